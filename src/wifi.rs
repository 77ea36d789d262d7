//! Station bring-up and the network side of the boot splash.

use anyhow::Result;
use embedded_svc::wifi::{AuthMethod, ClientConfiguration, Configuration};
use esp_idf_svc::eventloop::EspSystemEventLoop;
use esp_idf_svc::hal::modem::Modem;
use esp_idf_svc::nvs::{EspNvsPartition, NvsDefault};
use esp_idf_svc::wifi::{BlockingWifi, EspWifi};
use log::info;

use crate::epd13in3e::splash::NetworkStatus;

pub struct WifiManager<'a> {
    wifi: Box<BlockingWifi<EspWifi<'a>>>,
    ssid: String,
}

impl<'a> WifiManager<'a> {
    /// Join the configured network and wait for an address.
    pub fn connect(modem: Modem, ssid: &str, password: &str) -> Result<WifiManager<'a>> {
        let sys_loop = EspSystemEventLoop::take()?;
        let nvs = EspNvsPartition::<NvsDefault>::take()?;

        let mut wifi = Box::new(BlockingWifi::wrap(
            EspWifi::new(modem, sys_loop.clone(), Some(nvs))?,
            sys_loop,
        )?);

        let config = Configuration::Client(ClientConfiguration {
            ssid: ssid
                .try_into()
                .map_err(|_| anyhow::anyhow!("SSID too long"))?,
            password: password
                .try_into()
                .map_err(|_| anyhow::anyhow!("password too long"))?,
            auth_method: AuthMethod::WPA2Personal,
            ..Default::default()
        });
        wifi.set_configuration(&config)?;
        wifi.start()?;
        wifi.connect()?;
        wifi.wait_netif_up()?;

        let manager = WifiManager {
            wifi,
            ssid: ssid.to_string(),
        };
        info!(
            "connected to {} as {}",
            manager.ssid,
            manager.local_address()
        );
        Ok(manager)
    }
}

impl NetworkStatus for WifiManager<'_> {
    fn is_connected(&self) -> bool {
        self.wifi.is_connected().unwrap_or(false)
    }

    fn local_address(&self) -> String {
        self.wifi
            .wifi()
            .sta_netif()
            .get_ip_info()
            .map(|info| info.ip.to_string())
            .unwrap_or_else(|_| "0.0.0.0".to_string())
    }

    fn access_point_id(&self) -> String {
        self.ssid.clone()
    }
}

/// Fallback provider when the network never came up; the splash then shows
/// the offline notices.
pub struct Offline;

impl NetworkStatus for Offline {
    fn is_connected(&self) -> bool {
        false
    }

    fn local_address(&self) -> String {
        String::new()
    }

    fn access_point_id(&self) -> String {
        String::new()
    }
}
