use anyhow::Context;

use esp_idf_svc::hal::delay::Delay;
use esp_idf_svc::hal::gpio;
use esp_idf_svc::hal::peripherals::Peripherals;
use esp_idf_svc::hal::prelude::*;
use esp_idf_svc::hal::spi;

mod epd13in3e;
mod power;
mod wifi;

use crate::epd13in3e::driver::Epd13in3e;

// Station credentials and the port the frame's image server listens on.
const WIFI_SSID: &str = "YOUR_WIFI_SSID";
const WIFI_PASS: &str = "YOUR_WIFI_PASSWORD";
const SERVER_PORT: u16 = 8080;

// https://docs.esp-rs.org/esp-idf-svc/esp_idf_svc/
fn main() -> anyhow::Result<()> {
    // It is necessary to call this function once. Otherwise some patches to the runtime
    // implemented by esp-idf-sys might not link properly. See https://github.com/esp-rs/esp-idf-template/issues/71
    esp_idf_svc::sys::link_patches();

    // Bind the log crate to the ESP Logging facilities
    esp_idf_svc::log::EspLogger::initialize_default();

    let peripherals = Peripherals::take().context("could not take peripherals")?;
    let pins = peripherals.pins;

    // 10 MHz is stable with the HAT's cable; the panel has no MISO and chip
    // selects are driven by hand, one per controller.
    log::info!("configuring SPI for the dual-controller panel");
    let spi = spi::SpiDeviceDriver::new_single(
        peripherals.spi2,
        pins.gpio5,                         // SCK  - Pins::SCK
        pins.gpio18,                        // MOSI - Pins::MOSI
        Option::<gpio::AnyIOPin>::None,     // no MISO
        Option::<gpio::AnyOutputPin>::None, // CS is per-controller, below
        &spi::SpiDriverConfig::new(),
        &spi::SpiConfig::new().baudrate(10.MHz().into()),
    )
    .context("could not create SPI device driver")?;

    let mut cs_m = gpio::PinDriver::output(pins.gpio33)?; // Pins::CS_M
    let mut cs_s = gpio::PinDriver::output(pins.gpio15)?; // Pins::CS_S
    cs_m.set_high()?;
    cs_s.set_high()?;

    // The panel frames command and data on one wire; DC stays parked high.
    let mut dc = gpio::PinDriver::output(pins.gpio14)?; // Pins::DC
    dc.set_high()?;

    let mut rst = gpio::PinDriver::output(pins.gpio32)?; // Pins::RST
    rst.set_high()?;
    let busy = gpio::PinDriver::input(pins.gpio27)?; // Pins::BUSY
    let pwr = gpio::PinDriver::output(pins.gpio21)?; // Pins::PWR

    let delay = Delay::default();
    let mut battery = power::BatteryMonitor::new();

    let mut epd = Epd13in3e::new(
        spi,
        busy,
        rst,
        cs_m,
        cs_s,
        Some(pwr),
        delay,
        power::TaskWatchdog,
    );
    epd.power_on()?;

    // The splash is diagnostic; a failed render must not block startup.
    match wifi::WifiManager::connect(peripherals.modem, WIFI_SSID, WIFI_PASS) {
        Ok(net) => {
            if let Err(e) = epd.show_boot_splash(&net, &mut battery, SERVER_PORT) {
                log::warn!("boot splash failed: {e}");
            }
        }
        Err(e) => {
            log::warn!("wifi unavailable, booting offline: {e:#}");
            if let Err(e) = epd.show_boot_splash(&wifi::Offline, &mut battery, SERVER_PORT) {
                log::warn!("boot splash failed: {e}");
            }
        }
    }

    epd.power_off()?;
    log::info!("boot splash done, panel asleep");
    Ok(())
}
