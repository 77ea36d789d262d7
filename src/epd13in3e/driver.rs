//! Panel driver: init/power sequencing, frame sessions, solid clear.
//!
//! The configure sequence and its timing come from the working vendor
//! driver for this panel and are treated as a hardware contract: the entries
//! are issued in table order, each under its own chip-select frame, and the
//! rail/boost block at the tail goes to the master controller only.

use embedded_hal::{
    delay::DelayNs,
    digital::{InputPin, OutputPin},
    spi::SpiDevice,
};

use super::cmd::Cmd;
use super::color::Color;
use super::interface::{DisplayInterface, Watchdog};
use super::{EpdError, Half, Target, BYTES_PER_LINE_HALF, HEIGHT};

// Vendor-calibrated payloads. Kept next to the sequence table so the whole
// protocol can be audited against the datasheet in one place.
const PSR_V: [u8; 2] = [0xDF, 0x69];
const PWR_V: [u8; 6] = [0x0F, 0x00, 0x28, 0x2C, 0x28, 0x38];
const POF_V: [u8; 1] = [0x00];
const DRF_V: [u8; 1] = [0x00];
const CDI_V: [u8; 1] = [0xF7];
const TCON_V: [u8; 2] = [0x03, 0x03];
const TRES_V: [u8; 4] = [0x04, 0xB0, 0x06, 0x40]; // 1200 x 1600
const CMD66_V: [u8; 6] = [0x49, 0x55, 0x13, 0x5D, 0x05, 0x10];
const EN_BUF_V: [u8; 1] = [0x07];
const CCSET_V: [u8; 1] = [0x01];
const PWS_V: [u8; 1] = [0x22];
const AN_TM_V: [u8; 9] = [0xC0, 0x1C, 0x1C, 0xCC, 0xCC, 0xCC, 0x15, 0x15, 0x55];
const AGID_V: [u8; 1] = [0x10];
const BTST_P_V: [u8; 2] = [0xE8, 0x28];
const BOOST_VDDP_EN_V: [u8; 1] = [0x01];
const BTST_N_V: [u8; 2] = [0xE8, 0x28];
const BUCK_BOOST_VDDN_V: [u8; 1] = [0x01];
const TFT_VCOM_POWER_V: [u8; 1] = [0x02];
const DSLP_V: [u8; 1] = [0xA5];

/// Configure sequence, consumed in order after the reset train. The
/// master-only rail block must stay contiguous for the chips to latch it.
const INIT_SEQUENCE: &[(Target, u8, &[u8])] = &[
    (Target::Master, Cmd::AN_TM, &AN_TM_V),
    (Target::Both, Cmd::CMD66, &CMD66_V),
    (Target::Both, Cmd::PSR, &PSR_V),
    (Target::Both, Cmd::CDI, &CDI_V),
    (Target::Both, Cmd::TCON, &TCON_V),
    (Target::Both, Cmd::AGID, &AGID_V),
    (Target::Both, Cmd::PWS, &PWS_V),
    (Target::Both, Cmd::CCSET, &CCSET_V),
    (Target::Both, Cmd::TRES, &TRES_V),
    (Target::Master, Cmd::PWR, &PWR_V),
    (Target::Master, Cmd::EN_BUF, &EN_BUF_V),
    (Target::Master, Cmd::BTST_P, &BTST_P_V),
    (Target::Master, Cmd::BOOST_VDDP_EN, &BOOST_VDDP_EN_V),
    (Target::Master, Cmd::BTST_N, &BTST_N_V),
    (Target::Master, Cmd::BUCK_BOOST_VDDN, &BUCK_BOOST_VDDN_V),
    (Target::Master, Cmd::TFT_VCOM_POWER, &TFT_VCOM_POWER_V),
];

// Empirical, like the interface timings.
const REFRESH_LEAD_MS: u32 = 50;
const SLEEP_SETTLE_MS: u32 = 100;
const POWER_SETTLE_MS: u32 = 100;

/// Proof of an open streaming session on one half.
///
/// Only [`Epd13in3e::begin_frame`] creates one, and [`Epd13in3e::end_frame`]
/// consumes it, so a line can't be streamed without the line-write command
/// having been framed first.
#[derive(Debug)]
pub struct FrameSession {
    half: Half,
}

/// 13.3" six-color e-paper panel over two controllers.
///
/// ## Type parameters
///
/// - `SPI` - SPI device for communication (no hardware CS)
/// - `BSY` - shared busy input, high when ready
/// - `RST` - shared reset output
/// - `CSM` / `CSS` - chip selects for master and slave controller
/// - `PWR` - optional panel power rail
/// - `DELAY` - delay provider for timing
/// - `WDT` - watchdog hook fed during busy waits
pub struct Epd13in3e<SPI, BSY, RST, CSM, CSS, PWR, DELAY, WDT> {
    interface: DisplayInterface<SPI, BSY, RST, CSM, CSS, DELAY, WDT>,
    power: Option<PWR>,
    session: Option<Half>,
}

impl<SPI, BSY, RST, CSM, CSS, PWR, DELAY, WDT> Epd13in3e<SPI, BSY, RST, CSM, CSS, PWR, DELAY, WDT>
where
    SPI: SpiDevice,
    BSY: InputPin,
    RST: OutputPin,
    CSM: OutputPin,
    CSS: OutputPin,
    PWR: OutputPin,
    DELAY: DelayNs,
    WDT: Watchdog,
{
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        spi: SPI,
        busy: BSY,
        rst: RST,
        cs_m: CSM,
        cs_s: CSS,
        power: Option<PWR>,
        delay: DELAY,
        wdt: WDT,
    ) -> Self {
        Epd13in3e {
            interface: DisplayInterface::new(spi, busy, rst, cs_m, cs_s, delay, wdt),
            power,
            session: None,
        }
    }

    /// Bring both controllers from reset to configured.
    pub fn init(&mut self) -> Result<(), EpdError> {
        log::info!("panel init");
        self.interface.reset_panel()?;
        for &(target, command, payload) in INIT_SEQUENCE {
            self.interface.send_framed(target, command, payload)?;
        }
        Ok(())
    }

    /// Raise the panel power rail, if one is wired.
    pub fn power_on(&mut self) -> Result<(), EpdError> {
        if let Some(pin) = self.power.as_mut() {
            pin.set_high()
                // No rail variant in DisplayError; RS is the nearest pin fault.
                .map_err(|_| display_interface::DisplayError::RSError)?;
            self.interface.delay_ms(POWER_SETTLE_MS);
        }
        Ok(())
    }

    /// Deep-sleep the panel, then cut the rail if one is wired.
    pub fn power_off(&mut self) -> Result<(), EpdError> {
        self.sleep()?;
        if self.power.is_some() {
            self.interface.delay_ms(POWER_SETTLE_MS);
        }
        if let Some(pin) = self.power.as_mut() {
            pin.set_low()
                .map_err(|_| display_interface::DisplayError::RSError)?;
        }
        Ok(())
    }

    /// Enter deep sleep. Only the reset train wakes the panel afterwards.
    pub fn sleep(&mut self) -> Result<(), EpdError> {
        log::info!("panel deep sleep");
        self.interface.send_framed(Target::Both, Cmd::DSLP, &DSLP_V)?;
        self.interface.delay_ms(SLEEP_SETTLE_MS);
        Ok(())
    }

    /// Power on the charge pumps, refresh the glass from controller RAM and
    /// power back off.
    pub fn refresh(&mut self) -> Result<(), EpdError> {
        log::info!("write PON");
        self.interface.send_framed(Target::Both, Cmd::PON, &[])?;
        self.interface.wait_ready()?;

        log::info!("write DRF");
        self.interface.delay_ms(REFRESH_LEAD_MS);
        self.interface.send_framed(Target::Both, Cmd::DRF, &DRF_V)?;
        self.interface.wait_ready()?;

        log::info!("write POF");
        self.interface.send_framed(Target::Both, Cmd::POF, &POF_V)?;
        // The controllers power down on their own schedule after POF and do
        // not raise busy again; waiting here desynchronizes them.
        Ok(())
    }

    /// Open a streaming session against one half: select its chip alone and
    /// frame the line-write command.
    ///
    /// Sessions are exclusive panel-wide; the two selects share one bus.
    pub fn begin_frame(&mut self, half: Half) -> Result<FrameSession, EpdError> {
        if let Some(open) = self.session {
            return Err(EpdError::SessionAlreadyOpen {
                open,
                requested: half,
            });
        }
        self.interface.select(half.into())?;
        self.interface.write_cmd(Cmd::DTM)?;
        self.session = Some(half);
        Ok(FrameSession { half })
    }

    /// Stream one packed line into the open session. Lines accumulate
    /// row-major, top to bottom. An empty buffer is a no-op.
    pub fn write_line(&mut self, session: &FrameSession, line: &[u8]) -> Result<(), EpdError> {
        debug_assert_eq!(self.session, Some(session.half));
        if line.is_empty() {
            return Ok(());
        }
        if line.len() != BYTES_PER_LINE_HALF {
            return Err(EpdError::LineLength {
                expected: BYTES_PER_LINE_HALF,
                got: line.len(),
            });
        }
        self.interface.write_data(line)
    }

    /// Close the session and release the chip-select.
    pub fn end_frame(&mut self, session: FrameSession) -> Result<(), EpdError> {
        debug_assert_eq!(self.session, Some(session.half));
        self.session = None;
        self.interface.deselect_all()
    }

    /// Drop whatever session is open and force both selects high. Called on
    /// any mid-stream error; a half-written frame is only recoverable through
    /// a full re-init anyway.
    pub(crate) fn abort_session(&mut self) {
        self.session = None;
        let _ = self.interface.deselect_all();
    }

    /// Fill the whole panel with one flat color and refresh.
    pub fn clear(&mut self, color: Color) -> Result<(), EpdError> {
        log::info!("clear panel to {:?}", color);
        let line = [color.packed(); BYTES_PER_LINE_HALF];
        let res = self.stream_solid(&line);
        if res.is_err() {
            self.abort_session();
        }
        res?;
        self.refresh()
    }

    fn stream_solid(&mut self, line: &[u8; BYTES_PER_LINE_HALF]) -> Result<(), EpdError> {
        for half in [Half::Master, Half::Slave] {
            let session = self.begin_frame(half)?;
            for _ in 0..HEIGHT {
                self.write_line(&session, line)?;
            }
            self.end_frame(session)?;
        }
        Ok(())
    }
}
