//! SPI/GPIO interface shared by both panel controllers.
//!
//! The panel frames command and data on a single wire: one command byte
//! followed by its payload, valid for whichever chips hold their select low.
//! There is no acknowledge path, so every fault that matters shows up later
//! on the busy line or on the glass.

use display_interface::DisplayError;
use embedded_hal::{
    delay::DelayNs,
    digital::{InputPin, OutputPin},
    spi::SpiDevice,
};

use super::{EpdError, Target};

// Empirically required by the panel; not tunable. Stretching the reset pulse
// or the poll cadence desynchronizes the two controllers.
const RESET_PULSE_MS: u32 = 30;
const BUSY_POLL_INTERVAL_MS: u32 = 10;
const BUSY_SETTLE_MS: u32 = 20;

// A full six-color refresh runs single-digit seconds; anything near this
// budget means dead hardware, not a slow refresh.
const BUSY_WAIT_BUDGET_MS: u32 = 60_000;

/// External watchdog hook, fed on every busy poll.
///
/// Refreshes block for multiple seconds; skipping the feed gets the task
/// killed mid-refresh by the system watchdog.
pub trait Watchdog {
    fn feed(&mut self);
}

/// The wiring to the panel: shared SPI bus, one chip-select per controller,
/// common reset and busy lines.
pub struct DisplayInterface<SPI, BSY, RST, CSM, CSS, DELAY, WDT> {
    spi: SPI,
    /// High when the panel is ready, low while it processes a command
    busy: BSY,
    rst: RST,
    /// Chip select for the master (left) controller
    cs_m: CSM,
    /// Chip select for the slave (right) controller
    cs_s: CSS,
    delay: DELAY,
    wdt: WDT,
}

impl<SPI, BSY, RST, CSM, CSS, DELAY, WDT> DisplayInterface<SPI, BSY, RST, CSM, CSS, DELAY, WDT> {
    pub fn new(spi: SPI, busy: BSY, rst: RST, cs_m: CSM, cs_s: CSS, delay: DELAY, wdt: WDT) -> Self {
        DisplayInterface {
            spi,
            busy,
            rst,
            cs_m,
            cs_s,
            delay,
            wdt,
        }
    }
}

impl<SPI, BSY, RST, CSM, CSS, DELAY, WDT> DisplayInterface<SPI, BSY, RST, CSM, CSS, DELAY, WDT>
where
    SPI: SpiDevice,
    BSY: InputPin,
    RST: OutputPin,
    CSM: OutputPin,
    CSS: OutputPin,
    DELAY: DelayNs,
    WDT: Watchdog,
{
    /// Assert the addressed chip-select(s).
    ///
    /// For a single-controller target the opposite select is released first:
    /// during streaming the two chips receive different data, and a stale low
    /// select would latch the wrong half's bytes.
    pub(crate) fn select(&mut self, target: Target) -> Result<(), EpdError> {
        match target {
            Target::Master => {
                self.cs_s.set_high().map_err(|_| DisplayError::CSError)?;
                self.cs_m.set_low().map_err(|_| DisplayError::CSError)?;
            }
            Target::Slave => {
                self.cs_m.set_high().map_err(|_| DisplayError::CSError)?;
                self.cs_s.set_low().map_err(|_| DisplayError::CSError)?;
            }
            Target::Both => {
                self.cs_m.set_low().map_err(|_| DisplayError::CSError)?;
                self.cs_s.set_low().map_err(|_| DisplayError::CSError)?;
            }
        }
        Ok(())
    }

    /// Release both chip-selects; the bus idle state.
    pub(crate) fn deselect_all(&mut self) -> Result<(), EpdError> {
        self.cs_m.set_high().map_err(|_| DisplayError::CSError)?;
        self.cs_s.set_high().map_err(|_| DisplayError::CSError)?;
        Ok(())
    }

    /// Write one command byte. Chip-select state is the caller's business;
    /// the hardware accepts multi-command bursts under one assertion.
    pub(crate) fn write_cmd(&mut self, command: u8) -> Result<(), EpdError> {
        match self.spi.write(&[command]) {
            Ok(()) => Ok(()),
            Err(e) => {
                log::error!("SPI write error for command 0x{:02X}: {:?}", command, e);
                Err(DisplayError::BusWriteError.into())
            }
        }
    }

    /// Write raw payload bytes under the currently asserted select(s).
    pub(crate) fn write_data(&mut self, data: &[u8]) -> Result<(), EpdError> {
        if data.is_empty() {
            return Ok(());
        }
        self.spi
            .write(data)
            .map_err(|_| DisplayError::BusWriteError)?;
        Ok(())
    }

    /// One fully framed command: select, command byte, payload, deselect.
    pub(crate) fn send_framed(
        &mut self,
        target: Target,
        command: u8,
        payload: &[u8],
    ) -> Result<(), EpdError> {
        self.select(target)?;
        let res = self
            .write_cmd(command)
            .and_then(|()| self.write_data(payload));
        if res.is_err() {
            let _ = self.deselect_all();
            return res;
        }
        self.deselect_all()
    }

    /// Hardware reset pulse train.
    ///
    /// Two low phases, 30 ms apart; the slave controller only resynchronizes
    /// on the second one. Collapsing this to a single pulse leaves the right
    /// half dead.
    pub(crate) fn reset_panel(&mut self) -> Result<(), EpdError> {
        for level in [true, false, true, false, true] {
            self.set_rst(level)?;
            self.delay.delay_ms(RESET_PULSE_MS);
        }
        Ok(())
    }

    fn set_rst(&mut self, level: bool) -> Result<(), EpdError> {
        let res = if level {
            self.rst.set_high()
        } else {
            self.rst.set_low()
        };
        res.map_err(|_| DisplayError::RSError)?;
        Ok(())
    }

    /// Block until the busy line reads ready, then settle.
    ///
    /// Polls at 10 ms and feeds the watchdog on every iteration. The vendor
    /// driver waits forever; the budget here turns a dead panel into a
    /// reportable [`EpdError::HandshakeTimeout`] without changing the
    /// steady-state cadence.
    pub(crate) fn wait_ready(&mut self) -> Result<(), EpdError> {
        log::debug!("e-paper busy");
        let mut waited_ms = 0u32;
        loop {
            let ready = self
                .busy
                .is_high()
                // No busy variant in DisplayError; DC is the closest pin fault.
                .map_err(|_| DisplayError::DCError)?;
            if ready {
                break;
            }
            if waited_ms >= BUSY_WAIT_BUDGET_MS {
                log::error!("busy line stuck low after {} ms", waited_ms);
                return Err(EpdError::HandshakeTimeout { waited_ms });
            }
            self.delay.delay_ms(BUSY_POLL_INTERVAL_MS);
            self.wdt.feed();
            waited_ms += BUSY_POLL_INTERVAL_MS;
        }
        self.delay.delay_ms(BUSY_SETTLE_MS);
        log::debug!("e-paper busy release");
        Ok(())
    }

    pub(crate) fn delay_ms(&mut self, ms: u32) {
        self.delay.delay_ms(ms);
    }
}
