//! Pin assignments for the e-paper HAT on the HUZZAH32 Feather.
//!
//! The HAT shares one SPI bus between both controllers; only the chip
//! selects differ. There is no MISO, the panel never talks back.

/// GPIO numbers for the display and battery sense.
pub struct Pins;

#[allow(dead_code)]
impl Pins {
    /// Hardware SPI clock
    pub const SCK: u8 = 5;
    /// Hardware SPI data out
    pub const MOSI: u8 = 18;
    /// Chip select, master (left) controller
    pub const CS_M: u8 = 33;
    /// Chip select, slave (right) controller
    pub const CS_S: u8 = 15;
    /// Data/command line; wired but parked high, the panel frames on one wire
    pub const DC: u8 = 14;
    /// Shared reset
    pub const RST: u8 = 32;
    /// Shared busy status, high when ready
    pub const BUSY: u8 = 27;
    /// Panel power rail; tie to VCC for always-on operation
    pub const PWR: u8 = 21;
    /// Battery divider on ADC1
    pub const VBAT: u8 = 35;
}
