pub struct Cmd;
impl Cmd {
    // Panel configuration
    pub const PSR: u8 = 0x00;
    pub const PWR: u8 = 0x01;
    pub const CDI: u8 = 0x50;
    pub const TCON: u8 = 0x60;
    pub const TRES: u8 = 0x61;
    pub const AN_TM: u8 = 0x74;
    pub const AGID: u8 = 0x86;
    pub const CCSET: u8 = 0xE0;
    pub const PWS: u8 = 0xE3;
    pub const CMD66: u8 = 0xF0;

    // Boost / rail control
    pub const BTST_N: u8 = 0x05;
    pub const BTST_P: u8 = 0x06;
    pub const BUCK_BOOST_VDDN: u8 = 0xB0;
    pub const TFT_VCOM_POWER: u8 = 0xB1;
    pub const EN_BUF: u8 = 0xB6;
    pub const BOOST_VDDP_EN: u8 = 0xB7;

    // Power state and refresh
    pub const POF: u8 = 0x02;
    pub const PON: u8 = 0x04;
    pub const DSLP: u8 = 0x07;
    pub const DTM: u8 = 0x10;
    pub const DRF: u8 = 0x12;
}
