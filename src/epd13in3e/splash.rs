//! Boot splash: six color bands, one status line each.
//!
//! Rendering is line-at-a-time into a 300-byte scratch buffer, streamed to
//! the master half first and then to the slave half. Both halves stamp every
//! character at its absolute panel x through their own 600-column window, so
//! a glyph straddling column 600 is produced by clipping alone and the right
//! half resumes mid-glyph exactly where the left half stopped.

use embedded_hal::{
    delay::DelayNs,
    digital::{InputPin, OutputPin},
    spi::SpiDevice,
};

use super::color::Color;
use super::driver::Epd13in3e;
use super::font::{glyph_index, stamp_glyph_row, CHAR_PITCH, FONT, GLYPH_ROWS, GLYPH_SPAN};
use super::interface::Watchdog;
use super::{EpdError, Half, BYTES_PER_LINE_HALF, HALF_WIDTH, HEIGHT};

/// Connection state shown on the splash, owed by the network stack.
pub trait NetworkStatus {
    fn is_connected(&self) -> bool;
    fn local_address(&self) -> String;
    fn access_point_id(&self) -> String;
}

/// Power-source state shown on the splash.
///
/// `battery_percent` returning `None` means USB power; the voltage is only
/// sampled when a cell is present.
pub trait PowerSource {
    fn battery_percent(&mut self) -> Option<i32>;
    fn battery_voltage(&mut self) -> f32;
}

const BAND_COUNT: usize = 6;

/// Rows per band; the division remainder folds into the bottom band.
const BAND_HEIGHT: usize = HEIGHT / BAND_COUNT;

const BAND_COLORS: [Color; BAND_COUNT] = [
    Color::Black,
    Color::White,
    Color::Yellow,
    Color::Red,
    Color::Blue,
    Color::Green,
];

/// Text window within a band: 64 rows starting at row 100, of which the
/// first 32 carry the 8 glyph rows at 4x vertical scale.
const TEXT_TOP: usize = 100;
const TEXT_WINDOW: usize = 64;
const VSCALE: usize = 4;

/// First rendered column of a status line.
const TEXT_LEFT_MARGIN: i32 = 20;

fn band_index(y: usize) -> usize {
    (y / BAND_HEIGHT).min(BAND_COUNT - 1)
}

/// The glyph row shown on scanline `y`, if `y` falls in its band's text zone.
fn text_row(y: usize) -> Option<usize> {
    let y_in_band = y % BAND_HEIGHT;
    if !(TEXT_TOP..TEXT_TOP + TEXT_WINDOW).contains(&y_in_band) {
        return None;
    }
    let row = (y_in_band - TEXT_TOP) / VSCALE;
    (row < GLYPH_ROWS).then_some(row)
}

/// Overlay one glyph row of `text` onto a line buffer that covers panel
/// columns `[window_start, window_start + window_width)`.
///
/// Characters advance by their nominal pitch regardless of clipping, which
/// is what keeps the two halves' layouts identical.
fn render_text_row(
    line: &mut [u8],
    text: &str,
    font_row: usize,
    color: Color,
    window_start: i32,
    window_width: usize,
) {
    for (i, c) in text.bytes().enumerate() {
        let origin = TEXT_LEFT_MARGIN + (i as i32) * CHAR_PITCH - window_start;
        if origin >= window_width as i32 {
            break;
        }
        if origin + GLYPH_SPAN <= 0 {
            continue;
        }
        let row_bits = FONT[glyph_index(c)][font_row];
        stamp_glyph_row(line, origin, row_bits, color, window_width);
    }
}

/// Build the six status lines. At 40 px pitch the panel fits 30 characters;
/// every line stays under that.
fn compose_status_lines(
    net: &impl NetworkStatus,
    power: &mut impl PowerSource,
    port: u16,
) -> [String; BAND_COUNT] {
    let (ip_line, wifi_line) = if net.is_connected() {
        (
            format!("IP: {} PORT: {}", net.local_address(), port),
            format!("WIFI: {}", net.access_point_id().to_uppercase()),
        )
    } else {
        ("NO WIFI CONNECTION".to_string(), "OFFLINE MODE".to_string())
    };

    let battery_line = match power.battery_percent() {
        Some(pct) => format!("BATTERY: {:.1}V ({}%)", power.battery_voltage(), pct),
        None => "USB POWER".to_string(),
    };

    [
        "E-INK FRAME (C) 2025".to_string(),
        ip_line,
        wifi_line,
        battery_line,
        "13.3 INCH COLOR DISPLAY".to_string(),
        "READY FOR YOUR IMAGES".to_string(),
    ]
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
    /// Render and refresh the six-band status screen.
    ///
    /// Re-initializes the panel first; the splash runs right after power-on
    /// and must not assume a configured controller.
    pub fn show_boot_splash(
        &mut self,
        net: &impl NetworkStatus,
        power: &mut impl PowerSource,
        port: u16,
    ) -> Result<(), EpdError> {
        log::info!("rendering boot splash");
        let texts = compose_status_lines(net, power, port);

        self.init()?;
        let res = self.render_bands(&texts);
        if res.is_err() {
            self.abort_session();
        }
        res?;

        log::info!("refreshing display");
        self.refresh()
    }

    fn render_bands(&mut self, texts: &[String; BAND_COUNT]) -> Result<(), EpdError> {
        let mut line = [0u8; BYTES_PER_LINE_HALF];
        for half in [Half::Master, Half::Slave] {
            let window_start = match half {
                Half::Master => 0,
                Half::Slave => HALF_WIDTH as i32,
            };
            let session = self.begin_frame(half)?;
            for y in 0..HEIGHT {
                let band = band_index(y);
                let background = BAND_COLORS[band];
                line.fill(background.packed());
                if let Some(row) = text_row(y) {
                    render_text_row(
                        &mut line,
                        &texts[band],
                        row,
                        background.contrast(),
                        window_start,
                        HALF_WIDTH,
                    );
                }
                self.write_line(&session, &line)?;
                if y % 100 == 0 {
                    log::debug!("{:?} line {}/{}", half, y, HEIGHT);
                }
            }
            self.end_frame(session)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FakeNet {
        connected: bool,
        ip: &'static str,
        ssid: &'static str,
    }

    impl NetworkStatus for FakeNet {
        fn is_connected(&self) -> bool {
            self.connected
        }
        fn local_address(&self) -> String {
            self.ip.to_string()
        }
        fn access_point_id(&self) -> String {
            self.ssid.to_string()
        }
    }

    /// Voltage is `None` when sampling it would be a test failure.
    struct FakeBattery {
        percent: Option<i32>,
        volts: Option<f32>,
    }

    impl PowerSource for FakeBattery {
        fn battery_percent(&mut self) -> Option<i32> {
            self.percent
        }
        fn battery_voltage(&mut self) -> f32 {
            self.volts.expect("voltage sampled without a cell present")
        }
    }

    #[test]
    fn connected_boot_lines() {
        let net = FakeNet {
            connected: true,
            ip: "192.168.1.5",
            ssid: "MyNetwork",
        };
        let mut battery = FakeBattery {
            percent: Some(75),
            volts: Some(3.9),
        };
        let lines = compose_status_lines(&net, &mut battery, 8080);
        assert_eq!(lines[0], "E-INK FRAME (C) 2025");
        assert_eq!(lines[1], "IP: 192.168.1.5 PORT: 8080");
        assert_eq!(lines[2], "WIFI: MYNETWORK");
        assert_eq!(lines[3], "BATTERY: 3.9V (75%)");
        assert_eq!(lines[4], "13.3 INCH COLOR DISPLAY");
        assert_eq!(lines[5], "READY FOR YOUR IMAGES");
    }

    #[test]
    fn offline_boot_lines() {
        let net = FakeNet {
            connected: false,
            ip: "",
            ssid: "",
        };
        let mut battery = FakeBattery {
            percent: Some(50),
            volts: Some(3.7),
        };
        let lines = compose_status_lines(&net, &mut battery, 8080);
        assert_eq!(lines[1], "NO WIFI CONNECTION");
        assert_eq!(lines[2], "OFFLINE MODE");
    }

    #[test]
    fn usb_power_skips_the_voltage_read() {
        let net = FakeNet {
            connected: true,
            ip: "10.0.0.2",
            ssid: "frame",
        };
        let mut battery = FakeBattery {
            percent: None,
            volts: None,
        };
        let lines = compose_status_lines(&net, &mut battery, 9000);
        assert_eq!(lines[3], "USB POWER");
    }

    #[test]
    fn bands_are_266_rows_with_the_remainder_folded_down() {
        assert_eq!(band_index(0), 0);
        assert_eq!(band_index(265), 0);
        assert_eq!(band_index(266), 1);
        assert_eq!(band_index(1329), 4);
        assert_eq!(band_index(1330), 5);
        // 1596..1600 are the fold; still band 5.
        assert_eq!(band_index(1599), 5);
    }

    #[test]
    fn text_zone_covers_the_first_eight_scaled_rows() {
        assert_eq!(text_row(99), None);
        assert_eq!(text_row(100), Some(0));
        assert_eq!(text_row(103), Some(0));
        assert_eq!(text_row(104), Some(1));
        assert_eq!(text_row(131), Some(7));
        // Rows 132..164 sit inside the window but past the glyph, and stay
        // background.
        assert_eq!(text_row(132), None);
        assert_eq!(text_row(163), None);
        assert_eq!(text_row(164), None);
        // Second band, same zone.
        assert_eq!(text_row(266 + 100), Some(0));
    }

    #[test]
    fn folded_rows_never_reenter_the_text_zone() {
        for y in 1596..1600 {
            assert_eq!(text_row(y), None, "fold row {y}");
        }
    }

    #[test]
    fn half_split_is_lossless_across_column_600() {
        use crate::epd13in3e::WIDTH;

        // 30 characters span 20..1220, so several glyphs cross column 600.
        let text = "ABCDEFGHIJKLMNOPQRSTUVWXYZ0123";
        let background = Color::White;
        let ink = Color::Black;

        for row in 0..GLYPH_ROWS {
            let mut full = vec![background.packed(); WIDTH / 2];
            render_text_row(&mut full, text, row, ink, 0, WIDTH);

            let mut master = vec![background.packed(); BYTES_PER_LINE_HALF];
            let mut slave = vec![background.packed(); BYTES_PER_LINE_HALF];
            render_text_row(&mut master, text, row, ink, 0, HALF_WIDTH);
            render_text_row(&mut slave, text, row, ink, HALF_WIDTH as i32, HALF_WIDTH);

            let mut joined = master;
            joined.extend_from_slice(&slave);
            assert_eq!(joined, full, "row {row} differs across the split");
        }
    }

    #[test]
    fn character_straddling_the_boundary_lands_on_both_halves() {
        // Pitch 40 from margin 20: the glyph starting at x=580 crosses 600.
        let idx = (600 - TEXT_LEFT_MARGIN) / CHAR_PITCH; // character 14
        let text = "A".repeat(idx as usize + 1);
        // Row 4 of 'A' is 0x3F: six set columns, 24 rendered px from x=580,
        // so ink falls on both sides of the boundary.
        let mut master = vec![Color::White.packed(); BYTES_PER_LINE_HALF];
        let mut slave = vec![Color::White.packed(); BYTES_PER_LINE_HALF];
        render_text_row(&mut master, &text, 4, Color::Black, 0, HALF_WIDTH);
        render_text_row(&mut slave, &text, 4, Color::Black, HALF_WIDTH as i32, HALF_WIDTH);

        let blank = vec![Color::White.packed(); BYTES_PER_LINE_HALF];
        assert_ne!(master, blank, "left part of the glyph missing");
        assert_ne!(slave, blank, "right part of the glyph missing");
    }
}
