//! Waveshare 13.3" e-Paper (E) driver
//!
//! Six-color panel, 1200x1600, driven by two cascaded controller chips on a
//! shared SPI bus: the master owns the left 600 columns, the slave the right
//! 600. Each has its own chip-select; reset and busy are common.
//!
//! The panel is too large to frame-buffer on this board (a full 4 bpp canvas
//! is 960 KB), so all drawing goes through a streaming session per half:
//!
//! 1. [`driver::Epd13in3e::begin_frame`] opens a session against one half
//! 1. [`driver::Epd13in3e::write_line`] streams 300-byte packed lines, top to
//!    bottom
//! 1. [`driver::Epd13in3e::end_frame`] closes it, and a refresh makes the
//!    content visible
//!
//! [`splash::NetworkStatus`] and [`splash::PowerSource`] are the status seams
//! the boot splash reads from; `wifi.rs` and `power.rs` provide the on-device
//! implementations.

use display_interface::DisplayError;
use thiserror::Error;

pub mod color;
pub mod driver;
pub mod interface;
pub mod pins;
pub mod splash;

mod cmd;
mod font;

#[cfg(test)]
pub(crate) mod testutil;

/// Panel width in pixels, both halves combined
pub const WIDTH: usize = 1200;

/// Panel height in pixels
pub const HEIGHT: usize = 1600;

/// Columns driven by a single controller
pub const HALF_WIDTH: usize = WIDTH / 2;

/// Bytes in one transmitted line per half, two pixels packed per byte
pub const BYTES_PER_LINE_HALF: usize = HALF_WIDTH / 2;

/// One of the two controller chips.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Half {
    /// Left half, columns 0..600
    Master,
    /// Right half, columns 600..1200
    Slave,
}

/// Addressing for a framed command: one controller or a broadcast to both.
///
/// Broadcasts are only valid when both chips must latch the same bytes; pixel
/// data always goes to exactly one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Target {
    Master,
    Slave,
    Both,
}

impl From<Half> for Target {
    fn from(half: Half) -> Self {
        match half {
            Half::Master => Target::Master,
            Half::Slave => Target::Slave,
        }
    }
}

/// Driver failure modes.
///
/// The panel has no acknowledge wire, so a transport-level fault either shows
/// up here as a stuck busy line or later as visibly wrong output.
#[derive(Debug, Error)]
pub enum EpdError {
    /// Busy line never went ready within the wait budget.
    #[error("busy line stuck low for {waited_ms} ms")]
    HandshakeTimeout { waited_ms: u32 },
    /// A frame session was opened while another was still active.
    #[error("frame session already open on {open:?} while opening {requested:?}")]
    SessionAlreadyOpen { open: Half, requested: Half },
    /// A line buffer of the wrong length was handed to an open session.
    #[error("line buffer must be {expected} bytes, got {got}")]
    LineLength { expected: usize, got: usize },
    /// SPI or control-line fault reported by the transport layer.
    #[error("transport failure: {0:?}")]
    Transport(DisplayError),
}

impl From<DisplayError> for EpdError {
    fn from(err: DisplayError) -> Self {
        EpdError::Transport(err)
    }
}
