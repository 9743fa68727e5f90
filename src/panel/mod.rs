//! ED060XC3 ePaper Panel Driver
//!
//! Used with the 6" 1024x758 ED060XC3 panel, whose source and gate drivers are
//! fed directly over an 8-bit parallel bus. There is no controller chip with
//! RAM on the panel side: every row is clocked in by the host while the panel
//! power IC keeps the analog rails up.
//!
//! ### Usage
//! This driver does not own a frame buffer. To display something you:
//!
//! 1. build a [`driver::PanelController`] from the pin drivers, the I2C bus
//!    wired to the power IC and a delay provider
//! 1. power the rails with [`driver::PanelController::enable`]
//! 1. push exactly [`HEIGHT`] rows between [`driver::PanelController::begin`]
//!    and [`driver::PanelController::end`], or hand a [`source::ScanlineSource`]
//!    to [`driver::PanelController::draw`]
//! 1. power down with [`driver::PanelController::disable`]
//!
//! Images are usually drawn after a couple of
//! [`driver::PanelController::clear`] passes.

pub mod band;
pub mod bus;
pub mod driver;
pub mod encoder;
pub mod error;
pub mod pins;
pub mod port;
pub mod power;
pub mod source;

mod cmd;
mod flag;

#[cfg(test)]
pub(crate) mod mock;

/// Display width, pixels horizontally (one scanline)
pub const WIDTH: usize = 1024;

/// Display height, pixels vertically (scanlines per frame)
pub const HEIGHT: usize = 758;

/// Pixels packed into one byte on the data bus
pub const PIXELS_PER_BYTE: usize = 4;

/// Bytes clocked onto the data bus for one row
pub const BYTES_PER_ROW: usize = WIDTH / PIXELS_PER_BYTE;

const _: () = assert!(WIDTH % PIXELS_PER_BYTE == 0, "WIDTH must be a multiple of 4");
