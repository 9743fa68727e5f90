//! Row producers for [`PanelController::draw`](super::driver::PanelController::draw).
//!
//! The panel has no frame buffer and the controller keeps none, so images are
//! pulled one row at a time. An image decoder only has to hand out decoded
//! rows in order; the controller pushes each one to the panel before asking
//! for the next.

use core::convert::Infallible;
use core::fmt::Debug;

use crate::panel::{HEIGHT, WIDTH};

/// A forward-only producer of panel rows.
///
/// `read_row` is called exactly once for every `y` in `0..HEIGHT`, in order.
/// Each call fills `row` with one pixel per byte, 1 for black and 0 for white.
pub trait ScanlineSource {
    /// Error raised when a row cannot be produced
    type Error: Debug;

    /// Fill `row` with scanline `y`.
    fn read_row(&mut self, y: usize, row: &mut [u8; WIDTH]) -> Result<(), Self::Error>;
}

impl<S: ScanlineSource + ?Sized> ScanlineSource for &mut S {
    type Error = S::Error;

    fn read_row(&mut self, y: usize, row: &mut [u8; WIDTH]) -> Result<(), Self::Error> {
        S::read_row(self, y, row)
    }
}

/// All-white rows, used for erase passes.
#[derive(Debug, Clone, Copy, Default)]
pub struct BlankSource;

impl ScanlineSource for BlankSource {
    type Error = Infallible;

    fn read_row(&mut self, _y: usize, row: &mut [u8; WIDTH]) -> Result<(), Self::Error> {
        row.fill(0);
        Ok(())
    }
}

/// Bytes per row of a packed full-panel bitmap
pub const PACKED_ROW_BYTES: usize = WIDTH / 8;

/// Size of a packed full-panel bitmap
pub const PACKED_FRAME_BYTES: usize = PACKED_ROW_BYTES * HEIGHT;

/// Error for a packed bitmap that does not cover the panel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("packed bitmap has {len} bytes, a full frame needs {expected}")]
pub struct BitmapSizeError {
    /// Bytes supplied
    pub len: usize,
    /// Bytes required
    pub expected: usize,
}

/// A full-panel 1 bit per pixel image, rows top to bottom, MSB is the
/// leftmost pixel, a set bit is black.
#[derive(Debug, Clone, Copy)]
pub struct PackedBitmap<'a> {
    data: &'a [u8],
}

impl<'a> PackedBitmap<'a> {
    /// Wrap `data`, which must be exactly [`PACKED_FRAME_BYTES`] long.
    pub fn new(data: &'a [u8]) -> Result<Self, BitmapSizeError> {
        if data.len() != PACKED_FRAME_BYTES {
            return Err(BitmapSizeError {
                len: data.len(),
                expected: PACKED_FRAME_BYTES,
            });
        }
        Ok(PackedBitmap { data })
    }
}

impl ScanlineSource for PackedBitmap<'_> {
    type Error = Infallible;

    fn read_row(&mut self, y: usize, row: &mut [u8; WIDTH]) -> Result<(), Self::Error> {
        let start = y * PACKED_ROW_BYTES;
        match self.data.get(start..start + PACKED_ROW_BYTES) {
            Some(packed) => unpack_row(packed, row),
            None => row.fill(0),
        }
        Ok(())
    }
}

/// Expand MSB-first packed bits into one byte per pixel.
pub fn unpack_row(packed: &[u8], row: &mut [u8]) {
    for (pixels, byte) in row.chunks_mut(8).zip(packed) {
        for (bit, pixel) in pixels.iter_mut().enumerate() {
            *pixel = (byte >> (7 - bit)) & 1;
        }
    }
}
