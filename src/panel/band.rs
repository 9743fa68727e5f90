//! Band rendering of `embedded-graphics` scenes.
//!
//! A full 1-bit frame is close to 100KB, more than the panel needs to be fed
//! one row at a time. The renderer instead keeps a packed buffer of
//! [`BAND_ROWS`] rows. When the driver asks for a row outside the current
//! band:
//!
//! 1. the band moves down and is cleared to white
//! 1. the scene closure draws the whole picture, the band clips it
//! 1. rows are unpacked out of the band until it runs out
//!
//! The scene is therefore drawn once per band and must draw the same picture
//! every time.

use embedded_graphics::{
    draw_target::DrawTarget,
    geometry::{OriginDimensions, Size},
    pixelcolor::BinaryColor,
    Pixel,
};

use crate::panel::source::{unpack_row, ScanlineSource, PACKED_ROW_BYTES};
use crate::panel::{HEIGHT, WIDTH};

/// Panel rows covered by one band.
/// 758 / 32 = 24 bands, the last one partly outside the panel.
pub const BAND_ROWS: usize = 32;

/// Packed bytes in one band
pub const BAND_BYTES: usize = PACKED_ROW_BYTES * BAND_ROWS; // 4096

/// A [`BAND_ROWS`] high horizontal slice of the panel.
///
/// Reports the size of the whole panel so scenes are laid out in panel
/// coordinates; pixels outside the band are dropped. `BinaryColor::On` is
/// black.
pub struct Band {
    buf: Vec<u8>,
    top: usize,
}

impl Band {
    fn new() -> Self {
        Band {
            buf: vec![0; BAND_BYTES],
            top: 0,
        }
    }

    /// First panel row in this band
    pub fn top(&self) -> usize {
        self.top
    }

    /// Whether panel row `y` falls in this band
    pub fn contains(&self, y: usize) -> bool {
        (self.top..self.top + BAND_ROWS).contains(&y)
    }

    fn begin(&mut self, top: usize) {
        self.top = top;
        self.buf.fill(0);
    }

    fn packed_row(&self, y: usize) -> &[u8] {
        let start = (y - self.top) * PACKED_ROW_BYTES;
        &self.buf[start..start + PACKED_ROW_BYTES]
    }

    // Silently clips anything outside the band.
    #[inline]
    fn set_pixel(&mut self, x: i32, y: i32, color: BinaryColor) {
        if x < 0 || y < 0 {
            return;
        }
        let (x, y) = (x as usize, y as usize);
        if x >= WIDTH || y >= HEIGHT || !self.contains(y) {
            return;
        }
        let index = (y - self.top) * PACKED_ROW_BYTES + x / 8;
        let mask = 0x80 >> (x % 8);
        match color {
            BinaryColor::On => self.buf[index] |= mask,
            BinaryColor::Off => self.buf[index] &= !mask,
        }
    }
}

impl DrawTarget for Band {
    type Color = BinaryColor;
    type Error = core::convert::Infallible;

    fn draw_iter<I>(&mut self, pixels: I) -> Result<(), Self::Error>
    where
        I: IntoIterator<Item = Pixel<Self::Color>>,
    {
        for Pixel(point, color) in pixels {
            self.set_pixel(point.x, point.y, color);
        }
        Ok(())
    }
}

impl OriginDimensions for Band {
    fn size(&self) -> Size {
        Size::new(WIDTH as u32, HEIGHT as u32)
    }
}

/// Turns a scene closure into a [`ScanlineSource`].
///
/// ```ignore
/// let mut banner = BandRenderer::new(|band: &mut Band| {
///     Text::new("hello", Point::new(40, 60), style).draw(band)?;
///     Ok::<(), Infallible>(())
/// });
/// panel.draw(&mut banner, false)?;
/// ```
pub struct BandRenderer<F> {
    band: Band,
    scene: F,
    rendered: bool,
}

impl<F, E> BandRenderer<F>
where
    F: FnMut(&mut Band) -> Result<(), E>,
{
    /// Wrap `scene`. Nothing is drawn until the first row is read.
    pub fn new(scene: F) -> Self {
        BandRenderer {
            band: Band::new(),
            scene,
            rendered: false,
        }
    }
}

impl<F, E> ScanlineSource for BandRenderer<F>
where
    F: FnMut(&mut Band) -> Result<(), E>,
    E: core::fmt::Debug,
{
    type Error = E;

    fn read_row(&mut self, y: usize, row: &mut [u8; WIDTH]) -> Result<(), Self::Error> {
        if !self.rendered || !self.band.contains(y) {
            self.band.begin(y - y % BAND_ROWS);
            self.rendered = false;
            log::trace!("Rendering band at row {}", self.band.top());
            (self.scene)(&mut self.band)?;
            self.rendered = true;
        }
        unpack_row(self.band.packed_row(y), row);
        Ok(())
    }
}
