//! Pixel to waveform encoding.
//!
//! The panel drives each pixel with a 2-bit phase, four pixels per bus byte,
//! first pixel in the two most significant bits. `01` pushes the pixel toward
//! black, `00` leaves it alone.

use crate::panel::flag::Flag;
use crate::panel::PIXELS_PER_BYTE;

/// Phase pairs for every 4-pixel group, indexed by the pixel bits (first pixel
/// is the most significant bit). A set pixel maps to `01`, a clear one to `10`.
const PALETTE: [u8; 16] = [
    0b1010_1010,
    0b1010_1001,
    0b1010_0110,
    0b1010_0101,
    0b1001_1010,
    0b1001_1001,
    0b1001_0110,
    0b1001_0101,
    0b0110_1010,
    0b0110_1001,
    0b0110_0110,
    0b0110_0101,
    0b0101_1010,
    0b0101_1001,
    0b0101_0110,
    0b0101_0101,
];

/// Packs four pixels into the 4-bit palette index. Only the low bit of each
/// pixel byte counts.
#[inline]
pub fn group_index(group: &[u8; PIXELS_PER_BYTE]) -> usize {
    let [a, b, c, d] = *group;
    usize::from(((a & 1) << 3) | ((b & 1) << 2) | ((c & 1) << 1) | (d & 1))
}

/// Waveform byte for one group of four pixels.
///
/// With `erase` set every pixel gets the clearing phase and the content is
/// ignored.
#[inline]
pub fn encode(group: &[u8; PIXELS_PER_BYTE], erase: bool) -> u8 {
    if erase {
        Flag::WAVEFORM_ERASE
    } else {
        PALETTE[group_index(group)] & Flag::WAVEFORM_MASK_DRAW
    }
}
