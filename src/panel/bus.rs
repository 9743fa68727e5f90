//! Parallel bus into the panel source driver.
//!
//! One row goes in as [`BYTES_PER_ROW`](crate::panel::BYTES_PER_ROW) bytes on D0-D7, each committed on a
//! rising edge of CL while STL is low. A trailing CL edge and an LE pulse move
//! the shift register into the output latch, and a CKV pulse steps the gate
//! driver to the next row. Nothing comes back from the panel, so ordering and
//! pulse widths are all there is.
use crate::panel::encoder;
use crate::panel::error::{PanelError, Signal};
use crate::panel::port::{DirectionalPin, WideGpioPort};
use crate::panel::{PIXELS_PER_BYTE, WIDTH};
use embedded_hal::delay::DelayNs;

/// Minimum low time of the CKV pulse that advances one row
pub const CKV_PULSE_US: u32 = 1;

/// Row shift lines of the panel
pub struct ParallelBus<P, D> {
    /// Start line, low while a row is being shifted
    pub(crate) stl: P,
    /// Latch enable
    pub(crate) le: P,
    /// Bus clock, data is taken on the rising edge
    pub(crate) cl: P,
    /// Vertical clock, shared with the frame start pulse
    pub(crate) ckv: P,
    /// D0-D7
    pub(crate) data: D,
}

impl<P, D> ParallelBus<P, D> {
    /// Wrap the row shift lines. No pin is touched.
    pub fn new(stl: P, le: P, cl: P, ckv: P, data: D) -> Self {
        ParallelBus {
            stl,
            le,
            cl,
            ckv,
            data,
        }
    }

    /// Give the pins back.
    pub fn release(self) -> (P, P, P, P, D) {
        (self.stl, self.le, self.cl, self.ckv, self.data)
    }
}

impl<P, D> ParallelBus<P, D>
where
    P: DirectionalPin,
    D: WideGpioPort,
{
    /// Shift one row into the panel and advance the gate driver.
    pub fn shift_row(
        &mut self,
        row: &[u8; WIDTH],
        erase: bool,
        delay: &mut impl DelayNs,
    ) -> Result<(), PanelError> {
        self.stl.set_low().map_err(|_| PanelError::Pin(Signal::Stl))?;

        for chunk in row.chunks_exact(PIXELS_PER_BYTE) {
            let group = [chunk[0], chunk[1], chunk[2], chunk[3]];
            self.data
                .set_byte(encoder::encode(&group, erase))
                .map_err(|_| PanelError::Pin(Signal::Data))?;
            self.pulse_clock()?;
        }

        self.stl.set_high().map_err(|_| PanelError::Pin(Signal::Stl))?;
        // Flush edge, the source driver needs one more clock after STL rises
        self.pulse_clock()?;

        self.le.set_high().map_err(|_| PanelError::Pin(Signal::Le))?;
        self.le.set_low().map_err(|_| PanelError::Pin(Signal::Le))?;

        self.ckv.set_low().map_err(|_| PanelError::Pin(Signal::Ckv))?;
        delay.delay_us(CKV_PULSE_US);
        self.ckv.set_high().map_err(|_| PanelError::Pin(Signal::Ckv))?;

        Ok(())
    }

    fn pulse_clock(&mut self) -> Result<(), PanelError> {
        self.cl.set_high().map_err(|_| PanelError::Pin(Signal::Cl))?;
        self.cl.set_low().map_err(|_| PanelError::Pin(Signal::Cl))
    }
}
