//! GPIO capabilities the panel needs beyond plain `OutputPin`.
//!
//! Every line is released to high impedance while the panel is unpowered, so
//! the driver must be able to flip pin direction at runtime. The data bus must
//! also change all eight lines in one write; a platform implements that with
//! whatever set/clear register its GPIO block offers.

use embedded_hal::digital::{ErrorType, OutputPin};

/// Pin direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// High impedance, the driver is released
    Input,
    /// Push-pull output
    Output,
}

/// An output pin that can also be released to an input.
pub trait DirectionalPin: OutputPin {
    /// Switch the pin direction. The output latch keeps its level, so callers
    /// set the level first and then enable the driver.
    fn set_direction(&mut self, direction: Direction) -> Result<(), Self::Error>;
}

/// Eight contiguous GPIO lines written as one byte.
pub trait WideGpioPort: ErrorType {
    /// Put `value` on the lines, bit 0 on the base pin. All eight lines change
    /// together.
    fn set_byte(&mut self, value: u8) -> Result<(), Self::Error>;

    /// Switch all eight lines to `direction`.
    fn set_direction(&mut self, direction: Direction) -> Result<(), Self::Error>;
}

impl<T: DirectionalPin + ?Sized> DirectionalPin for &mut T {
    #[inline]
    fn set_direction(&mut self, direction: Direction) -> Result<(), Self::Error> {
        T::set_direction(self, direction)
    }
}

impl<T: WideGpioPort + ?Sized> WideGpioPort for &mut T {
    #[inline]
    fn set_byte(&mut self, value: u8) -> Result<(), Self::Error> {
        T::set_byte(self, value)
    }

    #[inline]
    fn set_direction(&mut self, direction: Direction) -> Result<(), Self::Error> {
        T::set_direction(self, direction)
    }
}
