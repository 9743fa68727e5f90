//! ESP32 implementations of the panel pin capabilities.
//!
//! The panel lines are addressed by GPIO number, which is what
//! [`PinAssignment`] holds, so the pins here go through the IDF GPIO driver
//! and the GPIO register block directly instead of the typed `PinDriver`s.
//! The data bus in particular must change all eight lines in a single
//! register write.

use esp_idf_svc::sys::{
    esp, gpio_mode_t_GPIO_MODE_INPUT, gpio_mode_t_GPIO_MODE_OUTPUT, gpio_reset_pin,
    gpio_set_direction, gpio_set_level, EspError, ESP_ERR_INVALID_ARG,
};

use crate::panel::driver::PanelPins;
use crate::panel::pins::{PinAssignment, DATA_LINES, MAX_D0};
use crate::panel::port::{Direction, DirectionalPin, WideGpioPort};

const GPIO_OUT_REG: u32 = 0x3FF4_4004; // Output levels, GPIO0-31
const GPIO_ENABLE_W1TS: u32 = 0x3FF4_4024; // Enable output (write-1-to-set)
const GPIO_ENABLE_W1TC: u32 = 0x3FF4_4028; // Disable output (write-1-to-clear)

/// IDF error from a GPIO call.
#[derive(Debug)]
pub struct GpioError(EspError);

impl embedded_hal::digital::Error for GpioError {
    fn kind(&self) -> embedded_hal::digital::ErrorKind {
        embedded_hal::digital::ErrorKind::Other
    }
}

impl From<EspError> for GpioError {
    fn from(e: EspError) -> Self {
        GpioError(e)
    }
}

/// A single panel line addressed by GPIO number.
pub struct RawPin {
    gpio: i32,
}

impl RawPin {
    /// Reset `gpio` to a plain GPIO input.
    ///
    /// # Safety
    /// No other driver may use the pin while this one exists.
    pub unsafe fn new(gpio: u8) -> Result<Self, GpioError> {
        let gpio = i32::from(gpio);
        esp!(unsafe { gpio_reset_pin(gpio) })?;
        Ok(RawPin { gpio })
    }

    fn level(&mut self, high: bool) -> Result<(), GpioError> {
        esp!(unsafe { gpio_set_level(self.gpio, u32::from(high)) })?;
        Ok(())
    }
}

impl embedded_hal::digital::ErrorType for RawPin {
    type Error = GpioError;
}

impl embedded_hal::digital::OutputPin for RawPin {
    #[inline]
    fn set_low(&mut self) -> Result<(), Self::Error> {
        self.level(false)
    }

    #[inline]
    fn set_high(&mut self) -> Result<(), Self::Error> {
        self.level(true)
    }
}

impl DirectionalPin for RawPin {
    fn set_direction(&mut self, direction: Direction) -> Result<(), Self::Error> {
        let mode = match direction {
            Direction::Input => gpio_mode_t_GPIO_MODE_INPUT,
            Direction::Output => gpio_mode_t_GPIO_MODE_OUTPUT,
        };
        esp!(unsafe { gpio_set_direction(self.gpio, mode) })?;
        Ok(())
    }
}

/// Eight consecutive GPIOs in bank 0 written through `GPIO_OUT_REG`.
pub struct RawBytePort {
    shift: u32,
    mask: u32,
}

impl RawBytePort {
    /// Claim GPIO `d0` to `d0 + 7` as a plain GPIO input bus.
    ///
    /// Fails with `ESP_ERR_INVALID_ARG` unless the bus lies within GPIO0-31,
    /// the only lines `GPIO_OUT_REG` covers.
    ///
    /// # Safety
    /// No other driver may use these pins while this one exists.
    pub unsafe fn new(d0: u8) -> Result<Self, GpioError> {
        if d0 > MAX_D0 {
            return Err(EspError::from_infallible::<ESP_ERR_INVALID_ARG>().into());
        }
        for gpio in d0..d0 + DATA_LINES {
            esp!(unsafe { gpio_reset_pin(i32::from(gpio)) })?;
        }
        Ok(RawBytePort {
            shift: u32::from(d0),
            mask: 0xFF << d0,
        })
    }
}

impl embedded_hal::digital::ErrorType for RawBytePort {
    type Error = core::convert::Infallible;
}

impl WideGpioPort for RawBytePort {
    #[inline]
    fn set_byte(&mut self, value: u8) -> Result<(), Self::Error> {
        // One store so all eight lines change on the same cycle
        unsafe {
            let out = GPIO_OUT_REG as *mut u32;
            let levels = (out.read_volatile() & !self.mask) | (u32::from(value) << self.shift);
            out.write_volatile(levels);
        }
        Ok(())
    }

    fn set_direction(&mut self, direction: Direction) -> Result<(), Self::Error> {
        let reg = match direction {
            Direction::Input => GPIO_ENABLE_W1TC,
            Direction::Output => GPIO_ENABLE_W1TS,
        };
        unsafe {
            (reg as *mut u32).write_volatile(self.mask);
        }
        Ok(())
    }
}

/// Claim every panel line named in `pins`.
///
/// # Safety
/// Same as [`RawPin::new`] and [`RawBytePort::new`] for every GPIO in the
/// assignment. Call [`PinAssignment::validate`] first.
pub unsafe fn panel_pins(
    pins: &PinAssignment,
) -> Result<PanelPins<RawPin, RawBytePort>, GpioError> {
    unsafe {
        Ok(PanelPins {
            spv: RawPin::new(pins.spv)?,
            ckv: RawPin::new(pins.ckv)?,
            mode: RawPin::new(pins.mode)?,
            stl: RawPin::new(pins.stl)?,
            oe: RawPin::new(pins.oe)?,
            le: RawPin::new(pins.le)?,
            cl: RawPin::new(pins.cl)?,
            data: RawBytePort::new(pins.d0)?,
            wakeup: RawPin::new(pins.wakeup)?,
        })
    }
}
