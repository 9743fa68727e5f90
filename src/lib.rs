//! Driver for the ED060XC3 6" e-paper panel on a parallel-bus board.
//!
//! The platform independent part lives in [`panel`] and only needs
//! `embedded-hal` pins, an I2C bus and a delay. The ESP32 pin implementations
//! are in `esp32` and are only built for ESP-IDF targets.

#![deny(missing_docs)]
#![deny(unsafe_op_in_unsafe_fn)]

pub mod panel;

#[cfg(target_os = "espidf")]
pub mod esp32;

pub use crate::panel::band::{Band, BandRenderer, BAND_ROWS};
pub use crate::panel::driver::{FrameState, PanelController, PanelPins};
pub use crate::panel::error::{DrawError, LifecycleState, Operation, PanelError, Signal};
pub use crate::panel::pins::PinAssignment;
pub use crate::panel::port::{Direction, DirectionalPin, WideGpioPort};
pub use crate::panel::power::{PowerSequencer, PowerState};
pub use crate::panel::source::{BlankSource, PackedBitmap, ScanlineSource};
pub use crate::panel::{HEIGHT, WIDTH};
