//! Driver errors.

use core::fmt;

use embedded_hal::i2c::ErrorKind;

/// Lines driven by the panel driver, used to name the pin that failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Signal {
    /// Start pulse (SPV)
    Spv,
    /// Vertical clock (CKV)
    Ckv,
    /// Mode select
    Mode,
    /// Start line (STL)
    Stl,
    /// Output enable (OE)
    Oe,
    /// Latch enable (LE)
    Le,
    /// Bus clock (CL)
    Cl,
    /// The 8-bit data bus
    Data,
    /// Power IC wakeup
    Wakeup,
}

impl fmt::Display for Signal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Signal::Spv => "SPV",
            Signal::Ckv => "CKV",
            Signal::Mode => "MODE",
            Signal::Stl => "STL",
            Signal::Oe => "OE",
            Signal::Le => "LE",
            Signal::Cl => "CL",
            Signal::Data => "D0-D7",
            Signal::Wakeup => "WAKEUP",
        };
        f.write_str(name)
    }
}

/// Public panel operations, named in protocol violations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    /// `enable()`
    Enable,
    /// `begin()`
    Begin,
    /// `transfer()`
    Transfer,
    /// `end()`
    End,
    /// `abort_frame()`
    AbortFrame,
    /// `disable()`
    Disable,
}

/// Lifecycle of the panel, see [`PanelController`](super::driver::PanelController).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleState {
    /// Rails off, every line released
    Unpowered,
    /// Rails off after a failed power IC write
    Faulted,
    /// Rails on, no frame in progress
    PoweredIdle,
    /// Between `begin()` and `end()`
    FrameActive,
}

/// Everything the panel driver can report.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PanelError {
    /// An operation was called in a state that does not allow it
    #[error("{operation:?} is not allowed while {state:?}")]
    ProtocolViolation {
        /// What was attempted
        operation: Operation,
        /// Where the controller was
        state: LifecycleState,
    },
    /// The power IC did not accept a register write
    #[error("power IC write of {value:#04x} failed: {kind:?}")]
    BusTransactionFailure {
        /// Value that was being written to the rail control register
        value: u8,
        /// What the I2C bus reported
        kind: ErrorKind,
    },
    /// A frame did not get exactly one transfer per panel row
    #[error("frame needs {expected} rows, got {actual}")]
    RowCountMismatch {
        /// Rows per frame
        expected: usize,
        /// Rows transferred, or about to be
        actual: usize,
    },
    /// A scanline was not exactly one panel row wide
    #[error("scanline holds {len} pixels, panel rows are {expected}")]
    InvalidScanline {
        /// Pixels supplied
        len: usize,
        /// Pixels required
        expected: usize,
    },
    /// Two roles share a GPIO, or the data bus does not fit in one bank
    #[error("invalid pin assignment: {0}")]
    InvalidPinAssignment(&'static str),
    /// Writing a GPIO failed
    #[error("GPIO write to {0} failed")]
    Pin(Signal),
}

/// Error while drawing from a [`ScanlineSource`](super::source::ScanlineSource).
#[derive(Debug, PartialEq, Eq, thiserror::Error)]
pub enum DrawError<E> {
    /// The panel refused or failed
    #[error(transparent)]
    Panel(#[from] PanelError),
    /// The source could not produce a row
    #[error("scanline source failed at row {row}: {error:?}")]
    Source {
        /// Row that was being produced
        row: usize,
        /// Error from the source
        error: E,
    },
}
