//! Pin assignment for the ED060XC3 panel and its power IC
//!
//! GPIO | Function | Notes
//! -----+----------+-----------------------------------------
//!  32  | SPV      | Start pulse, frame sync
//!  33  | CKV      | Vertical clock, advances the gate driver
//!  25  | MODE     | Gate driver output mode
//!  26  | STL      | Start line, source driver capture
//!  27  | OE       | Source driver output enable
//!   2  | LE       | Latch enable
//!   4  | CL       | Bus clock
//! 12-19| D0-D7    | Data bus, must be contiguous
//!  21  | SDA      | Power IC I2C data
//!  22  | SCL      | Power IC I2C clock
//!   5  | WAKEUP   | Power IC wakeup

use crate::panel::error::PanelError;

/// Number of lines on the data bus
pub const DATA_LINES: u8 = 8;

/// Highest data bus base that keeps D7 at or below GPIO31
pub const MAX_D0: u8 = 32 - DATA_LINES;

/// GPIO numbers for every panel role. Set once and never changed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PinAssignment {
    /// Start pulse
    pub spv: u8,
    /// Vertical clock
    pub ckv: u8,
    /// Mode select
    pub mode: u8,
    /// Start line
    pub stl: u8,
    /// Output enable
    pub oe: u8,
    /// Latch enable
    pub le: u8,
    /// Bus clock
    pub cl: u8,
    /// First line of the data bus, D0..D7 are `d0..d0 + 8`
    pub d0: u8,
    /// Power IC I2C data
    pub sda: u8,
    /// Power IC I2C clock
    pub scl: u8,
    /// Power IC wakeup
    pub wakeup: u8,
}

impl PinAssignment {
    /// Wiring used on this board
    pub const BOARD: PinAssignment = PinAssignment {
        spv: 32,
        ckv: 33,
        mode: 25,
        stl: 26,
        oe: 27,
        le: 2,
        cl: 4,
        d0: 12,
        sda: 21,
        scl: 22,
        wakeup: 5,
    };

    /// Single-line roles, in the order the driver configures them.
    pub fn single_lines(&self) -> [u8; 10] {
        [
            self.spv,
            self.ckv,
            self.mode,
            self.stl,
            self.oe,
            self.le,
            self.cl,
            self.sda,
            self.scl,
            self.wakeup,
        ]
    }

    /// GPIO numbers of the data bus.
    pub fn data_lines(&self) -> impl Iterator<Item = u8> {
        let d0 = self.d0;
        (0..DATA_LINES).map(move |bit| d0.saturating_add(bit))
    }

    /// Check that no two roles share a line and the data bus sits inside
    /// GPIO0-31, so a single write to the first output register moves all
    /// eight lines.
    pub fn validate(&self) -> Result<(), PanelError> {
        if self.d0 > MAX_D0 {
            return Err(PanelError::InvalidPinAssignment(
                "data bus must lie within GPIO0-31",
            ));
        }

        let singles = self.single_lines();
        for (i, pin) in singles.iter().enumerate() {
            if singles[i + 1..].contains(pin) {
                return Err(PanelError::InvalidPinAssignment(
                    "two roles share one GPIO",
                ));
            }
            if self.data_lines().any(|line| line == *pin) {
                return Err(PanelError::InvalidPinAssignment(
                    "a control line overlaps the data bus",
                ));
            }
        }
        Ok(())
    }
}

impl Default for PinAssignment {
    fn default() -> Self {
        Self::BOARD
    }
}
