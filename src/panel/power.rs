//! Rail sequencing for the panel power IC.
//!
//! The power IC sits on I2C at address 0x68 and is woken by a GPIO.
//! Rails come up VDD first, then the source/gate rails, then VCOM, and go down
//! in the reverse order. Every settle time below is a minimum; the panel can be
//! damaged or show artifacts if a step follows too early.

use embedded_hal::delay::DelayNs;
use embedded_hal::i2c::{Error as _, I2c};

use crate::panel::cmd::Cmd;
use crate::panel::error::{LifecycleState, Operation, PanelError, Signal};
use crate::panel::flag::Flag;
use crate::panel::port::{Direction, DirectionalPin};

/// Time the power IC needs after wakeup before it takes register writes
pub const WAKEUP_SETTLE_MS: u32 = 5;

/// Rail sequencer state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PowerState {
    /// All rails off, wakeup released
    Off,
    /// Power-up sequence running
    PoweringUp,
    /// All rails and VCOM up
    On,
    /// Power-down sequence running
    PoweringDown,
}

/// One write to the rail control register and the settle time after it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RailStep {
    /// Value for the rail control register
    pub value: u8,
    /// Minimum wait before the next step
    pub settle_ms: u32,
}

/// Power-up order
pub const POWER_UP: [RailStep; 3] = [
    RailStep {
        value: Flag::ENABLE_VDD,
        settle_ms: 1,
    },
    RailStep {
        value: Flag::ENABLE_AUX_RAILS,
        settle_ms: 25,
    },
    RailStep {
        value: Flag::ENABLE_VCOM,
        settle_ms: 1,
    },
];

/// Power-down order
pub const POWER_DOWN: [RailStep; 3] = [
    RailStep {
        value: Flag::DISABLE_VCOM,
        settle_ms: 1,
    },
    RailStep {
        value: Flag::DISABLE_AUX_RAILS,
        settle_ms: 25,
    },
    RailStep {
        value: Flag::DISABLE_ALL,
        settle_ms: 0,
    },
];

/// Drives the power IC through its rail sequences.
pub struct PowerSequencer<I2C, P> {
    i2c: I2C,
    wakeup: P,
    state: PowerState,
}

impl<I2C, P> PowerSequencer<I2C, P> {
    /// Wrap the power IC bus and wakeup line. Nothing is written.
    pub fn new(i2c: I2C, wakeup: P) -> Self {
        PowerSequencer {
            i2c,
            wakeup,
            state: PowerState::Off,
        }
    }

    /// Current rail state
    pub fn state(&self) -> PowerState {
        self.state
    }

    /// Give the bus and the wakeup pin back.
    pub fn release(self) -> (I2C, P) {
        (self.i2c, self.wakeup)
    }

    // PoweringUp and PoweringDown only exist while enable() or disable() is
    // running, a caller never sees them. They are reported as powered since
    // rails may already be up.
    fn violation(&self, operation: Operation) -> PanelError {
        let state = match self.state {
            PowerState::Off => LifecycleState::Unpowered,
            PowerState::On | PowerState::PoweringUp | PowerState::PoweringDown => {
                LifecycleState::PoweredIdle
            }
        };
        PanelError::ProtocolViolation { operation, state }
    }
}

impl<I2C, P> PowerSequencer<I2C, P>
where
    I2C: I2c,
    P: DirectionalPin,
{
    /// Release the wakeup line to a high-impedance input, driven low first.
    pub(crate) fn release_wakeup(&mut self) -> Result<(), PanelError> {
        self.wakeup
            .set_low()
            .map_err(|_| PanelError::Pin(Signal::Wakeup))?;
        self.wakeup
            .set_direction(Direction::Input)
            .map_err(|_| PanelError::Pin(Signal::Wakeup))
    }

    /// Wake the power IC and bring every rail up.
    ///
    /// If the power IC rejects a write, no further register is written, the
    /// wakeup line is dropped (which turns the power IC off) and the failure is
    /// returned. The write is never retried, a repeat could assert a rail twice.
    pub fn enable(&mut self, delay: &mut impl DelayNs) -> Result<(), PanelError> {
        if self.state != PowerState::Off {
            return Err(self.violation(Operation::Enable));
        }

        self.state = PowerState::PoweringUp;
        log::debug!("Waking power IC");
        let woken = self
            .wakeup
            .set_high()
            .and_then(|_| self.wakeup.set_direction(Direction::Output));
        if woken.is_err() {
            self.abort();
            return Err(PanelError::Pin(Signal::Wakeup));
        }
        delay.delay_ms(WAKEUP_SETTLE_MS);

        self.run(&POWER_UP, delay)?;

        self.state = PowerState::On;
        log::info!("Panel rails up");
        Ok(())
    }

    /// Bring every rail down in reverse order and release the wakeup line.
    ///
    /// A rejected write stops the sequence; the wakeup line is still dropped.
    pub fn disable(&mut self, delay: &mut impl DelayNs) -> Result<(), PanelError> {
        if self.state != PowerState::On {
            return Err(self.violation(Operation::Disable));
        }

        self.state = PowerState::PoweringDown;
        self.run(&POWER_DOWN, delay)?;

        self.release_wakeup()?;
        self.state = PowerState::Off;
        log::info!("Panel rails down");
        Ok(())
    }

    fn run(&mut self, steps: &[RailStep], delay: &mut impl DelayNs) -> Result<(), PanelError> {
        for step in steps {
            log::debug!("Power control <- {:#04x}", step.value);
            if let Err(e) = self
                .i2c
                .write(Cmd::I2C_ADDRESS, &[Cmd::POWER_CONTROL, step.value])
            {
                log::error!(
                    "Power IC rejected {:#04x}: {:?}, dropping wakeup",
                    step.value,
                    e.kind()
                );
                self.abort();
                return Err(PanelError::BusTransactionFailure {
                    value: step.value,
                    kind: e.kind(),
                });
            }
            if step.settle_ms > 0 {
                delay.delay_ms(step.settle_ms);
            }
        }
        Ok(())
    }

    fn abort(&mut self) {
        if self.release_wakeup().is_err() {
            log::error!("Could not release the power IC wakeup line");
        }
        self.state = PowerState::Off;
    }
}
