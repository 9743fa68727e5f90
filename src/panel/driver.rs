//! ED060XC3 Panel Driver Implementation
//!
//! This module contains the controller that owns every panel line and walks
//! the panel through its lifecycle:
//!
//! ```text
//! Unpowered --enable()--> PoweredIdle --begin()--> FrameActive
//!     ^                      |   ^                     |
//!     +-------disable()------+   +---------end()-------+
//!                                        (HEIGHT x transfer())
//! ```
//!
//! ## Critical Implementation Details
//!
//! ### Pin release
//!
//! While the rails are off every line is released to high impedance with its
//! output latch low. Driving the panel inputs with VDD down back-powers the
//! panel through its protection diodes.
//!
//! ### Output enable order
//!
//! After power-up the lines are switched to outputs in a fixed order: SPV,
//! CKV, MODE, STL, OE, LE, CL, then the data bus. SPV, CKV and STL idle high
//! and get their level before the driver turns on.
//!
//! ### Row count
//!
//! The gate driver has no row address, it only counts CKV pulses. A frame with
//! the wrong number of rows leaves the gate driver out of step with the image,
//! so the controller counts rows and refuses frames that do not add up to
//! [`HEIGHT`].

use embedded_hal::delay::DelayNs;
use embedded_hal::i2c::I2c;

use crate::panel::bus::ParallelBus;
use crate::panel::error::{DrawError, LifecycleState, Operation, PanelError, Signal};
use crate::panel::pins::PinAssignment;
use crate::panel::port::{Direction, DirectionalPin, WideGpioPort};
use crate::panel::power::{PowerSequencer, PowerState};
use crate::panel::source::{BlankSource, ScanlineSource};
use crate::panel::{HEIGHT, WIDTH};

/// Minimum low time of SPV and CKV in the frame start pulse
pub const FRAME_SYNC_US: u32 = 1;

/// Frame progress.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameState {
    /// No frame in progress
    Idle,
    /// Between `begin()` and `end()`, with the rows transferred so far
    Active {
        /// Rows shifted into the panel in this frame
        rows: usize,
    },
}

/// Every line the panel driver drives, in the order of its roles.
///
/// All single lines share one pin type, which is what a GPIO number based
/// platform layer produces.
pub struct PanelPins<P, D> {
    /// Start pulse
    pub spv: P,
    /// Vertical clock
    pub ckv: P,
    /// Mode select
    pub mode: P,
    /// Start line
    pub stl: P,
    /// Output enable
    pub oe: P,
    /// Latch enable
    pub le: P,
    /// Bus clock
    pub cl: P,
    /// D0-D7
    pub data: D,
    /// Power IC wakeup
    pub wakeup: P,
}

/// ED060XC3 panel controller
///
/// Owns every panel line, the power IC bus and a delay provider, and only
/// allows operations that are valid in the current [`LifecycleState`].
///
/// ## Type Parameters
///
/// - `P` - single GPIO lines (SPV, CKV, MODE, STL, OE, LE, CL, WAKEUP)
/// - `D` - the 8-bit data bus
/// - `I2C` - bus to the power IC
/// - `DELAY` - delay provider for settle times and pulse widths
pub struct PanelController<P, D, I2C, DELAY> {
    pins: PinAssignment,
    spv: P,
    mode: P,
    oe: P,
    bus: ParallelBus<P, D>,
    power: PowerSequencer<I2C, P>,
    delay: DELAY,
    faulted: bool,
    frame: FrameState,
}

impl<P, D, I2C, DELAY> PanelController<P, D, I2C, DELAY>
where
    P: DirectionalPin,
    D: WideGpioPort,
    I2C: I2c,
    DELAY: DelayNs,
{
    /// Take ownership of the panel lines and release them all.
    ///
    /// The assignment is checked first. Every line is then driven low and
    /// switched to an input, data bus first, wakeup last. No power is applied.
    pub fn new(
        pins: PinAssignment,
        lines: PanelPins<P, D>,
        i2c: I2C,
        delay: DELAY,
    ) -> Result<Self, PanelError> {
        pins.validate()?;

        let PanelPins {
            spv,
            ckv,
            mode,
            stl,
            oe,
            le,
            cl,
            data,
            wakeup,
        } = lines;

        let mut panel = PanelController {
            pins,
            spv,
            mode,
            oe,
            bus: ParallelBus::new(stl, le, cl, ckv, data),
            power: PowerSequencer::new(i2c, wakeup),
            delay,
            faulted: false,
            frame: FrameState::Idle,
        };
        panel.release_lines()?;
        panel.power.release_wakeup()?;
        log::info!("Panel lines released, D0 on GPIO{}", pins.d0);
        Ok(panel)
    }

    /// Pin assignment this controller was built with
    pub fn pins(&self) -> &PinAssignment {
        &self.pins
    }

    /// Where the panel is in its lifecycle
    pub fn state(&self) -> LifecycleState {
        match (self.power.state(), self.frame) {
            (_, FrameState::Active { .. }) => LifecycleState::FrameActive,
            (PowerState::On, FrameState::Idle) => LifecycleState::PoweredIdle,
            _ if self.faulted => LifecycleState::Faulted,
            _ => LifecycleState::Unpowered,
        }
    }

    /// Frame progress
    pub fn frame(&self) -> FrameState {
        self.frame
    }

    fn require(&self, operation: Operation, allowed: &[LifecycleState]) -> Result<(), PanelError> {
        let state = self.state();
        if allowed.contains(&state) {
            Ok(())
        } else {
            log::warn!("{:?} refused while {:?}", operation, state);
            Err(PanelError::ProtocolViolation { operation, state })
        }
    }

    /// Power the rails and take over the panel lines.
    ///
    /// Valid from `Unpowered` and `Faulted`. If the power IC rejects a write
    /// the lines stay released and the controller ends up `Faulted`.
    pub fn enable(&mut self) -> Result<(), PanelError> {
        self.require(
            Operation::Enable,
            &[LifecycleState::Unpowered, LifecycleState::Faulted],
        )?;

        if let Err(e) = self.power.enable(&mut self.delay) {
            self.faulted = true;
            return Err(e);
        }
        self.faulted = false;

        if let Err(e) = self.drive_lines() {
            log::error!("Could not take over panel lines: {}", e);
            self.fault_shutdown();
            return Err(e);
        }
        log::info!("Panel enabled");
        Ok(())
    }

    /// Start a frame: assert OE and MODE, then pulse SPV and CKV low together
    /// to reset the gate driver to the first row.
    pub fn begin(&mut self) -> Result<(), PanelError> {
        self.require(Operation::Begin, &[LifecycleState::PoweredIdle])?;

        self.oe.set_high().map_err(|_| PanelError::Pin(Signal::Oe))?;
        self.mode
            .set_high()
            .map_err(|_| PanelError::Pin(Signal::Mode))?;

        self.spv.set_low().map_err(|_| PanelError::Pin(Signal::Spv))?;
        self.bus
            .ckv
            .set_low()
            .map_err(|_| PanelError::Pin(Signal::Ckv))?;
        self.delay.delay_us(FRAME_SYNC_US);
        self.bus
            .ckv
            .set_high()
            .map_err(|_| PanelError::Pin(Signal::Ckv))?;
        self.spv.set_high().map_err(|_| PanelError::Pin(Signal::Spv))?;

        self.frame = FrameState::Active { rows: 0 };
        log::debug!("Frame started");
        Ok(())
    }

    /// Shift one scanline into the panel.
    ///
    /// `scanline` holds [`WIDTH`] pixels, one per byte, only the low bit
    /// counts (1 is black). With `erase` set the content is ignored and every
    /// pixel gets the clearing waveform. Exactly [`HEIGHT`] transfers make a
    /// frame; one more is refused.
    pub fn transfer(&mut self, scanline: &[u8], erase: bool) -> Result<(), PanelError> {
        self.require(Operation::Transfer, &[LifecycleState::FrameActive])?;

        let row: &[u8; WIDTH] =
            scanline
                .try_into()
                .map_err(|_| PanelError::InvalidScanline {
                    len: scanline.len(),
                    expected: WIDTH,
                })?;

        let rows = match self.frame {
            FrameState::Active { rows } => rows,
            FrameState::Idle => 0,
        };
        if rows >= HEIGHT {
            return Err(PanelError::RowCountMismatch {
                expected: HEIGHT,
                actual: rows + 1,
            });
        }

        self.bus.shift_row(row, erase, &mut self.delay)?;
        self.frame = FrameState::Active { rows: rows + 1 };
        Ok(())
    }

    /// Finish the frame: release MODE and OE.
    ///
    /// Refused with [`PanelError::RowCountMismatch`] unless exactly [`HEIGHT`]
    /// rows were transferred; the frame then stays active so the caller can
    /// push the missing rows or call [`Self::abort_frame`].
    pub fn end(&mut self) -> Result<(), PanelError> {
        self.require(Operation::End, &[LifecycleState::FrameActive])?;

        if let FrameState::Active { rows } = self.frame {
            if rows != HEIGHT {
                log::warn!("Frame ended after {} of {} rows", rows, HEIGHT);
                return Err(PanelError::RowCountMismatch {
                    expected: HEIGHT,
                    actual: rows,
                });
            }
        }

        self.stop_frame()?;
        log::debug!("Frame complete");
        Ok(())
    }

    /// Drop the current frame regardless of how many rows went in.
    pub fn abort_frame(&mut self) -> Result<(), PanelError> {
        self.require(Operation::AbortFrame, &[LifecycleState::FrameActive])?;
        if let FrameState::Active { rows } = self.frame {
            log::warn!("Aborting frame after {} rows", rows);
        }
        self.stop_frame()
    }

    fn stop_frame(&mut self) -> Result<(), PanelError> {
        self.frame = FrameState::Idle;
        self.mode
            .set_low()
            .map_err(|_| PanelError::Pin(Signal::Mode))?;
        self.oe.set_low().map_err(|_| PanelError::Pin(Signal::Oe))
    }

    /// Release the panel lines and power the rails down.
    ///
    /// On an unpowered panel this does nothing and touches no hardware. During
    /// a frame it is refused, end or abort the frame first.
    ///
    /// SDA and SCL belong to the I2C driver, not to the controller, and stay
    /// as that driver left them. Take the bus back with [`Self::release`] and
    /// shut it down to release those two lines as well.
    pub fn disable(&mut self) -> Result<(), PanelError> {
        match self.state() {
            LifecycleState::Unpowered | LifecycleState::Faulted => {
                log::debug!("Panel already unpowered");
                return Ok(());
            }
            LifecycleState::FrameActive => {
                return Err(PanelError::ProtocolViolation {
                    operation: Operation::Disable,
                    state: LifecycleState::FrameActive,
                });
            }
            LifecycleState::PoweredIdle => {}
        }

        if let Err(e) = self.release_lines() {
            self.fault_shutdown();
            return Err(e);
        }
        if let Err(e) = self.power.disable(&mut self.delay) {
            self.faulted = true;
            return Err(e);
        }
        log::info!("Panel disabled");
        Ok(())
    }

    /// Wipe the panel with `passes` erase frames.
    pub fn clear(&mut self, passes: usize) -> Result<(), PanelError> {
        for pass in 0..passes {
            log::debug!("Clear pass {}/{}", pass + 1, passes);
            self.draw(&mut BlankSource, true).map_err(|e| match e {
                DrawError::Panel(e) => e,
                DrawError::Source { error, .. } => match error {},
            })?;
        }
        Ok(())
    }

    /// Draw one full frame pulled row by row from `source`.
    ///
    /// If the source or a panel line fails the frame is aborted and the error
    /// returned, so the panel is back in `PoweredIdle` and can be disabled.
    pub fn draw<S>(&mut self, source: &mut S, erase: bool) -> Result<(), DrawError<S::Error>>
    where
        S: ScanlineSource,
    {
        let mut row = [0u8; WIDTH];
        self.begin()?;
        for y in 0..HEIGHT {
            if let Err(error) = source.read_row(y, &mut row) {
                log::error!("Scanline source failed at row {}", y);
                self.abort_frame()?;
                return Err(DrawError::Source { row: y, error });
            }
            if let Err(e) = self.transfer(&row, erase) {
                log::error!("Transfer failed at row {}: {}", y, e);
                self.close_failed_frame();
                return Err(e.into());
            }
        }
        if let Err(e) = self.end() {
            self.close_failed_frame();
            return Err(e.into());
        }
        Ok(())
    }

    // Best effort, the caller gets the error that broke the frame
    fn close_failed_frame(&mut self) {
        if self.state() != LifecycleState::FrameActive {
            return;
        }
        if let Err(e) = self.abort_frame() {
            log::error!("Could not close the failed frame: {}", e);
        }
    }

    /// Give back every owned resource, including the I2C bus. Lines are left
    /// as they are.
    pub fn release(self) -> (PanelPins<P, D>, I2C, DELAY) {
        let (stl, le, cl, ckv, data) = self.bus.release();
        let (i2c, wakeup) = self.power.release();
        (
            PanelPins {
                spv: self.spv,
                ckv,
                mode: self.mode,
                stl,
                oe: self.oe,
                le,
                cl,
                data,
                wakeup,
            },
            i2c,
            self.delay,
        )
    }

    fn drive_lines(&mut self) -> Result<(), PanelError> {
        fn out<P: DirectionalPin>(
            pin: &mut P,
            signal: Signal,
            idle_high: bool,
        ) -> Result<(), PanelError> {
            if idle_high {
                pin.set_high().map_err(|_| PanelError::Pin(signal))?;
            }
            pin.set_direction(Direction::Output)
                .map_err(|_| PanelError::Pin(signal))
        }

        out(&mut self.spv, Signal::Spv, true)?;
        out(&mut self.bus.ckv, Signal::Ckv, true)?;
        out(&mut self.mode, Signal::Mode, false)?;
        out(&mut self.bus.stl, Signal::Stl, true)?;
        out(&mut self.oe, Signal::Oe, false)?;
        out(&mut self.bus.le, Signal::Le, false)?;
        out(&mut self.bus.cl, Signal::Cl, false)?;
        self.bus
            .data
            .set_direction(Direction::Output)
            .map_err(|_| PanelError::Pin(Signal::Data))
    }

    fn release_lines(&mut self) -> Result<(), PanelError> {
        fn release<P: DirectionalPin>(pin: &mut P, signal: Signal) -> Result<(), PanelError> {
            pin.set_low().map_err(|_| PanelError::Pin(signal))?;
            pin.set_direction(Direction::Input)
                .map_err(|_| PanelError::Pin(signal))
        }

        // Every line is attempted, a stuck one must not keep the rest driven
        let data = self
            .bus
            .data
            .set_byte(0x00)
            .and_then(|_| self.bus.data.set_direction(Direction::Input))
            .map_err(|_| PanelError::Pin(Signal::Data));
        data.and(release(&mut self.bus.cl, Signal::Cl))
            .and(release(&mut self.bus.le, Signal::Le))
            .and(release(&mut self.oe, Signal::Oe))
            .and(release(&mut self.bus.stl, Signal::Stl))
            .and(release(&mut self.mode, Signal::Mode))
            .and(release(&mut self.bus.ckv, Signal::Ckv))
            .and(release(&mut self.spv, Signal::Spv))
    }

    /// Best effort after a line failure with the rails up: release what can
    /// be released and power down.
    fn fault_shutdown(&mut self) {
        if self.release_lines().is_err() {
            log::error!("Could not release every panel line");
        }
        if let Err(e) = self.power.disable(&mut self.delay) {
            log::error!("Power down after fault failed: {}", e);
        }
        self.faulted = true;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::panel::mock::{panel_pins, Event, Log, MockDelay, MockI2c, MockPin};
    use embedded_hal::i2c::{ErrorKind, NoAcknowledgeSource};
    use crate::panel::BYTES_PER_ROW;

    type Panel = PanelController<
        MockPin,
        crate::panel::mock::MockPort,
        MockI2c,
        MockDelay,
    >;

    fn panel(log: &Log) -> Panel {
        PanelController::new(
            PinAssignment::BOARD,
            panel_pins(log),
            MockI2c::new(log),
            MockDelay::new(log),
        )
        .unwrap()
    }

    fn released(signal: Signal) -> [Event; 2] {
        [
            Event::Level(signal, false),
            Event::Direction(signal, Direction::Input),
        ]
    }

    #[test]
    fn construction_releases_every_line_without_power() {
        let log = Log::default();
        let panel = panel(&log);

        let mut expected = vec![
            Event::Byte(0x00),
            Event::Direction(Signal::Data, Direction::Input),
        ];
        for signal in [
            Signal::Cl,
            Signal::Le,
            Signal::Oe,
            Signal::Stl,
            Signal::Mode,
            Signal::Ckv,
            Signal::Spv,
            Signal::Wakeup,
        ] {
            expected.extend(released(signal));
        }
        assert_eq!(log.events(), expected);
        assert_eq!(panel.state(), LifecycleState::Unpowered);
        assert!(log.rail_writes().is_empty());
    }

    #[test]
    fn invalid_assignment_is_rejected_before_touching_pins() {
        let log = Log::default();
        let pins = PinAssignment {
            cl: PinAssignment::BOARD.le,
            ..PinAssignment::BOARD
        };
        let result = PanelController::new(
            pins,
            panel_pins(&log),
            MockI2c::new(&log),
            MockDelay::new(&log),
        );
        assert!(matches!(result, Err(PanelError::InvalidPinAssignment(_))));
        assert!(log.events().is_empty());
    }

    #[test]
    fn enable_powers_up_before_driving_lines_in_order() {
        let log = Log::default();
        let mut panel = panel(&log);
        log.clear();

        panel.enable().unwrap();
        assert_eq!(panel.state(), LifecycleState::PoweredIdle);

        let events = log.events();
        let last_rail = events
            .iter()
            .rposition(|e| matches!(e, Event::I2cWrite(..)))
            .unwrap();
        let outputs: Vec<Signal> = events
            .iter()
            .filter_map(|e| match e {
                Event::Direction(s, Direction::Output) => Some(*s),
                _ => None,
            })
            .collect();
        assert_eq!(
            outputs,
            vec![
                Signal::Wakeup,
                Signal::Spv,
                Signal::Ckv,
                Signal::Mode,
                Signal::Stl,
                Signal::Oe,
                Signal::Le,
                Signal::Cl,
                Signal::Data,
            ]
        );
        let first_bus_output = events
            .iter()
            .position(|e| *e == Event::Direction(Signal::Spv, Direction::Output))
            .unwrap();
        assert!(last_rail < first_bus_output);
        assert_eq!(log.rail_writes(), vec![0x20, 0xA0, 0x3F]);
    }

    #[test]
    fn begin_emits_frame_sync_pulse() {
        let log = Log::default();
        let mut panel = panel(&log);
        panel.enable().unwrap();
        log.clear();

        panel.begin().unwrap();

        assert_eq!(
            log.events(),
            vec![
                Event::Level(Signal::Oe, true),
                Event::Level(Signal::Mode, true),
                Event::Level(Signal::Spv, false),
                Event::Level(Signal::Ckv, false),
                Event::DelayNs(1_000),
                Event::Level(Signal::Ckv, true),
                Event::Level(Signal::Spv, true),
            ]
        );
        assert_eq!(panel.state(), LifecycleState::FrameActive);
    }

    #[test]
    fn transfer_outside_frame_is_refused_without_pin_writes() {
        let log = Log::default();
        let mut panel = panel(&log);
        let row = [0u8; WIDTH];
        log.clear();

        assert_eq!(
            panel.transfer(&row, false),
            Err(PanelError::ProtocolViolation {
                operation: Operation::Transfer,
                state: LifecycleState::Unpowered,
            })
        );

        panel.enable().unwrap();
        log.clear();
        assert_eq!(
            panel.transfer(&row, false),
            Err(PanelError::ProtocolViolation {
                operation: Operation::Transfer,
                state: LifecycleState::PoweredIdle,
            })
        );
        assert!(log.events().is_empty());
    }

    #[test]
    fn short_scanline_is_refused() {
        let log = Log::default();
        let mut panel = panel(&log);
        panel.enable().unwrap();
        panel.begin().unwrap();
        log.clear();

        assert_eq!(
            panel.transfer(&[0u8; 100], false),
            Err(PanelError::InvalidScanline {
                len: 100,
                expected: WIDTH,
            })
        );
        assert!(log.events().is_empty());
    }

    #[test]
    fn lifecycle_rejects_out_of_order_calls() {
        let log = Log::default();
        let mut panel = panel(&log);

        assert!(panel.begin().is_err());
        assert!(panel.end().is_err());
        panel.enable().unwrap();
        assert!(matches!(
            panel.enable(),
            Err(PanelError::ProtocolViolation {
                operation: Operation::Enable,
                state: LifecycleState::PoweredIdle,
            })
        ));
        panel.begin().unwrap();
        assert!(panel.begin().is_err());
        assert!(matches!(
            panel.disable(),
            Err(PanelError::ProtocolViolation {
                operation: Operation::Disable,
                state: LifecycleState::FrameActive,
            })
        ));
    }

    #[test]
    fn end_with_missing_rows_keeps_frame_open() {
        let log = Log::default();
        let mut panel = panel(&log);
        panel.enable().unwrap();
        panel.begin().unwrap();
        panel.transfer(&[0u8; WIDTH], false).unwrap();

        assert_eq!(
            panel.end(),
            Err(PanelError::RowCountMismatch {
                expected: HEIGHT,
                actual: 1,
            })
        );
        assert_eq!(panel.frame(), FrameState::Active { rows: 1 });

        panel.abort_frame().unwrap();
        assert_eq!(panel.state(), LifecycleState::PoweredIdle);
    }

    #[test]
    fn row_past_height_is_refused() {
        let log = Log::default();
        let mut panel = panel(&log);
        let row = [0u8; WIDTH];
        panel.enable().unwrap();
        panel.begin().unwrap();
        for _ in 0..HEIGHT {
            panel.transfer(&row, false).unwrap();
        }
        let clocks = log.rising_edges(Signal::Cl);

        assert_eq!(
            panel.transfer(&row, false),
            Err(PanelError::RowCountMismatch {
                expected: HEIGHT,
                actual: HEIGHT + 1,
            })
        );
        assert_eq!(log.rising_edges(Signal::Cl), clocks);
        panel.end().unwrap();
    }

    #[test]
    fn full_cycle_counts_clock_pulses() {
        let log = Log::default();
        let mut panel = panel(&log);
        let row = [0u8; WIDTH];

        panel.enable().unwrap();
        panel.begin().unwrap();
        for _ in 0..HEIGHT {
            panel.transfer(&row, false).unwrap();
        }
        panel.end().unwrap();
        panel.disable().unwrap();

        assert_eq!(log.rising_edges(Signal::Cl), HEIGHT * (BYTES_PER_ROW + 1));
        assert_eq!(log.rising_edges(Signal::Cl), 194_806);
        assert_eq!(log.rising_edges(Signal::Le), HEIGHT);
        assert_eq!(panel.state(), LifecycleState::Unpowered);
        assert_eq!(
            log.rail_writes(),
            vec![0x20, 0xA0, 0x3F, 0x2F, 0x60, 0x00]
        );
    }

    #[test]
    fn disable_releases_lines_before_power_down() {
        let log = Log::default();
        let mut panel = panel(&log);
        panel.enable().unwrap();
        log.clear();

        panel.disable().unwrap();
        let events = log.events();

        let spv_released = events
            .iter()
            .position(|e| *e == Event::Direction(Signal::Spv, Direction::Input))
            .unwrap();
        let first_rail = events
            .iter()
            .position(|e| matches!(e, Event::I2cWrite(..)))
            .unwrap();
        assert!(spv_released < first_rail);
        assert_eq!(
            events.last(),
            Some(&Event::Direction(Signal::Wakeup, Direction::Input))
        );
    }

    #[test]
    fn disable_when_unpowered_touches_nothing() {
        let log = Log::default();
        let mut panel = panel(&log);
        panel.enable().unwrap();
        panel.disable().unwrap();
        log.clear();

        assert_eq!(panel.disable(), Ok(()));
        assert!(log.events().is_empty());
    }

    #[test]
    fn rejected_power_write_leaves_panel_faulted() {
        let log = Log::default();
        let mut panel = PanelController::new(
            PinAssignment::BOARD,
            panel_pins(&log),
            MockI2c::failing_at(&log, 1),
            MockDelay::new(&log),
        )
        .unwrap();
        log.clear();

        let result = panel.enable();

        assert!(matches!(
            result,
            Err(PanelError::BusTransactionFailure { value: 0xA0, .. })
        ));
        assert_eq!(panel.state(), LifecycleState::Faulted);
        assert_eq!(log.rail_writes(), vec![0x20]);
        let driven = log
            .events()
            .iter()
            .filter(|e| matches!(e, Event::Direction(s, Direction::Output) if *s != Signal::Wakeup))
            .count();
        assert_eq!(driven, 0);
        assert!(panel.begin().is_err());
        assert_eq!(panel.disable(), Ok(()));
    }

    #[test]
    fn clear_runs_erase_frames() {
        let log = Log::default();
        let mut panel = panel(&log);
        panel.enable().unwrap();
        log.clear();

        panel.clear(2).unwrap();

        assert_eq!(log.rising_edges(Signal::Le), 2 * HEIGHT);
        assert!(log
            .events()
            .iter()
            .filter_map(|e| match e {
                Event::Byte(b) => Some(*b),
                _ => None,
            })
            .all(|b| b == 0xFF));
        assert_eq!(panel.state(), LifecycleState::PoweredIdle);
    }

    #[test]
    fn failing_source_aborts_frame() {
        struct Broken;
        impl ScanlineSource for Broken {
            type Error = &'static str;
            fn read_row(&mut self, y: usize, _row: &mut [u8; WIDTH]) -> Result<(), Self::Error> {
                if y == 3 {
                    Err("truncated")
                } else {
                    Ok(())
                }
            }
        }

        let log = Log::default();
        let mut panel = panel(&log);
        panel.enable().unwrap();

        let result = panel.draw(&mut Broken, false);

        assert_eq!(
            result,
            Err(DrawError::Source {
                row: 3,
                error: "truncated",
            })
        );
        assert_eq!(panel.state(), LifecycleState::PoweredIdle);
        assert_eq!(log.rising_edges(Signal::Le), 3);
    }

    const FULL_POWER_CYCLE: [u8; 6] = [0x20, 0xA0, 0x3F, 0x2F, 0x60, 0x00];

    #[test]
    fn pin_failure_mid_frame_still_allows_power_down() {
        let log = Log::default();
        let mut lines = panel_pins(&log);
        // Two calls on release, one on enable, then two per row: row 10 fails
        lines.le = MockPin::failing_after(Signal::Le, &log, 3 + 2 * 10);
        let mut panel = PanelController::new(
            PinAssignment::BOARD,
            lines,
            MockI2c::new(&log),
            MockDelay::new(&log),
        )
        .unwrap();
        panel.enable().unwrap();

        assert_eq!(
            panel.draw(&mut BlankSource, false),
            Err(DrawError::Panel(PanelError::Pin(Signal::Le)))
        );
        assert_eq!(log.rising_edges(Signal::Le), 10);
        assert_eq!(panel.state(), LifecycleState::PoweredIdle);
        assert_eq!(
            log.events().last(),
            Some(&Event::Level(Signal::Oe, false))
        );

        // LE cannot be released, everything else is and the rails still drop
        assert_eq!(panel.disable(), Err(PanelError::Pin(Signal::Le)));
        assert_eq!(panel.state(), LifecycleState::Faulted);
        assert_eq!(log.rail_writes(), FULL_POWER_CYCLE);
        let events = log.events();
        for signal in [Signal::Cl, Signal::Oe, Signal::Stl, Signal::Spv] {
            assert!(events.contains(&Event::Direction(signal, Direction::Input)));
        }
        assert_eq!(
            events.last(),
            Some(&Event::Direction(Signal::Wakeup, Direction::Input))
        );
    }

    #[test]
    fn failed_erase_pass_leaves_no_frame_open() {
        let log = Log::default();
        let mut lines = panel_pins(&log);
        lines.cl = MockPin::failing_after(Signal::Cl, &log, 3 + 100);
        let mut panel = PanelController::new(
            PinAssignment::BOARD,
            lines,
            MockI2c::new(&log),
            MockDelay::new(&log),
        )
        .unwrap();
        panel.enable().unwrap();

        assert_eq!(panel.clear(2), Err(PanelError::Pin(Signal::Cl)));
        assert_eq!(panel.state(), LifecycleState::PoweredIdle);
    }

    #[test]
    fn rejected_power_down_write_still_drops_wakeup() {
        let log = Log::default();
        let mut panel = PanelController::new(
            PinAssignment::BOARD,
            panel_pins(&log),
            MockI2c::failing_at(&log, 4),
            MockDelay::new(&log),
        )
        .unwrap();
        panel.enable().unwrap();

        assert_eq!(
            panel.disable(),
            Err(PanelError::BusTransactionFailure {
                value: 0x60,
                kind: ErrorKind::NoAcknowledge(NoAcknowledgeSource::Address),
            })
        );
        assert_eq!(panel.state(), LifecycleState::Faulted);
        assert_eq!(log.rail_writes(), vec![0x20, 0xA0, 0x3F, 0x2F]);
        assert_eq!(
            log.events().last(),
            Some(&Event::Direction(Signal::Wakeup, Direction::Input))
        );

        log.clear();
        assert_eq!(panel.disable(), Ok(()));
        assert!(log.events().is_empty());
    }

    #[test]
    fn line_failure_during_enable_powers_back_down() {
        let log = Log::default();
        let mut lines = panel_pins(&log);
        // Low and input on release, the output switch fails
        lines.cl = MockPin::failing_after(Signal::Cl, &log, 2);
        let mut panel = PanelController::new(
            PinAssignment::BOARD,
            lines,
            MockI2c::new(&log),
            MockDelay::new(&log),
        )
        .unwrap();
        log.clear();

        assert_eq!(panel.enable(), Err(PanelError::Pin(Signal::Cl)));
        assert_eq!(panel.state(), LifecycleState::Faulted);
        assert_eq!(log.rail_writes(), FULL_POWER_CYCLE);

        let events = log.events();
        let last_rail = events
            .iter()
            .rposition(|e| matches!(e, Event::I2cWrite(..)))
            .unwrap();
        let spv_released = events
            .iter()
            .rposition(|e| *e == Event::Direction(Signal::Spv, Direction::Input))
            .unwrap();
        assert!(spv_released < last_rail);
        assert_eq!(
            events.last(),
            Some(&Event::Direction(Signal::Wakeup, Direction::Input))
        );
    }

    #[test]
    fn release_hands_back_the_i2c_bus() {
        let log = Log::default();
        let mut panel = panel(&log);
        panel.enable().unwrap();
        panel.disable().unwrap();
        log.clear();

        let (_lines, mut i2c, _delay) = panel.release();
        i2c.write(0x68, &[0x01, 0x00]).unwrap();

        assert!(log.events().iter().all(|e| matches!(e, Event::I2cWrite(..))));
        assert_eq!(log.rail_writes(), vec![0x00]);
    }
}
