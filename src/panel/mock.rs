//! Recording fakes for unit tests.
//!
//! Every pin, the data port, the I2C bus and the delay push into one shared
//! log so tests can assert on global ordering.

use std::cell::RefCell;
use std::rc::Rc;
use std::vec::Vec;

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::{self, ErrorType, OutputPin};
use embedded_hal::i2c::{self, I2c, Operation};

use crate::panel::driver::PanelPins;
use crate::panel::error::Signal;
use crate::panel::port::{Direction, DirectionalPin, WideGpioPort};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    Level(Signal, bool),
    Direction(Signal, Direction),
    Byte(u8),
    DelayNs(u32),
    I2cWrite(u8, Vec<u8>),
}

#[derive(Clone, Default)]
pub struct Log(Rc<RefCell<Vec<Event>>>);

impl Log {
    pub fn push(&self, event: Event) {
        self.0.borrow_mut().push(event);
    }

    pub fn events(&self) -> Vec<Event> {
        self.0.borrow().clone()
    }

    pub fn clear(&self) {
        self.0.borrow_mut().clear();
    }

    /// Rising edges on `signal`.
    pub fn rising_edges(&self, signal: Signal) -> usize {
        self.0
            .borrow()
            .iter()
            .filter(|e| **e == Event::Level(signal, true))
            .count()
    }

    /// Values written to the power control register, in order.
    pub fn rail_writes(&self) -> Vec<u8> {
        self.0
            .borrow()
            .iter()
            .filter_map(|e| match e {
                Event::I2cWrite(_, bytes) => bytes.get(1).copied(),
                _ => None,
            })
            .collect()
    }
}

pub struct MockPin {
    signal: Signal,
    log: Log,
    fail_after: Option<usize>,
    calls: usize,
}

impl MockPin {
    pub fn new(signal: Signal, log: &Log) -> Self {
        Self {
            signal,
            log: log.clone(),
            fail_after: None,
            calls: 0,
        }
    }

    pub fn failing(signal: Signal, log: &Log) -> Self {
        Self::failing_after(signal, log, 0)
    }

    /// Accepts `calls` level or direction changes, then fails every one.
    pub fn failing_after(signal: Signal, log: &Log, calls: usize) -> Self {
        Self {
            fail_after: Some(calls),
            ..Self::new(signal, log)
        }
    }

    fn record(&mut self, event: Event) -> Result<(), digital::ErrorKind> {
        if self.fail_after.is_some_and(|n| self.calls >= n) {
            return Err(digital::ErrorKind::Other);
        }
        self.calls += 1;
        self.log.push(event);
        Ok(())
    }
}

impl ErrorType for MockPin {
    type Error = digital::ErrorKind;
}

impl OutputPin for MockPin {
    fn set_low(&mut self) -> Result<(), Self::Error> {
        self.record(Event::Level(self.signal, false))
    }

    fn set_high(&mut self) -> Result<(), Self::Error> {
        self.record(Event::Level(self.signal, true))
    }
}

impl DirectionalPin for MockPin {
    fn set_direction(&mut self, direction: Direction) -> Result<(), Self::Error> {
        self.record(Event::Direction(self.signal, direction))
    }
}

pub struct MockPort {
    log: Log,
}

impl MockPort {
    pub fn new(log: &Log) -> Self {
        Self { log: log.clone() }
    }
}

impl ErrorType for MockPort {
    type Error = digital::ErrorKind;
}

impl WideGpioPort for MockPort {
    fn set_byte(&mut self, value: u8) -> Result<(), Self::Error> {
        self.log.push(Event::Byte(value));
        Ok(())
    }

    fn set_direction(&mut self, direction: Direction) -> Result<(), Self::Error> {
        self.log.push(Event::Direction(Signal::Data, direction));
        Ok(())
    }
}

pub struct MockDelay {
    log: Log,
}

impl MockDelay {
    pub fn new(log: &Log) -> Self {
        Self { log: log.clone() }
    }
}

impl DelayNs for MockDelay {
    fn delay_ns(&mut self, ns: u32) {
        self.log.push(Event::DelayNs(ns));
    }
}

/// I2C bus that accepts writes until `fail_at` writes have gone through.
pub struct MockI2c {
    log: Log,
    fail_at: Option<usize>,
    writes: usize,
}

impl MockI2c {
    pub fn new(log: &Log) -> Self {
        Self {
            log: log.clone(),
            fail_at: None,
            writes: 0,
        }
    }

    pub fn failing_at(log: &Log, write: usize) -> Self {
        Self {
            fail_at: Some(write),
            ..Self::new(log)
        }
    }
}

impl i2c::ErrorType for MockI2c {
    type Error = i2c::ErrorKind;
}

impl I2c for MockI2c {
    fn transaction(
        &mut self,
        address: u8,
        operations: &mut [Operation<'_>],
    ) -> Result<(), Self::Error> {
        for op in operations.iter() {
            if let Operation::Write(bytes) = op {
                if self.fail_at == Some(self.writes) {
                    return Err(i2c::ErrorKind::NoAcknowledge(
                        i2c::NoAcknowledgeSource::Address,
                    ));
                }
                self.writes += 1;
                self.log.push(Event::I2cWrite(address, bytes.to_vec()));
            }
        }
        Ok(())
    }
}

/// A full set of recording panel pins sharing `log`.
pub fn panel_pins(log: &Log) -> PanelPins<MockPin, MockPort> {
    PanelPins {
        spv: MockPin::new(Signal::Spv, log),
        ckv: MockPin::new(Signal::Ckv, log),
        mode: MockPin::new(Signal::Mode, log),
        stl: MockPin::new(Signal::Stl, log),
        oe: MockPin::new(Signal::Oe, log),
        le: MockPin::new(Signal::Le, log),
        cl: MockPin::new(Signal::Cl, log),
        data: MockPort::new(log),
        wakeup: MockPin::new(Signal::Wakeup, log),
    }
}
