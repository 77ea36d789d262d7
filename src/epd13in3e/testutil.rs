//! Hand-rolled embedded-hal doubles sharing one event trace, so tests can
//! assert on pin/SPI ordering across objects.

use std::cell::RefCell;
use std::rc::Rc;

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::{self, InputPin, OutputPin};
use embedded_hal::spi::{self, Operation, SpiDevice};

use super::interface::Watchdog;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    /// Output pin level change: (pin name, level)
    Pin(&'static str, bool),
    /// Bytes written in one SPI operation
    Spi(Vec<u8>),
    DelayMs(u32),
    WdtFeed,
}

pub type Trace = Rc<RefCell<Vec<Event>>>;

pub fn trace() -> Trace {
    Rc::new(RefCell::new(Vec::new()))
}

pub struct TracePin {
    trace: Trace,
    name: &'static str,
}

impl TracePin {
    pub fn new(trace: &Trace, name: &'static str) -> Self {
        TracePin {
            trace: Rc::clone(trace),
            name,
        }
    }
}

impl digital::ErrorType for TracePin {
    type Error = digital::ErrorKind;
}

impl OutputPin for TracePin {
    fn set_low(&mut self) -> Result<(), Self::Error> {
        self.trace.borrow_mut().push(Event::Pin(self.name, false));
        Ok(())
    }

    fn set_high(&mut self) -> Result<(), Self::Error> {
        self.trace.borrow_mut().push(Event::Pin(self.name, true));
        Ok(())
    }
}

/// Busy input that reads low `reads_low` times, then high.
pub struct BusyPin {
    reads_low: usize,
    reads: usize,
}

impl BusyPin {
    pub fn new(reads_low: usize) -> Self {
        BusyPin { reads_low, reads: 0 }
    }
}

impl digital::ErrorType for BusyPin {
    type Error = digital::ErrorKind;
}

impl InputPin for BusyPin {
    fn is_high(&mut self) -> Result<bool, Self::Error> {
        let ready = self.reads >= self.reads_low;
        self.reads = self.reads.saturating_add(1);
        Ok(ready)
    }

    fn is_low(&mut self) -> Result<bool, Self::Error> {
        self.is_high().map(|high| !high)
    }
}

pub struct MockSpi {
    trace: Trace,
}

impl MockSpi {
    pub fn new(trace: &Trace) -> Self {
        MockSpi {
            trace: Rc::clone(trace),
        }
    }
}

impl spi::ErrorType for MockSpi {
    type Error = spi::ErrorKind;
}

impl SpiDevice for MockSpi {
    fn transaction(&mut self, operations: &mut [Operation<'_, u8>]) -> Result<(), Self::Error> {
        for op in operations.iter() {
            if let Operation::Write(bytes) = op {
                self.trace.borrow_mut().push(Event::Spi(bytes.to_vec()));
            }
        }
        Ok(())
    }
}

pub struct MockDelay {
    trace: Trace,
}

impl MockDelay {
    pub fn new(trace: &Trace) -> Self {
        MockDelay {
            trace: Rc::clone(trace),
        }
    }
}

impl DelayNs for MockDelay {
    fn delay_ns(&mut self, ns: u32) {
        self.trace.borrow_mut().push(Event::DelayMs(ns / 1_000_000));
    }

    fn delay_ms(&mut self, ms: u32) {
        self.trace.borrow_mut().push(Event::DelayMs(ms));
    }
}

pub struct MockWdt {
    trace: Trace,
}

impl MockWdt {
    pub fn new(trace: &Trace) -> Self {
        MockWdt {
            trace: Rc::clone(trace),
        }
    }
}

impl Watchdog for MockWdt {
    fn feed(&mut self) {
        self.trace.borrow_mut().push(Event::WdtFeed);
    }
}
