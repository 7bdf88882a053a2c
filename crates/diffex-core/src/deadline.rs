//! Cooperative time limit for bisection.
//!
//! Time is read through the [`Clock`] trait so that callers (and tests) can
//! substitute their own source.

use std::cell::Cell;
use std::fmt;
use std::time::{Duration, Instant};

pub trait Clock {
    fn now(&self) -> Instant;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

/// Clock that only moves when told to.
#[derive(Debug)]
pub struct ManualClock {
    now: Cell<Instant>,
}

impl ManualClock {
    pub fn new(start: Instant) -> Self {
        Self {
            now: Cell::new(start),
        }
    }

    pub fn advance(&self, by: Duration) {
        self.now.set(self.now.get() + by);
    }
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new(Instant::now())
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Instant {
        self.now.get()
    }
}

/// Point in time after which bisection gives up.
#[derive(Clone, Copy)]
pub struct Deadline<'c> {
    at: Option<Instant>,
    clock: &'c dyn Clock,
}

impl Deadline<'static> {
    pub fn never() -> Self {
        Deadline {
            at: None,
            clock: &SystemClock,
        }
    }
}

impl<'c> Deadline<'c> {
    pub fn unbounded(clock: &'c dyn Clock) -> Self {
        Self { at: None, clock }
    }

    pub fn at(at: Instant, clock: &'c dyn Clock) -> Self {
        Self {
            at: Some(at),
            clock,
        }
    }

    /// `timeout` from the clock's current reading. Overflowing instants
    /// are treated as unbounded.
    pub fn after(timeout: Duration, clock: &'c dyn Clock) -> Self {
        Self {
            at: clock.now().checked_add(timeout),
            clock,
        }
    }

    pub fn is_bounded(&self) -> bool {
        self.at.is_some()
    }

    pub fn is_past(&self) -> bool {
        match self.at {
            Some(at) => self.clock.now() > at,
            None => false,
        }
    }
}

impl fmt::Debug for Deadline<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Deadline").field("at", &self.at).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn never_is_not_past() {
        assert!(!Deadline::never().is_past());
        assert!(!Deadline::never().is_bounded());
    }

    #[test]
    fn manual_clock_expires() {
        let clock = ManualClock::default();
        let deadline = Deadline::after(Duration::from_millis(100), &clock);
        assert!(!deadline.is_past());
        clock.advance(Duration::from_millis(100));
        assert!(!deadline.is_past());
        clock.advance(Duration::from_millis(1));
        assert!(deadline.is_past());
    }
}
