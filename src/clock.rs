// Copyright 2026 Hypermesh Foundation. All rights reserved.
// Commodity Market Simulation - Clocks

use std::cell::Cell;
use std::rc::Rc;

use chrono::{Local, Timelike, Utc};

const MS_PER_HOUR: u64 = 3_600_000;

/// Wall-clock source for the engine.
pub trait Clock {
    /// Local hour of day, 0-23.
    fn local_hour(&self) -> u32;
    /// Milliseconds on a non-decreasing timeline.
    fn now_millis(&self) -> u64;
}

/// Host time via chrono. Works in the browser as well as natively.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn local_hour(&self) -> u32 {
        Local::now().hour()
    }

    fn now_millis(&self) -> u64 {
        Utc::now().timestamp_millis().max(0) as u64
    }
}

/// Manually advanced clock. Clones share the same timeline, so a test can
/// keep a handle while the engine owns another.
#[derive(Debug, Clone)]
pub struct ManualClock {
    start_hour: u32,
    millis: Rc<Cell<u64>>,
}

impl ManualClock {
    /// Starts at millisecond 0, which is the top of `start_hour`.
    pub fn at_hour(start_hour: u32) -> Self {
        Self { start_hour: start_hour % 24, millis: Rc::new(Cell::new(0)) }
    }

    pub fn advance(&self, millis: u64) {
        self.millis.set(self.millis.get() + millis);
    }
}

impl Clock for ManualClock {
    fn local_hour(&self) -> u32 {
        let elapsed_hours = self.millis.get() / MS_PER_HOUR;
        ((self.start_hour as u64 + elapsed_hours) % 24) as u32
    }

    fn now_millis(&self) -> u64 {
        self.millis.get()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn manual_clock_rolls_over_midnight() {
        let clock = ManualClock::at_hour(23);
        let handle = clock.clone();
        assert_eq!(clock.local_hour(), 23);
        handle.advance(MS_PER_HOUR);
        assert_eq!(clock.local_hour(), 0);
        assert_eq!(clock.now_millis(), MS_PER_HOUR);
    }

    #[test]
    fn system_clock_hour_is_valid() {
        assert!(SystemClock.local_hour() < 24);
    }
}
