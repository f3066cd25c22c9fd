// Copyright 2026 Hypermesh Foundation. All rights reserved.
// Commodity Market Simulation - Interval Scheduling

use serde::{Deserialize, Serialize};

/// Handle for the single recurring tick. Created once when the engine starts
/// running and never cancelled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct IntervalTimer {
    interval_ms: u64,
    next_due_ms: u64,
    fired: u64,
}

impl IntervalTimer {
    /// First firing is one full interval after `now_ms`.
    pub fn start(now_ms: u64, interval_ms: u64) -> Self {
        let interval_ms = interval_ms.max(1);
        Self { interval_ms, next_due_ms: now_ms.saturating_add(interval_ms), fired: 0 }
    }

    pub fn interval_ms(&self) -> u64 {
        self.interval_ms
    }

    pub fn next_due_ms(&self) -> u64 {
        self.next_due_ms
    }

    /// Total firings consumed so far.
    pub fn fired(&self) -> u64 {
        self.fired
    }

    /// Firings whose deadline is at or before `now_ms`.
    pub fn due(&self, now_ms: u64) -> u64 {
        if now_ms < self.next_due_ms {
            0
        } else {
            (now_ms - self.next_due_ms) / self.interval_ms + 1
        }
    }

    /// Consume every due firing and move the deadline past `now_ms`.
    pub fn take_due(&mut self, now_ms: u64) -> u64 {
        let due = self.due(now_ms);
        self.next_due_ms = self.next_due_ms.saturating_add(due.saturating_mul(self.interval_ms));
        self.fired = self.fired.saturating_add(due);
        due
    }

    pub fn millis_until_due(&self, now_ms: u64) -> u64 {
        self.next_due_ms.saturating_sub(now_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fires_once_per_interval() {
        let mut timer = IntervalTimer::start(1_000, 60_000);
        assert_eq!(timer.take_due(60_999), 0);
        assert_eq!(timer.take_due(61_000), 1);
        assert_eq!(timer.take_due(61_000), 0);
        assert_eq!(timer.next_due_ms(), 121_000);
    }

    #[test]
    fn catches_up_on_missed_intervals() {
        let mut timer = IntervalTimer::start(0, 60_000);
        assert_eq!(timer.due(185_000), 3);
        assert_eq!(timer.take_due(185_000), 3);
        assert_eq!(timer.fired(), 3);
        assert_eq!(timer.millis_until_due(185_000), 55_000);
    }

    #[test]
    fn deadline_saturates_near_the_end_of_time() {
        let mut timer = IntervalTimer::start(u64::MAX - 10, 60_000);
        assert_eq!(timer.next_due_ms(), u64::MAX);
        assert_eq!(timer.take_due(u64::MAX), 1);
        assert_eq!(timer.next_due_ms(), u64::MAX);
        assert_eq!(timer.fired(), 1);
    }
}
