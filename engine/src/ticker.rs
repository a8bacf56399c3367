use std::time::Duration;

/// Upper bound on ticks reported by a single `advance`, e.g. after the machine slept.
pub const MAX_CATCH_UP_TICKS: u32 = 4;

/// Fixed-interval tick scheduler.
///
/// Feed it real elapsed time; it reports how many whole intervals have passed and keeps the
/// remainder, so a slow frame fires several ticks instead of silently stretching the interval.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FixedTicker {
    interval: Duration,
    elapsed: Duration,
}

impl FixedTicker {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval: interval.max(Duration::from_millis(1)),
            elapsed: Duration::ZERO,
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub fn elapsed(&self) -> Duration {
        self.elapsed
    }

    /// Time left until the next tick is due.
    pub fn until_next(&self) -> Duration {
        self.interval.saturating_sub(self.elapsed)
    }

    /// Accumulates `dt` and returns the number of ticks that became due, at most
    /// [`MAX_CATCH_UP_TICKS`]. Any backlog beyond that is dropped.
    pub fn advance(&mut self, dt: Duration) -> u32 {
        self.elapsed = self.elapsed.saturating_add(dt);
        let mut due = 0u32;
        while self.elapsed >= self.interval && due < MAX_CATCH_UP_TICKS {
            self.elapsed -= self.interval;
            due += 1;
        }
        if self.elapsed >= self.interval {
            self.elapsed = Duration::ZERO;
        }
        due
    }
}
