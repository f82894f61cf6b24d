use crate::error::Error;

use std::time::Duration;

pub const DEFAULT_QUEUE_CAPACITY: usize = 512;
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_micros(100);

/// Sliding window occupancy limit.
///
/// A zero `window` together with a zero `limit` disables interval limiting.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IntervalOptions {
    pub window: Duration,
    pub limit: u32,
}

impl IntervalOptions {
    pub fn new(window: Duration, limit: u32) -> Self {
        Self { window, limit }
    }

    pub fn is_disabled(&self) -> bool {
        self.window.is_zero() || self.limit == 0
    }
}

/// Everything a [Limiter](crate::Limiter) is configured with at construction.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LimiterOptions {
    pub interval: IntervalOptions,
    /// Maximum number of jobs running at once. `0` is unbounded.
    pub peak_load: u32,
    /// Queue capacity. `0` selects [DEFAULT_QUEUE_CAPACITY], negative values are rejected.
    pub queue_capacity: i32,
    /// Longest the dispatch loop waits between admission checks. It re-checks
    /// sooner whenever a running job finishes or a completed job leaves the
    /// interval window. `0` selects [DEFAULT_POLL_INTERVAL].
    pub poll_interval: Duration,
}

impl LimiterOptions {
    pub fn validate(&self) -> Result<(), Error> {
        if self.interval.limit > 0 && self.interval.window.is_zero() {
            return Err(Error::LimitWithoutWindow);
        }

        if !self.interval.window.is_zero() && self.interval.limit == 0 {
            return Err(Error::WindowWithoutLimit);
        }

        if self.queue_capacity < 0 {
            return Err(Error::NegativeQueueCapacity(self.queue_capacity));
        }

        Ok(())
    }

    pub fn effective_queue_capacity(&self) -> usize {
        usize::try_from(self.queue_capacity)
            .ok()
            .filter(|capacity| *capacity > 0)
            .unwrap_or(DEFAULT_QUEUE_CAPACITY)
    }

    pub fn effective_poll_interval(&self) -> Duration {
        if self.poll_interval.is_zero() {
            DEFAULT_POLL_INTERVAL
        } else {
            self.poll_interval
        }
    }
}
