use super::Limiter;
use crate::{
    error::Error,
    options::{IntervalOptions, LimiterOptions},
};

use std::time::Duration;

#[derive(Debug, Clone, Default)]
pub struct LimiterBuilder {
    pub(crate) options: LimiterOptions,
}

impl LimiterBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_peak_load(mut self, peak_load: u32) -> Self {
        self.options.peak_load = peak_load;
        self
    }
    pub fn with_interval(mut self, window: Duration, limit: u32) -> Self {
        self.options.interval = IntervalOptions::new(window, limit);
        self
    }
    pub fn with_queue_capacity(mut self, capacity: i32) -> Self {
        self.options.queue_capacity = capacity;
        self
    }
    pub fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.options.poll_interval = poll_interval;
        self
    }

    pub fn build(self) -> Result<Limiter, Error> {
        Limiter::new(self.options)
    }
}

impl From<LimiterOptions> for LimiterBuilder {
    fn from(options: LimiterOptions) -> Self {
        Self { options }
    }
}
