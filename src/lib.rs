#![doc = include_str!("../README.md")]

mod auto_traits;
mod counters;
mod dispatch;
mod error;
mod intervals;
mod job;
mod limiter;
mod options;
mod task;
mod worker;

pub use auto_traits::{AsyncWork, Work};
pub use error::Error;
pub use job::Job;
pub use limiter::{Limiter, LimiterState, builder::LimiterBuilder};
pub use options::{DEFAULT_POLL_INTERVAL, DEFAULT_QUEUE_CAPACITY, IntervalOptions, LimiterOptions};
