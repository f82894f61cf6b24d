use crate::{options::IntervalOptions, task::TaskTracker};

use std::{collections::HashMap, time::Duration};
use tokio::time::Instant;

/// Decides whether one more task may start given the recent admission history.
///
/// Only the dispatch loop calls into a strategy, so implementations take
/// `&mut self` and need no locking of their own.
pub(crate) trait IntervalAdmission: Send + 'static {
    fn may_admit_at(&mut self, now: Instant) -> bool;

    fn record_admission(&mut self, id: u64, tracker: TaskTracker);

    /// Tasks currently occupying the window.
    fn counted(&self) -> usize;

    /// Earliest moment a completed task leaves the window, if any has completed.
    fn next_expiry(&self) -> Option<Instant>;

    fn may_admit_now(&mut self) -> bool {
        self.may_admit_at(Instant::now())
    }
}

pub(crate) fn from_options(options: &IntervalOptions) -> Box<dyn IntervalAdmission> {
    if options.is_disabled() {
        Box::new(NullInterval)
    } else {
        Box::new(SlidingWindow::new(options.window, options.limit))
    }
}

#[derive(Debug, Default)]
pub(crate) struct NullInterval;

impl IntervalAdmission for NullInterval {
    fn may_admit_at(&mut self, _now: Instant) -> bool {
        true
    }

    fn record_admission(&mut self, _id: u64, _tracker: TaskTracker) {}

    fn counted(&self) -> usize {
        0
    }

    fn next_expiry(&self) -> Option<Instant> {
        None
    }
}

/// Counts every admitted task from its start until `window` after it completed.
#[derive(Debug)]
pub(crate) struct SlidingWindow {
    window: Duration,
    limit: usize,
    tasks: HashMap<u64, TaskTracker>,
}

impl SlidingWindow {
    pub fn new(window: Duration, limit: u32) -> Self {
        Self {
            window,
            limit: limit as usize,
            tasks: HashMap::new(),
        }
    }

    fn purge(&mut self, now: Instant) {
        // Nothing can have expired yet if the clock hasn't run a full window.
        let Some(deadline) = now.checked_sub(self.window) else {
            return;
        };

        self.tasks.retain(|_, task| !task.ended_before(deadline));
    }
}

impl IntervalAdmission for SlidingWindow {
    fn may_admit_at(&mut self, now: Instant) -> bool {
        self.purge(now);
        self.tasks.len() < self.limit
    }

    fn record_admission(&mut self, id: u64, tracker: TaskTracker) {
        self.tasks.insert(id, tracker);
    }

    fn counted(&self) -> usize {
        self.tasks.len()
    }

    fn next_expiry(&self) -> Option<Instant> {
        self.tasks
            .values()
            .filter_map(TaskTracker::end)
            .min()
            .map(|end| end + self.window)
    }
}
