use crate::job::Job;

use std::sync::{Arc, OnceLock};
use tokio::time::Instant;

/// Bookkeeping for one admitted job.
///
/// The completion instant is written once by the worker that runs the job and
/// read by the interval strategy through a [TaskTracker].
pub(crate) struct Task {
    pub(crate) id: u64,
    pub(crate) job: Job,
    completion: Arc<OnceLock<Instant>>,
}

/// Read side of a task's completion record.
#[derive(Debug, Clone)]
pub(crate) struct TaskTracker {
    completion: Arc<OnceLock<Instant>>,
}

impl Task {
    pub fn new(id: u64, job: Job) -> Self {
        Self {
            id,
            job,
            completion: Default::default(),
        }
    }

    pub fn tracker(&self) -> TaskTracker {
        TaskTracker {
            completion: self.completion.clone(),
        }
    }

    pub fn completion(&self) -> Arc<OnceLock<Instant>> {
        self.completion.clone()
    }
}

impl TaskTracker {
    #[cfg(test)]
    pub fn is_complete(&self) -> bool {
        self.completion.get().is_some()
    }

    pub fn end(&self) -> Option<Instant> {
        self.completion.get().copied()
    }

    /// A running task never counts as ended, however old it is.
    pub fn ended_before(&self, deadline: Instant) -> bool {
        self.end().is_some_and(|end| end < deadline)
    }
}
