use crate::{counters::InFlightSlot, job::JobKind, task::Task};

use futures::FutureExt;
use std::{
    panic::{self, AssertUnwindSafe},
    sync::{Arc, OnceLock},
};
use tokio::time::Instant;
use tracing::{trace, warn};

/// Runs one admitted task to completion, detached from the dispatch loop.
pub(crate) struct Worker;

/// Stamps the task's completion and then frees its in-flight slot, on every exit path.
struct Completion {
    id: u64,
    end: Arc<OnceLock<Instant>>,
    _slot: InFlightSlot,
}

impl Drop for Completion {
    fn drop(&mut self) {
        let _ = self.end.set(Instant::now());
        trace!(task_id = self.id, "task complete");
    }
}

impl Worker {
    pub fn spawn(task: Task, slot: InFlightSlot) {
        let id = task.id;
        let completion = Completion {
            id,
            end: task.completion(),
            _slot: slot,
        };

        match task.job.kind {
            JobKind::Blocking(work) => {
                tokio::task::spawn_blocking(move || {
                    let _completion = completion;

                    if panic::catch_unwind(AssertUnwindSafe(work)).is_err() {
                        warn!(task_id = id, "job panicked");
                    }
                });
            }
            JobKind::Async(work) => {
                tokio::spawn(async move {
                    let _completion = completion;

                    if AssertUnwindSafe(work).catch_unwind().await.is_err() {
                        warn!(task_id = id, "job panicked");
                    }
                });
            }
        }
    }
}
