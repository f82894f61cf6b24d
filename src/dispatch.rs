use crate::{
    counters::{Counters, InFlightSlot},
    intervals::IntervalAdmission,
    job::Job,
    task::Task,
    worker::Worker,
};

use std::{sync::Arc, time::Duration};
use tokio::{runtime::Handle, time::Instant};
use tracing::{debug, trace};

/// The single control loop of a limiter.
///
/// Owns the receiving end of the queue and the interval strategy, so admission
/// state is only ever touched from here.
pub(crate) struct Dispatch {
    receiver: flume::Receiver<Job>,
    interval: Box<dyn IntervalAdmission>,
    counters: Arc<Counters>,
    peak_load: usize,
    poll_interval: Duration,
}

impl Dispatch {
    pub fn new(
        receiver: flume::Receiver<Job>,
        interval: Box<dyn IntervalAdmission>,
        counters: Arc<Counters>,
        peak_load: u32,
        poll_interval: Duration,
    ) -> Self {
        Self {
            receiver,
            interval,
            counters,
            peak_load: peak_load as usize,
            poll_interval,
        }
    }

    pub fn spawn(self, runtime: &Handle) {
        runtime.spawn(self.run());
    }

    fn peak_check(&self) -> bool {
        self.peak_load == 0 || self.counters.in_flight() < self.peak_load
    }

    fn may_admit(&mut self) -> bool {
        self.peak_check() && self.interval.may_admit_now()
    }

    /// Latest moment to re-check admission if no slot is given back before it.
    fn recheck_at(&self) -> Instant {
        let backstop = Instant::now() + self.poll_interval;

        self.interval
            .next_expiry()
            .map_or(backstop, |expiry| expiry.min(backstop))
    }

    async fn run(mut self) {
        loop {
            while !self.may_admit() {
                let recheck_at = self.recheck_at();

                tokio::select! {
                    _ = self.counters.released() => {}
                    _ = tokio::time::sleep_until(recheck_at) => {}
                }
            }

            // Fails only once every sender is gone and the queue is drained.
            let Ok(job) = self.receiver.recv_async().await else {
                break;
            };

            let slot = InFlightSlot::acquire(&self.counters);
            let task = Task::new(self.counters.next_id(), job);

            self.interval.record_admission(task.id, task.tracker());

            trace!(
                task_id = task.id,
                blocking = task.job.is_blocking(),
                in_flight = self.counters.in_flight(),
                counted = self.interval.counted(),
                "task admitted"
            );

            Worker::spawn(task, slot);
        }

        debug!(
            admitted = self.counters.admitted(),
            "queue disconnected, dispatch loop exiting"
        );
    }
}
