use std::sync::{
    Arc,
    atomic::{AtomicU64, AtomicUsize, Ordering},
};
use tokio::sync::Notify;

/// Per-limiter counters shared between the limiter, its dispatch loop and the workers.
#[derive(Debug, Default)]
pub(crate) struct Counters {
    in_flight: AtomicUsize,
    id_serial: AtomicU64,
    released: Notify,
}

impl Counters {
    pub fn in_flight(&self) -> usize {
        self.in_flight.load(Ordering::Acquire)
    }

    /// Number of ids handed out so far, which is also the number of admitted jobs.
    pub fn admitted(&self) -> u64 {
        self.id_serial.load(Ordering::Acquire)
    }

    pub fn next_id(&self) -> u64 {
        self.id_serial.fetch_add(1, Ordering::SeqCst) + 1
    }

    /// Resolves once a slot has been given back since the last call.
    pub async fn released(&self) {
        self.released.notified().await;
    }
}

/// One occupied in-flight slot, given back on drop.
#[derive(Debug)]
pub(crate) struct InFlightSlot {
    counters: Arc<Counters>,
}

impl InFlightSlot {
    pub fn acquire(counters: &Arc<Counters>) -> Self {
        counters.in_flight.fetch_add(1, Ordering::SeqCst);
        Self {
            counters: counters.clone(),
        }
    }
}

impl Drop for InFlightSlot {
    fn drop(&mut self) {
        self.counters.in_flight.fetch_sub(1, Ordering::SeqCst);
        self.counters.released.notify_one();
    }
}
