use crate::{
    auto_traits::{AsyncWork, Work},
    counters::Counters,
    dispatch::Dispatch,
    error::Error,
    intervals,
    job::Job,
    options::LimiterOptions,
};

use std::{sync::Arc, time::Duration};
use tokio::runtime::Handle;
use tracing::debug;

pub mod builder;

/// Admits queued jobs under a peak concurrency cap and a sliding window cap.
///
/// Jobs are admitted strictly in submission order by a single background
/// dispatch loop, spawned on the current tokio runtime when the limiter is
/// built. Dropping the limiter lets the loop finish whatever is still queued
/// and then exit.
#[derive(Debug)]
pub struct Limiter {
    queue: flume::Sender<Job>,
    counters: Arc<Counters>,
    options: LimiterOptions,
}

/// A snapshot of the state of a [Limiter].
///
/// Not guaranteed to be consistent under concurrent submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LimiterState {
    pub in_flight: usize,
    pub queued: usize,
    pub admitted: u64,
    pub peak_load: u32,
    pub queue_capacity: usize,
}

impl Limiter {
    pub fn new(options: LimiterOptions) -> Result<Self, Error> {
        Self::from_options(Some(options))
    }

    /// Validates `options`, starts the dispatch loop and returns the ready limiter.
    ///
    /// Must be called from within a tokio runtime.
    pub fn from_options(options: Option<LimiterOptions>) -> Result<Self, Error> {
        let options = options.ok_or(Error::MissingOptions)?;
        options.validate()?;

        let runtime = Handle::try_current()?;
        let capacity = options.effective_queue_capacity();
        let (queue, receiver) = flume::bounded(capacity);
        let counters = Arc::new(Counters::default());

        Dispatch::new(
            receiver,
            intervals::from_options(&options.interval),
            counters.clone(),
            options.peak_load,
            options.effective_poll_interval(),
        )
        .spawn(&runtime);

        debug!(
            peak_load = options.peak_load,
            interval_window = ?options.interval.window,
            interval_limit = options.interval.limit,
            queue_capacity = capacity,
            "limiter started"
        );

        Ok(Self {
            queue,
            counters,
            options,
        })
    }

    /// Queues `job`, waiting for room if the queue is full.
    pub async fn submit(&self, job: Job) -> Result<(), Error> {
        self.queue.send_async(job).await?;
        Ok(())
    }

    /// Queues `job` from synchronous code, blocking the thread while the queue is full.
    ///
    /// Don't call this from an async context; use [submit](Self::submit) there.
    pub fn submit_blocking(&self, job: Job) -> Result<(), Error> {
        self.queue.send(job)?;
        Ok(())
    }

    /// Queues a blocking closure.
    pub async fn perform<F: Work>(&self, work: F) -> Result<(), Error> {
        self.submit(Job::blocking(work)).await
    }

    /// Queues a future.
    pub async fn perform_async<F: AsyncWork>(&self, work: F) -> Result<(), Error> {
        self.submit(Job::future(work)).await
    }

    /// Direct handle on the queue, with the same backpressure as [submit](Self::submit).
    pub fn queue(&self) -> flume::Sender<Job> {
        self.queue.clone()
    }

    /// `true` if nothing is queued and nothing is running.
    ///
    /// The two halves are read separately, so this can be briefly wrong around
    /// a submission or an admission. Poll it rather than relying on one reading.
    pub fn is_idle(&self) -> bool {
        self.queue.is_empty() && self.counters.in_flight() == 0
    }

    pub async fn wait_until_idle(&self) {
        while !self.is_idle() {
            tokio::time::sleep(self.poll_interval()).await;
        }
    }

    pub fn state(&self) -> LimiterState {
        LimiterState {
            in_flight: self.counters.in_flight(),
            queued: self.queue.len(),
            admitted: self.counters.admitted(),
            peak_load: self.options.peak_load,
            queue_capacity: self.options.effective_queue_capacity(),
        }
    }

    pub fn options(&self) -> &LimiterOptions {
        &self.options
    }

    fn poll_interval(&self) -> Duration {
        self.options.effective_poll_interval()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::options::{DEFAULT_QUEUE_CAPACITY, IntervalOptions};
    use itertools::Itertools;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tokio::sync::Mutex;

    #[tokio::test]
    async fn missing_options() {
        assert!(matches!(
            Limiter::from_options(None),
            Err(Error::MissingOptions)
        ));
    }

    #[tokio::test]
    async fn invalid_options() {
        let invalid = [
            LimiterOptions {
                interval: IntervalOptions::new(Duration::from_secs(3600), 0),
                ..Default::default()
            },
            LimiterOptions {
                interval: IntervalOptions::new(Duration::ZERO, 42),
                ..Default::default()
            },
            LimiterOptions {
                queue_capacity: -5,
                ..Default::default()
            },
        ];

        for options in invalid {
            assert!(Limiter::new(options).is_err(), "{options:?} should be invalid");
        }
    }

    #[test]
    fn needs_a_runtime() {
        assert!(matches!(
            Limiter::new(LimiterOptions::default()),
            Err(Error::NoRuntime(_))
        ));
    }

    #[tokio::test]
    async fn default_state() {
        let limiter = Limiter::new(LimiterOptions::default()).unwrap();

        assert!(limiter.is_idle());
        assert_eq!(
            limiter.state(),
            LimiterState {
                in_flight: 0,
                queued: 0,
                admitted: 0,
                peak_load: 0,
                queue_capacity: DEFAULT_QUEUE_CAPACITY,
            }
        );
    }

    #[tokio::test]
    async fn admits_in_submission_order() {
        let limiter = Limiter::new(LimiterOptions {
            peak_load: 1,
            ..Default::default()
        })
        .unwrap();
        let acc: Arc<Mutex<Vec<usize>>> = Default::default();

        for i in 0..20 {
            let acc = acc.clone();
            limiter
                .perform_async(async move {
                    acc.lock().await.push(i);
                })
                .await
                .unwrap();
        }

        limiter.wait_until_idle().await;
        while acc.lock().await.len() < 20 {
            tokio::time::sleep(Duration::from_millis(1)).await;
        }

        let order = acc.lock().await.iter().copied().collect_vec();
        assert_eq!(order, (0..20).collect_vec());
        assert_eq!(limiter.state().admitted, 20);
    }

    #[tokio::test]
    async fn admission_order_is_independent_of_run_time() {
        use rand::Rng;

        let limiter = Limiter::new(LimiterOptions {
            peak_load: 4,
            ..Default::default()
        })
        .unwrap();
        let started: Arc<Mutex<Vec<usize>>> = Default::default();
        let finished: Arc<Mutex<Vec<usize>>> = Default::default();

        for i in 0..40 {
            let delay = Duration::from_millis(rand::thread_rng().gen_range(0..20));
            let started = started.clone();
            let finished = finished.clone();

            limiter
                .perform_async(async move {
                    started.lock().await.push(i);
                    tokio::time::sleep(delay).await;
                    finished.lock().await.push(i);
                })
                .await
                .unwrap();
        }

        while finished.lock().await.len() < 40 {
            tokio::time::sleep(Duration::from_millis(1)).await;
        }

        let started = started.lock().await.iter().copied().collect_vec();
        assert_eq!(started, (0..40).collect_vec());
        assert_eq!(limiter.state().admitted, 40);
    }

    #[tokio::test]
    async fn slot_released_after_panic() {
        let limiter = Limiter::new(LimiterOptions {
            peak_load: 1,
            ..Default::default()
        })
        .unwrap();
        let runs = Arc::new(AtomicUsize::new(0));

        limiter.perform(|| panic!("boom")).await.unwrap();
        limiter
            .perform({
                let runs = runs.clone();
                move || {
                    runs.fetch_add(1, Ordering::SeqCst);
                }
            })
            .await
            .unwrap();

        tokio::time::timeout(Duration::from_secs(5), async {
            while runs.load(Ordering::SeqCst) == 0 {
                tokio::time::sleep(Duration::from_millis(1)).await;
            }
        })
        .await
        .unwrap();

        tokio::time::timeout(Duration::from_secs(5), limiter.wait_until_idle())
            .await
            .unwrap();
        assert_eq!(limiter.state().in_flight, 0);
    }

    #[tokio::test]
    async fn queue_handle_feeds_the_limiter() {
        let limiter = Limiter::new(LimiterOptions::default()).unwrap();
        let runs = Arc::new(AtomicUsize::new(0));
        let queue = limiter.queue();

        for _ in 0..5 {
            let runs = runs.clone();
            queue
                .send_async(Job::future(async move {
                    runs.fetch_add(1, Ordering::SeqCst);
                }))
                .await
                .unwrap();
        }

        tokio::time::timeout(Duration::from_secs(5), async {
            while runs.load(Ordering::SeqCst) < 5 {
                tokio::time::sleep(Duration::from_millis(1)).await;
            }
        })
        .await
        .unwrap();
    }
}
