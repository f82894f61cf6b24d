use crate::auto_traits::{AsyncWork, Work};

use futures::future::BoxFuture;
use std::fmt;

/// A unit of work waiting in the limiter's queue.
///
/// Either a blocking closure, run on the runtime's blocking pool, or a future,
/// run as a regular task. Nothing it returns or raises is reported back.
pub struct Job {
    pub(crate) kind: JobKind,
}

pub(crate) enum JobKind {
    Blocking(Box<dyn FnOnce() + Send + 'static>),
    Async(BoxFuture<'static, ()>),
}

impl Job {
    pub fn blocking<F: Work>(work: F) -> Self {
        Self {
            kind: JobKind::Blocking(Box::new(work)),
        }
    }

    pub fn future<F: AsyncWork>(work: F) -> Self {
        Self {
            kind: JobKind::Async(Box::pin(work)),
        }
    }

    pub fn is_blocking(&self) -> bool {
        matches!(self.kind, JobKind::Blocking(_))
    }
}

impl fmt::Debug for Job {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kind = match self.kind {
            JobKind::Blocking(_) => "blocking",
            JobKind::Async(_) => "async",
        };

        f.debug_struct("Job").field("kind", &kind).finish()
    }
}
