use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("options absent")]
    MissingOptions,
    #[error("interval window set without limit")]
    WindowWithoutLimit,
    #[error("interval limit set without window")]
    LimitWithoutWindow,
    #[error("negative queue capacity: {0}")]
    NegativeQueueCapacity(i32),
    #[error("no tokio runtime to run the dispatch loop on: {0}")]
    NoRuntime(#[from] tokio::runtime::TryCurrentError),
    #[error("queue closed")]
    Closed,
}

impl<T> From<flume::SendError<T>> for Error {
    fn from(_: flume::SendError<T>) -> Self {
        Error::Closed
    }
}
