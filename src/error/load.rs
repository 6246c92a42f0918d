use thiserror::Error;

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("Request suite is empty.")]
    EmptySuite,
    #[error("Rate must be > 0 requests per second.")]
    InvalidRate,
    #[error("Duration must be > 0 minutes.")]
    InvalidDuration,
    #[error("Count must be >= 1.")]
    InvalidCount,
    #[error("Concurrency must be >= 1.")]
    InvalidConcurrency,
    #[error("Run setup failed: {message}")]
    SetupFailed { message: String },
    #[error("{failed} of {total} requests failed.")]
    RequestsFailed { failed: usize, total: usize },
    #[error("Request '{name}' got no response: {message}")]
    NoResponse { name: String, message: String },
    #[error("Unknown run '{id}'.")]
    UnknownRun { id: String },
}
