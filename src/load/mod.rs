//! Load Generator: fixed-count and timed-rate strategies, the run state
//! machine, and cooperative cancellation.
mod cancel;
mod generator;
mod inflight;
mod runner;
mod sink;
mod types;

#[cfg(test)]
mod tests;

pub use cancel::CancelToken;
pub use generator::{LoadGenerator, RunSummary};
pub use runner::{RunHandle, RunOutcome, RunRequest, start_run};
pub use sink::ResultSink;
pub use types::{LoadConfig, RunKind, RunStatus, TestRun};
