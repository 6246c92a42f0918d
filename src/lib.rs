//! Core library for the `apiload` CLI.
//!
//! `apiload` runs suites of named HTTP requests against an API under
//! load. A suite is driven either as a fixed number of suite executions
//! with bounded concurrency, or as a timed, rate-paced stream of
//! requests. Every response can be checked against declarative
//! validation rules, and results are folded into streaming latency and
//! throughput statistics that subscribers observe while the run is in
//! progress.
pub mod args;
pub mod auth;
pub mod config;
pub mod error;
pub mod http;
pub mod load;
pub mod metrics;
pub mod store;
pub mod system;
pub mod validation;

mod entry;

/// Parses the command line and runs the selected command.
///
/// # Errors
///
/// Returns the error that ended the command, including a failed run.
pub fn run() -> error::AppResult<()> {
    entry::run()
}
