//! HTTP side of a run: request templates, client construction, and the
//! Request Executor.
mod body;
mod client;
mod executor;
mod spec;


pub use client::{ClientSettings, DEFAULT_TIMEOUT, build_client, parse_base_url, resolve_url};
pub use executor::{ExecutionDetail, RequestExecutor};
pub use spec::RequestSpec;
