//! Per-run statistics: request outcomes and their aggregation into
//! [`TestMetrics`].
mod aggregator;
mod types;


pub use aggregator::{MetricsAggregator, aggregate};
pub use types::{RequestResult, TestMetrics, UNKNOWN_ERROR, now_ms};
