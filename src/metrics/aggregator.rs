use std::collections::BTreeMap;

use super::types::{RequestResult, TestMetrics};

/// Width of the sliding window behind `current_rps`.
const RPS_WINDOW_MS: u64 = 1000;
const PERCENT_DIVISOR: u64 = 100;

/// Incremental aggregator over one run's results.
///
/// Latencies and timestamps are kept sorted on insert, so a snapshot is
/// identical to recomputing from the full result list regardless of the
/// order in which results arrive.
#[derive(Debug, Default, Clone)]
pub struct MetricsAggregator {
    latencies: Vec<u64>,
    timestamps: Vec<u64>,
    successful: u64,
    latency_sum_ms: u128,
    errors_by_type: BTreeMap<String, u64>,
}

impl MetricsAggregator {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, result: &RequestResult) {
        insert_sorted(&mut self.latencies, result.duration_ms);
        insert_sorted(&mut self.timestamps, result.timestamp_ms);
        self.latency_sum_ms = self
            .latency_sum_ms
            .saturating_add(u128::from(result.duration_ms));
        if result.success {
            self.successful = self.successful.saturating_add(1);
        } else {
            let count = self
                .errors_by_type
                .entry(result.error_kind().to_owned())
                .or_insert(0);
            *count = count.saturating_add(1);
        }
    }

    /// Records `result` and returns the refreshed metrics.
    pub fn on_result(&mut self, result: &RequestResult, now_ms: u64) -> Option<TestMetrics> {
        self.record(result);
        self.snapshot(now_ms)
    }

    /// Current metrics, or `None` before the first result.
    #[must_use]
    pub fn snapshot(&self, now_ms: u64) -> Option<TestMetrics> {
        let (&min, &max) = (self.latencies.first()?, self.latencies.last()?);
        let total = u64::try_from(self.latencies.len()).unwrap_or(u64::MAX);
        let average = self.latency_sum_ms as f64 / total as f64;

        let window_start = now_ms.saturating_sub(RPS_WINDOW_MS);
        let recent = self
            .timestamps
            .len()
            .saturating_sub(self.timestamps.partition_point(|&ts| ts <= window_start));

        let total_duration_ms = match (self.timestamps.first(), self.timestamps.last()) {
            (Some(first), Some(last)) if self.timestamps.len() > 1 => last.saturating_sub(*first),
            _ => 0,
        };

        Some(TestMetrics {
            total_requests: total,
            successful_requests: self.successful,
            failed_requests: total.saturating_sub(self.successful),
            average_response_time_ms: average,
            p50: percentile(&self.latencies, 50),
            p90: percentile(&self.latencies, 90),
            p95: percentile(&self.latencies, 95),
            p99: percentile(&self.latencies, 99),
            max_response_time_ms: max,
            min_response_time_ms: min,
            current_rps: u64::try_from(recent).unwrap_or(u64::MAX),
            total_duration_ms,
            errors_by_type: self.errors_by_type.clone(),
        })
    }
}

/// Aggregates a complete result list from scratch.
#[must_use]
pub fn aggregate(results: &[RequestResult], now_ms: u64) -> Option<TestMetrics> {
    let mut aggregator = MetricsAggregator::new();
    for result in results {
        aggregator.record(result);
    }
    aggregator.snapshot(now_ms)
}

fn insert_sorted(values: &mut Vec<u64>, value: u64) {
    let at = values.partition_point(|&existing| existing <= value);
    values.insert(at, value);
}

/// Nearest-rank percentile: the value at `floor(p / 100 * n)`, clamped to
/// the last index.
fn percentile(sorted: &[u64], percentile: u64) -> u64 {
    let count = u64::try_from(sorted.len()).unwrap_or(u64::MAX);
    let rank = percentile
        .saturating_mul(count)
        .checked_div(PERCENT_DIVISOR)
        .unwrap_or(0);
    let index = usize::try_from(rank)
        .unwrap_or(usize::MAX)
        .min(sorted.len().saturating_sub(1));
    sorted.get(index).copied().unwrap_or(0)
}
