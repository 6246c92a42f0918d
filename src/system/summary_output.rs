use serde_json::Value;

use crate::http::ExecutionDetail;
use crate::load::{RunSummary, TestRun};
use crate::metrics::TestMetrics;

/// Milliseconds per second.
const MS_PER_SEC: u64 = 1_000;

pub(crate) fn run_status_line(run: &TestRun, summary: Option<&RunSummary>) -> String {
    let head = format!(
        "Run {} ({}): {}",
        run.name,
        run.kind.as_str(),
        run.status.as_str()
    );
    match summary {
        Some(summary) => format!(
            "{} after {}.{:03}s, {} requests, {} suite executions, peak in flight {}",
            head,
            summary.elapsed.as_secs(),
            summary.elapsed.subsec_millis(),
            summary.requests,
            summary.iterations,
            summary.peak_in_flight
        ),
        None => head,
    }
}

pub(crate) fn metrics_lines(metrics: &TestMetrics) -> Vec<String> {
    let mut lines = Vec::new();
    lines.push(format!(
        "Duration: {}.{:03}s",
        metrics.total_duration_ms / MS_PER_SEC,
        metrics.total_duration_ms % MS_PER_SEC
    ));
    lines.push(format!("Total Requests: {}", metrics.total_requests));
    lines.push(format!(
        "Successful: {} ({})",
        metrics.successful_requests,
        success_rate(metrics)
    ));
    lines.push(format!("Failed: {}", metrics.failed_requests));
    lines.push(format!(
        "Avg Latency: {:.2}ms",
        metrics.average_response_time_ms
    ));
    lines.push(format!(
        "Min/Max Latency: {}ms / {}ms",
        metrics.min_response_time_ms, metrics.max_response_time_ms
    ));
    lines.push(format!(
        "P50/P90/P95/P99 Latency: {}ms / {}ms / {}ms / {}ms",
        metrics.p50, metrics.p90, metrics.p95, metrics.p99
    ));
    lines.push(format!("Current RPS: {}", metrics.current_rps));
    if !metrics.errors_by_type.is_empty() {
        lines.push("Errors:".to_owned());
        for (kind, count) in &metrics.errors_by_type {
            lines.push(format!("  {}: {}", kind, count));
        }
    }
    lines
}

/// Outcome and per-rule detail for one request of a single run.
pub(crate) fn validation_lines(detail: &ExecutionDetail) -> Vec<String> {
    let result = &detail.result;
    let mut lines = Vec::new();
    let status = result
        .status_code
        .map_or_else(|| "-".to_owned(), |code| code.to_string());
    lines.push(format!(
        "{} {}: status {} in {}ms",
        if result.success { "PASS" } else { "FAIL" },
        result.config_name,
        status,
        result.duration_ms
    ));
    if let Some(error) = result.error.as_deref() {
        lines.push(format!("  error: {}", error));
    }
    let Some(validation) = detail.validation.as_ref() else {
        return lines;
    };
    for rule in &validation.results {
        let mut parts = vec![format!(
            "  [{}] {}",
            if rule.passed { "ok" } else { "failed" },
            rule.rule_name
        )];
        if let Some(actual) = rule.actual_value.as_ref() {
            parts.push(format!("actual={}", compact(actual)));
        }
        if let Some(expected) = rule.expected_value.as_ref() {
            parts.push(format!("expected={}", compact(expected)));
        }
        if let Some(error) = rule.error.as_deref() {
            parts.push(format!("error={}", error));
        }
        lines.push(parts.join(" "));
    }
    lines
}

fn success_rate(metrics: &TestMetrics) -> String {
    if metrics.total_requests == 0 {
        return "0.00%".to_owned();
    }
    let rate_x100 = metrics
        .successful_requests
        .saturating_mul(10_000)
        .checked_div(metrics.total_requests)
        .unwrap_or_default();
    format!("{}.{:02}%", rate_x100 / 100, rate_x100 % 100)
}

fn compact(value: &Value) -> String {
    match value {
        Value::String(text) => format!("{:?}", text),
        other => other.to_string(),
    }
}
