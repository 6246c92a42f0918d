use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Bucket used in `errors_by_type` for failures without a message.
pub const UNKNOWN_ERROR: &str = "Unknown Error";

/// Outcome of one issued request. Created once, never mutated.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct RequestResult {
    pub config_name: String,
    /// Completion time, epoch milliseconds.
    pub timestamp_ms: u64,
    pub duration_ms: u64,
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status_code: Option<u16>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub response_size_bytes: Option<u64>,
}

impl RequestResult {
    /// Failure without a response, e.g. a transport error or cancellation.
    #[must_use]
    pub fn transport_failure(
        config_name: impl Into<String>,
        duration_ms: u64,
        message: impl Into<String>,
    ) -> Self {
        Self {
            config_name: config_name.into(),
            timestamp_ms: now_ms(),
            duration_ms,
            success: false,
            status_code: None,
            error: Some(message.into()),
            response_size_bytes: None,
        }
    }

    /// Bucket key for `errors_by_type`.
    #[must_use]
    pub fn error_kind(&self) -> &str {
        self.error.as_deref().unwrap_or(UNKNOWN_ERROR)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TestMetrics {
    pub total_requests: u64,
    pub successful_requests: u64,
    pub failed_requests: u64,
    pub average_response_time_ms: f64,
    pub p50: u64,
    pub p90: u64,
    pub p95: u64,
    pub p99: u64,
    pub max_response_time_ms: u64,
    pub min_response_time_ms: u64,
    #[serde(rename = "currentRPS")]
    pub current_rps: u64,
    pub total_duration_ms: u64,
    pub errors_by_type: BTreeMap<String, u64>,
}

/// Wall clock in epoch milliseconds.
#[must_use]
pub fn now_ms() -> u64 {
    u64::try_from(chrono::Utc::now().timestamp_millis()).unwrap_or(0)
}
