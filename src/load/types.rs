use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{AppError, AppResult, LoadError};
use crate::metrics::now_ms;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum RunKind {
    Fixed,
    Timed,
}

impl RunKind {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            RunKind::Fixed => "fixed",
            RunKind::Timed => "timed",
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum RunStatus {
    Running,
    Completed,
    Stopped,
    Failed,
}

impl RunStatus {
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        !matches!(self, RunStatus::Running)
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            RunStatus::Running => "running",
            RunStatus::Completed => "completed",
            RunStatus::Stopped => "stopped",
            RunStatus::Failed => "failed",
        }
    }
}

/// Load strategy and its parameters.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(tag = "mode", rename_all = "lowercase")]
pub enum LoadConfig {
    /// `count` suite executions, at most `concurrency` in flight.
    Fixed { count: u64, concurrency: usize },
    /// One request every `1 / rate_per_second` seconds for the duration.
    Timed {
        duration_minutes: f64,
        rate_per_second: f64,
    },
}

impl LoadConfig {
    #[must_use]
    pub const fn kind(&self) -> RunKind {
        match self {
            LoadConfig::Fixed { .. } => RunKind::Fixed,
            LoadConfig::Timed { .. } => RunKind::Timed,
        }
    }

    /// Rejects parameters that would make the run meaningless.
    ///
    /// # Errors
    ///
    /// Returns a [`LoadError`] for a zero count, zero concurrency, or a
    /// rate or duration that is not a positive, representable span. A rate
    /// so high that its tick period rounds to zero counts as invalid.
    pub fn validate(&self) -> AppResult<()> {
        match *self {
            LoadConfig::Fixed { count, concurrency } => {
                if count == 0 {
                    return Err(AppError::load(LoadError::InvalidCount));
                }
                if concurrency == 0 {
                    return Err(AppError::load(LoadError::InvalidConcurrency));
                }
            }
            LoadConfig::Timed {
                duration_minutes,
                rate_per_second,
            } => {
                if !(rate_per_second.is_finite() && rate_per_second > 0.0) {
                    return Err(AppError::load(LoadError::InvalidRate));
                }
                if !(duration_minutes.is_finite() && duration_minutes > 0.0) {
                    return Err(AppError::load(LoadError::InvalidDuration));
                }
                tick_period(rate_per_second)?;
                run_length(duration_minutes)?;
            }
        }
        Ok(())
    }
}

const SECONDS_PER_MINUTE: f64 = 60.0;

/// Spacing between timed-mode requests.
pub(super) fn tick_period(rate_per_second: f64) -> AppResult<Duration> {
    Duration::try_from_secs_f64(rate_per_second.recip())
        .ok()
        .filter(|period| !period.is_zero())
        .ok_or_else(|| AppError::load(LoadError::InvalidRate))
}

pub(super) fn run_length(duration_minutes: f64) -> AppResult<Duration> {
    Duration::try_from_secs_f64(duration_minutes * SECONDS_PER_MINUTE)
        .ok()
        .filter(|length| !length.is_zero())
        .ok_or_else(|| AppError::load(LoadError::InvalidDuration))
}

/// One load run. Leaves `running` exactly once.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TestRun {
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub kind: RunKind,
    pub status: RunStatus,
    pub start_time_ms: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_time_ms: Option<u64>,
    pub config: LoadConfig,
}

impl TestRun {
    #[must_use]
    pub fn new(name: impl Into<String>, config: LoadConfig) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            name: name.into(),
            kind: config.kind(),
            status: RunStatus::Running,
            start_time_ms: now_ms(),
            end_time_ms: None,
            config,
        }
    }

    /// Moves a running run to `status`. Returns `false` (and changes
    /// nothing) if the run already finished or `status` is `Running`.
    pub fn finish(&mut self, status: RunStatus) -> bool {
        if self.status.is_terminal() || !status.is_terminal() {
            return false;
        }
        self.status = status;
        self.end_time_ms = Some(now_ms().max(self.start_time_ms));
        true
    }
}
