use std::collections::BTreeMap;

use serde::Deserialize;

use crate::auth::AuthContext;
use crate::http::RequestSpec;

/// A request suite plus the settings needed to run it.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SuiteFile {
    /// Run name shown in summaries; defaults to the suite file stem.
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default, alias = "baseUrl")]
    pub base_url: Option<String>,
    #[serde(default, alias = "timeoutMs")]
    pub timeout_ms: Option<u64>,
    /// Sent with every request; auth and per-request headers win.
    #[serde(default)]
    pub headers: BTreeMap<String, String>,
    #[serde(default)]
    pub auth: Option<AuthContext>,
    /// "Current user" endpoint returning `tenantId`/`regionId`.
    #[serde(default, alias = "identityUrl")]
    pub identity_url: Option<String>,
    /// Fail the run instead of warning when the identity lookup fails.
    #[serde(default, alias = "identityRequired")]
    pub identity_required: bool,
    #[serde(default)]
    pub requests: Vec<RequestSpec>,
    #[serde(default)]
    pub load: Option<LoadSection>,
}

#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LoadMode {
    Fixed,
    Timed,
}

/// Default load parameters; command-line values override them.
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
pub struct LoadSection {
    #[serde(default)]
    pub mode: Option<LoadMode>,
    #[serde(default)]
    pub count: Option<u64>,
    #[serde(default)]
    pub concurrency: Option<usize>,
    #[serde(default, alias = "durationMinutes")]
    pub duration_minutes: Option<f64>,
    #[serde(default, alias = "ratePerSecond")]
    pub rate_per_second: Option<f64>,
}
