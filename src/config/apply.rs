use std::time::Duration;

use reqwest::Url;

use crate::args::{FixedArgs, SuiteArgs, TimedArgs};
use crate::auth::AuthContext;
use crate::error::{AppError, AppResult, ConfigError};
use crate::http::{ClientSettings, DEFAULT_TIMEOUT, RequestSpec, parse_base_url};
use crate::load::LoadConfig;

use super::types::{LoadMode, LoadSection, SuiteFile};

/// Client settings from the suite, with command-line overrides applied.
///
/// # Errors
///
/// Returns an error when the effective base URL is invalid.
pub fn client_settings(suite: &SuiteFile, args: &SuiteArgs) -> AppResult<ClientSettings> {
    let base_url = args
        .base_url
        .as_deref()
        .or(suite.base_url.as_deref())
        .map(parse_base_url)
        .transpose()?;
    let timeout = args
        .timeout
        .or_else(|| suite.timeout_ms.map(Duration::from_millis))
        .unwrap_or(DEFAULT_TIMEOUT);
    let mut headers: Vec<(String, String)> = suite
        .headers
        .iter()
        .map(|(key, value)| (key.clone(), value.clone()))
        .collect();
    headers.extend(args.headers.iter().cloned());

    Ok(ClientSettings {
        base_url,
        timeout,
        headers,
    })
}

/// Static auth from the suite; `--bearer-token` replaces the suite token.
#[must_use]
pub fn auth_context(suite: &SuiteFile, args: &SuiteArgs) -> AuthContext {
    let mut auth = suite.auth.clone().unwrap_or_default();
    if let Some(token) = args.bearer_token.as_ref() {
        auth.bearer_token = Some(token.clone());
    }
    auth
}

/// # Errors
///
/// Returns an error when the configured identity URL does not resolve.
pub fn identity_url(suite: &SuiteFile, settings: &ClientSettings) -> AppResult<Option<Url>> {
    suite
        .identity_url
        .as_deref()
        .map(|url| crate::http::resolve_url(settings.base_url.as_ref(), url))
        .transpose()
}

/// The whole suite, or the single request called `name`.
///
/// # Errors
///
/// Returns an error when the suite is empty or has no such request.
pub fn select_requests(suite: &SuiteFile, name: Option<&str>) -> AppResult<Vec<RequestSpec>> {
    if suite.requests.is_empty() {
        return Err(AppError::config(ConfigError::NoRequests));
    }
    let Some(name) = name else {
        return Ok(suite.requests.clone());
    };
    suite
        .requests
        .iter()
        .find(|spec| spec.name == name)
        .map(|spec| vec![spec.clone()])
        .ok_or_else(|| {
            AppError::config(ConfigError::UnknownRequest {
                name: name.to_owned(),
            })
        })
}

/// # Errors
///
/// Returns an error when neither the command line nor the suite sets the
/// count or concurrency.
pub fn fixed_load_config(suite: &SuiteFile, args: &FixedArgs) -> AppResult<LoadConfig> {
    let load = load_defaults(suite, LoadMode::Fixed);
    let count = args
        .count
        .map(|count| count.get())
        .or(load.count)
        .ok_or_else(|| missing("fixed", "count"))?;
    let concurrency = args
        .concurrency
        .map(|concurrency| concurrency.get())
        .or(load.concurrency)
        .ok_or_else(|| missing("fixed", "concurrency"))?;
    Ok(LoadConfig::Fixed { count, concurrency })
}

/// # Errors
///
/// Returns an error when neither the command line nor the suite sets the
/// duration or rate.
pub fn timed_load_config(suite: &SuiteFile, args: &TimedArgs) -> AppResult<LoadConfig> {
    let load = load_defaults(suite, LoadMode::Timed);
    let duration_minutes = args
        .duration_minutes
        .or(load.duration_minutes)
        .ok_or_else(|| missing("timed", "duration_minutes"))?;
    let rate_per_second = args
        .rate
        .or(load.rate_per_second)
        .ok_or_else(|| missing("timed", "rate_per_second"))?;
    Ok(LoadConfig::Timed {
        duration_minutes,
        rate_per_second,
    })
}

/// The suite's load section, unless it is pinned to the other mode.
fn load_defaults(suite: &SuiteFile, mode: LoadMode) -> LoadSection {
    suite
        .load
        .clone()
        .filter(|load| load.mode.is_none_or(|pinned| pinned == mode))
        .unwrap_or_default()
}

fn missing(mode: &'static str, field: &'static str) -> AppError {
    AppError::config(ConfigError::MissingLoadField { mode, field })
}
