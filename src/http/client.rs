use std::time::Duration;

use reqwest::{Client, Url};

use crate::error::{AppError, AppResult, HttpError};

/// Client request timeout when the suite does not set one.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_millis(30_000);
const DEFAULT_USER_AGENT: &str = concat!("apiload/", env!("CARGO_PKG_VERSION"));

/// Connection-level settings shared by every request of a suite.
#[derive(Debug, Clone)]
pub struct ClientSettings {
    pub base_url: Option<Url>,
    pub timeout: Duration,
    /// Suite-wide default headers, lowest precedence.
    pub headers: Vec<(String, String)>,
}

impl Default for ClientSettings {
    fn default() -> Self {
        Self {
            base_url: None,
            timeout: DEFAULT_TIMEOUT,
            headers: Vec::new(),
        }
    }
}

/// Builds the shared client.
///
/// # Errors
///
/// Returns an error when the TLS backend cannot be initialised.
pub fn build_client(timeout: Duration) -> AppResult<Client> {
    Client::builder()
        .timeout(timeout)
        .user_agent(DEFAULT_USER_AGENT)
        .build()
        .map_err(|source| AppError::http(HttpError::BuildClientFailed { source }))
}

/// # Errors
///
/// Returns an error when `value` is not an absolute URL.
pub fn parse_base_url(value: &str) -> AppResult<Url> {
    Url::parse(value.trim()).map_err(|source| {
        AppError::http(HttpError::InvalidBaseUrl {
            url: value.to_owned(),
            source,
        })
    })
}

/// Absolute `path`s are used as-is; relative ones are appended to
/// `base_url`, keeping any path prefix the base carries.
///
/// # Errors
///
/// Returns an error when `path` is relative and no base is set, or the
/// joined text is not a valid URL.
pub fn resolve_url(base_url: Option<&Url>, path: &str) -> AppResult<Url> {
    if let Ok(absolute) = Url::parse(path)
        && absolute.has_host()
    {
        return Ok(absolute);
    }
    let base = base_url.ok_or_else(|| {
        AppError::http(HttpError::BaseUrlRequired {
            path: path.to_owned(),
        })
    })?;
    let joined = if path.is_empty() {
        base.as_str().to_owned()
    } else {
        format!(
            "{}/{}",
            base.as_str().trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    };
    Url::parse(&joined).map_err(|source| {
        AppError::http(HttpError::JoinUrlFailed {
            url: joined,
            source,
        })
    })
}
