use std::collections::BTreeMap;
use std::time::Instant;

use reqwest::header::{CONTENT_TYPE, HeaderMap, HeaderName, HeaderValue};
use reqwest::{Client, Request, Url};
use serde_json::Value;
use tracing::debug;

use crate::auth::{AuthContext, substitute_payload};
use crate::error::{AppError, AppResult, HttpError};
use crate::load::CancelToken;
use crate::metrics::{RequestResult, now_ms};
use crate::validation::{
    Comparable, RequestValidationResult, ResponseSnapshot, evaluate_legacy_test,
    validate_response,
};

use super::body::{drain_response_body, parse_body};
use super::client::{ClientSettings, resolve_url};
use super::spec::RequestSpec;

const CANCELLED_MESSAGE: &str = "Request cancelled";

/// Everything observed for one request; used by single-request runs.
#[derive(Debug, Clone)]
pub struct ExecutionDetail {
    pub result: RequestResult,
    /// Absent when no response was received.
    pub snapshot: Option<ResponseSnapshot>,
    /// Present when validation rules ran.
    pub validation: Option<RequestValidationResult>,
}

/// Issues one request per call. Never returns an error: every failure is
/// folded into the [`RequestResult`].
#[derive(Debug, Clone)]
pub struct RequestExecutor {
    client: Client,
    base_url: Option<Url>,
    default_headers: Vec<(String, String)>,
}

impl RequestExecutor {
    #[must_use]
    pub fn new(client: Client, settings: &ClientSettings) -> Self {
        Self {
            client,
            base_url: settings.base_url.clone(),
            default_headers: settings.headers.clone(),
        }
    }

    #[must_use]
    pub const fn client(&self) -> &Client {
        &self.client
    }

    pub async fn execute(
        &self,
        spec: &RequestSpec,
        auth: &AuthContext,
        cancel: &CancelToken,
    ) -> RequestResult {
        self.execute_detailed(spec, auth, cancel).await.result
    }

    pub async fn execute_detailed(
        &self,
        spec: &RequestSpec,
        auth: &AuthContext,
        cancel: &CancelToken,
    ) -> ExecutionDetail {
        let request = match self.build_request(spec, auth) {
            Ok(request) => request,
            Err(err) => {
                debug!("Request '{}' could not be built: {}", spec.name, err);
                return ExecutionDetail::failed(RequestResult::transport_failure(
                    spec.name.as_str(),
                    0,
                    err.to_string(),
                ));
            }
        };

        let started = Instant::now();
        tokio::select! {
            detail = self.send(spec, request, started) => detail,
            () = cancel.cancelled() => ExecutionDetail::failed(RequestResult::transport_failure(
                spec.name.as_str(),
                elapsed_ms(started),
                CANCELLED_MESSAGE,
            )),
        }
    }

    fn build_request(&self, spec: &RequestSpec, auth: &AuthContext) -> AppResult<Request> {
        let url = resolve_url(self.base_url.as_ref(), &spec.path)?;
        let mut builder = self
            .client
            .request(spec.method.into(), url)
            .headers(self.merged_headers(spec, auth)?);

        if let Some(params) = spec.input_params.as_ref() {
            let params = substitute_payload(params, auth);
            if spec.method.sends_query() {
                builder = builder.query(&query_pairs(&params));
            } else {
                builder = builder.json(&params);
            }
        }

        Ok(builder.build()?)
    }

    /// Suite defaults, then auth headers, then the spec's own headers.
    pub(super) fn merged_headers(&self, spec: &RequestSpec, auth: &AuthContext) -> AppResult<HeaderMap> {
        let mut headers = HeaderMap::new();
        let layers = self
            .default_headers
            .iter()
            .cloned()
            .chain(auth.headers())
            .chain(spec.headers.iter().map(|(key, value)| (key.clone(), value.clone())));
        for (key, value) in layers {
            let name = HeaderName::from_bytes(key.as_bytes()).map_err(|source| {
                AppError::http(HttpError::InvalidHeaderName {
                    header: key.clone(),
                    source,
                })
            })?;
            let value = HeaderValue::from_str(&value).map_err(|source| {
                AppError::http(HttpError::InvalidHeaderValue {
                    header: key.clone(),
                    source,
                })
            })?;
            headers.insert(name, value);
        }
        Ok(headers)
    }

    async fn send(&self, spec: &RequestSpec, request: Request, started: Instant) -> ExecutionDetail {
        let response = match self.client.execute(request).await {
            Ok(response) => response,
            Err(err) => {
                debug!("Request '{}' failed: {}", spec.name, err);
                return ExecutionDetail::failed(RequestResult::transport_failure(
                    spec.name.as_str(),
                    elapsed_ms(started),
                    err.to_string(),
                ));
            }
        };

        let status = response.status();
        let headers = header_map(response.headers());
        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .map(str::to_owned);
        let (bytes, size_bytes) = match drain_response_body(response).await {
            Ok(drained) => drained,
            Err(err) => {
                debug!("Request '{}' body read failed: {}", spec.name, err);
                return ExecutionDetail::failed(RequestResult::transport_failure(
                    spec.name.as_str(),
                    elapsed_ms(started),
                    err.to_string(),
                ));
            }
        };
        let duration_ms = elapsed_ms(started);

        let snapshot = ResponseSnapshot {
            status: status.as_u16(),
            headers,
            body: parse_body(content_type.as_deref(), &bytes),
            response_time_ms: duration_ms,
            size_bytes,
        };
        let mut result = RequestResult {
            config_name: spec.name.clone(),
            timestamp_ms: now_ms(),
            duration_ms,
            success: false,
            status_code: Some(snapshot.status),
            error: None,
            response_size_bytes: Some(size_bytes),
        };

        if !status.is_success() {
            result.error = Some(format!("HTTP {}", snapshot.status));
            debug!("Request '{}' -> {}", spec.name, snapshot.status);
            return ExecutionDetail {
                result,
                snapshot: Some(snapshot),
                validation: None,
            };
        }

        let validation = if spec.has_enabled_rules() {
            let validation = validate_response(&snapshot, &spec.validation_rules);
            result.success = validation.passed;
            Some(validation)
        } else {
            result.success = evaluate_legacy_test(&spec.legacy_test, &snapshot);
            None
        };
        debug!(
            "Request '{}' -> {} in {}ms (success={})",
            spec.name, snapshot.status, duration_ms, result.success
        );

        ExecutionDetail {
            result,
            snapshot: Some(snapshot),
            validation,
        }
    }
}

impl ExecutionDetail {
    const fn failed(result: RequestResult) -> Self {
        Self {
            result,
            snapshot: None,
            validation: None,
        }
    }
}

/// Flattens an object payload into query pairs; nulls are skipped and
/// non-object payloads send nothing.
pub(super) fn query_pairs(params: &Value) -> Vec<(String, String)> {
    let Value::Object(fields) = params else {
        debug!("Ignoring non-object query params");
        return Vec::new();
    };
    fields
        .iter()
        .filter(|(_, value)| !value.is_null())
        .map(|(key, value)| (key.clone(), Comparable::from_json(value).coerce_string()))
        .collect()
}

fn header_map(headers: &HeaderMap) -> BTreeMap<String, String> {
    let mut map: BTreeMap<String, String> = BTreeMap::new();
    for (name, value) in headers {
        let Ok(value) = value.to_str() else {
            continue;
        };
        map.entry(name.as_str().to_owned())
            .and_modify(|existing| {
                existing.push_str(", ");
                existing.push_str(value);
            })
            .or_insert_with(|| value.to_owned());
    }
    map
}

fn elapsed_ms(started: Instant) -> u64 {
    u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX)
}
