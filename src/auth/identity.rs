use async_trait::async_trait;
use reqwest::{Client, Url};
use serde_json::Value;

use crate::error::{AppError, AppResult, HttpError};

/// Tenant and region reported by the "current user" endpoint.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Identity {
    pub tenant_id: Option<String>,
    pub region_id: Option<String>,
}

impl Identity {
    /// Reads `tenantId`/`regionId` (or snake_case) from a JSON document.
    /// Numeric ids are stringified.
    #[must_use]
    pub fn from_json(body: &Value) -> Self {
        Self {
            tenant_id: field(body, &["tenantId", "tenant_id"]),
            region_id: field(body, &["regionId", "region_id"]),
        }
    }
}

fn field(body: &Value, names: &[&str]) -> Option<String> {
    names
        .iter()
        .find_map(|name| body.get(*name))
        .and_then(|value| match value {
            Value::String(text) => Some(text.clone()),
            Value::Number(number) => Some(number.to_string()),
            Value::Null | Value::Bool(_) | Value::Array(_) | Value::Object(_) => None,
        })
}

#[async_trait]
pub trait IdentityLookup: Send + Sync {
    async fn lookup(&self) -> AppResult<Identity>;
}

/// Looks the identity up with a GET against a fixed URL.
#[derive(Debug, Clone)]
pub struct HttpIdentityLookup {
    client: Client,
    url: Url,
}

impl HttpIdentityLookup {
    #[must_use]
    pub const fn new(client: Client, url: Url) -> Self {
        Self { client, url }
    }
}

#[async_trait]
impl IdentityLookup for HttpIdentityLookup {
    async fn lookup(&self) -> AppResult<Identity> {
        let response = self
            .client
            .get(self.url.clone())
            .send()
            .await
            .map_err(|source| AppError::http(HttpError::IdentityRequest { source }))?;
        let status = response.status();
        if !status.is_success() {
            return Err(AppError::http(HttpError::IdentityStatus {
                status: status.as_u16(),
            }));
        }
        let body: Value = response
            .json()
            .await
            .map_err(|source| AppError::http(HttpError::IdentityRequest { source }))?;
        Ok(Identity::from_json(&body))
    }
}
