use std::collections::BTreeMap;

use serde::Deserialize;
use tracing::warn;

use crate::error::{AppError, AppResult, LoadError};

use super::identity::IdentityLookup;

/// Header carrying the anti-forgery token.
pub const ANTI_FORGERY_HEADER: &str = "RequestVerificationToken";

/// Identity and session values shared by every request of a run.
///
/// Populated once before the run starts and read-only afterwards.
#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
pub struct AuthContext {
    #[serde(default, alias = "tenantId")]
    pub tenant_id: Option<String>,
    #[serde(default, alias = "regionId")]
    pub region_id: Option<String>,
    #[serde(default, alias = "bearerToken")]
    pub bearer_token: Option<String>,
    #[serde(default, alias = "antiForgeryToken")]
    pub anti_forgery_token: Option<String>,
}

impl AuthContext {
    /// Ambient auth headers, lowest precedence after suite defaults.
    #[must_use]
    pub fn headers(&self) -> Vec<(String, String)> {
        let mut headers = Vec::new();
        if let Some(token) = non_empty(self.bearer_token.as_deref()) {
            headers.push(("Authorization".to_owned(), format!("Bearer {}", token)));
        }
        if let Some(token) = non_empty(self.anti_forgery_token.as_deref()) {
            headers.push((ANTI_FORGERY_HEADER.to_owned(), token.to_owned()));
        }
        headers
    }

    /// Placeholder values; absent fields substitute as empty strings.
    #[must_use]
    pub fn template_vars(&self) -> BTreeMap<String, String> {
        BTreeMap::from([
            (
                "tenantId".to_owned(),
                self.tenant_id.clone().unwrap_or_default(),
            ),
            (
                "regionId".to_owned(),
                self.region_id.clone().unwrap_or_default(),
            ),
        ])
    }

    /// Merges the looked-up tenant and region into the context.
    ///
    /// # Errors
    ///
    /// Returns the lookup error unchanged; fields are left as they were.
    pub async fn populate(&mut self, lookup: &dyn IdentityLookup) -> AppResult<()> {
        let identity = lookup.lookup().await?;
        if identity.tenant_id.is_some() {
            self.tenant_id = identity.tenant_id;
        }
        if identity.region_id.is_some() {
            self.region_id = identity.region_id;
        }
        Ok(())
    }

    /// Runs `populate`, downgrading a failed lookup to a warning unless
    /// the identity is `required`.
    ///
    /// # Errors
    ///
    /// Returns a setup error when the lookup fails and `required` is set.
    pub async fn populate_identity(
        &mut self,
        lookup: &dyn IdentityLookup,
        required: bool,
    ) -> AppResult<()> {
        match self.populate(lookup).await {
            Ok(()) => Ok(()),
            Err(err) if required => Err(AppError::load(LoadError::SetupFailed {
                message: err.to_string(),
            })),
            Err(err) => {
                warn!(
                    "Identity lookup failed, tenant/region placeholders will be empty: {}",
                    err
                );
                Ok(())
            }
        }
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|value| !value.is_empty())
}
