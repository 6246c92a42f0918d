use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::args::HttpMethod;
use crate::validation::ValidationRule;

/// A named, reusable HTTP request template: one step of a suite.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RequestSpec {
    pub name: String,
    #[serde(default)]
    pub method: HttpMethod,
    pub path: String,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub headers: BTreeMap<String, String>,
    /// Query parameters for GET/DELETE, JSON body otherwise.
    #[serde(default, alias = "input_params", skip_serializing_if = "Option::is_none")]
    pub input_params: Option<Value>,
    /// Legacy boolean expression, used when no rule is enabled.
    #[serde(default, rename = "test", alias = "legacyTest", alias = "legacy_test")]
    pub legacy_test: String,
    #[serde(default, alias = "validation_rules", skip_serializing_if = "Vec::is_empty")]
    pub validation_rules: Vec<ValidationRule>,
}

impl RequestSpec {
    #[must_use]
    pub fn new(name: impl Into<String>, method: HttpMethod, path: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            method,
            path: path.into(),
            headers: BTreeMap::new(),
            input_params: None,
            legacy_test: String::new(),
            validation_rules: Vec::new(),
        }
    }

    #[must_use]
    pub fn has_enabled_rules(&self) -> bool {
        self.validation_rules.iter().any(|rule| rule.enabled)
    }
}
