use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum RuleType {
    Status,
    Header,
    Body,
    ResponseTime,
    Size,
    Custom,
}

#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum RuleOperator {
    Equals,
    NotEquals,
    Contains,
    NotContains,
    GreaterThan,
    LessThan,
    GreaterThanOrEqual,
    LessThanOrEqual,
    Exists,
    NotExists,
    Regex,
    JsonPath,
    Custom,
}

/// A declarative assertion evaluated against one response.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ValidationRule {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(rename = "type")]
    pub rule_type: RuleType,
    pub operator: RuleOperator,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target: Option<String>,
    #[serde(
        default,
        alias = "expected_value",
        skip_serializing_if = "Option::is_none"
    )]
    pub expected_value: Option<Value>,
    #[serde(default, alias = "custom_code", skip_serializing_if = "Option::is_none")]
    pub custom_code: Option<String>,
    #[serde(default = "default_enabled")]
    pub enabled: bool,
}

const fn default_enabled() -> bool {
    true
}

impl ValidationRule {
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        rule_type: RuleType,
        operator: RuleOperator,
    ) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            name: name.into(),
            rule_type,
            operator,
            target: None,
            expected_value: None,
            custom_code: None,
            enabled: true,
        }
    }

    #[must_use]
    pub fn with_target(mut self, target: impl Into<String>) -> Self {
        self.target = Some(target.into());
        self
    }

    #[must_use]
    pub fn with_expected(mut self, expected: impl Into<Value>) -> Self {
        self.expected_value = Some(expected.into());
        self
    }

    #[must_use]
    pub fn with_code(mut self, code: impl Into<String>) -> Self {
        self.custom_code = Some(code.into());
        self
    }

    #[must_use]
    pub const fn disabled(mut self) -> Self {
        self.enabled = false;
        self
    }

    pub(crate) const fn runs_custom_code(&self) -> bool {
        matches!(self.rule_type, RuleType::Custom) || matches!(self.operator, RuleOperator::Custom)
    }
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ValidationResult {
    pub rule_id: String,
    pub rule_name: String,
    pub passed: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub actual_value: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expected_value: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RequestValidationResult {
    pub passed: bool,
    pub results: Vec<ValidationResult>,
    pub execution_time_ms: f64,
}

/// Everything a rule may look at: the parsed body plus response metadata.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResponseSnapshot {
    pub status: u16,
    /// Header names as delivered by the client.
    pub headers: BTreeMap<String, String>,
    /// Parsed JSON when the content type says so, otherwise the raw text.
    pub body: Value,
    pub response_time_ms: u64,
    pub size_bytes: u64,
}

impl ResponseSnapshot {
    /// Exact header-name match first, then a case-insensitive one.
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        if let Some(value) = self.headers.get(name) {
            return Some(value.as_str());
        }
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }
}
