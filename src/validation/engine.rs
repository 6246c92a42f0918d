use std::time::Instant;

use serde_json::Value;
use tracing::{debug, warn};

use super::expr::{Expression, Scope};
use super::json_path::resolve_path;
use super::operators::apply;
use super::types::{
    RequestValidationResult, ResponseSnapshot, RuleOperator, RuleType, ValidationResult,
    ValidationRule,
};
use super::value::Comparable;

/// Evaluates every enabled rule against `response`.
///
/// Rules are independent: a failing or erroring rule never stops the
/// others, and an empty (or fully disabled) rule set passes.
#[must_use]
pub fn validate_response(
    response: &ResponseSnapshot,
    rules: &[ValidationRule],
) -> RequestValidationResult {
    let started = Instant::now();
    let mut scope = None;
    let results: Vec<ValidationResult> = rules
        .iter()
        .filter(|rule| rule.enabled)
        .map(|rule| evaluate_rule(rule, response, &mut scope))
        .collect();
    let passed = results.iter().all(|result| result.passed);

    RequestValidationResult {
        passed,
        results,
        execution_time_ms: started.elapsed().as_secs_f64() * 1000.0,
    }
}

/// Variables exposed to custom code and legacy tests.
#[must_use]
pub fn response_scope(response: &ResponseSnapshot) -> Scope {
    let headers = response
        .headers
        .iter()
        .map(|(key, value)| (key.clone(), Comparable::Text(value.clone())))
        .collect();
    Scope::new()
        .with("response", Comparable::from_json(&response.body))
        .with("status", Comparable::Number(f64::from(response.status)))
        .with("headers", Comparable::Map(headers))
        .with(
            "responseTime",
            Comparable::Number(response.response_time_ms as f64),
        )
        .with(
            "responseSize",
            Comparable::Number(response.size_bytes as f64),
        )
}

/// Evaluates a legacy boolean test expression. Blank or failing
/// expressions count as a failed test.
#[must_use]
pub fn evaluate_legacy_test(expression: &str, response: &ResponseSnapshot) -> bool {
    if expression.trim().is_empty() {
        return false;
    }
    match Expression::parse(expression).and_then(|expr| expr.evaluate(&response_scope(response)))
    {
        Ok(value) => value.is_truthy(),
        Err(err) => {
            warn!("Legacy test expression failed: {}", err);
            false
        }
    }
}

fn evaluate_rule(
    rule: &ValidationRule,
    response: &ResponseSnapshot,
    scope: &mut Option<Scope>,
) -> ValidationResult {
    let mut result = ValidationResult {
        rule_id: rule.id.clone(),
        rule_name: rule.name.clone(),
        passed: false,
        actual_value: None,
        expected_value: rule.expected_value.clone(),
        error: None,
    };

    if rule.runs_custom_code() {
        let scope = scope.get_or_insert_with(|| response_scope(response));
        match run_custom(rule, scope) {
            Ok(outcome) => {
                result.passed = outcome.passed;
                result.actual_value = outcome.actual_value;
                result.error = outcome.error;
            }
            Err(message) => result.error = Some(message),
        }
        return result;
    }

    let outcome = extract_actual(rule, response).and_then(|actual| {
        let expected = Comparable::from_optional(rule.expected_value.as_ref());
        apply(rule.operator, actual, &expected, rule.target.as_deref())
    });
    match outcome {
        Ok(outcome) => {
            result.passed = outcome.passed;
            result.actual_value = outcome.actual.to_json();
        }
        Err(message) => {
            debug!("Rule '{}' errored: {}", rule.name, message);
            result.error = Some(message);
        }
    }
    result
}

fn extract_actual(rule: &ValidationRule, response: &ResponseSnapshot) -> Result<Comparable, String> {
    let target = rule.target.as_deref().map(str::trim).filter(|target| !target.is_empty());
    match rule.rule_type {
        RuleType::Status => Ok(Comparable::Number(f64::from(response.status))),
        RuleType::Header => {
            let name = target.ok_or_else(|| "header rule has no target header name".to_owned())?;
            Ok(response
                .header(name)
                .map_or(Comparable::Undefined, |value| Comparable::Text(value.to_owned())))
        }
        RuleType::Body => {
            let body = Comparable::from_json(&response.body);
            match target {
                // jsonPath resolves the target itself
                Some(path) if rule.operator != RuleOperator::JsonPath => {
                    resolve_path(&body, path).map_err(|err| format!("jsonPath error: {}", err))
                }
                _ => Ok(body),
            }
        }
        RuleType::ResponseTime => Ok(Comparable::Number(response.response_time_ms as f64)),
        RuleType::Size => Ok(Comparable::Number(response.size_bytes as f64)),
        RuleType::Custom => Ok(Comparable::Undefined),
    }
}

struct CustomOutcome {
    passed: bool,
    actual_value: Option<Value>,
    error: Option<String>,
}

/// Runs a rule's custom code. A boolean is the verdict; a map is read as
/// `{ passed, actualValue?, error? }`; anything else counts by truthiness.
fn run_custom(rule: &ValidationRule, scope: &Scope) -> Result<CustomOutcome, String> {
    let code = rule
        .custom_code
        .as_deref()
        .filter(|code| !code.trim().is_empty())
        .ok_or_else(|| "custom rule has no customCode".to_owned())?;
    let value = Expression::parse(code)
        .and_then(|expr| expr.evaluate(scope))
        .map_err(|err| format!("custom code error: {}", err))?;

    Ok(match value {
        Comparable::Bool(passed) => CustomOutcome {
            passed,
            actual_value: None,
            error: None,
        },
        Comparable::Map(fields) if fields.contains_key("passed") => CustomOutcome {
            passed: fields.get("passed").is_some_and(Comparable::is_truthy),
            actual_value: fields.get("actualValue").and_then(Comparable::to_json),
            error: fields
                .get("error")
                .filter(|error| !error.is_nullish())
                .map(Comparable::coerce_string),
        },
        other => CustomOutcome {
            passed: other.is_truthy(),
            actual_value: other.to_json(),
            error: None,
        },
    })
}
