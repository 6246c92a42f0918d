use std::cmp::Ordering;

use super::expr::regex_test;
use super::json_path::resolve_path;
use super::types::RuleOperator;
use super::value::Comparable;

/// Result of applying one operator: the verdict plus the value that was
/// actually compared (JSONPath reports the resolved value, not the body).
pub(crate) struct OperatorOutcome {
    pub(crate) passed: bool,
    pub(crate) actual: Comparable,
}

impl OperatorOutcome {
    const fn new(passed: bool, actual: Comparable) -> Self {
        Self { passed, actual }
    }
}

/// Applies `operator` to `actual` and `expected`.
///
/// # Errors
///
/// Returns a message for a malformed JSONPath or regex, or when called with
/// `RuleOperator::Custom` (custom code is executed by the engine).
pub(crate) fn apply(
    operator: RuleOperator,
    actual: Comparable,
    expected: &Comparable,
    target: Option<&str>,
) -> Result<OperatorOutcome, String> {
    let passed = match operator {
        RuleOperator::Equals => actual.coerce_string() == expected.coerce_string(),
        RuleOperator::NotEquals => actual.coerce_string() != expected.coerce_string(),
        RuleOperator::Contains => actual.contains(expected),
        RuleOperator::NotContains => !actual.contains(expected),
        RuleOperator::GreaterThan => numeric(&actual, expected, |ord| ord == Ordering::Greater),
        RuleOperator::LessThan => numeric(&actual, expected, |ord| ord == Ordering::Less),
        RuleOperator::GreaterThanOrEqual => {
            numeric(&actual, expected, |ord| ord != Ordering::Less)
        }
        RuleOperator::LessThanOrEqual => {
            numeric(&actual, expected, |ord| ord != Ordering::Greater)
        }
        RuleOperator::Exists => !actual.is_nullish(),
        RuleOperator::NotExists => actual.is_nullish(),
        RuleOperator::Regex => regex_test(&actual, &expected.coerce_string())
            .map_err(|err| err.to_string())?
            .is_truthy(),
        RuleOperator::JsonPath => {
            let path = target
                .filter(|path| !path.trim().is_empty())
                .ok_or_else(|| "jsonPath error: rule has no target path".to_owned())?;
            let resolved = resolve_path(&actual, path)
                .map_err(|err| format!("jsonPath error: {}", err))?;
            let passed = resolved.coerce_string() == expected.coerce_string();
            return Ok(OperatorOutcome::new(passed, resolved));
        }
        RuleOperator::Custom => {
            return Err("custom operator requires customCode".to_owned());
        }
    };
    Ok(OperatorOutcome::new(passed, actual))
}

fn numeric(actual: &Comparable, expected: &Comparable, accept: fn(Ordering) -> bool) -> bool {
    actual
        .coerce_number()
        .partial_cmp(&expected.coerce_number())
        .is_some_and(accept)
}
