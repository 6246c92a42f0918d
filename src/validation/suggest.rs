use serde_json::Value;

use super::types::{ResponseSnapshot, RuleOperator, RuleType, ValidationRule};

/// Response-time budget for the suggested (disabled) latency rule.
const SUGGESTED_MAX_RESPONSE_MS: u64 = 2000;

/// Proposes a baseline rule set from a sample response.
///
/// The latency rule is emitted disabled so a fresh suite does not fail on
/// a slow first environment.
#[must_use]
pub fn suggest_rules(sample: &ResponseSnapshot) -> Vec<ValidationRule> {
    let mut rules = vec![
        ValidationRule::new(
            format!("Status is {}", sample.status),
            RuleType::Status,
            RuleOperator::Equals,
        )
        .with_expected(sample.status),
    ];

    if let Some(content_type) = sample.header("content-type") {
        let media_type = content_type
            .split(';')
            .next()
            .unwrap_or(content_type)
            .trim();
        if !media_type.is_empty() {
            rules.push(
                ValidationRule::new(
                    format!("Content-Type is {}", media_type),
                    RuleType::Header,
                    RuleOperator::Contains,
                )
                .with_target("content-type")
                .with_expected(media_type),
            );
        }
    }

    match &sample.body {
        Value::Object(fields) => {
            for field in ["success", "data"] {
                if fields.contains_key(field) {
                    rules.push(
                        ValidationRule::new(
                            format!("Response has '{}'", field),
                            RuleType::Body,
                            RuleOperator::Exists,
                        )
                        .with_target(field),
                    );
                }
            }
            if !fields.contains_key("error") {
                rules.push(
                    ValidationRule::new("Response has no 'error'", RuleType::Body, RuleOperator::NotExists)
                        .with_target("error"),
                );
            }
            for (field, value) in fields {
                if value.is_array() {
                    rules.push(non_empty_rule(
                        format!("'{}' is not empty", field),
                        &format!("response[{}]", Value::String(field.clone())),
                    ));
                }
            }
        }
        Value::Array(_) => {
            rules.push(non_empty_rule("Response is not empty".to_owned(), "response"));
        }
        Value::Null | Value::Bool(_) | Value::Number(_) | Value::String(_) => {}
    }

    rules.push(
        ValidationRule::new(
            format!("Responds within {}ms", SUGGESTED_MAX_RESPONSE_MS),
            RuleType::ResponseTime,
            RuleOperator::LessThan,
        )
        .with_expected(SUGGESTED_MAX_RESPONSE_MS)
        .disabled(),
    );

    rules
}

fn non_empty_rule(name: String, subject: &str) -> ValidationRule {
    ValidationRule::new(name, RuleType::Custom, RuleOperator::Custom)
        .with_code(format!("len({}) > 0", subject))
}
