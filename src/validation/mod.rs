//! Response validation: declarative rules, the operator table, JSONPath
//! lookups, the custom-code expression sandbox, and rule suggestion.
mod engine;
pub mod expr;
mod json_path;
mod operators;
mod suggest;
mod types;
mod value;

#[cfg(test)]
mod tests;

pub use engine::{evaluate_legacy_test, response_scope, validate_response};
pub use suggest::suggest_rules;
pub use types::{
    RequestValidationResult, ResponseSnapshot, RuleOperator, RuleType, ValidationResult,
    ValidationRule,
};
pub use value::Comparable;
