use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ExprError {
    #[error("Expression is empty.")]
    Empty,
    #[error("Unexpected character '{ch}' at {pos}.")]
    UnexpectedChar { ch: char, pos: usize },
    #[error("Unterminated string starting at {pos}.")]
    UnterminatedString { pos: usize },
    #[error("Invalid number '{value}'.")]
    InvalidNumber { value: String },
    #[error("Unexpected token '{found}', expected {expected}.")]
    UnexpectedToken {
        found: String,
        expected: &'static str,
    },
    #[error("Unexpected end of expression, expected {expected}.")]
    UnexpectedEnd { expected: &'static str },
    #[error("Unknown variable '{name}'.")]
    UnknownVariable { name: String },
    #[error("Unknown function '{name}'.")]
    UnknownFunction { name: String },
    #[error("Function '{name}' expects {expected} argument(s), got {got}.")]
    Arity {
        name: String,
        expected: usize,
        got: usize,
    },
    #[error("Cannot read property '{property}' of {target}.")]
    PropertyOfNothing {
        property: String,
        target: &'static str,
    },
    #[error("Invalid regex '{pattern}': {message}")]
    InvalidRegex { pattern: String, message: String },
    #[error("{message}")]
    Eval { message: String },
    #[error("Expression nesting is too deep.")]
    TooDeep,
}
