//! Sandboxed expression language for custom rules and legacy tests.
//!
//! Expressions are side-effect free: no assignment, loops, or I/O. They see
//! only the variables placed in a [`Scope`] and the built-in helpers
//! (`len`, `contains`, `matches`, `base64.encode`, `json.parse`, ...).
mod eval;
mod lexer;
mod parser;

#[cfg(test)]
mod tests;

use crate::error::ExprError;

use super::value::Comparable;

pub use eval::Scope;
pub(crate) use eval::regex_test;

/// A parsed expression, reusable across evaluations.
#[derive(Debug, Clone)]
pub struct Expression {
    root: parser::Expr,
}

impl Expression {
    /// Parses `source`. A leading `return` and trailing `;` are accepted.
    ///
    /// # Errors
    ///
    /// Returns an error when the source is blank or not a valid expression.
    pub fn parse(source: &str) -> Result<Self, ExprError> {
        let tokens = lexer::tokenize(source)?;
        let root = parser::Parser::new(tokens).parse_program()?;
        Ok(Self { root })
    }

    /// Evaluates against `scope`.
    ///
    /// # Errors
    ///
    /// Returns an error on unknown names, property access on null/undefined,
    /// wrong arity, or a failing helper.
    pub fn evaluate(&self, scope: &Scope) -> Result<Comparable, ExprError> {
        eval::evaluate(&self.root, scope)
    }
}

/// Parses and evaluates in one step.
///
/// # Errors
///
/// Returns an error when parsing or evaluation fails.
pub fn evaluate(source: &str, scope: &Scope) -> Result<Comparable, ExprError> {
    Expression::parse(source)?.evaluate(scope)
}
