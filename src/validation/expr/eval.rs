use std::cmp::Ordering;
use std::collections::BTreeMap;

use base64::{Engine as _, engine::general_purpose::STANDARD as B64};
use regex::RegexBuilder;

use crate::error::ExprError;
use crate::validation::value::Comparable;

use super::parser::{BinaryOp, Expr};

/// Variables visible to an expression.
#[derive(Debug, Clone, Default)]
pub struct Scope {
    vars: BTreeMap<String, Comparable>,
}

impl Scope {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with(mut self, name: &str, value: Comparable) -> Self {
        self.vars.insert(name.to_owned(), value);
        self
    }

    fn get(&self, name: &str) -> Result<&Comparable, ExprError> {
        self.vars
            .get(name)
            .ok_or_else(|| ExprError::UnknownVariable {
                name: name.to_owned(),
            })
    }
}

pub(super) fn evaluate(expr: &Expr, scope: &Scope) -> Result<Comparable, ExprError> {
    match expr {
        Expr::Number(number) => Ok(Comparable::Number(*number)),
        Expr::Str(text) => Ok(Comparable::Text(text.clone())),
        Expr::Bool(flag) => Ok(Comparable::Bool(*flag)),
        Expr::Null => Ok(Comparable::Null),
        Expr::Undefined => Ok(Comparable::Undefined),
        Expr::Var(name) => scope.get(name).cloned(),
        Expr::List(items) => items
            .iter()
            .map(|item| evaluate(item, scope))
            .collect::<Result<Vec<_>, _>>()
            .map(Comparable::List),
        Expr::Object(fields) => {
            let mut map = BTreeMap::new();
            for (key, value) in fields {
                map.insert(key.clone(), evaluate(value, scope)?);
            }
            Ok(Comparable::Map(map))
        }
        Expr::Member(target, property) => {
            let target = evaluate(target, scope)?;
            member(&target, property)
        }
        Expr::Index(target, index) => {
            let target = evaluate(target, scope)?;
            let index = evaluate(index, scope)?;
            index_value(&target, &index)
        }
        Expr::Call(name, args) => {
            let values = evaluate_args(args, scope)?;
            call_function(name, &values)
        }
        Expr::Method(target, name, args) => {
            let target = evaluate(target, scope)?;
            let values = evaluate_args(args, scope)?;
            call_method(&target, name, &values)
        }
        Expr::Not(inner) => Ok(Comparable::Bool(!evaluate(inner, scope)?.is_truthy())),
        Expr::Neg(inner) => Ok(Comparable::Number(-evaluate(inner, scope)?.coerce_number())),
        Expr::And(left, right) => {
            let left = evaluate(left, scope)?;
            if !left.is_truthy() {
                return Ok(left);
            }
            evaluate(right, scope)
        }
        Expr::Or(left, right) => {
            let left = evaluate(left, scope)?;
            if left.is_truthy() {
                return Ok(left);
            }
            evaluate(right, scope)
        }
        Expr::Ternary(condition, then, otherwise) => {
            if evaluate(condition, scope)?.is_truthy() {
                evaluate(then, scope)
            } else {
                evaluate(otherwise, scope)
            }
        }
        Expr::Binary(op, left, right) => {
            let left = evaluate(left, scope)?;
            let right = evaluate(right, scope)?;
            Ok(binary(*op, &left, &right))
        }
    }
}

fn evaluate_args(args: &[Expr], scope: &Scope) -> Result<Vec<Comparable>, ExprError> {
    args.iter().map(|arg| evaluate(arg, scope)).collect()
}

fn binary(op: BinaryOp, left: &Comparable, right: &Comparable) -> Comparable {
    let ordering = || left.compare(right);
    match op {
        BinaryOp::Add => {
            if matches!(left, Comparable::Text(_)) || matches!(right, Comparable::Text(_)) {
                Comparable::Text(format!("{}{}", left.coerce_string(), right.coerce_string()))
            } else {
                Comparable::Number(left.coerce_number() + right.coerce_number())
            }
        }
        BinaryOp::Sub => Comparable::Number(left.coerce_number() - right.coerce_number()),
        BinaryOp::Mul => Comparable::Number(left.coerce_number() * right.coerce_number()),
        BinaryOp::Div => Comparable::Number(left.coerce_number() / right.coerce_number()),
        BinaryOp::Rem => Comparable::Number(left.coerce_number() % right.coerce_number()),
        BinaryOp::Lt => Comparable::Bool(ordering() == Some(Ordering::Less)),
        BinaryOp::Le => Comparable::Bool(matches!(
            ordering(),
            Some(Ordering::Less | Ordering::Equal)
        )),
        BinaryOp::Gt => Comparable::Bool(ordering() == Some(Ordering::Greater)),
        BinaryOp::Ge => Comparable::Bool(matches!(
            ordering(),
            Some(Ordering::Greater | Ordering::Equal)
        )),
        BinaryOp::LooseEq => Comparable::Bool(left.loose_eq(right)),
        BinaryOp::LooseNe => Comparable::Bool(!left.loose_eq(right)),
        BinaryOp::StrictEq => Comparable::Bool(left.strict_eq(right)),
        BinaryOp::StrictNe => Comparable::Bool(!left.strict_eq(right)),
    }
}

fn member(target: &Comparable, property: &str) -> Result<Comparable, ExprError> {
    match target {
        Comparable::Undefined | Comparable::Null => Err(ExprError::PropertyOfNothing {
            property: property.to_owned(),
            target: target.type_name(),
        }),
        Comparable::Map(fields) => Ok(fields
            .get(property)
            .cloned()
            .unwrap_or(Comparable::Undefined)),
        Comparable::List(_) | Comparable::Text(_) if property == "length" => Ok(target
            .length()
            .map_or(Comparable::Undefined, |len| Comparable::Number(len as f64))),
        Comparable::List(items) => Ok(property
            .parse::<usize>()
            .ok()
            .and_then(|index| items.get(index))
            .cloned()
            .unwrap_or(Comparable::Undefined)),
        Comparable::Text(_) | Comparable::Bool(_) | Comparable::Number(_) => {
            Ok(Comparable::Undefined)
        }
    }
}

fn index_value(target: &Comparable, index: &Comparable) -> Result<Comparable, ExprError> {
    match (target, index) {
        (Comparable::List(items), Comparable::Number(number)) => {
            Ok(position(*number)
                .and_then(|idx| items.get(idx))
                .cloned()
                .unwrap_or(Comparable::Undefined))
        }
        (Comparable::Text(text), Comparable::Number(number)) => Ok(position(*number)
            .and_then(|idx| text.chars().nth(idx))
            .map_or(Comparable::Undefined, |ch| Comparable::Text(ch.to_string()))),
        _ => member(target, &index.coerce_string()),
    }
}

fn position(number: f64) -> Option<usize> {
    if number.is_finite() && number >= 0.0 && number.fract() == 0.0 {
        return Some(number as usize);
    }
    None
}

fn arity(name: &str, args: &[Comparable], expected: usize) -> Result<(), ExprError> {
    if args.len() != expected {
        return Err(ExprError::Arity {
            name: name.to_owned(),
            expected,
            got: args.len(),
        });
    }
    Ok(())
}

fn arg(args: &[Comparable], index: usize) -> Comparable {
    args.get(index).cloned().unwrap_or(Comparable::Undefined)
}

fn call_function(name: &str, args: &[Comparable]) -> Result<Comparable, ExprError> {
    match name {
        "len" => {
            arity(name, args, 1)?;
            Ok(arg(args, 0)
                .length()
                .map_or(Comparable::Number(0.0), |len| Comparable::Number(len as f64)))
        }
        "contains" => {
            arity(name, args, 2)?;
            Ok(Comparable::Bool(arg(args, 0).contains(&arg(args, 1))))
        }
        "startsWith" => {
            arity(name, args, 2)?;
            Ok(Comparable::Bool(
                arg(args, 0)
                    .coerce_string()
                    .starts_with(&arg(args, 1).coerce_string()),
            ))
        }
        "endsWith" => {
            arity(name, args, 2)?;
            Ok(Comparable::Bool(
                arg(args, 0)
                    .coerce_string()
                    .ends_with(&arg(args, 1).coerce_string()),
            ))
        }
        "matches" => {
            arity(name, args, 2)?;
            regex_test(&arg(args, 0), &arg(args, 1).coerce_string())
        }
        "lower" => {
            arity(name, args, 1)?;
            Ok(Comparable::Text(arg(args, 0).coerce_string().to_lowercase()))
        }
        "upper" => {
            arity(name, args, 1)?;
            Ok(Comparable::Text(arg(args, 0).coerce_string().to_uppercase()))
        }
        "number" => {
            arity(name, args, 1)?;
            Ok(Comparable::Number(arg(args, 0).coerce_number()))
        }
        "string" => {
            arity(name, args, 1)?;
            Ok(Comparable::Text(arg(args, 0).coerce_string()))
        }
        "isArray" => {
            arity(name, args, 1)?;
            Ok(Comparable::Bool(matches!(arg(args, 0), Comparable::List(_))))
        }
        "isObject" => {
            arity(name, args, 1)?;
            Ok(Comparable::Bool(matches!(arg(args, 0), Comparable::Map(_))))
        }
        "keys" => {
            arity(name, args, 1)?;
            match arg(args, 0) {
                Comparable::Map(fields) => Ok(Comparable::List(
                    fields.into_keys().map(Comparable::Text).collect(),
                )),
                _ => Ok(Comparable::List(Vec::new())),
            }
        }
        "base64.encode" => {
            arity(name, args, 1)?;
            Ok(Comparable::Text(B64.encode(arg(args, 0).coerce_string())))
        }
        "base64.decode" => {
            arity(name, args, 1)?;
            let bytes = B64
                .decode(arg(args, 0).coerce_string())
                .map_err(|err| ExprError::Eval {
                    message: format!("base64.decode: {}", err),
                })?;
            Ok(Comparable::Text(String::from_utf8_lossy(&bytes).into_owned()))
        }
        "json.stringify" => {
            arity(name, args, 1)?;
            let value = arg(args, 0);
            Ok(match value.to_json() {
                Some(json) => Comparable::Text(json.to_string()),
                None => Comparable::Undefined,
            })
        }
        "json.parse" => {
            arity(name, args, 1)?;
            let parsed: serde_json::Value = serde_json::from_str(&arg(args, 0).coerce_string())
                .map_err(|err| ExprError::Eval {
                    message: format!("json.parse: {}", err),
                })?;
            Ok(Comparable::from_json(&parsed))
        }
        _ => Err(ExprError::UnknownFunction {
            name: name.to_owned(),
        }),
    }
}

fn call_method(target: &Comparable, name: &str, args: &[Comparable]) -> Result<Comparable, ExprError> {
    if target.is_nullish() {
        return Err(ExprError::PropertyOfNothing {
            property: name.to_owned(),
            target: target.type_name(),
        });
    }
    match name {
        "includes" => {
            arity(name, args, 1)?;
            Ok(Comparable::Bool(target.contains(&arg(args, 0))))
        }
        "startsWith" | "endsWith" => {
            let mut full = Vec::with_capacity(2);
            full.push(target.clone());
            full.extend(args.iter().cloned());
            call_function(name, &full)
        }
        "toLowerCase" => {
            arity(name, args, 0)?;
            Ok(Comparable::Text(target.coerce_string().to_lowercase()))
        }
        "toUpperCase" => {
            arity(name, args, 0)?;
            Ok(Comparable::Text(target.coerce_string().to_uppercase()))
        }
        "trim" => {
            arity(name, args, 0)?;
            Ok(Comparable::Text(target.coerce_string().trim().to_owned()))
        }
        "test" => {
            arity(name, args, 1)?;
            regex_test(&arg(args, 0), &target.coerce_string())
        }
        _ => Err(ExprError::UnknownFunction {
            name: format!("{}.{}", target.type_name(), name),
        }),
    }
}

/// Case-insensitive regex test; non-text subjects never match.
pub(crate) fn regex_test(subject: &Comparable, pattern: &str) -> Result<Comparable, ExprError> {
    let regex = RegexBuilder::new(pattern)
        .case_insensitive(true)
        .build()
        .map_err(|err| ExprError::InvalidRegex {
            pattern: pattern.to_owned(),
            message: err.to_string(),
        })?;
    Ok(Comparable::Bool(match subject {
        Comparable::Text(text) => regex.is_match(text),
        _ => false,
    }))
}
