use std::cmp::Ordering;
use std::collections::BTreeMap;

use serde_json::{Map, Number, Value};

/// Values rules and expressions operate on.
///
/// `Undefined` marks a lookup that found nothing; it is distinct from an
/// explicit JSON `null`.
#[derive(Debug, Clone, PartialEq)]
pub enum Comparable {
    Undefined,
    Null,
    Bool(bool),
    Number(f64),
    Text(String),
    List(Vec<Comparable>),
    Map(BTreeMap<String, Comparable>),
}

impl Comparable {
    #[must_use]
    pub fn from_json(value: &Value) -> Self {
        match value {
            Value::Null => Comparable::Null,
            Value::Bool(flag) => Comparable::Bool(*flag),
            Value::Number(number) => Comparable::Number(number.as_f64().unwrap_or(f64::NAN)),
            Value::String(text) => Comparable::Text(text.clone()),
            Value::Array(items) => Comparable::List(items.iter().map(Self::from_json).collect()),
            Value::Object(fields) => Comparable::Map(
                fields
                    .iter()
                    .map(|(key, item)| (key.clone(), Self::from_json(item)))
                    .collect(),
            ),
        }
    }

    #[must_use]
    pub fn from_optional(value: Option<&Value>) -> Self {
        value.map_or(Comparable::Undefined, Self::from_json)
    }

    /// Converts back to JSON; `Undefined` has no JSON form.
    #[must_use]
    pub fn to_json(&self) -> Option<Value> {
        match self {
            Comparable::Undefined => None,
            Comparable::Null => Some(Value::Null),
            Comparable::Bool(flag) => Some(Value::Bool(*flag)),
            Comparable::Number(number) => Some(number_to_json(*number)),
            Comparable::Text(text) => Some(Value::String(text.clone())),
            Comparable::List(items) => Some(Value::Array(
                items
                    .iter()
                    .map(|item| item.to_json().unwrap_or(Value::Null))
                    .collect(),
            )),
            Comparable::Map(fields) => {
                let mut map = Map::new();
                for (key, item) in fields {
                    if let Some(value) = item.to_json() {
                        map.insert(key.clone(), value);
                    }
                }
                Some(Value::Object(map))
            }
        }
    }

    #[must_use]
    pub const fn type_name(&self) -> &'static str {
        match self {
            Comparable::Undefined => "undefined",
            Comparable::Null => "null",
            Comparable::Bool(_) => "boolean",
            Comparable::Number(_) => "number",
            Comparable::Text(_) => "string",
            Comparable::List(_) => "array",
            Comparable::Map(_) => "object",
        }
    }

    #[must_use]
    pub const fn is_nullish(&self) -> bool {
        matches!(self, Comparable::Undefined | Comparable::Null)
    }

    #[must_use]
    pub fn is_truthy(&self) -> bool {
        match self {
            Comparable::Undefined | Comparable::Null => false,
            Comparable::Bool(flag) => *flag,
            Comparable::Number(number) => *number != 0.0 && !number.is_nan(),
            Comparable::Text(text) => !text.is_empty(),
            Comparable::List(_) | Comparable::Map(_) => true,
        }
    }

    /// String coercion. Lists and maps render as compact JSON.
    #[must_use]
    pub fn coerce_string(&self) -> String {
        match self {
            Comparable::Undefined => "undefined".to_owned(),
            Comparable::Null => "null".to_owned(),
            Comparable::Bool(flag) => flag.to_string(),
            Comparable::Number(number) => format_number(*number),
            Comparable::Text(text) => text.clone(),
            Comparable::List(_) | Comparable::Map(_) => self
                .to_json()
                .map(|value| value.to_string())
                .unwrap_or_default(),
        }
    }

    /// Numeric coercion; `NaN` when the value has no numeric reading.
    #[must_use]
    pub fn coerce_number(&self) -> f64 {
        match self {
            Comparable::Null => 0.0,
            Comparable::Bool(flag) => {
                if *flag {
                    1.0
                } else {
                    0.0
                }
            }
            Comparable::Number(number) => *number,
            Comparable::Text(text) => {
                let trimmed = text.trim();
                if trimmed.is_empty() {
                    0.0
                } else {
                    trimmed.parse::<f64>().unwrap_or(f64::NAN)
                }
            }
            Comparable::Undefined | Comparable::List(_) | Comparable::Map(_) => f64::NAN,
        }
    }

    /// Same type and same value (`===`).
    #[must_use]
    pub fn strict_eq(&self, other: &Comparable) -> bool {
        match (self, other) {
            (Comparable::Number(left), Comparable::Number(right)) => left == right,
            _ => self == other,
        }
    }

    /// Equality with null/undefined folding and numeric coercion across
    /// primitives (`==`).
    #[must_use]
    pub fn loose_eq(&self, other: &Comparable) -> bool {
        match (self, other) {
            (left, right) if left.is_nullish() || right.is_nullish() => {
                left.is_nullish() && right.is_nullish()
            }
            (Comparable::Text(left), Comparable::Text(right)) => left == right,
            (Comparable::List(_) | Comparable::Map(_), _)
            | (_, Comparable::List(_) | Comparable::Map(_)) => self == other,
            _ => self.coerce_number() == other.coerce_number(),
        }
    }

    /// Ordering for `<`/`>`: text compares lexically, everything else
    /// numerically. `None` when either side is `NaN`.
    #[must_use]
    pub fn compare(&self, other: &Comparable) -> Option<Ordering> {
        match (self, other) {
            (Comparable::Text(left), Comparable::Text(right)) => Some(left.cmp(right)),
            _ => self.coerce_number().partial_cmp(&other.coerce_number()),
        }
    }

    /// Substring test on text, membership on lists, substring of the
    /// serialised form on maps, and stringify-then-substring on any other
    /// primitive.
    #[must_use]
    pub fn contains(&self, needle: &Comparable) -> bool {
        let needle_text = needle.coerce_string();
        match self {
            Comparable::Undefined => false,
            Comparable::Text(text) => text.contains(&needle_text),
            Comparable::List(items) => items
                .iter()
                .any(|item| item.loose_eq(needle) || item.coerce_string() == needle_text),
            Comparable::Map(_) | Comparable::Null | Comparable::Bool(_) | Comparable::Number(_) => {
                self.coerce_string().contains(&needle_text)
            }
        }
    }

    #[must_use]
    pub fn length(&self) -> Option<usize> {
        match self {
            Comparable::Text(text) => Some(text.chars().count()),
            Comparable::List(items) => Some(items.len()),
            Comparable::Map(fields) => Some(fields.len()),
            Comparable::Undefined | Comparable::Null | Comparable::Bool(_) | Comparable::Number(_) => {
                None
            }
        }
    }
}

impl From<&Value> for Comparable {
    fn from(value: &Value) -> Self {
        Self::from_json(value)
    }
}

pub(crate) fn format_number(number: f64) -> String {
    if number.is_nan() {
        return "NaN".to_owned();
    }
    if number.is_infinite() {
        return if number.is_sign_positive() {
            "Infinity".to_owned()
        } else {
            "-Infinity".to_owned()
        };
    }
    if number.fract() == 0.0 && number.abs() < 1e15 {
        return format!("{}", number as i64);
    }
    number.to_string()
}

fn number_to_json(number: f64) -> Value {
    if number.fract() == 0.0 && number.abs() < 1e15 {
        return Value::Number(Number::from(number as i64));
    }
    Number::from_f64(number).map_or(Value::Null, Value::Number)
}
