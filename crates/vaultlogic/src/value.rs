//! Value helpers shared by both operator sets.
//!
//! Values are plain `serde_json::Value`s. Coercion is decided by each operator,
//! so everything here is a small, explicit conversion rather than a general
//! "to string" / "to number" facility.

use std::cmp::Ordering;

use serde_json::Value as JsonValue;

/// Evaluation result - either a value or missing
#[derive(Debug, Clone, PartialEq)]
pub enum EvalValue {
    Missing,
    Value(JsonValue),
}

impl EvalValue {
    pub fn is_missing(&self) -> bool {
        matches!(self, EvalValue::Missing)
    }

    /// True for `Missing` and for a present `null`.
    pub fn is_nullish(&self) -> bool {
        matches!(self, EvalValue::Missing | EvalValue::Value(JsonValue::Null))
    }

    pub fn into_value(self) -> Option<JsonValue> {
        match self {
            EvalValue::Value(v) => Some(v),
            EvalValue::Missing => None,
        }
    }

    pub fn as_value(&self) -> Option<&JsonValue> {
        match self {
            EvalValue::Value(v) => Some(v),
            EvalValue::Missing => None,
        }
    }

    /// Collapses `Missing` to `null`.
    pub fn into_value_or_null(self) -> JsonValue {
        self.into_value().unwrap_or(JsonValue::Null)
    }
}

impl From<Option<&JsonValue>> for EvalValue {
    fn from(value: Option<&JsonValue>) -> Self {
        match value {
            Some(v) => EvalValue::Value(v.clone()),
            None => EvalValue::Missing,
        }
    }
}

/// `null` or a string holding only whitespace.
pub fn is_blank(value: &JsonValue) -> bool {
    match value {
        JsonValue::Null => true,
        JsonValue::String(s) => s.trim().is_empty(),
        _ => false,
    }
}

/// Numbers, and strings that parse as a finite number once trimmed.
pub fn as_number(value: &JsonValue) -> Option<f64> {
    match value {
        JsonValue::Number(n) => n.as_f64(),
        JsonValue::String(s) => {
            let trimmed = s.trim();
            if trimmed.is_empty() {
                return None;
            }
            trimmed.parse::<f64>().ok().filter(|f| f.is_finite())
        }
        _ => None,
    }
}

/// Text form of a scalar: strings as-is, numbers and booleans printed.
pub fn as_text(value: &JsonValue) -> Option<String> {
    match value {
        JsonValue::String(s) => Some(s.clone()),
        JsonValue::Number(n) => Some(n.to_string()),
        JsonValue::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

/// Strict equality: same type and same value. Numbers compare by value, so
/// `1` and `1.0` are equal, but `"1"` and `1` are not.
pub fn strict_equals(left: &JsonValue, right: &JsonValue) -> bool {
    match (left, right) {
        (JsonValue::Number(l), JsonValue::Number(r)) => match (l.as_f64(), r.as_f64()) {
            (Some(l), Some(r)) => l == r,
            _ => l == r,
        },
        _ => left == right,
    }
}

fn type_rank(value: &JsonValue) -> u8 {
    match value {
        JsonValue::Null => 0,
        JsonValue::Bool(_) => 1,
        JsonValue::Number(_) => 2,
        JsonValue::String(_) => 3,
        JsonValue::Array(_) => 4,
        JsonValue::Object(_) => 5,
    }
}

/// Total order used for sorting: `null` first, then by runtime type, numbers
/// numerically and strings by code point. Values of different types order by
/// type so the result is deterministic.
pub fn sort_cmp(left: &JsonValue, right: &JsonValue) -> Ordering {
    match (left, right) {
        (JsonValue::Number(l), JsonValue::Number(r)) => {
            let l = l.as_f64().unwrap_or(0.0);
            let r = r.as_f64().unwrap_or(0.0);
            l.partial_cmp(&r).unwrap_or(Ordering::Equal)
        }
        (JsonValue::String(l), JsonValue::String(r)) => l.cmp(r),
        (JsonValue::Bool(l), JsonValue::Bool(r)) => l.cmp(r),
        (JsonValue::Null, JsonValue::Null) => Ordering::Equal,
        (JsonValue::Array(l), JsonValue::Array(r)) => l.len().cmp(&r.len()),
        (JsonValue::Object(l), JsonValue::Object(r)) => l.len().cmp(&r.len()),
        _ => type_rank(left).cmp(&type_rank(right)),
    }
}
