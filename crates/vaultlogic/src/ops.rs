//! Operator library for condition expressions.
//!
//! String comparisons here are case-insensitive; `equals` also trims. The
//! pipeline filter operators in `filter.rs` are strict by default and must not
//! share these helpers for their plain variants.

use std::cmp::Ordering;

use serde_json::Value as JsonValue;
use tracing::debug;

use crate::model::Operator;
use crate::value::{as_number, as_text, is_blank, strict_equals};

pub fn apply_operator(op: Operator, left: &JsonValue, right: &JsonValue) -> bool {
    match op {
        Operator::Equals => loose_equals(left, right),
        Operator::NotEquals => !loose_equals(left, right),
        Operator::Gt => compare_numeric(left, right) == Some(Ordering::Greater),
        Operator::Gte => matches!(
            compare_numeric(left, right),
            Some(Ordering::Greater | Ordering::Equal)
        ),
        Operator::Lt => compare_numeric(left, right) == Some(Ordering::Less),
        Operator::Lte => matches!(
            compare_numeric(left, right),
            Some(Ordering::Less | Ordering::Equal)
        ),
        Operator::In => is_member(left, right),
        Operator::NotIn => !is_member(left, right),
        Operator::Contains => contains(left, right),
        Operator::NotContains => !contains(left, right),
        Operator::StartsWith => text_pair(left, right).is_some_and(|(l, r)| l.starts_with(&r)),
        Operator::EndsWith => text_pair(left, right).is_some_and(|(l, r)| l.ends_with(&r)),
        Operator::Matches => regex_matches(left, right),
        Operator::IsEmpty => is_empty(left),
        Operator::NotEmpty => !is_empty(left),
    }
}

/// Strings compare trimmed and case-insensitively; everything else strictly.
pub fn loose_equals(left: &JsonValue, right: &JsonValue) -> bool {
    match (left, right) {
        (JsonValue::String(l), JsonValue::String(r)) => {
            l.trim().to_lowercase() == r.trim().to_lowercase()
        }
        _ => strict_equals(left, right),
    }
}

fn compare_numeric(left: &JsonValue, right: &JsonValue) -> Option<Ordering> {
    let l = as_number(left)?;
    let r = as_number(right)?;
    l.partial_cmp(&r)
}

fn is_member(needle: &JsonValue, haystack: &JsonValue) -> bool {
    match haystack {
        JsonValue::Array(items) => items.iter().any(|item| loose_equals(needle, item)),
        _ => false,
    }
}

fn contains(left: &JsonValue, right: &JsonValue) -> bool {
    match left {
        JsonValue::Array(items) => items.iter().any(|item| loose_equals(item, right)),
        JsonValue::String(s) => match as_text(right) {
            Some(needle) => s.to_lowercase().contains(&needle.to_lowercase()),
            None => false,
        },
        _ => false,
    }
}

fn text_pair(left: &JsonValue, right: &JsonValue) -> Option<(String, String)> {
    Some((as_text(left)?.to_lowercase(), as_text(right)?.to_lowercase()))
}

fn regex_matches(left: &JsonValue, right: &JsonValue) -> bool {
    let (Some(text), JsonValue::String(pattern)) = (as_text(left), right) else {
        return false;
    };
    match regex::Regex::new(pattern) {
        Ok(re) => re.is_match(&text),
        Err(err) => {
            debug!(pattern = %pattern, error = %err, "invalid regex in matches operator");
            false
        }
    }
}

/// `null`, blank strings and empty arrays are empty. `0`, `false` and `{}`
/// are not.
pub fn is_empty(value: &JsonValue) -> bool {
    match value {
        JsonValue::Array(items) => items.is_empty(),
        other => is_blank(other),
    }
}
