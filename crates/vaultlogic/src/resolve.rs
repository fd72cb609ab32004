//! Operand resolution against an evaluation context.

use serde_json::{Map, Value as JsonValue};

use crate::model::{EvaluationContext, Operand};
use crate::path::{PathToken, get_path, parse_path};
use crate::value::EvalValue;

/// Resolves an operand to a value. Anything that cannot be found is `null`.
pub fn resolve_operand(operand: &Operand, ctx: &EvaluationContext) -> JsonValue {
    match operand {
        Operand::Literal { value } => value.clone(),
        Operand::Variable { path } => resolve_variable(path, ctx).into_value_or_null(),
    }
}

/// Looks `path` up in `ctx.variables`, falling back to `ctx.record` when the
/// root segment is not a live variable.
pub fn resolve_variable(path: &str, ctx: &EvaluationContext) -> EvalValue {
    if let Some(value) = ctx.variables.get(path) {
        return EvalValue::Value(value.clone());
    }

    let tokens = parse_path(path).ok();
    let root = match tokens.as_deref().and_then(|tokens| tokens.first()) {
        Some(PathToken::Key(root)) => Some(root.as_str()),
        _ => None,
    };
    if let (Some(tokens), Some(root)) = (&tokens, root) {
        if ctx.variables.contains_key(root) {
            return lookup_in_map(&ctx.variables, tokens).into();
        }
    }

    let Some(record) = ctx.record.as_ref() else {
        return EvalValue::Missing;
    };
    if let Some(value) = record.get(path) {
        return EvalValue::Value(value.clone());
    }
    match tokens {
        Some(tokens) => lookup_in_map(record, &tokens).into(),
        None => EvalValue::Missing,
    }
}

/// Walks `tokens` through a map whose first token must be a key.
pub(crate) fn lookup_in_map<'a>(
    map: &'a Map<String, JsonValue>,
    tokens: &[PathToken],
) -> Option<&'a JsonValue> {
    let (first, rest) = tokens.split_first()?;
    let root = match first {
        PathToken::Key(key) => map.get(key)?,
        PathToken::Index(_) => return None,
    };
    get_path(root, rest)
}
