//! Condition evaluation.

use serde_json::Value as JsonValue;
use tracing::warn;

use crate::model::{ConditionExpression, EvaluationContext};
use crate::ops::apply_operator;
use crate::resolve::resolve_operand;

/// Evaluates a condition tree. Never fails: missing data resolves to `null`
/// and each operator has a defined answer for every value shape.
pub fn evaluate_condition(expr: &ConditionExpression, ctx: &EvaluationContext) -> bool {
    match expr {
        ConditionExpression::Comparison { op, left, right } => {
            let left = resolve_operand(left, ctx);
            if op.is_unary() {
                return apply_operator(*op, &left, &JsonValue::Null);
            }
            let right = resolve_operand(right, ctx);
            apply_operator(*op, &left, &right)
        }
        ConditionExpression::And { children } => {
            children.iter().all(|child| evaluate_condition(child, ctx))
        }
        ConditionExpression::Or { children } => {
            children.iter().any(|child| evaluate_condition(child, ctx))
        }
        ConditionExpression::Not { child } => !evaluate_condition(child, ctx),
    }
}

/// Evaluates an untrusted, serialized condition tree. A tree that does not
/// deserialize evaluates to `false`.
pub fn evaluate_raw_condition(raw: &JsonValue, ctx: &EvaluationContext) -> bool {
    match ConditionExpression::from_json(raw) {
        Ok(expr) => evaluate_condition(&expr, ctx),
        Err(err) => {
            warn!(error = %err, "condition expression rejected; evaluating as false");
            false
        }
    }
}
