//! Structural validation of authored condition trees.
//!
//! Works on the raw JSON so that it can report every problem at once, with a
//! position prefix such as `AND[0].OR[1].left`, instead of stopping at the
//! first deserialization failure.

use serde_json::{Map, Value as JsonValue};

use crate::error::{ConditionError, ErrorCode, ValidationResult};
use crate::model::Operator;
use crate::path::parse_path;

/// Validates a raw condition tree and renders each problem as a
/// `"<position>: <message>"` string. An empty list means the tree is valid.
pub fn validate_condition_expression(raw: &JsonValue) -> Vec<String> {
    match validate_condition(raw) {
        Ok(()) => Vec::new(),
        Err(errors) => errors.iter().map(ToString::to_string).collect(),
    }
}

pub fn validate_condition(raw: &JsonValue) -> ValidationResult {
    let mut ctx = ValidationCtx::new();
    validate_node(raw, "", &mut ctx);
    ctx.finish()
}

struct ValidationCtx {
    errors: Vec<ConditionError>,
}

impl ValidationCtx {
    fn new() -> Self {
        Self { errors: Vec::new() }
    }

    fn push(&mut self, code: ErrorCode, message: impl Into<String>, path: &str) {
        let mut err = ConditionError::new(code, message);
        if !path.is_empty() {
            err = err.with_path(path);
        }
        self.errors.push(err);
    }

    fn finish(self) -> ValidationResult {
        if self.errors.is_empty() {
            Ok(())
        } else {
            Err(self.errors)
        }
    }
}

fn join(base: &str, segment: &str) -> String {
    if base.is_empty() {
        segment.to_string()
    } else {
        format!("{}.{}", base, segment)
    }
}

fn validate_node(raw: &JsonValue, path: &str, ctx: &mut ValidationCtx) {
    let obj = match raw {
        JsonValue::Object(obj) => obj,
        _ => {
            ctx.push(ErrorCode::InvalidExprShape, "expression must be an object", path);
            return;
        }
    };

    let node_type = match obj.get("type") {
        Some(JsonValue::String(t)) => t.as_str(),
        Some(_) => {
            ctx.push(ErrorCode::InvalidExprShape, "'type' must be a string", path);
            return;
        }
        None => {
            ctx.push(ErrorCode::InvalidExprShape, "expression is missing 'type'", path);
            return;
        }
    };

    match node_type {
        "comparison" => validate_comparison(obj, path, ctx),
        "and" => validate_children(obj, "AND", path, ctx),
        "or" => validate_children(obj, "OR", path, ctx),
        "not" => match obj.get("child") {
            Some(child) => validate_node(child, &join(path, "NOT"), ctx),
            None => ctx.push(ErrorCode::MissingChild, "NOT requires a 'child' expression", path),
        },
        other => ctx.push(
            ErrorCode::UnknownNodeType,
            format!("unknown expression type '{}'", other),
            path,
        ),
    }
}

fn validate_children(
    obj: &Map<String, JsonValue>,
    label: &str,
    path: &str,
    ctx: &mut ValidationCtx,
) {
    let children = match obj.get("children") {
        Some(JsonValue::Array(children)) => children,
        _ => {
            ctx.push(
                ErrorCode::InvalidChildren,
                format!("{} requires a 'children' array", label),
                path,
            );
            return;
        }
    };
    for (index, child) in children.iter().enumerate() {
        validate_node(child, &join(path, &format!("{}[{}]", label, index)), ctx);
    }
}

fn validate_comparison(obj: &Map<String, JsonValue>, path: &str, ctx: &mut ValidationCtx) {
    let op = match obj.get("op") {
        Some(JsonValue::String(name)) => {
            let op = Operator::parse(name);
            if op.is_none() {
                ctx.push(ErrorCode::UnknownOp, format!("unknown operator '{}'", name), path);
            }
            op
        }
        Some(other) => {
            ctx.push(ErrorCode::UnknownOp, format!("unknown operator {}", other), path);
            None
        }
        None => {
            ctx.push(ErrorCode::UnknownOp, "comparison is missing 'op'", path);
            None
        }
    };

    match obj.get("left") {
        Some(left) => validate_operand(left, &join(path, "left"), ctx),
        None => ctx.push(ErrorCode::MissingOperand, "comparison is missing 'left' operand", path),
    }

    let right = obj.get("right");
    match right {
        Some(right) => validate_operand(right, &join(path, "right"), ctx),
        None if op.is_some_and(|op| op.is_unary()) => {}
        None => ctx.push(ErrorCode::MissingOperand, "comparison is missing 'right' operand", path),
    }

    if let (Some(op), Some(right)) = (op, right) {
        validate_literal_argument(op, right, &join(path, "right"), ctx);
    }
}

fn validate_operand(raw: &JsonValue, path: &str, ctx: &mut ValidationCtx) {
    let obj = match raw {
        JsonValue::Object(obj) => obj,
        _ => {
            ctx.push(ErrorCode::InvalidOperandKind, "operand must be an object", path);
            return;
        }
    };

    match obj.get("kind").and_then(JsonValue::as_str) {
        Some("variable") => match obj.get("path") {
            Some(JsonValue::String(var_path)) if !var_path.trim().is_empty() => {
                if let Err(err) = parse_path(var_path) {
                    ctx.push(ErrorCode::InvalidPath, err.message, path);
                }
            }
            _ => ctx.push(
                ErrorCode::MissingOperandField,
                "variable operand requires a non-empty 'path'",
                path,
            ),
        },
        Some("literal") => {
            if !obj.contains_key("value") {
                ctx.push(
                    ErrorCode::MissingOperandField,
                    "literal operand requires a 'value'",
                    path,
                );
            }
        }
        Some(other) => ctx.push(
            ErrorCode::InvalidOperandKind,
            format!("unknown operand kind '{}'", other),
            path,
        ),
        None => ctx.push(ErrorCode::InvalidOperandKind, "operand is missing 'kind'", path),
    }
}

/// Checks literal right-hand values whose shape the operator depends on.
fn validate_literal_argument(op: Operator, right: &JsonValue, path: &str, ctx: &mut ValidationCtx) {
    if right.get("kind").and_then(JsonValue::as_str) != Some("literal") {
        return;
    }
    let Some(value) = right.get("value") else {
        return;
    };

    match op {
        Operator::In | Operator::NotIn => {
            if !value.is_array() {
                ctx.push(
                    ErrorCode::InvalidArgs,
                    format!("{} requires an array value", op),
                    path,
                );
            }
        }
        Operator::Matches => match value {
            JsonValue::String(pattern) => {
                if let Err(err) = regex::Regex::new(pattern) {
                    ctx.push(
                        ErrorCode::InvalidRegex,
                        format!("invalid regex pattern: {}", err),
                        path,
                    );
                }
            }
            _ => ctx.push(
                ErrorCode::InvalidArgs,
                "matches requires a regex pattern string",
                path,
            ),
        },
        _ => {}
    }
}
