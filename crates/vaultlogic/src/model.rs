//! Condition expression types.
//!
//! These are the typed form of the condition trees produced by the authoring
//! UI. The serialized shape is tagged by `type` for nodes and by `kind` for
//! operands:
//!
//! ```json
//! {"type": "and", "children": [
//!   {"type": "comparison", "op": "equals",
//!    "left": {"kind": "variable", "path": "user.status"},
//!    "right": {"kind": "literal", "value": "active"}}
//! ]}
//! ```

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value as JsonValue};

use crate::error::ParseError;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Operand {
    Variable { path: String },
    Literal {
        #[serde(default)]
        value: JsonValue,
    },
}

impl Operand {
    pub fn variable(path: impl Into<String>) -> Self {
        Operand::Variable { path: path.into() }
    }

    pub fn literal(value: impl Into<JsonValue>) -> Self {
        Operand::Literal {
            value: value.into(),
        }
    }
}

fn null_operand() -> Operand {
    Operand::Literal {
        value: JsonValue::Null,
    }
}

/// Operators understood by the condition evaluator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Operator {
    Equals,
    NotEquals,
    Gt,
    Gte,
    Lt,
    Lte,
    In,
    NotIn,
    Contains,
    NotContains,
    StartsWith,
    EndsWith,
    Matches,
    IsEmpty,
    NotEmpty,
}

impl Operator {
    pub const ALL: [Operator; 15] = [
        Operator::Equals,
        Operator::NotEquals,
        Operator::Gt,
        Operator::Gte,
        Operator::Lt,
        Operator::Lte,
        Operator::In,
        Operator::NotIn,
        Operator::Contains,
        Operator::NotContains,
        Operator::StartsWith,
        Operator::EndsWith,
        Operator::Matches,
        Operator::IsEmpty,
        Operator::NotEmpty,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Operator::Equals => "equals",
            Operator::NotEquals => "notEquals",
            Operator::Gt => "gt",
            Operator::Gte => "gte",
            Operator::Lt => "lt",
            Operator::Lte => "lte",
            Operator::In => "in",
            Operator::NotIn => "notIn",
            Operator::Contains => "contains",
            Operator::NotContains => "notContains",
            Operator::StartsWith => "startsWith",
            Operator::EndsWith => "endsWith",
            Operator::Matches => "matches",
            Operator::IsEmpty => "isEmpty",
            Operator::NotEmpty => "notEmpty",
        }
    }

    pub fn parse(name: &str) -> Option<Operator> {
        Operator::ALL.into_iter().find(|op| op.as_str() == name)
    }

    /// Emptiness checks ignore the right operand.
    pub fn is_unary(&self) -> bool {
        matches!(self, Operator::IsEmpty | Operator::NotEmpty)
    }
}

impl std::fmt::Display for Operator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ConditionExpression {
    Comparison {
        op: Operator,
        left: Operand,
        #[serde(default = "null_operand")]
        right: Operand,
    },
    And {
        children: Vec<ConditionExpression>,
    },
    Or {
        children: Vec<ConditionExpression>,
    },
    Not {
        child: Box<ConditionExpression>,
    },
}

impl ConditionExpression {
    pub fn comparison(op: Operator, left: Operand, right: Operand) -> Self {
        ConditionExpression::Comparison { op, left, right }
    }

    pub fn and(children: Vec<ConditionExpression>) -> Self {
        ConditionExpression::And { children }
    }

    pub fn or(children: Vec<ConditionExpression>) -> Self {
        ConditionExpression::Or { children }
    }

    pub fn not(child: ConditionExpression) -> Self {
        ConditionExpression::Not {
            child: Box::new(child),
        }
    }

    pub fn from_json(value: &JsonValue) -> Result<Self, ParseError> {
        Ok(serde_json::from_value(value.clone())?)
    }
}

/// Live variables plus an optional record used as a fallback namespace.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EvaluationContext {
    #[serde(default)]
    pub variables: Map<String, JsonValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub record: Option<Map<String, JsonValue>>,
}

impl EvaluationContext {
    pub fn new(variables: Map<String, JsonValue>) -> Self {
        Self {
            variables,
            record: None,
        }
    }

    pub fn with_record(mut self, record: Map<String, JsonValue>) -> Self {
        self.record = Some(record);
        self
    }

    /// Builds a context from loosely typed values. Anything that is not a JSON
    /// object contributes no variables.
    pub fn from_values(variables: JsonValue, record: Option<JsonValue>) -> Self {
        let variables = match variables {
            JsonValue::Object(map) => map,
            _ => Map::new(),
        };
        let record = match record {
            Some(JsonValue::Object(map)) => Some(map),
            _ => None,
        };
        Self { variables, record }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn deserializes_nested_expression() {
        let raw = json!({
            "type": "and",
            "children": [
                {
                    "type": "comparison",
                    "op": "notEquals",
                    "left": {"kind": "variable", "path": "status"},
                    "right": {"kind": "literal", "value": "closed"}
                },
                {"type": "not", "child": {"type": "or", "children": []}}
            ]
        });
        let expr = ConditionExpression::from_json(&raw).unwrap();
        assert_eq!(
            expr,
            ConditionExpression::and(vec![
                ConditionExpression::comparison(
                    Operator::NotEquals,
                    Operand::variable("status"),
                    Operand::literal("closed"),
                ),
                ConditionExpression::not(ConditionExpression::or(vec![])),
            ])
        );
    }

    #[test]
    fn unary_comparison_defaults_right_operand() {
        let raw = json!({
            "type": "comparison",
            "op": "isEmpty",
            "left": {"kind": "variable", "path": "notes"}
        });
        let expr = ConditionExpression::from_json(&raw).unwrap();
        match expr {
            ConditionExpression::Comparison { right, .. } => {
                assert_eq!(right, Operand::literal(JsonValue::Null));
            }
            other => panic!("expected comparison, got {other:?}"),
        }
    }

    #[test]
    fn operator_names_round_trip_through_parse() {
        for op in Operator::ALL {
            assert_eq!(Operator::parse(op.as_str()), Some(op));
            let serialized = serde_json::to_value(op).unwrap();
            assert_eq!(serialized, json!(op.as_str()));
        }
        assert_eq!(Operator::parse("equal"), None);
    }

    #[test]
    fn unknown_operator_fails_to_parse() {
        let raw = json!({
            "type": "comparison",
            "op": "like",
            "left": {"kind": "literal", "value": 1},
            "right": {"kind": "literal", "value": 1}
        });
        assert!(ConditionExpression::from_json(&raw).is_err());
    }

    #[test]
    fn context_from_values_ignores_non_objects() {
        let ctx = EvaluationContext::from_values(json!([1, 2]), Some(json!({"a": 1})));
        assert!(ctx.variables.is_empty());
        assert_eq!(ctx.record.unwrap().get("a"), Some(&json!(1)));
    }
}
