//! Alias/key resolution for workflow variables.
//!
//! Authors refer to variables by a readable alias; storage uses a canonical
//! key. Resolution is "resolve or pass through": a name that matches neither
//! is returned unchanged so validation further down can report it.

use serde::{Deserialize, Serialize};

use crate::model::{ConditionExpression, Operand};
use crate::path::{PathToken, parse_path};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkflowVariable {
    pub key: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alias: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub var_type: Option<String>,
}

impl WorkflowVariable {
    pub fn new(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            alias: None,
            title: None,
            var_type: None,
        }
    }

    pub fn with_alias(mut self, alias: impl Into<String>) -> Self {
        self.alias = Some(alias.into());
        self
    }
}

#[derive(Debug, Clone, Copy)]
pub struct VariableResolver<'a> {
    variables: &'a [WorkflowVariable],
}

impl<'a> VariableResolver<'a> {
    pub fn new(variables: &'a [WorkflowVariable]) -> Self {
        Self { variables }
    }

    /// Key match first, then alias match, so a name that is one variable's key
    /// and another's alias resolves to the key owner.
    pub fn get_variable(&self, name_or_key: &str) -> Option<&'a WorkflowVariable> {
        self.variables
            .iter()
            .find(|var| var.key == name_or_key)
            .or_else(|| {
                self.variables
                    .iter()
                    .find(|var| var.alias.as_deref() == Some(name_or_key))
            })
    }

    pub fn resolve_operand(&self, name_or_key: &str) -> String {
        match self.get_variable(name_or_key) {
            Some(var) => var.key.clone(),
            None => name_or_key.to_string(),
        }
    }

    pub fn resolve_operands<S: AsRef<str>>(&self, names: &[S]) -> Vec<String> {
        names
            .iter()
            .map(|name| self.resolve_operand(name.as_ref()))
            .collect()
    }

    pub fn is_valid_operand(&self, name_or_key: &str) -> bool {
        self.get_variable(name_or_key).is_some()
    }

    /// Reverse direction: the alias of the variable stored under `key`, or the
    /// key itself when it has no alias or is unknown.
    pub fn alias_for(&self, key: &str) -> String {
        self.variables
            .iter()
            .find(|var| var.key == key)
            .and_then(|var| var.alias.clone())
            .unwrap_or_else(|| key.to_string())
    }

    /// Rewrites a variable path whose root segment is an alias so that it
    /// starts with the storage key. The rest of the path is kept verbatim.
    pub fn resolve_path(&self, path: &str) -> String {
        if self.get_variable(path).is_some() {
            return self.resolve_operand(path);
        }
        let root = match parse_path(path).ok().and_then(|tokens| tokens.into_iter().next()) {
            Some(PathToken::Key(root)) => root,
            _ => return path.to_string(),
        };
        match self.get_variable(&root) {
            Some(var) if path.starts_with(root.as_str()) => {
                format!("{}{}", var.key, &path[root.len()..])
            }
            _ => path.to_string(),
        }
    }

    /// Returns a copy of `expr` with every variable operand resolved to
    /// storage keys.
    pub fn resolve_expression(&self, expr: &ConditionExpression) -> ConditionExpression {
        match expr {
            ConditionExpression::Comparison { op, left, right } => ConditionExpression::Comparison {
                op: *op,
                left: self.resolve_operand_ref(left),
                right: self.resolve_operand_ref(right),
            },
            ConditionExpression::And { children } => ConditionExpression::And {
                children: children.iter().map(|c| self.resolve_expression(c)).collect(),
            },
            ConditionExpression::Or { children } => ConditionExpression::Or {
                children: children.iter().map(|c| self.resolve_expression(c)).collect(),
            },
            ConditionExpression::Not { child } => ConditionExpression::Not {
                child: Box::new(self.resolve_expression(child)),
            },
        }
    }

    fn resolve_operand_ref(&self, operand: &Operand) -> Operand {
        match operand {
            Operand::Variable { path } => Operand::Variable {
                path: self.resolve_path(path),
            },
            literal => literal.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Operator;
    use serde_json::json;

    fn table() -> Vec<WorkflowVariable> {
        vec![
            WorkflowVariable::new("step1.q_9f2").with_alias("firstName"),
            WorkflowVariable::new("step1.q_a41").with_alias("income"),
            WorkflowVariable::new("email"),
            // alias that collides with another variable's key
            WorkflowVariable::new("step2.q_777").with_alias("email"),
        ]
    }

    #[test]
    fn resolves_alias_to_key() {
        let vars = table();
        let resolver = VariableResolver::new(&vars);
        assert_eq!(resolver.resolve_operand("firstName"), "step1.q_9f2");
        assert_eq!(resolver.resolve_operand("step1.q_a41"), "step1.q_a41");
    }

    #[test]
    fn unknown_names_pass_through() {
        let vars = table();
        let resolver = VariableResolver::new(&vars);
        assert_eq!(resolver.resolve_operand("lastName"), "lastName");
        assert!(!resolver.is_valid_operand("lastName"));
        assert_eq!(
            resolver.resolve_operands(&["income", "nope"]),
            vec!["step1.q_a41".to_string(), "nope".to_string()]
        );
    }

    #[test]
    fn key_wins_over_alias_on_collision() {
        let vars = table();
        let resolver = VariableResolver::new(&vars);
        assert_eq!(resolver.get_variable("email").map(|v| v.key.as_str()), Some("email"));
        assert_eq!(resolver.resolve_operand("email"), "email");
        assert!(resolver.is_valid_operand("email"));
    }

    #[test]
    fn alias_for_maps_back() {
        let vars = table();
        let resolver = VariableResolver::new(&vars);
        assert_eq!(resolver.alias_for("step1.q_9f2"), "firstName");
        assert_eq!(resolver.alias_for("email"), "email");
        assert_eq!(resolver.alias_for("unknown"), "unknown");
    }

    #[test]
    fn resolves_paths_below_an_alias() {
        let vars = vec![WorkflowVariable::new("q_list").with_alias("applicants")];
        let resolver = VariableResolver::new(&vars);
        assert_eq!(resolver.resolve_path("applicants[0].name"), "q_list[0].name");
        assert_eq!(resolver.resolve_path("applicants.count"), "q_list.count");
        assert_eq!(resolver.resolve_path("other[0]"), "other[0]");
    }

    #[test]
    fn resolves_whole_expression() {
        let vars = table();
        let resolver = VariableResolver::new(&vars);
        let expr = ConditionExpression::and(vec![
            ConditionExpression::comparison(
                Operator::Equals,
                Operand::variable("firstName"),
                Operand::literal("Ann"),
            ),
            ConditionExpression::not(ConditionExpression::comparison(
                Operator::Lt,
                Operand::variable("income"),
                Operand::literal(json!(1000)),
            )),
        ]);
        let resolved = resolver.resolve_expression(&expr);
        let expected = ConditionExpression::and(vec![
            ConditionExpression::comparison(
                Operator::Equals,
                Operand::variable("step1.q_9f2"),
                Operand::literal("Ann"),
            ),
            ConditionExpression::not(ConditionExpression::comparison(
                Operator::Lt,
                Operand::variable("step1.q_a41"),
                Operand::literal(json!(1000)),
            )),
        ]);
        assert_eq!(resolved, expected);
    }

    #[test]
    fn deserializes_variable_table() {
        let vars: Vec<WorkflowVariable> = serde_json::from_value(json!([
            {"key": "k1", "alias": "a1", "title": "First", "type": "text"},
            {"key": "k2"}
        ]))
        .unwrap();
        assert_eq!(vars[0].var_type.as_deref(), Some("text"));
        assert_eq!(vars[1].alias, None);
    }
}
