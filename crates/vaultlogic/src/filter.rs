//! Row filters used by the list pipeline.
//!
//! Unlike condition operators, the plain operators here are strict: no
//! trimming, no case folding, no string/number coercion. Case-insensitive
//! behaviour is opt-in through the `*_ci` variants.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value as JsonValue};
use tracing::debug;

use crate::list::Row;
use crate::path::parse_path;
use crate::resolve::lookup_in_map;
use crate::value::{EvalValue, as_number, is_blank, strict_equals};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FilterOperator {
    Equals,
    NotEquals,
    EqualsCi,
    Contains,
    NotContains,
    ContainsCi,
    NotContainsCi,
    StartsWith,
    StartsWithCi,
    EndsWith,
    EndsWithCi,
    Gt,
    Gte,
    Lt,
    Lte,
    InList,
    NotInList,
    Matches,
    IsEmpty,
    IsNotEmpty,
    Exists,
    NotExists,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValueSource {
    #[default]
    Const,
    Var,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct FilterRule {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub field_path: String,
    pub op: FilterOperator,
    #[serde(default)]
    pub value: JsonValue,
    #[serde(default)]
    pub value_source: ValueSource,
}

impl FilterRule {
    pub fn new(
        field_path: impl Into<String>,
        op: FilterOperator,
        value: impl Into<JsonValue>,
    ) -> Self {
        Self {
            id: None,
            field_path: field_path.into(),
            op,
            value: value.into(),
            value_source: ValueSource::Const,
        }
    }

    /// Compare against the context variable named `name` instead of a constant.
    pub fn from_var(
        field_path: impl Into<String>,
        op: FilterOperator,
        name: impl Into<String>,
    ) -> Self {
        Self {
            value_source: ValueSource::Var,
            ..Self::new(field_path, op, JsonValue::String(name.into()))
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Combinator {
    #[default]
    And,
    Or,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FilterGroup {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default)]
    pub combinator: Combinator,
    #[serde(default)]
    pub rules: Vec<FilterNode>,
}

impl FilterGroup {
    pub fn and(rules: Vec<FilterNode>) -> Self {
        Self {
            id: None,
            combinator: Combinator::And,
            rules,
        }
    }

    pub fn or(rules: Vec<FilterNode>) -> Self {
        Self {
            id: None,
            combinator: Combinator::Or,
            rules,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FilterNode {
    Group(FilterGroup),
    Rule(FilterRule),
}

impl From<FilterRule> for FilterNode {
    fn from(rule: FilterRule) -> Self {
        FilterNode::Rule(rule)
    }
}

impl From<FilterGroup> for FilterNode {
    fn from(group: FilterGroup) -> Self {
        FilterNode::Group(group)
    }
}

/// Reads a field from a row. A key spelled exactly like the path wins over a
/// nested lookup, so projected rows with dotted keys stay addressable.
pub fn field_value(row: &Row, field_path: &str) -> EvalValue {
    if let Some(value) = row.get(field_path) {
        return EvalValue::Value(value.clone());
    }
    match parse_path(field_path) {
        Ok(tokens) => lookup_in_map(row, &tokens).into(),
        Err(_) => EvalValue::Missing,
    }
}

fn rule_target(rule: &FilterRule, context: &Map<String, JsonValue>) -> EvalValue {
    match rule.value_source {
        ValueSource::Const => EvalValue::Value(rule.value.clone()),
        ValueSource::Var => match &rule.value {
            JsonValue::String(name) => field_value(context, name),
            _ => EvalValue::Missing,
        },
    }
}

pub fn evaluate_filter_rule(
    row: &Row,
    rule: &FilterRule,
    context: &Map<String, JsonValue>,
) -> bool {
    let field = field_value(row, &rule.field_path);
    let target = rule_target(rule, context);
    apply_filter_operator(rule.op, &field, &target)
}

pub fn evaluate_filter_group(
    row: &Row,
    group: &FilterGroup,
    context: &Map<String, JsonValue>,
) -> bool {
    let mut results = group
        .rules
        .iter()
        .map(|node| evaluate_filter_node(row, node, context));
    match group.combinator {
        Combinator::And => results.all(|ok| ok),
        Combinator::Or => results.any(|ok| ok),
    }
}

pub fn evaluate_filter_node(
    row: &Row,
    node: &FilterNode,
    context: &Map<String, JsonValue>,
) -> bool {
    match node {
        FilterNode::Group(group) => evaluate_filter_group(row, group, context),
        FilterNode::Rule(rule) => evaluate_filter_rule(row, rule, context),
    }
}

pub fn apply_filter_operator(op: FilterOperator, field: &EvalValue, target: &EvalValue) -> bool {
    match op {
        FilterOperator::Equals => strict_eval_equals(field, target),
        FilterOperator::NotEquals => !strict_eval_equals(field, target),
        FilterOperator::EqualsCi => values(field, target).is_some_and(|(f, t)| ci_equals(f, t)),
        FilterOperator::Contains => {
            values(field, target).is_some_and(|(f, t)| contains(f, t, false))
        }
        FilterOperator::NotContains => {
            !values(field, target).is_some_and(|(f, t)| contains(f, t, false))
        }
        FilterOperator::ContainsCi => {
            values(field, target).is_some_and(|(f, t)| contains(f, t, true))
        }
        FilterOperator::NotContainsCi => {
            !values(field, target).is_some_and(|(f, t)| contains(f, t, true))
        }
        FilterOperator::StartsWith => {
            strings(field, target, false).is_some_and(|(f, t)| f.starts_with(&t))
        }
        FilterOperator::StartsWithCi => {
            strings(field, target, true).is_some_and(|(f, t)| f.starts_with(&t))
        }
        FilterOperator::EndsWith => {
            strings(field, target, false).is_some_and(|(f, t)| f.ends_with(&t))
        }
        FilterOperator::EndsWithCi => {
            strings(field, target, true).is_some_and(|(f, t)| f.ends_with(&t))
        }
        FilterOperator::Gt => compare(field, target) == Some(std::cmp::Ordering::Greater),
        FilterOperator::Gte => matches!(
            compare(field, target),
            Some(std::cmp::Ordering::Greater | std::cmp::Ordering::Equal)
        ),
        FilterOperator::Lt => compare(field, target) == Some(std::cmp::Ordering::Less),
        FilterOperator::Lte => matches!(
            compare(field, target),
            Some(std::cmp::Ordering::Less | std::cmp::Ordering::Equal)
        ),
        FilterOperator::InList => in_list(field, target),
        FilterOperator::NotInList => !in_list(field, target),
        FilterOperator::Matches => regex_matches(field, target),
        FilterOperator::IsEmpty => is_empty(field),
        FilterOperator::IsNotEmpty => !is_empty(field),
        FilterOperator::Exists => !field.is_missing(),
        FilterOperator::NotExists => field.is_missing(),
    }
}

fn values<'a>(
    field: &'a EvalValue,
    target: &'a EvalValue,
) -> Option<(&'a JsonValue, &'a JsonValue)> {
    Some((field.as_value()?, target.as_value()?))
}

fn strict_eval_equals(field: &EvalValue, target: &EvalValue) -> bool {
    match (field, target) {
        (EvalValue::Missing, EvalValue::Missing) => true,
        (EvalValue::Value(f), EvalValue::Value(t)) => strict_equals(f, t),
        _ => false,
    }
}

fn ci_equals(field: &JsonValue, target: &JsonValue) -> bool {
    match (field, target) {
        (JsonValue::String(f), JsonValue::String(t)) => f.to_lowercase() == t.to_lowercase(),
        _ => strict_equals(field, target),
    }
}

fn contains(field: &JsonValue, target: &JsonValue, fold_case: bool) -> bool {
    match field {
        JsonValue::String(haystack) => match target {
            JsonValue::String(needle) if fold_case => {
                haystack.to_lowercase().contains(&needle.to_lowercase())
            }
            JsonValue::String(needle) => haystack.contains(needle.as_str()),
            _ => false,
        },
        JsonValue::Array(items) => items.iter().any(|item| {
            if fold_case {
                ci_equals(item, target)
            } else {
                strict_equals(item, target)
            }
        }),
        _ => false,
    }
}

fn strings(field: &EvalValue, target: &EvalValue, fold_case: bool) -> Option<(String, String)> {
    match (field.as_value()?, target.as_value()?) {
        (JsonValue::String(f), JsonValue::String(t)) if fold_case => {
            Some((f.to_lowercase(), t.to_lowercase()))
        }
        (JsonValue::String(f), JsonValue::String(t)) => Some((f.clone(), t.clone())),
        _ => None,
    }
}

/// Numeric when both sides read as numbers, otherwise string order when both
/// are strings (ISO dates sort correctly this way).
fn compare(field: &EvalValue, target: &EvalValue) -> Option<std::cmp::Ordering> {
    let (f, t) = values(field, target)?;
    if let (Some(f), Some(t)) = (as_number(f), as_number(t)) {
        return f.partial_cmp(&t);
    }
    match (f, t) {
        (JsonValue::String(f), JsonValue::String(t)) => Some(f.cmp(t)),
        _ => None,
    }
}

fn in_list(field: &EvalValue, target: &EvalValue) -> bool {
    match (field, target) {
        (EvalValue::Value(f), EvalValue::Value(JsonValue::Array(items))) => {
            items.iter().any(|item| strict_equals(f, item))
        }
        _ => false,
    }
}

fn regex_matches(field: &EvalValue, target: &EvalValue) -> bool {
    let Some((JsonValue::String(text), JsonValue::String(pattern))) = values(field, target) else {
        return false;
    };
    match regex::Regex::new(pattern) {
        Ok(re) => re.is_match(text),
        Err(err) => {
            debug!(pattern = %pattern, error = %err, "invalid regex in matches filter");
            false
        }
    }
}

/// Missing, `null` and blank strings. Arrays are never empty here.
fn is_empty(field: &EvalValue) -> bool {
    match field {
        EvalValue::Missing => true,
        EvalValue::Value(v) => is_blank(v),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn row(value: JsonValue) -> Row {
        match value {
            JsonValue::Object(map) => map,
            _ => panic!("row must be an object"),
        }
    }

    fn check(r: &Row, rule: FilterRule) -> bool {
        evaluate_filter_rule(r, &rule, &Map::new())
    }

    #[test]
    fn equals_is_strict() {
        let r = row(json!({"id": "1", "code": "123", "name": "John"}));
        assert!(!check(&r, FilterRule::new("code", FilterOperator::Equals, 123)));
        assert!(check(&r, FilterRule::new("code", FilterOperator::Equals, "123")));
        assert!(!check(&r, FilterRule::new("name", FilterOperator::Equals, "john")));
        assert!(check(&r, FilterRule::new("name", FilterOperator::EqualsCi, "JOHN")));
        assert!(check(&r, FilterRule::new("name", FilterOperator::NotEquals, "john")));
    }

    #[test]
    fn contains_variants() {
        let r = row(json!({"id": "1", "title": "Hello World", "tags": ["Red", "blue"]}));
        assert!(check(&r, FilterRule::new("title", FilterOperator::Contains, "World")));
        assert!(!check(&r, FilterRule::new("title", FilterOperator::Contains, "world")));
        assert!(check(&r, FilterRule::new("title", FilterOperator::ContainsCi, "world")));
        assert!(check(&r, FilterRule::new("title", FilterOperator::NotContains, "world")));
        assert!(!check(&r, FilterRule::new("title", FilterOperator::NotContainsCi, "world")));
        assert!(check(&r, FilterRule::new("tags", FilterOperator::Contains, "Red")));
        assert!(!check(&r, FilterRule::new("tags", FilterOperator::Contains, "red")));
        assert!(check(&r, FilterRule::new("tags", FilterOperator::ContainsCi, "red")));
    }

    #[test]
    fn prefix_suffix_variants() {
        let r = row(json!({"id": "1", "file": "Report.PDF"}));
        assert!(check(&r, FilterRule::new("file", FilterOperator::StartsWith, "Rep")));
        assert!(!check(&r, FilterRule::new("file", FilterOperator::StartsWith, "rep")));
        assert!(check(&r, FilterRule::new("file", FilterOperator::StartsWithCi, "rep")));
        assert!(!check(&r, FilterRule::new("file", FilterOperator::EndsWith, ".pdf")));
        assert!(check(&r, FilterRule::new("file", FilterOperator::EndsWithCi, ".pdf")));
    }

    #[test]
    fn in_list_uses_strict_membership() {
        let r = row(json!({"id": "1", "n": 2, "s": "2"}));
        assert!(check(&r, FilterRule::new("n", FilterOperator::InList, json!([1, 2]))));
        assert!(!check(&r, FilterRule::new("s", FilterOperator::InList, json!([1, 2]))));
        assert!(check(&r, FilterRule::new("s", FilterOperator::NotInList, json!([1, 2]))));
        assert!(!check(&r, FilterRule::new("missing", FilterOperator::InList, json!([null]))));
    }

    #[test]
    fn ordering_is_numeric_or_lexicographic() {
        let r = row(json!({"id": "1", "age": 30, "joined": "2024-03-01"}));
        assert!(check(&r, FilterRule::new("age", FilterOperator::Gt, 29)));
        assert!(check(&r, FilterRule::new("age", FilterOperator::Lte, "30")));
        assert!(check(&r, FilterRule::new("joined", FilterOperator::Lt, "2024-12-31")));
        assert!(!check(&r, FilterRule::new("missing", FilterOperator::Gt, 0)));
        assert!(!check(&r, FilterRule::new("age", FilterOperator::Gt, true)));
    }

    #[test]
    fn emptiness_and_existence() {
        let r = row(json!({"id": "1", "a": null, "b": "  ", "c": [], "d": 0}));
        assert!(check(&r, FilterRule::new("a", FilterOperator::IsEmpty, JsonValue::Null)));
        assert!(check(&r, FilterRule::new("b", FilterOperator::IsEmpty, JsonValue::Null)));
        assert!(!check(&r, FilterRule::new("c", FilterOperator::IsEmpty, JsonValue::Null)));
        assert!(!check(&r, FilterRule::new("d", FilterOperator::IsEmpty, JsonValue::Null)));
        assert!(check(&r, FilterRule::new("zz", FilterOperator::IsEmpty, JsonValue::Null)));
        assert!(check(&r, FilterRule::new("d", FilterOperator::IsNotEmpty, JsonValue::Null)));

        assert!(check(&r, FilterRule::new("a", FilterOperator::Exists, JsonValue::Null)));
        assert!(!check(&r, FilterRule::new("zz", FilterOperator::Exists, JsonValue::Null)));
        assert!(check(&r, FilterRule::new("zz", FilterOperator::NotExists, JsonValue::Null)));
    }

    #[test]
    fn var_source_reads_context() {
        let r = row(json!({"id": "1", "owner": "ann", "limit": 5}));
        let ctx = row(json!({"currentUser": "ann", "caps": {"max": 10}}));
        let rule = FilterRule::from_var("owner", FilterOperator::Equals, "currentUser");
        assert!(evaluate_filter_rule(&r, &rule, &ctx));

        let rule = FilterRule::from_var("limit", FilterOperator::Lt, "caps.max");
        assert!(evaluate_filter_rule(&r, &rule, &ctx));

        // unresolved variable behaves as undefined
        let rule = FilterRule::from_var("owner", FilterOperator::Equals, "nobody");
        assert!(!evaluate_filter_rule(&r, &rule, &ctx));
        let rule = FilterRule::from_var("absent", FilterOperator::Equals, "nobody");
        assert!(evaluate_filter_rule(&r, &rule, &ctx));
    }

    #[test]
    fn nested_field_paths() {
        let r = row(json!({"id": "1", "address": {"city": "Oslo"}, "a.b": "flat"}));
        assert!(check(&r, FilterRule::new("address.city", FilterOperator::Equals, "Oslo")));
        assert!(check(&r, FilterRule::new("a.b", FilterOperator::Equals, "flat")));
    }

    #[test]
    fn groups_nest() {
        let r = row(json!({"id": "1", "status": "open", "priority": 3}));
        let group = FilterGroup::and(vec![
            FilterRule::new("status", FilterOperator::Equals, "open").into(),
            FilterGroup::or(vec![
                FilterRule::new("priority", FilterOperator::Gt, 5).into(),
                FilterRule::new("priority", FilterOperator::Equals, 3).into(),
            ])
            .into(),
        ]);
        assert!(evaluate_filter_group(&r, &group, &Map::new()));

        let contradiction = FilterGroup::and(vec![
            FilterRule::new("status", FilterOperator::Equals, "open").into(),
            FilterRule::new("status", FilterOperator::Equals, "closed").into(),
        ]);
        assert!(!evaluate_filter_group(&r, &contradiction, &Map::new()));
        assert!(evaluate_filter_group(&r, &FilterGroup::and(vec![]), &Map::new()));
        assert!(!evaluate_filter_group(&r, &FilterGroup::or(vec![]), &Map::new()));
    }

    #[test]
    fn deserializes_rules_and_groups() {
        let raw = json!({
            "combinator": "or",
            "rules": [
                {"fieldPath": "status", "op": "equals_ci", "value": "OPEN"},
                {"combinator": "and", "rules": [
                    {"id": "r2", "fieldPath": "owner", "op": "equals", "value": "me", "valueSource": "var"}
                ]}
            ]
        });
        let group: FilterGroup = serde_json::from_value(raw).unwrap();
        assert_eq!(group.combinator, Combinator::Or);
        assert!(matches!(&group.rules[0], FilterNode::Rule(r) if r.op == FilterOperator::EqualsCi));
        match &group.rules[1] {
            FilterNode::Group(inner) => match &inner.rules[0] {
                FilterNode::Rule(rule) => {
                    assert_eq!(rule.value_source, ValueSource::Var);
                    assert_eq!(rule.id.as_deref(), Some("r2"));
                }
                other => panic!("expected rule, got {other:?}"),
            },
            other => panic!("expected group, got {other:?}"),
        }
    }
}
