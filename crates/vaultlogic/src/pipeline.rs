//! List transform pipeline.
//!
//! Stages always run in the order filter, sort, offset/limit, select, dedupe,
//! whatever order the keys appear in the config. Every stage is also callable
//! on its own and returns a new list; inputs are never modified.

use std::cmp::Ordering;
use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value as JsonValue};
use tracing::debug;

use crate::filter::{FilterGroup, evaluate_filter_group, field_value};
use crate::list::{ColumnMeta, ListVariable, Row};
use crate::value::{EvalValue, sort_cmp};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct SortKey {
    pub field_path: String,
    #[serde(default)]
    pub direction: SortDirection,
}

impl SortKey {
    pub fn asc(field_path: impl Into<String>) -> Self {
        Self {
            field_path: field_path.into(),
            direction: SortDirection::Asc,
        }
    }

    pub fn desc(field_path: impl Into<String>) -> Self {
        Self {
            field_path: field_path.into(),
            direction: SortDirection::Desc,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct DedupeConfig {
    pub field_path: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct TransformConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filters: Option<FilterGroup>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sort: Option<Vec<SortKey>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub offset: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limit: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub select: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dedupe: Option<DedupeConfig>,
}

pub fn transform_list(list: &ListVariable, config: &TransformConfig) -> ListVariable {
    transform_list_with_context(list, config, &Map::new())
}

/// Runs the configured stages. `context` supplies the variables that
/// `valueSource: "var"` filter rules compare against.
pub fn transform_list_with_context(
    list: &ListVariable,
    config: &TransformConfig,
    context: &Map<String, JsonValue>,
) -> ListVariable {
    let mut rows = list.rows.clone();
    let mut resized = false;
    debug!(rows = rows.len(), "list transform started");

    if let Some(filters) = &config.filters {
        rows = filter_rows(rows, filters, context);
        resized = true;
        debug!(rows = rows.len(), "filter stage applied");
    }
    if let Some(keys) = &config.sort {
        rows = sort_rows(rows, keys);
        debug!(keys = keys.len(), "sort stage applied");
    }
    if config.offset.is_some() || config.limit.is_some() {
        rows = range_rows(rows, config.offset, config.limit);
        resized = true;
        debug!(rows = rows.len(), "range stage applied");
    }
    let mut columns = list.columns.clone();
    if let Some(fields) = &config.select {
        rows = select_rows(rows, fields);
        columns = select_columns(&columns, fields);
        debug!(fields = fields.len(), "select stage applied");
    }
    if let Some(dedupe) = &config.dedupe {
        rows = dedupe_rows(rows, &dedupe.field_path);
        resized = true;
        debug!(rows = rows.len(), "dedupe stage applied");
    }

    let mut out = if resized {
        list.with_rows(rows)
    } else {
        list.with_same_count(rows)
    };
    out.columns = columns;
    out
}

pub fn apply_list_filters(
    list: &ListVariable,
    filters: &FilterGroup,
    context: &Map<String, JsonValue>,
) -> ListVariable {
    list.with_rows(filter_rows(list.rows.clone(), filters, context))
}

pub fn apply_list_sort(list: &ListVariable, keys: &[SortKey]) -> ListVariable {
    list.with_same_count(sort_rows(list.rows.clone(), keys))
}

pub fn apply_list_range(
    list: &ListVariable,
    offset: Option<usize>,
    limit: Option<usize>,
) -> ListVariable {
    list.with_rows(range_rows(list.rows.clone(), offset, limit))
}

pub fn apply_list_select(list: &ListVariable, fields: &[String]) -> ListVariable {
    let mut out = list.with_same_count(select_rows(list.rows.clone(), fields));
    out.columns = select_columns(&list.columns, fields);
    out
}

pub fn apply_list_dedupe(list: &ListVariable, dedupe: &DedupeConfig) -> ListVariable {
    list.with_rows(dedupe_rows(list.rows.clone(), &dedupe.field_path))
}

fn filter_rows(
    rows: Vec<Row>,
    filters: &FilterGroup,
    context: &Map<String, JsonValue>,
) -> Vec<Row> {
    rows.into_iter()
        .filter(|row| evaluate_filter_group(row, filters, context))
        .collect()
}

/// Stable multi-key sort. Per key, `null`/missing sort before any value, so
/// they lead an ascending sort and trail a descending one.
fn sort_rows(rows: Vec<Row>, keys: &[SortKey]) -> Vec<Row> {
    if keys.is_empty() {
        return rows;
    }
    let mut keyed: Vec<(Vec<Option<JsonValue>>, Row)> = rows
        .into_iter()
        .map(|row| {
            let values = keys
                .iter()
                .map(|key| match field_value(&row, &key.field_path) {
                    EvalValue::Value(JsonValue::Null) | EvalValue::Missing => None,
                    EvalValue::Value(v) => Some(v),
                })
                .collect();
            (values, row)
        })
        .collect();

    keyed.sort_by(|(left, _), (right, _)| {
        for (index, key) in keys.iter().enumerate() {
            let ordering = match (&left[index], &right[index]) {
                (None, None) => Ordering::Equal,
                (None, Some(_)) => Ordering::Less,
                (Some(_), None) => Ordering::Greater,
                (Some(l), Some(r)) => sort_cmp(l, r),
            };
            let ordering = match key.direction {
                SortDirection::Asc => ordering,
                SortDirection::Desc => ordering.reverse(),
            };
            if ordering != Ordering::Equal {
                return ordering;
            }
        }
        Ordering::Equal
    });

    keyed.into_iter().map(|(_, row)| row).collect()
}

fn range_rows(rows: Vec<Row>, offset: Option<usize>, limit: Option<usize>) -> Vec<Row> {
    let iter = rows.into_iter().skip(offset.unwrap_or(0));
    match limit {
        Some(limit) => iter.take(limit).collect(),
        None => iter.collect(),
    }
}

/// Projects rows onto `fields`. Nested paths are stored under their dotted
/// name; fields a row lacks are left out; `id` always survives.
fn select_rows(rows: Vec<Row>, fields: &[String]) -> Vec<Row> {
    rows.into_iter()
        .map(|row| {
            let mut projected = Row::new();
            if let Some(id) = row.get("id") {
                projected.insert("id".to_string(), id.clone());
            }
            for field in fields {
                if field == "id" {
                    continue;
                }
                if let EvalValue::Value(value) = field_value(&row, field) {
                    projected.insert(field.clone(), value);
                }
            }
            projected
        })
        .collect()
}

fn select_columns(columns: &[ColumnMeta], fields: &[String]) -> Vec<ColumnMeta> {
    columns
        .iter()
        .filter(|column| {
            column.id == "id"
                || fields
                    .iter()
                    .any(|field| *field == column.id || *field == column.name)
        })
        .cloned()
        .collect()
}

/// Keeps the first row per distinct key. Rows whose key is `null` or missing
/// are always kept.
fn dedupe_rows(rows: Vec<Row>, field_path: &str) -> Vec<Row> {
    let mut seen: HashSet<String> = HashSet::new();
    rows.into_iter()
        .filter(|row| match field_value(row, field_path) {
            EvalValue::Missing | EvalValue::Value(JsonValue::Null) => true,
            EvalValue::Value(value) => seen.insert(dedupe_key(&value)),
        })
        .collect()
}

fn dedupe_key(value: &JsonValue) -> String {
    match value {
        JsonValue::Number(n) => match n.as_f64() {
            Some(f) => format!("n:{}", f),
            None => format!("n:{}", n),
        },
        other => other.to_string(),
    }
}
