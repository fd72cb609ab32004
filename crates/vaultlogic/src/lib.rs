//! Condition and list-transform engine for workflow branching.
//!
//! Two halves share one set of filtering primitives:
//!
//! - conditions: `ConditionExpression` trees evaluated against live variables
//!   (`evaluate_condition`) and checked at authoring time
//!   (`validate_condition_expression`);
//! - lists: `ListVariable` tables run through filter, sort, range, select and
//!   dedupe stages (`transform_list`).
//!
//! Everything here is synchronous and pure. Evaluation never fails on bad
//! data; only parsing and validation report errors.

mod error;
mod eval;
mod filter;
mod list;
mod model;
mod ops;
mod path;
mod pipeline;
mod resolve;
mod validator;
mod value;
mod variables;

/// Library version from Cargo.toml
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub use error::{ConditionError, ErrorCode, ParseError, ParseErrorKind, ValidationResult};
pub use eval::{evaluate_condition, evaluate_raw_condition};
pub use filter::{
    Combinator, FilterGroup, FilterNode, FilterOperator, FilterRule, ValueSource,
    evaluate_filter_group, evaluate_filter_rule,
};
pub use list::{ColumnMeta, ListVariable, Row};
pub use model::{ConditionExpression, EvaluationContext, Operand, Operator};
pub use path::{PathError, PathToken, get_path, parse_path};
pub use pipeline::{
    DedupeConfig, SortDirection, SortKey, TransformConfig, apply_list_dedupe, apply_list_filters,
    apply_list_range, apply_list_select, apply_list_sort, transform_list,
    transform_list_with_context,
};
pub use resolve::resolve_operand;
pub use validator::{validate_condition, validate_condition_expression};
pub use value::EvalValue;
pub use variables::{VariableResolver, WorkflowVariable};

pub use serde_json::Value;

use serde::de::DeserializeOwned;

/// Authored documents arrive as JSON from the UI or as YAML written by hand.
/// Text that looks like JSON is tried as JSON first and falls back to YAML
/// (flow style such as `{ limit: 2 }`); the JSON error is reported when both
/// fail.
fn from_json_or_yaml<T: DeserializeOwned>(text: &str) -> Result<T, ParseError> {
    let trimmed = text.trim_start();
    if trimmed.starts_with('{') || trimmed.starts_with('[') {
        match serde_json::from_str(text) {
            Ok(value) => Ok(value),
            Err(json_err) => serde_yaml::from_str(text).map_err(|_| json_err.into()),
        }
    } else {
        Ok(serde_yaml::from_str(text)?)
    }
}

pub fn parse_condition(text: &str) -> Result<ConditionExpression, ParseError> {
    from_json_or_yaml(text)
}

pub fn parse_transform_config(text: &str) -> Result<TransformConfig, ParseError> {
    from_json_or_yaml(text)
}

pub fn parse_variables(text: &str) -> Result<Vec<WorkflowVariable>, ParseError> {
    from_json_or_yaml(text)
}

/// Parses raw condition text into an untyped tree, for validation.
pub fn parse_condition_value(text: &str) -> Result<Value, ParseError> {
    from_json_or_yaml(text)
}
