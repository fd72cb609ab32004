//! In-memory tabular datasets passed through the list pipeline.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value as JsonValue};

use crate::error::{ParseError, ParseErrorKind};

/// One row. `id` is the only field every row is expected to carry.
pub type Row = Map<String, JsonValue>;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnMeta {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub column_type: Option<String>,
}

impl ColumnMeta {
    pub fn new(id: impl Into<String>) -> Self {
        let id = id.into();
        Self {
            name: id.clone(),
            id,
            column_type: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ListVariable {
    #[serde(default)]
    pub rows: Vec<Row>,
    #[serde(default)]
    pub columns: Vec<ColumnMeta>,
    #[serde(default)]
    pub count: usize,
    #[serde(default, skip_serializing_if = "JsonValue::is_null")]
    pub metadata: JsonValue,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum ListDocument {
    List(ListVariable),
    Rows(Vec<Row>),
}

impl ListVariable {
    pub fn from_rows(rows: Vec<Row>) -> Self {
        let count = rows.len();
        Self {
            rows,
            columns: Vec::new(),
            count,
            metadata: JsonValue::Null,
        }
    }

    pub fn with_columns(mut self, columns: Vec<ColumnMeta>) -> Self {
        self.columns = columns;
        self
    }

    /// Same columns and metadata, new rows.
    pub(crate) fn with_rows(&self, rows: Vec<Row>) -> Self {
        Self {
            count: rows.len(),
            rows,
            columns: self.columns.clone(),
            metadata: self.metadata.clone(),
        }
    }

    /// New rows from a stage that only reorders or reshapes them; `count`
    /// is carried over so a server-side total survives.
    pub(crate) fn with_same_count(&self, rows: Vec<Row>) -> Self {
        Self {
            count: self.count,
            ..self.with_rows(rows)
        }
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Parses either a full list document or a bare array of row objects.
    /// A document that omits `count` gets the row count.
    pub fn from_json_str(input: &str) -> Result<Self, ParseError> {
        let raw: JsonValue = serde_json::from_str(input)?;
        let has_count = raw.get("count").is_some();
        match serde_json::from_value::<ListDocument>(raw)? {
            ListDocument::List(mut list) => {
                if !has_count {
                    list.count = list.rows.len();
                }
                Ok(list)
            }
            ListDocument::Rows(rows) => Ok(Self::from_rows(rows)),
        }
    }

    /// Loads a CSV table with a header row. Cells are strings, empty cells are
    /// `null`. Rows take their `id` from an `id` column, or from their 1-based
    /// position when the table has none.
    pub fn from_csv_str(input: &str) -> Result<Self, ParseError> {
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .from_reader(input.as_bytes());
        let headers: Vec<String> = reader.headers()?.iter().map(str::to_string).collect();
        if headers.iter().any(|h| h.is_empty()) {
            return Err(ParseError::new(
                ParseErrorKind::InvalidCsv,
                "csv header contains an empty column name",
            ));
        }
        let has_id = headers.iter().any(|h| h == "id");

        let mut rows = Vec::new();
        for (index, record) in reader.records().enumerate() {
            let record = record?;
            let mut row = Row::new();
            if !has_id {
                row.insert("id".to_string(), JsonValue::String((index + 1).to_string()));
            }
            for (header, cell) in headers.iter().zip(record.iter()) {
                let value = if cell.is_empty() {
                    JsonValue::Null
                } else {
                    JsonValue::String(cell.to_string())
                };
                row.insert(header.clone(), value);
            }
            rows.push(row);
        }

        let mut columns: Vec<ColumnMeta> = headers
            .iter()
            .map(|h| ColumnMeta {
                column_type: Some("text".to_string()),
                ..ColumnMeta::new(h.as_str())
            })
            .collect();
        if !has_id {
            columns.insert(0, ColumnMeta::new("id"));
        }
        Ok(Self::from_rows(rows).with_columns(columns))
    }
}
