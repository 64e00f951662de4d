//! Parsed tabular input (header list + row matrix)

use anyhow::{Context, Result};
use serde::{Deserialize, Deserializer, Serialize};
use std::path::Path;

/// A parsed sheet: one header row and the data rows below it.
///
/// Decoding spreadsheet formats happens upstream; this crate reads the JSON
/// form `{"headers": [...], "rows": [[...], ...]}`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Table {
    #[serde(default)]
    pub headers: Vec<String>,
    #[serde(default, deserialize_with = "deserialize_rows")]
    pub rows: Vec<Vec<String>>,
}

impl Table {
    pub fn new(headers: Vec<String>, rows: Vec<Vec<String>>) -> Self {
        Self { headers, rows }
    }

    /// Load a table from a JSON file
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read table file: {}", path.display()))?;
        serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse table JSON: {}", path.display()))
    }

    /// Trimmed cell value, `None` when the column is out of range or blank
    pub fn cell<'a>(row: &'a [String], column: usize) -> Option<&'a str> {
        row.get(column)
            .map(|value| value.trim())
            .filter(|value| !value.is_empty())
    }

    /// Resolve a mapping key to a column index.
    ///
    /// Exact header match wins; otherwise `_col_<N>` addresses column N directly
    /// (used for columns that have no usable header).
    pub fn column_index(&self, key: &str) -> Option<usize> {
        if let Some(idx) = self.headers.iter().position(|h| h == key) {
            return Some(idx);
        }
        key.strip_prefix("_col_")
            .and_then(|n| n.parse::<usize>().ok())
    }

    /// Mapping key for a column: its header, or `_col_<N>` when the header is blank
    pub fn column_key(&self, column: usize) -> String {
        match self.headers.get(column) {
            Some(header) if !header.trim().is_empty() => header.clone(),
            _ => format!("_col_{}", column),
        }
    }
}

/// Rows may arrive with numbers, booleans or nulls in them; everything becomes text.
fn deserialize_rows<'de, D>(deserializer: D) -> Result<Vec<Vec<String>>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Vec<Vec<serde_json::Value>> = Vec::deserialize(deserializer)?;
    Ok(raw
        .into_iter()
        .map(|row| row.into_iter().map(cell_to_string).collect())
        .collect())
}

fn cell_to_string(value: serde_json::Value) -> String {
    match value {
        serde_json::Value::Null => String::new(),
        serde_json::Value::String(s) => s,
        other => other.to_string(),
    }
}
