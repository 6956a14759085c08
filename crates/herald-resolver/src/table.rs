// SPDX-FileCopyrightText: 2026 Herald Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Rectangular contact table produced by the spreadsheet loader.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Headers plus rows of cell text.
///
/// Cells arrive as arbitrary JSON scalars from the browser and are stored as
/// strings. Rows may be shorter than the header list; missing cells read as
/// empty.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "RawTable")]
pub struct Table {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

#[derive(Deserialize)]
struct RawTable {
    #[serde(default)]
    headers: Vec<Value>,
    #[serde(default)]
    rows: Vec<Vec<Value>>,
}

impl From<RawTable> for Table {
    fn from(raw: RawTable) -> Self {
        Self {
            headers: raw.headers.iter().map(cell_text).collect(),
            rows: raw
                .rows
                .iter()
                .map(|row| row.iter().map(cell_text).collect())
                .collect(),
        }
    }
}

impl Table {
    pub fn new(headers: Vec<String>, rows: Vec<Vec<String>>) -> Self {
        Self { headers, rows }
    }

    /// Cell text at `row`/`col`, empty when either is out of range.
    pub fn cell(&self, row: usize, col: usize) -> &str {
        self.rows
            .get(row)
            .and_then(|r| r.get(col))
            .map(String::as_str)
            .unwrap_or("")
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }
}

/// Stringify one JSON cell the way a spreadsheet would display it.
pub fn cell_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => number_text(n),
        other => other.to_string(),
    }
}

// Spreadsheet libraries hand whole numbers over as floats (`51999111222.0`).
fn number_text(n: &serde_json::Number) -> String {
    if let Some(f) = n.as_f64()
        && n.is_f64()
        && f.fract() == 0.0
        && f.abs() < 1e15
    {
        return format!("{}", f as i64);
    }
    n.to_string()
}
