// SPDX-FileCopyrightText: 2026 Herald Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `{{token}}` substitution for one table row.

use crate::columns::{detect_name_column, detect_phone_column};
use crate::table::Table;

/// Token always bound to the detected name column.
pub const NAME_TOKEN: &str = "{{nombre}}";

/// Token always bound to the detected phone column.
pub const PHONE_TOKEN: &str = "{{telefono}}";

/// A message template bound to a table's headers.
///
/// Column detection runs once per table, not once per row.
#[derive(Debug, Clone)]
pub struct Template<'a> {
    source: &'a str,
    headers: &'a [String],
    name_column: Option<usize>,
    phone_column: Option<usize>,
}

impl<'a> Template<'a> {
    pub fn new(source: &'a str, table: &'a Table) -> Self {
        Self {
            source,
            headers: &table.headers,
            name_column: detect_name_column(&table.headers),
            phone_column: detect_phone_column(&table.headers),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.source.is_empty()
    }

    /// Render the template against one row.
    ///
    /// Header tokens are replaced first, using the header text verbatim, then
    /// the `{{nombre}}` and `{{telefono}}` aliases. Unknown tokens survive.
    pub fn render(&self, row: &[String]) -> String {
        if self.source.is_empty() {
            return String::new();
        }

        let cell = |idx: usize| row.get(idx).map(String::as_str).unwrap_or("");
        let mut out = self.source.to_string();

        if !row.is_empty() {
            for (idx, header) in self.headers.iter().enumerate() {
                if header.is_empty() {
                    continue;
                }
                let token = format!("{{{{{header}}}}}");
                if out.contains(&token) {
                    out = out.replace(&token, cell(idx));
                }
            }
        }

        if out.contains(NAME_TOKEN) {
            out = out.replace(NAME_TOKEN, self.name_column.map(cell).unwrap_or(""));
        }
        if out.contains(PHONE_TOKEN) {
            out = out.replace(PHONE_TOKEN, self.phone_column.map(cell).unwrap_or(""));
        }

        out
    }
}
