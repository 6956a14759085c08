// SPDX-FileCopyrightText: 2026 Herald Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Recipient resolution for Herald campaigns.
//!
//! Turns a contact table and a message template into the ordered list of
//! [`SendUnit`]s handed to the campaign engine. Rows without a usable
//! destination or with an empty rendered message are dropped silently.

use std::sync::Arc;

use herald_core::{HeraldError, ImageSource, SendUnit};
use tracing::debug;

pub mod columns;
pub mod phone;
pub mod table;
pub mod template;

pub use columns::{detect_name_column, detect_phone_column, normalize_key};
pub use phone::PhoneRules;
pub use table::Table;
pub use template::Template;

/// Builds send units from tables or caller-supplied messages.
#[derive(Debug, Clone, Default)]
pub struct Resolver {
    rules: PhoneRules,
}

impl Resolver {
    pub fn new(rules: PhoneRules) -> Self {
        Self { rules }
    }

    pub fn rules(&self) -> &PhoneRules {
        &self.rules
    }

    /// Resolve every row of `table` into a unit, in row order.
    ///
    /// `phone_column` falls back to header detection. Without a phone column
    /// nothing is sendable and the result is empty.
    pub fn resolve(
        &self,
        table: &Table,
        template: &str,
        phone_column: Option<usize>,
        image: Option<Arc<ImageSource>>,
    ) -> Vec<SendUnit> {
        let Some(phone_column) = phone_column.or_else(|| detect_phone_column(&table.headers))
        else {
            debug!(headers = ?table.headers, "no phone column found");
            return Vec::new();
        };

        let template = Template::new(template, table);
        let units: Vec<SendUnit> = table
            .rows
            .iter()
            .enumerate()
            .filter_map(|(idx, row)| {
                let destination = self.rules.normalize(table.cell(idx, phone_column));
                if destination.is_empty() {
                    return None;
                }
                let text = template.render(row);
                if text.is_empty() {
                    return None;
                }
                Some(attach(SendUnit::new(destination, text), image.as_ref()))
            })
            .collect();

        debug!(
            rows = table.row_count(),
            units = units.len(),
            phone_column,
            "resolved campaign table"
        );
        units
    }

    /// Render the template for one row, as the UI shows it before sending.
    pub fn preview(
        &self,
        table: &Table,
        template: &str,
        row: usize,
    ) -> Result<String, HeraldError> {
        let cells = table.rows.get(row).ok_or_else(|| {
            HeraldError::InvalidInput(format!(
                "row {row} out of range, table has {} rows",
                table.row_count()
            ))
        })?;
        Ok(Template::new(template, table).render(cells))
    }

    /// Normalize destinations of pre-resolved messages and drop unusable ones.
    pub fn sanitize<I>(&self, units: I) -> Vec<SendUnit>
    where
        I: IntoIterator<Item = SendUnit>,
    {
        units
            .into_iter()
            .filter_map(|mut unit| {
                unit.destination = self.rules.normalize(&unit.destination);
                (!unit.destination.is_empty() && !unit.text.is_empty()).then_some(unit)
            })
            .collect()
    }
}

fn attach(unit: SendUnit, image: Option<&Arc<ImageSource>>) -> SendUnit {
    match image {
        Some(image) => unit.with_image(Arc::clone(image)),
        None => unit,
    }
}
