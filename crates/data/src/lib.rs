//! The data processing engine.
//!
//! Rows flow from a [`banded_source::RowSource`] through field binding, an
//! optional stable sort, group boundary detection and variable aggregation.
//! The engine is strictly sequential: every variable depends on every row
//! before it, so a row that fails to bind or evaluate ends the stream.

mod aggregate;
pub mod binding;
pub mod error;
pub mod processor;

pub use binding::{bind_row, coerce, resolve_parameters};
pub use error::DataError;
pub use processor::{Processor, RowContext, RowResult, RowStream, process};

use banded_source::RowSource;
use banded_template::Template;
use banded_types::Value;
use indexmap::IndexMap;

/// Field values of one row, keyed by field name in declaration order.
pub type PreviewRow = IndexMap<String, Value>;

/// Binds up to `limit` rows in source order without grouping, aggregation or
/// layout. Meant for editor tooling that wants to see what a template's
/// fields will receive.
pub fn preview_rows<S: RowSource>(
    template: &Template,
    mut source: S,
    limit: usize,
) -> Result<Vec<PreviewRow>, DataError> {
    let mut preview = Vec::with_capacity(limit.min(source.size_hint().unwrap_or(limit)));
    for index in 0..limit {
        let Some(row) = source.next_row() else {
            break;
        };
        let values = bind_row(template, &row?, index)?;
        preview.push(
            template
                .fields
                .iter()
                .map(|f| f.name.clone())
                .zip(values)
                .collect(),
        );
    }
    Ok(preview)
}
