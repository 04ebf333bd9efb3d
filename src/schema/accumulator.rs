//! Schema accumulation across documents

use super::inference::project;
use super::naming::sanitize_name;
use super::types::Column;
use crate::document::Value;
use std::cmp::Ordering;
use std::collections::HashMap;

/// Name of the column that always sorts first
pub const ID_COLUMN: &str = "id";

/// Accumulates columns seen across a run.
///
/// The first definition recorded for a name wins; later documents can only
/// add nested fields to a RECORD column, never change a type. Iteration
/// order is irrelevant, [`SchemaAccumulator::finalize`] imposes the order.
#[derive(Debug, Clone, Default)]
pub struct SchemaAccumulator {
    columns: HashMap<String, Column>,
}

impl SchemaAccumulator {
    /// Create an empty accumulator
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a column from a single observed value.
    ///
    /// Returns `None` for null values and for arrays or documents that are
    /// empty once normalized.
    pub fn column(name: &str, value: &Value) -> Option<Column> {
        let name = sanitize_name(name);
        if name.is_empty() {
            return None;
        }
        project(value)
            .filter(|p| !p.is_empty())
            .map(|p| p.into_column(name))
    }

    /// Record a column, merging into any existing definition
    pub fn add(&mut self, column: Column) {
        match self.columns.get_mut(&column.name) {
            Some(existing) => merge(existing, column),
            None => {
                self.columns.insert(column.name.clone(), column);
            }
        }
    }

    /// Record several columns
    pub fn merge_all(&mut self, columns: impl IntoIterator<Item = Column>) {
        for column in columns {
            self.add(column);
        }
    }

    /// Get a recorded column by name
    pub fn get(&self, name: &str) -> Option<&Column> {
        self.columns.get(name)
    }

    /// Number of top-level columns
    pub fn len(&self) -> usize {
        self.columns.len()
    }

    /// Check if nothing has been recorded
    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// Convert to the ordered column list: `id` first, then by name,
    /// recursively inside RECORD columns.
    pub fn finalize(self) -> Vec<Column> {
        finalize_columns(self.into_columns())
    }

    /// The recorded columns in no particular order
    pub(crate) fn into_columns(self) -> Vec<Column> {
        self.columns.into_values().collect()
    }
}

/// Merge `incoming` into `existing`.
///
/// Scalars: the existing definition stays as is. RECORD into RECORD: nested
/// fields are merged by the same rule, recursively.
pub fn merge(existing: &mut Column, incoming: Column) {
    if !(existing.is_record() && incoming.is_record()) {
        return;
    }
    for field in incoming.fields {
        match existing.fields.iter_mut().find(|f| f.name == field.name) {
            Some(current) => merge(current, field),
            None => existing.fields.push(field),
        }
    }
}

/// Sort columns `id` first then ascending by name, recursing into RECORDs
pub fn finalize_columns(mut columns: Vec<Column>) -> Vec<Column> {
    columns.sort_by(|a, b| column_order(&a.name, &b.name));
    for column in &mut columns {
        if column.is_record() {
            let fields = std::mem::take(&mut column.fields);
            column.fields = finalize_columns(fields);
        }
    }
    columns
}

fn column_order(a: &str, b: &str) -> Ordering {
    match (a == ID_COLUMN, b == ID_COLUMN) {
        (true, true) => Ordering::Equal,
        (true, false) => Ordering::Less,
        (false, true) => Ordering::Greater,
        (false, false) => a.cmp(b),
    }
}
