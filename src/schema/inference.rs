//! Type inference and value normalization
//!
//! Maps a single [`Value`] to a warehouse column type and mode, and to the
//! JSON it is written as in the staged file.

use super::accumulator::SchemaAccumulator;
use super::naming::sanitize_name;
use super::types::{Column, ColumnMode, ColumnType};
use crate::document::{Document, Value};
use chrono::{DateTime, Utc};
use serde_json::{Map, Value as JsonValue};

/// Timestamp layout accepted by the warehouse loader
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Infer the column type of a value.
///
/// Arrays take the type of their first element; an array whose first
/// element is missing or null is a STRING column.
pub fn infer_type(value: &Value) -> ColumnType {
    match value {
        Value::Timestamp(_) => ColumnType::Timestamp,
        Value::Number(_) => ColumnType::Float,
        Value::Boolean(_) => ColumnType::Boolean,
        Value::Identifier(_) => ColumnType::String,
        Value::Array(items) => element_type(items),
        Value::Document(_) => ColumnType::Record,
        Value::Text(_) | Value::Null => ColumnType::String,
    }
}

/// Infer the column mode of a value
pub fn infer_mode(value: &Value) -> ColumnMode {
    match value {
        Value::Array(_) => ColumnMode::Repeated,
        _ => ColumnMode::Nullable,
    }
}

/// Normalize a value for output. `None` means the value is absent.
///
/// Nested documents come back with sanitized keys and without null or
/// empty members; arrays drop null and empty elements.
pub fn normalize_value(value: &Value) -> Option<JsonValue> {
    project(value).map(|p| p.value)
}

/// Format a timestamp the way the loader expects it
pub fn format_timestamp(ts: &DateTime<Utc>) -> String {
    ts.format(TIMESTAMP_FORMAT).to_string()
}

/// A value together with the column describing it
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Projection {
    pub value: JsonValue,
    pub column_type: ColumnType,
    pub mode: ColumnMode,
    pub fields: Vec<Column>,
}

impl Projection {
    fn scalar(value: JsonValue, source: &Value) -> Self {
        Self {
            value,
            column_type: infer_type(source),
            mode: infer_mode(source),
            fields: Vec::new(),
        }
    }

    /// An empty array or document carries nothing worth a column
    pub fn is_empty(&self) -> bool {
        match &self.value {
            JsonValue::Array(items) => items.is_empty(),
            JsonValue::Object(map) => map.is_empty(),
            _ => false,
        }
    }

    pub fn into_column(self, name: impl Into<String>) -> Column {
        Column {
            name: name.into(),
            column_type: self.column_type,
            mode: self.mode,
            fields: self.fields,
        }
    }
}

/// Normalize a value and describe it in one pass
pub(crate) fn project(value: &Value) -> Option<Projection> {
    match value {
        Value::Null => None,
        Value::Boolean(b) => Some(Projection::scalar(JsonValue::Bool(*b), value)),
        Value::Number(n) => {
            let json = serde_json::Number::from_f64(*n)
                .map_or_else(|| JsonValue::String(n.to_string()), JsonValue::Number);
            Some(Projection::scalar(json, value))
        }
        Value::Text(s) => Some(Projection::scalar(JsonValue::String(s.clone()), value)),
        Value::Identifier(id) => Some(Projection::scalar(JsonValue::String(id.clone()), value)),
        Value::Timestamp(ts) => Some(Projection::scalar(
            JsonValue::String(format_timestamp(ts)),
            value,
        )),
        Value::Array(items) => Some(project_array(items)),
        Value::Document(doc) => {
            let (map, fields) = project_document(doc);
            Some(Projection {
                value: JsonValue::Object(map),
                column_type: ColumnType::Record,
                mode: ColumnMode::Nullable,
                fields,
            })
        }
    }
}

/// Project every field of a document.
///
/// Returns the normalized field map and the (unordered) columns for it.
/// Null and empty members are skipped. When several raw names sanitize to
/// the same column, a name already in sanitized form wins; otherwise the
/// first one in key order is kept.
pub(crate) fn project_document(doc: &Document) -> (Map<String, JsonValue>, Vec<Column>) {
    let mut map = Map::new();
    let mut schema = SchemaAccumulator::new();

    let (canonical, aliases): (Vec<_>, Vec<_>) = doc
        .iter()
        .map(|(key, value)| (sanitize_name(key), key, value))
        .partition(|(name, key, _)| name == *key);

    for (name, _, value) in canonical.into_iter().chain(aliases) {
        if name.is_empty() || map.contains_key(&name) {
            continue;
        }
        let Some(projection) = project(value) else {
            continue;
        };
        if projection.is_empty() {
            continue;
        }
        map.insert(name.clone(), projection.value.clone());
        schema.add(projection.into_column(name));
    }

    (map, schema.into_columns())
}

fn element_type(items: &[Value]) -> ColumnType {
    match items.first() {
        Some(first) if !first.is_null() => infer_type(first),
        _ => ColumnType::String,
    }
}

// The column type comes from the raw first element, before null and empty
// elements are dropped from the output.
fn project_array(items: &[Value]) -> Projection {
    let column_type = element_type(items);
    let mut values = Vec::with_capacity(items.len());
    let mut record_fields = SchemaAccumulator::new();

    for item in items {
        let Some(element) = project(item) else {
            continue;
        };
        if element.is_empty() {
            continue;
        }
        if column_type == ColumnType::Record && element.column_type == ColumnType::Record {
            record_fields.merge_all(element.fields);
        }
        values.push(element.value);
    }

    Projection {
        value: JsonValue::Array(values),
        column_type,
        mode: ColumnMode::Repeated,
        fields: record_fields.into_columns(),
    }
}
