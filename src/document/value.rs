//! Value types

use chrono::{DateTime, TimeZone, Utc};
use serde_json::Value as JsonValue;
use std::collections::BTreeMap;

/// A document: field name to value. Field order carries no meaning.
pub type Document = BTreeMap<String, Value>;

/// A single value read from a source document
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Boolean(bool),
    Number(f64),
    Text(String),
    Timestamp(DateTime<Utc>),
    /// Native document identifier (e.g. an ObjectId), kept as its hex text
    Identifier(String),
    Array(Vec<Value>),
    Document(Document),
}

impl Value {
    /// Create an identifier value
    pub fn identifier(id: impl Into<String>) -> Self {
        Value::Identifier(id.into())
    }

    /// Check if this value is null
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Short name of the variant, for log output
    pub fn kind(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Boolean(_) => "boolean",
            Value::Number(_) => "number",
            Value::Text(_) => "text",
            Value::Timestamp(_) => "timestamp",
            Value::Identifier(_) => "identifier",
            Value::Array(_) => "array",
            Value::Document(_) => "document",
        }
    }

    /// Check if a key is an extended-JSON type wrapper this decoder unwraps
    pub fn is_wrapper_key(key: &str) -> bool {
        matches!(
            key,
            "$oid" | "$date" | "$numberInt" | "$numberLong" | "$numberDouble" | "$numberDecimal"
        )
    }

    /// Decode a MongoDB extended JSON value
    pub fn from_extended_json(json: JsonValue) -> Self {
        match json {
            JsonValue::Null => Value::Null,
            JsonValue::Bool(b) => Value::Boolean(b),
            JsonValue::Number(n) => n.as_f64().map_or(Value::Text(n.to_string()), Value::Number),
            JsonValue::String(s) => Value::Text(s),
            JsonValue::Array(items) => {
                Value::Array(items.into_iter().map(Value::from_extended_json).collect())
            }
            JsonValue::Object(map) => {
                if is_wrapper(&map) {
                    return decode_wrapper(map);
                }
                Value::Document(
                    map.into_iter()
                        .map(|(k, v)| (k, Value::from_extended_json(v)))
                        .collect(),
                )
            }
        }
    }

    /// Decode a whole document from extended JSON.
    ///
    /// Returns `None` when the JSON is not an object.
    pub fn document_from_extended_json(json: JsonValue) -> Option<Document> {
        match Value::from_extended_json(json) {
            Value::Document(doc) => Some(doc),
            _ => None,
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Boolean(b)
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Number(n)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Number(n as f64)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Text(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Text(s)
    }
}

impl From<DateTime<Utc>> for Value {
    fn from(ts: DateTime<Utc>) -> Self {
        Value::Timestamp(ts)
    }
}

impl From<Vec<Value>> for Value {
    fn from(items: Vec<Value>) -> Self {
        Value::Array(items)
    }
}

impl From<Document> for Value {
    fn from(doc: Document) -> Self {
        Value::Document(doc)
    }
}

fn is_wrapper(map: &serde_json::Map<String, JsonValue>) -> bool {
    !map.is_empty() && map.keys().all(|k| k.starts_with('$'))
}

/// Unwrap a `{"$type": ...}` object. Unknown wrappers keep their JSON text.
fn decode_wrapper(map: serde_json::Map<String, JsonValue>) -> Value {
    if map.len() == 1 {
        if let Some((key, inner)) = map.iter().next() {
            let decoded = match key.as_str() {
                "$oid" => inner.as_str().map(Value::identifier),
                "$date" => parse_date(inner).map(Value::Timestamp),
                "$numberInt" | "$numberLong" | "$numberDouble" | "$numberDecimal" => {
                    parse_number(inner).map(Value::Number)
                }
                _ => None,
            };
            if let Some(value) = decoded {
                return value;
            }
        }
    }
    Value::Text(JsonValue::Object(map).to_string())
}

fn parse_date(inner: &JsonValue) -> Option<DateTime<Utc>> {
    match inner {
        JsonValue::String(s) => DateTime::parse_from_rfc3339(s)
            .ok()
            .map(|dt| dt.with_timezone(&Utc)),
        JsonValue::Number(n) => n.as_i64().and_then(|ms| Utc.timestamp_millis_opt(ms).single()),
        JsonValue::Object(obj) => obj
            .get("$numberLong")
            .and_then(parse_number)
            .and_then(|ms| Utc.timestamp_millis_opt(ms as i64).single()),
        _ => None,
    }
}

fn parse_number(inner: &JsonValue) -> Option<f64> {
    match inner {
        JsonValue::String(s) => s.parse::<f64>().ok(),
        JsonValue::Number(n) => n.as_f64(),
        _ => None,
    }
}
