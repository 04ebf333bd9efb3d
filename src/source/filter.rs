//! Query filter evaluation
//!
//! Supports field equality (dotted paths allowed), `$eq`, `$ne`, `$in`
//! and `$exists`.

use crate::document::Value;
use crate::error::{Error, Result};
use crate::types::{JsonObject, JsonValue};

#[derive(Debug, Clone, PartialEq)]
enum Condition {
    Eq(JsonValue),
    Ne(JsonValue),
    In(Vec<JsonValue>),
    Exists(bool),
}

/// A parsed query filter
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QueryFilter {
    conditions: Vec<(String, Condition)>,
}

impl QueryFilter {
    /// Parse a filter object
    pub fn parse(filter: &JsonObject) -> Result<Self> {
        let mut conditions = Vec::new();

        for (path, expected) in filter {
            if path.starts_with('$') {
                return Err(Error::config(format!(
                    "Unsupported top-level query operator: {path}"
                )));
            }

            match expected {
                JsonValue::Object(ops) if is_operator_object(ops) => {
                    for (op, arg) in ops {
                        conditions.push((path.clone(), parse_operator(op, arg)?));
                    }
                }
                _ => conditions.push((path.clone(), Condition::Eq(expected.clone()))),
            }
        }

        Ok(Self { conditions })
    }

    /// Check if the filter has no conditions
    pub fn is_empty(&self) -> bool {
        self.conditions.is_empty()
    }

    /// Evaluate against a raw document
    pub fn matches(&self, doc: &JsonValue) -> bool {
        self.conditions.iter().all(|(path, condition)| {
            let actual = lookup(doc, path);
            match condition {
                Condition::Eq(expected) => actual.is_some_and(|v| json_eq(v, expected)),
                Condition::Ne(expected) => !actual.is_some_and(|v| json_eq(v, expected)),
                Condition::In(options) => {
                    actual.is_some_and(|v| options.iter().any(|o| json_eq(v, o)))
                }
                Condition::Exists(should) => actual.is_some() == *should,
            }
        })
    }
}

// Extended-JSON wrappers such as {"$oid": ..} are values, not operators
fn is_operator_object(ops: &JsonObject) -> bool {
    !ops.is_empty()
        && ops
            .keys()
            .all(|k| k.starts_with('$') && !Value::is_wrapper_key(k))
}

fn parse_operator(op: &str, arg: &JsonValue) -> Result<Condition> {
    match op {
        "$eq" => Ok(Condition::Eq(arg.clone())),
        "$ne" => Ok(Condition::Ne(arg.clone())),
        "$in" => match arg {
            JsonValue::Array(items) => Ok(Condition::In(items.clone())),
            _ => Err(Error::config("$in expects an array")),
        },
        "$exists" => Ok(Condition::Exists(match arg {
            JsonValue::Bool(b) => *b,
            JsonValue::Number(n) => n.as_f64().is_some_and(|n| n != 0.0),
            _ => return Err(Error::config("$exists expects a boolean")),
        })),
        other => Err(Error::config(format!("Unsupported query operator: {other}"))),
    }
}

fn lookup<'a>(doc: &'a JsonValue, path: &str) -> Option<&'a JsonValue> {
    path.split('.').try_fold(doc, |current, segment| current.get(segment))
}

fn json_eq(a: &JsonValue, b: &JsonValue) -> bool {
    match (a, b) {
        (JsonValue::Number(x), JsonValue::Number(y)) => x.as_f64() == y.as_f64(),
        _ => a == b,
    }
}
