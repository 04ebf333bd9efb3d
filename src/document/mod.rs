//! Document model
//!
//! Source documents are decoded into an explicit [`Value`] sum type so that
//! type inference can match exhaustively instead of probing at runtime.
//!
//! # Extended JSON
//!
//! Collection exports use MongoDB extended JSON, where typed scalars are
//! wrapped in single-key objects:
//!
//! ```text
//! {"_id": {"$oid": "5f1d..."}, "at": {"$date": "2014-12-21T01:02:03Z"}}
//! ```
//!
//! [`Value::from_extended_json`] unwraps those into `Identifier`, `Timestamp`
//! and `Number` variants.

mod value;

pub use value::{Document, Value};
