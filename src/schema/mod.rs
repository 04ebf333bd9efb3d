//! Schema inference module
//!
//! Derives the target table schema from the documents themselves.
//!
//! # Features
//!
//! - **Type Inference**: STRING, FLOAT, BOOLEAN, TIMESTAMP or RECORD per value
//! - **Mode Inference**: REPEATED for arrays, NULLABLE otherwise
//! - **Normalization**: values rewritten into loader-friendly JSON
//! - **Accumulation**: first-seen definitions win, RECORD fields deep-merge
//! - **Deterministic Order**: `id` first, then lexical, at every level

mod accumulator;
mod inference;
mod naming;
mod types;

pub use accumulator::{finalize_columns, merge, SchemaAccumulator, ID_COLUMN};
pub use inference::{format_timestamp, infer_mode, infer_type, normalize_value, TIMESTAMP_FORMAT};
pub use naming::sanitize_name;
pub use types::{Column, ColumnMode, ColumnType};

pub(crate) use inference::project_document;
