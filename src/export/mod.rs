//! Streaming export to the staging sink
//!
//! Reads documents from a source stream, transforms each one and writes it
//! as one line of newline-delimited JSON, optionally gzip-compressed, to an
//! async sink. Writes are awaited one record at a time, so a slow sink
//! slows the read side down instead of buffering the whole collection.

mod pipeline;

pub use pipeline::{ExportPipeline, ExportSummary};
