//! Document sources
//!
//! A source yields the documents of one collection, lazily and in order.
//!
//! # Overview
//!
//! - [`DocumentSource`] - trait every source implements
//! - [`JsonLinesSource`] - reads extended-JSON exports (`mongoexport` output)
//! - [`SourceQuery`] - collection, filter, projection and batch size
//! - [`QueryFilter`] - the subset of query operators applied to each document

mod filter;
mod jsonl;

pub use filter::QueryFilter;
pub use jsonl::JsonLinesSource;

use crate::document::Document;
use crate::error::Result;
use crate::types::JsonObject;
use async_trait::async_trait;
use futures::stream::BoxStream;

/// Default number of documents fetched per batch
pub const DEFAULT_BATCH_SIZE: usize = 1000;

/// A lazy sequence of documents
pub type DocumentStream = BoxStream<'static, Result<Document>>;

/// What to read from a source
#[derive(Debug, Clone, PartialEq)]
pub struct SourceQuery {
    /// Collection name
    pub collection: String,
    /// Query filter
    pub filter: JsonObject,
    /// Projected fields (empty = all)
    pub fields: Vec<String>,
    /// Documents fetched per batch
    pub batch_size: usize,
}

impl SourceQuery {
    /// Query every document of a collection
    pub fn new(collection: impl Into<String>) -> Self {
        Self {
            collection: collection.into(),
            filter: JsonObject::new(),
            fields: Vec::new(),
            batch_size: DEFAULT_BATCH_SIZE,
        }
    }

    /// Set the filter
    #[must_use]
    pub fn with_filter(mut self, filter: JsonObject) -> Self {
        self.filter = filter;
        self
    }

    /// Set the projected fields
    #[must_use]
    pub fn with_fields(mut self, fields: Vec<String>) -> Self {
        self.fields = fields;
        self
    }

    /// Set the batch size
    #[must_use]
    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size.max(1);
        self
    }
}

/// A collection reader
#[async_trait]
pub trait DocumentSource: Send + Sync {
    /// Human-readable location of the source, for logs
    fn describe(&self) -> String;

    /// Start reading. Connection failures surface as
    /// [`Error::SourceConnection`](crate::Error::SourceConnection).
    async fn open(&self, query: &SourceQuery) -> Result<DocumentStream>;
}

#[cfg(test)]
mod tests;
