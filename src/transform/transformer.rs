//! Per-document transformer

use crate::document::Document;
use crate::error::Result;
use crate::schema::{project_document, Column, SchemaAccumulator, ID_COLUMN};
use crate::types::JsonObject;

/// Native identifier field of source documents
pub const DEFAULT_ID_FIELD: &str = "_id";

/// Internal bookkeeping keys dropped from every document
pub const DEFAULT_BOOKKEEPING_KEYS: &[&str] = &["__v"];

/// Configuration for the transformer
#[derive(Debug, Clone)]
pub struct TransformerConfig {
    /// Field holding the source identifier, rewritten to `id`
    pub id_field: String,
    /// Keys removed before projection
    pub bookkeeping_keys: Vec<String>,
}

impl Default for TransformerConfig {
    fn default() -> Self {
        Self {
            id_field: DEFAULT_ID_FIELD.to_string(),
            bookkeeping_keys: DEFAULT_BOOKKEEPING_KEYS
                .iter()
                .map(|k| (*k).to_string())
                .collect(),
        }
    }
}

impl TransformerConfig {
    /// Create a config with default settings
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the identifier field
    #[must_use]
    pub fn with_id_field(mut self, field: impl Into<String>) -> Self {
        self.id_field = field.into();
        self
    }

    /// Set the bookkeeping keys
    #[must_use]
    pub fn with_bookkeeping_keys(mut self, keys: Vec<String>) -> Self {
        self.bookkeeping_keys = keys;
        self
    }
}

/// Output of transforming one document
#[derive(Debug, Clone, PartialEq)]
pub struct TransformedRecord {
    /// Normalized record
    pub record: JsonObject,
    /// Columns this document implies (empty with a fixed schema)
    pub schema_delta: Vec<Column>,
}

#[derive(Debug, Clone)]
enum SchemaSource {
    Detect(SchemaAccumulator),
    Fixed(Vec<Column>),
}

/// Transforms documents into records, one at a time, in arrival order
#[derive(Debug, Clone)]
pub struct RecordTransformer {
    config: TransformerConfig,
    schema: SchemaSource,
    records: u64,
}

impl RecordTransformer {
    /// Create a transformer that infers the schema from the documents
    pub fn detecting(config: TransformerConfig) -> Self {
        Self {
            config,
            schema: SchemaSource::Detect(SchemaAccumulator::new()),
            records: 0,
        }
    }

    /// Create a transformer that uses a caller-supplied schema verbatim
    pub fn with_fixed_schema(config: TransformerConfig, columns: Vec<Column>) -> Self {
        Self {
            config,
            schema: SchemaSource::Fixed(columns),
            records: 0,
        }
    }

    /// Whether the schema is being inferred
    pub fn detects_schema(&self) -> bool {
        matches!(self.schema, SchemaSource::Detect(_))
    }

    /// Number of documents transformed so far
    pub fn records(&self) -> u64 {
        self.records
    }

    /// Project a document without touching the accumulated schema
    pub fn project(&self, mut doc: Document) -> TransformedRecord {
        for key in &self.config.bookkeeping_keys {
            doc.remove(key);
        }
        if let Some(id) = doc.remove(&self.config.id_field) {
            doc.insert(ID_COLUMN.to_string(), id);
        }

        let (record, columns) = project_document(&doc);
        TransformedRecord {
            record,
            schema_delta: if self.detects_schema() {
                columns
            } else {
                Vec::new()
            },
        }
    }

    /// Transform a document, merging its columns into the schema
    pub fn transform(&mut self, doc: Document) -> JsonObject {
        let TransformedRecord {
            record,
            schema_delta,
        } = self.project(doc);
        if let SchemaSource::Detect(schema) = &mut self.schema {
            schema.merge_all(schema_delta);
        }
        self.records += 1;
        record
    }

    /// Transform a document into one newline-terminated JSON line
    pub fn transform_line(&mut self, doc: Document) -> Result<String> {
        let record = self.transform(doc);
        let mut line = serde_json::to_string(&record)?;
        line.push('\n');
        Ok(line)
    }

    /// Finish the run: the ordered inferred schema, or the fixed one as given
    pub fn finish(self) -> Vec<Column> {
        match self.schema {
            SchemaSource::Detect(schema) => schema.finalize(),
            SchemaSource::Fixed(columns) => columns,
        }
    }
}
