//! Engine types
//!
//! Configuration and report of a single transfer.

use crate::error::Result;
use crate::load::{CleanupStatus, LoadOptions, LoadOutcome, LoadReport, LoadState};
use crate::schema::Column;
use crate::source::SourceQuery;
use crate::storage::{StagedObject, DEFAULT_SUFFIX_FORMAT};
use crate::transform::TransformerConfig;
use crate::types::Compression;
use crate::warehouse::{JobHandle, TableRef};

/// Configuration for one collection-to-table transfer
#[derive(Debug, Clone)]
pub struct TransferConfig {
    /// What to read
    pub query: SourceQuery,
    /// Staging bucket
    pub bucket: String,
    /// Path prefix inside the bucket
    pub prefix: String,
    /// strftime format of the staged file name suffix
    pub suffix_format: String,
    /// Compression of the staged file
    pub compression: Compression,
    /// Destination table
    pub destination: TableRef,
    /// Record transformation settings
    pub transformer: TransformerConfig,
    /// Use this schema instead of detecting one
    pub fixed_schema: Option<Vec<Column>>,
    /// Load lifecycle settings
    pub load: LoadOptions,
}

impl TransferConfig {
    /// Create a config with defaults for everything but the endpoints
    pub fn new(query: SourceQuery, bucket: impl Into<String>, destination: TableRef) -> Self {
        Self {
            query,
            bucket: bucket.into(),
            prefix: String::new(),
            suffix_format: DEFAULT_SUFFIX_FORMAT.to_string(),
            compression: Compression::None,
            destination,
            transformer: TransformerConfig::default(),
            fixed_schema: None,
            load: LoadOptions::default(),
        }
    }

    /// Set the path prefix
    #[must_use]
    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = prefix.into();
        self
    }

    /// Set the file name suffix format
    #[must_use]
    pub fn with_suffix_format(mut self, format: impl Into<String>) -> Self {
        self.suffix_format = format.into();
        self
    }

    /// Set compression
    #[must_use]
    pub fn with_compression(mut self, compression: Compression) -> Self {
        self.compression = compression;
        self
    }

    /// Set transformer settings
    #[must_use]
    pub fn with_transformer(mut self, transformer: TransformerConfig) -> Self {
        self.transformer = transformer;
        self
    }

    /// Use a fixed schema
    #[must_use]
    pub fn with_fixed_schema(mut self, schema: Vec<Column>) -> Self {
        self.fixed_schema = Some(schema);
        self
    }

    /// Set load options
    #[must_use]
    pub fn with_load_options(mut self, load: LoadOptions) -> Self {
        self.load = load;
        self
    }
}

/// Report of a finished transfer
#[derive(Debug, Clone, PartialEq)]
pub struct TransferReport {
    /// Records exported
    pub records: u64,
    /// Bytes written to staging
    pub bytes_written: u64,
    /// Schema sent with the load
    pub schema: Vec<Column>,
    /// The staged object
    pub staged: StagedObject,
    /// Load lifecycle result
    pub load: LoadReport,
    /// Duration in milliseconds
    pub duration_ms: u64,
}

impl TransferReport {
    /// Job outcome, when the run waited for one
    pub fn outcome(&self) -> Option<&LoadOutcome> {
        match &self.load.state {
            LoadState::Done { outcome, .. } => Some(outcome),
            _ => None,
        }
    }

    /// The submitted job, if any
    pub fn job(&self) -> Option<&JobHandle> {
        self.load.job()
    }

    /// What happened to the staged object
    pub fn cleanup(&self) -> &CleanupStatus {
        &self.load.cleanup
    }

    /// Fail on a failed job or a failed cleanup
    pub fn ensure_success(&self) -> Result<()> {
        self.load.ensure_success()
    }
}
