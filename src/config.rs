//! Run configuration
//!
//! A [`RunConfig`] can be loaded from a YAML (or JSON) file and is then
//! overridden field by field by command-line flags. Once validated it is
//! turned into the collaborator settings of a transfer.

use crate::engine::TransferConfig;
use crate::error::{Error, Result};
use crate::load::LoadOptions;
use crate::polling::PollConfig;
use crate::schema::{sanitize_name, Column, ColumnType};
use crate::source::{SourceQuery, DEFAULT_BATCH_SIZE};
use crate::storage::{GcsBucketConfig, DEFAULT_STORAGE_ENDPOINT, DEFAULT_SUFFIX_FORMAT};
use crate::transform::{TransformerConfig, DEFAULT_BOOKKEEPING_KEYS};
use crate::types::{Compression, JsonObject, OptionStringExt};
use crate::warehouse::{BigQueryConfig, TableRef, DEFAULT_ENDPOINT};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

// ============================================================================
// Run Config
// ============================================================================

/// Everything one run needs, as read from a config file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RunConfig {
    // Destination
    /// Warehouse project
    #[serde(default)]
    pub project: Option<String>,

    /// Warehouse dataset
    #[serde(default)]
    pub dataset: Option<String>,

    /// Destination table (defaults to the sanitized collection name)
    #[serde(default)]
    pub table: Option<String>,

    // Staging
    /// Staging bucket
    #[serde(default)]
    pub bucket: Option<String>,

    /// Path prefix inside the bucket
    #[serde(default)]
    pub path: String,

    /// strftime format of the file name suffix
    #[serde(default = "default_suffix")]
    pub suffix: String,

    /// Staging root: `gs://`, `s3://`, `az://` or a local directory
    #[serde(default = "default_staging_root")]
    pub staging_root: String,

    /// Cloud Storage JSON API endpoint, used to create `gs://` buckets
    #[serde(default = "default_storage_endpoint")]
    pub storage_endpoint: String,

    /// Gzip the staged file
    #[serde(default)]
    pub compress: bool,

    // Source
    /// Directory (or file) holding the collection exports
    #[serde(default = "default_source")]
    pub source: String,

    /// Collection to transfer
    #[serde(default)]
    pub collection: Option<String>,

    /// Query filter
    #[serde(default)]
    pub query: JsonObject,

    /// Projected fields (empty = all)
    #[serde(default)]
    pub fields: Vec<String>,

    /// Documents read per batch
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,

    /// Keys dropped from every document
    #[serde(default = "default_bookkeeping_keys")]
    pub bookkeeping_keys: Vec<String>,

    // Schema
    /// JSON file with a fixed schema; disables detection
    #[serde(default)]
    pub schema: Option<PathBuf>,

    // Load
    /// Do not wait for the load job
    #[serde(default, rename = "async")]
    pub async_mode: bool,

    /// Delete the staged file after a successful load
    #[serde(default)]
    pub autoclean: bool,

    /// Infer and print the schema without staging or loading anything
    #[serde(default)]
    pub dryrun: bool,

    // Polling
    /// Seconds between job status polls
    #[serde(default = "default_interval_secs")]
    pub poll_interval_secs: u64,

    /// Seconds between staged-object visibility checks
    #[serde(default = "default_interval_secs")]
    pub visibility_interval_secs: u64,

    /// Give up waiting for visibility after this many seconds
    #[serde(default)]
    pub visibility_timeout_secs: Option<u64>,

    /// Give up waiting for the job after this many seconds
    #[serde(default)]
    pub job_timeout_secs: Option<u64>,

    // Warehouse
    /// Warehouse API endpoint
    #[serde(default = "default_endpoint")]
    pub warehouse_endpoint: String,

    /// OAuth access token (falls back to the environment)
    #[serde(default, skip_serializing)]
    pub access_token: Option<String>,
}

fn default_suffix() -> String {
    DEFAULT_SUFFIX_FORMAT.to_string()
}

fn default_staging_root() -> String {
    "gs://".to_string()
}

fn default_storage_endpoint() -> String {
    DEFAULT_STORAGE_ENDPOINT.to_string()
}

fn default_source() -> String {
    ".".to_string()
}

fn default_batch_size() -> usize {
    DEFAULT_BATCH_SIZE
}

fn default_bookkeeping_keys() -> Vec<String> {
    DEFAULT_BOOKKEEPING_KEYS
        .iter()
        .map(ToString::to_string)
        .collect()
}

fn default_interval_secs() -> u64 {
    5
}

fn default_endpoint() -> String {
    DEFAULT_ENDPOINT.to_string()
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            project: None,
            dataset: None,
            table: None,
            bucket: None,
            path: String::new(),
            suffix: default_suffix(),
            staging_root: default_staging_root(),
            storage_endpoint: default_storage_endpoint(),
            compress: false,
            source: default_source(),
            collection: None,
            query: JsonObject::new(),
            fields: Vec::new(),
            batch_size: default_batch_size(),
            bookkeeping_keys: default_bookkeeping_keys(),
            schema: None,
            async_mode: false,
            autoclean: false,
            dryrun: false,
            poll_interval_secs: default_interval_secs(),
            visibility_interval_secs: default_interval_secs(),
            visibility_timeout_secs: None,
            job_timeout_secs: None,
            warehouse_endpoint: default_endpoint(),
            access_token: None,
        }
    }
}

impl RunConfig {
    /// Load a config file (YAML, or JSON as a YAML subset)
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| {
            Error::config(format!(
                "Failed to read config file '{}': {e}",
                path.display()
            ))
        })?;
        Self::from_yaml(&content)
    }

    /// Parse a config document
    pub fn from_yaml(content: &str) -> Result<Self> {
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_yaml::from_str(content)?)
    }

    /// Check that every required setting is present
    pub fn validate(&self) -> Result<()> {
        for (field, value) in [
            ("project", &self.project),
            ("dataset", &self.dataset),
            ("bucket", &self.bucket),
            ("collection", &self.collection),
        ] {
            if value.as_deref().map_or(true, str::is_empty) {
                return Err(Error::missing_field(field));
            }
        }
        if self.batch_size == 0 {
            return Err(Error::config("batch_size must be at least 1"));
        }
        if self.poll_interval_secs == 0 || self.visibility_interval_secs == 0 {
            return Err(Error::config("poll intervals must be at least 1 second"));
        }
        Ok(())
    }

    fn required(value: &Option<String>, field: &str) -> Result<String> {
        value.clone().ok_or_else(|| Error::missing_field(field))
    }

    /// Collection name
    pub fn collection_name(&self) -> Result<String> {
        Self::required(&self.collection, "collection")
    }

    /// Destination table, defaulting to the sanitized collection name
    pub fn table_ref(&self) -> Result<TableRef> {
        let table = match self.table.clone().none_if_empty() {
            Some(table) => table,
            None => sanitize_name(&self.collection_name()?),
        };
        Ok(TableRef::new(
            Self::required(&self.project, "project")?,
            Self::required(&self.dataset, "dataset")?,
            table,
        ))
    }

    /// Compression of the staged file
    pub fn compression(&self) -> Compression {
        if self.compress {
            Compression::Gzip
        } else {
            Compression::None
        }
    }

    /// Source query
    pub fn source_query(&self) -> Result<SourceQuery> {
        Ok(SourceQuery::new(self.collection_name()?)
            .with_filter(self.query.clone())
            .with_fields(self.fields.clone())
            .with_batch_size(self.batch_size))
    }

    /// Load lifecycle settings
    pub fn load_options(&self) -> LoadOptions {
        let mut visibility = PollConfig::every(Duration::from_secs(self.visibility_interval_secs));
        if let Some(secs) = self.visibility_timeout_secs {
            visibility = visibility.with_timeout(Duration::from_secs(secs));
        }
        let mut job = PollConfig::every(Duration::from_secs(self.poll_interval_secs));
        if let Some(secs) = self.job_timeout_secs {
            job = job.with_timeout(Duration::from_secs(secs));
        }

        LoadOptions {
            visibility,
            job,
            async_mode: self.async_mode,
            auto_clean: self.autoclean,
            dry_run: self.dryrun,
        }
    }

    /// Warehouse client settings
    pub fn warehouse_config(&self) -> Result<BigQueryConfig> {
        let mut config = BigQueryConfig::new(Self::required(&self.project, "project")?)
            .with_endpoint(self.warehouse_endpoint.clone());
        if let Some(token) = self.access_token.clone().none_if_empty() {
            config = config.with_access_token(token);
        }
        Ok(config)
    }

    /// Bucket client settings for `gs://` staging
    pub fn gcs_bucket_config(&self) -> Result<GcsBucketConfig> {
        let mut config = GcsBucketConfig::new(Self::required(&self.project, "project")?)
            .with_endpoint(self.storage_endpoint.clone());
        if let Some(token) = self.access_token.clone().none_if_empty() {
            config = config.with_access_token(token);
        }
        Ok(config)
    }

    /// Read the fixed schema file, if one is configured
    pub fn fixed_schema(&self) -> Result<Option<Vec<Column>>> {
        let Some(path) = &self.schema else {
            return Ok(None);
        };
        let content = fs::read_to_string(path).map_err(|e| {
            Error::config(format!(
                "Failed to read schema file '{}': {e}",
                path.display()
            ))
        })?;
        let columns = parse_schema(&content)?;
        Ok(Some(columns))
    }

    /// Full transfer settings
    pub fn transfer_config(&self) -> Result<TransferConfig> {
        self.validate()?;

        let transformer =
            TransformerConfig::new().with_bookkeeping_keys(self.bookkeeping_keys.clone());
        let mut config = TransferConfig::new(
            self.source_query()?,
            Self::required(&self.bucket, "bucket")?,
            self.table_ref()?,
        )
        .with_prefix(self.path.clone())
        .with_suffix_format(self.suffix.clone())
        .with_compression(self.compression())
        .with_transformer(transformer)
        .with_load_options(self.load_options());

        if let Some(schema) = self.fixed_schema()? {
            config = config.with_fixed_schema(schema);
        }
        Ok(config)
    }
}

/// Parse a schema file: a column list, or an object with a `fields` list
pub fn parse_schema(content: &str) -> Result<Vec<Column>> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum SchemaFile {
        Columns(Vec<Column>),
        Fields { fields: Vec<Column> },
    }

    let columns = match serde_json::from_str::<SchemaFile>(content)
        .map_err(|e| Error::config(format!("Invalid schema file: {e}")))?
    {
        SchemaFile::Columns(columns) | SchemaFile::Fields { fields: columns } => columns,
    };

    if columns.is_empty() {
        return Err(Error::config("Schema file has no columns"));
    }
    for column in &columns {
        check_column(column)?;
    }
    Ok(columns)
}

fn check_column(column: &Column) -> Result<()> {
    if column.name.is_empty() {
        return Err(Error::config("Schema column with an empty name"));
    }
    match (column.column_type, column.fields.is_empty()) {
        (ColumnType::Record, true) => Err(Error::config(format!(
            "RECORD column '{}' has no fields",
            column.name
        ))),
        (ColumnType::Record, false) => column.fields.iter().try_for_each(check_column),
        (_, false) => Err(Error::config(format!(
            "Column '{}' of type {} cannot have fields",
            column.name, column.column_type
        ))),
        (_, true) => Ok(()),
    }
}
