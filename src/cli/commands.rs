//! CLI arguments

use crate::config::RunConfig;
use crate::error::{Error, Result};
use crate::types::JsonObject;
use clap::Parser;
use std::path::PathBuf;

/// Load a document collection into a warehouse table
#[derive(Parser, Debug, Default)]
#[command(name = "doc2table")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Configuration file (YAML or JSON); flags override its values
    #[arg(short = 'C', long)]
    pub config: Option<PathBuf>,

    /// Warehouse project
    #[arg(long)]
    pub project: Option<String>,

    /// Warehouse dataset
    #[arg(long)]
    pub dataset: Option<String>,

    /// Destination table (defaults to the collection name)
    #[arg(long)]
    pub table: Option<String>,

    /// Staging bucket
    #[arg(long)]
    pub bucket: Option<String>,

    /// Path prefix inside the bucket
    #[arg(long)]
    pub path: Option<String>,

    /// File name suffix format (strftime)
    #[arg(long)]
    pub suffix: Option<String>,

    /// Directory (or file) holding the collection exports
    #[arg(long)]
    pub source: Option<String>,

    /// Collection to transfer
    #[arg(long)]
    pub collection: Option<String>,

    /// Query filter as a JSON object
    #[arg(long)]
    pub query: Option<String>,

    /// Fields to project (comma-separated)
    #[arg(long, value_delimiter = ',')]
    pub fields: Option<Vec<String>>,

    /// Documents read per batch
    #[arg(long)]
    pub batch_size: Option<usize>,

    /// Gzip the staged file
    #[arg(long)]
    pub compress: bool,

    /// Return after submitting the load job
    #[arg(long = "async")]
    pub async_mode: bool,

    /// Delete the staged file after a successful load
    #[arg(long)]
    pub autoclean: bool,

    /// Infer the schema and show the load configuration without staging or loading
    #[arg(long)]
    pub dryrun: bool,

    /// Fixed schema file (JSON); disables schema detection
    #[arg(long)]
    pub schema: Option<PathBuf>,

    /// Staging root: gs://, s3://, az:// or a local directory
    #[arg(long)]
    pub staging_root: Option<String>,

    /// Warehouse API endpoint
    #[arg(long)]
    pub warehouse_endpoint: Option<String>,

    /// Seconds between job status polls
    #[arg(long)]
    pub poll_interval: Option<u64>,

    /// Give up waiting for the staged file after this many seconds
    #[arg(long)]
    pub visibility_timeout: Option<u64>,

    /// Give up waiting for the load job after this many seconds
    #[arg(long)]
    pub job_timeout: Option<u64>,

    /// Verbose output
    #[arg(short, long)]
    pub verbose: bool,
}

impl Cli {
    /// Apply the flags on top of a file config
    pub fn apply(&self, mut config: RunConfig) -> Result<RunConfig> {
        fn set<T: Clone>(target: &mut T, value: Option<&T>) {
            if let Some(value) = value {
                *target = value.clone();
            }
        }
        fn set_some<T: Clone>(target: &mut Option<T>, value: Option<&T>) {
            if let Some(value) = value {
                *target = Some(value.clone());
            }
        }

        set_some(&mut config.project, self.project.as_ref());
        set_some(&mut config.dataset, self.dataset.as_ref());
        set_some(&mut config.table, self.table.as_ref());
        set_some(&mut config.bucket, self.bucket.as_ref());
        set(&mut config.path, self.path.as_ref());
        set(&mut config.suffix, self.suffix.as_ref());
        set(&mut config.source, self.source.as_ref());
        set_some(&mut config.collection, self.collection.as_ref());
        set(&mut config.fields, self.fields.as_ref());
        set(&mut config.batch_size, self.batch_size.as_ref());
        set_some(&mut config.schema, self.schema.as_ref());
        set(&mut config.staging_root, self.staging_root.as_ref());
        set(&mut config.warehouse_endpoint, self.warehouse_endpoint.as_ref());
        set(&mut config.poll_interval_secs, self.poll_interval.as_ref());
        set_some(&mut config.visibility_timeout_secs, self.visibility_timeout.as_ref());
        set_some(&mut config.job_timeout_secs, self.job_timeout.as_ref());

        if let Some(query) = &self.query {
            config.query = parse_query(query)?;
        }

        // Switches only turn features on
        config.compress |= self.compress;
        config.async_mode |= self.async_mode;
        config.autoclean |= self.autoclean;
        config.dryrun |= self.dryrun;

        Ok(config)
    }
}

fn parse_query(query: &str) -> Result<JsonObject> {
    match serde_json::from_str(query) {
        Ok(serde_json::Value::Object(map)) => Ok(map),
        Ok(_) => Err(Error::config("--query must be a JSON object")),
        Err(e) => Err(Error::config(format!("--query is not valid JSON: {e}"))),
    }
}
