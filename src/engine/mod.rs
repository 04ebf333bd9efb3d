//! Execution engine module
//!
//! Runs one transfer end to end.
//!
//! # Overview
//!
//! The engine module provides:
//! - `TransferEngine` - composes source, export, staging and load
//! - `TransferConfig` - what to move and how
//! - `TransferReport` - records, schema, staged object and load result

mod types;

pub use types::{TransferConfig, TransferReport};

use crate::error::{Error, Result};
use crate::export::ExportPipeline;
use crate::load::LoadOrchestrator;
use crate::source::DocumentSource;
use crate::storage::{StagedObject, StagingStore};
use crate::transform::RecordTransformer;
use crate::warehouse::Warehouse;
use chrono::Local;
use std::sync::Arc;
use std::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

/// Transfer engine for moving one collection into one table
pub struct TransferEngine {
    source: Arc<dyn DocumentSource>,
    staging: Arc<dyn StagingStore>,
    warehouse: Arc<dyn Warehouse>,
    cancel: CancellationToken,
}

impl TransferEngine {
    /// Create a new transfer engine
    pub fn new(
        source: Arc<dyn DocumentSource>,
        staging: Arc<dyn StagingStore>,
        warehouse: Arc<dyn Warehouse>,
    ) -> Self {
        Self {
            source,
            staging,
            warehouse,
            cancel: CancellationToken::new(),
        }
    }

    /// Abort waits and the export when this token is cancelled
    #[must_use]
    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// Make sure the staging bucket exists, creating it when missing
    pub async fn ensure_bucket(&self, bucket: &str) -> Result<()> {
        if self.staging.bucket_exists(bucket).await? {
            debug!("Bucket '{bucket}' exists");
            return Ok(());
        }
        info!("Creating bucket '{bucket}'");
        self.staging.create_bucket(bucket).await
    }

    /// Run the transfer
    pub async fn run(&self, config: &TransferConfig) -> Result<TransferReport> {
        let start = Instant::now();
        let dry_run = config.load.dry_run;
        let collection = &config.query.collection;

        info!(
            "Transferring '{collection}' from {} into {}{}{}",
            self.source.describe(),
            config.destination,
            if dry_run { " (dry run)" } else { "" },
            if config.load.async_mode { " (async)" } else { "" },
        );

        let staged = StagedObject::for_collection(
            &config.bucket,
            &config.prefix,
            collection,
            &config.suffix_format,
            config.compression,
            Local::now(),
        )?;
        let target = self.staging.uri(&staged);

        debug!("Connecting to {}", self.source.describe());
        let documents = self.source.open(&config.query).await?;

        let transformer = match &config.fixed_schema {
            Some(schema) => {
                RecordTransformer::with_fixed_schema(config.transformer.clone(), schema.clone())
            }
            None => RecordTransformer::detecting(config.transformer.clone()),
        };
        let pipeline = ExportPipeline::new(transformer, config.compression)
            .with_collection(collection.as_str())
            .with_target(target.as_str());

        let export = if dry_run {
            info!("Dry run: exporting to a discarding sink");
            let mut sink = tokio::io::sink();
            self.cancellable("export", pipeline.run(documents, &mut sink))
                .await?
        } else {
            self.ensure_bucket(&config.bucket).await?;
            info!("Staging to {target}");
            let mut writer = self.staging.open_write_stream(&staged).await?;
            self.cancellable("export", pipeline.run(documents, &mut writer))
                .await?
        };
        info!(
            "Exported {} records ({} bytes) with {} top-level columns",
            export.records,
            export.bytes_written,
            export.schema.len()
        );

        let orchestrator = LoadOrchestrator::new(
            self.staging.clone(),
            self.warehouse.clone(),
            config.load.clone(),
        )
        .with_cancellation(self.cancel.clone());
        let load = orchestrator
            .run(&staged, config.destination.clone(), export.schema.clone())
            .await?;

        Ok(TransferReport {
            records: export.records,
            bytes_written: export.bytes_written,
            schema: export.schema,
            staged,
            load,
            duration_ms: start.elapsed().as_millis() as u64,
        })
    }

    async fn cancellable<T>(
        &self,
        what: &str,
        work: impl std::future::Future<Output = Result<T>>,
    ) -> Result<T> {
        tokio::select! {
            biased;
            () = self.cancel.cancelled() => Err(Error::Cancelled { what: what.to_string() }),
            result = work => result,
        }
    }
}
