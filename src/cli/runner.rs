//! CLI runner - executes a transfer

use crate::cli::commands::Cli;
use crate::config::RunConfig;
use crate::engine::{TransferEngine, TransferReport};
use crate::error::Result;
use crate::load::{CleanupStatus, LoadOutcome, LoadState};
use crate::source::JsonLinesSource;
use crate::storage::{GcsBuckets, ObjectStoreStaging};
use crate::warehouse::BigQueryClient;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

/// CLI runner
pub struct Runner {
    cli: Cli,
    cancel: CancellationToken,
}

impl Runner {
    /// Create a new runner
    pub fn new(cli: Cli) -> Self {
        Self {
            cli,
            cancel: CancellationToken::new(),
        }
    }

    /// Cancel waits and the export through this token
    #[must_use]
    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// Merge the config file (if any) with the flags
    pub fn config(&self) -> Result<RunConfig> {
        let base = match &self.cli.config {
            Some(path) => RunConfig::from_file(path)?,
            None => RunConfig::default(),
        };
        self.cli.apply(base)
    }

    /// Build the engine for a config
    pub fn engine(&self, config: &RunConfig) -> Result<TransferEngine> {
        let source = JsonLinesSource::new(&config.source);
        let staging = ObjectStoreStaging::parse(&config.staging_root)?
            .with_gcs_buckets(GcsBuckets::new(config.gcs_bucket_config()?)?);
        let warehouse = BigQueryClient::new(config.warehouse_config()?)?;

        Ok(TransferEngine::new(
            Arc::new(source),
            Arc::new(staging),
            Arc::new(warehouse),
        )
        .with_cancellation(self.cancel.clone()))
    }

    /// Run the transfer. Job and cleanup failures become errors.
    pub async fn run(&self) -> Result<TransferReport> {
        let config = self.config()?;
        let transfer = config.transfer_config()?;
        let engine = self.engine(&config)?;

        let report = engine.run(&transfer).await?;
        log_report(&report);
        report.ensure_success()?;
        Ok(report)
    }
}

fn log_report(report: &TransferReport) {
    if let Ok(schema) = serde_json::to_string_pretty(&report.schema) {
        info!("Schema: {schema}");
    }

    match &report.load.state {
        LoadState::DryRun => info!("Dry run complete: {} records", report.records),
        LoadState::Submitted(job) => info!("Load job {job} submitted"),
        LoadState::Done { job, outcome } => match outcome {
            LoadOutcome::Success => info!(
                "DONE: {} records loaded into {} by job {job}",
                report.records, report.load.request.destination
            ),
            LoadOutcome::Failure(errors) => {
                error!("Load job {job} failed with {} error(s)", errors.len());
            }
        },
    }

    if let CleanupStatus::Failed(message) = report.cleanup() {
        warn!("Staged file {} was not cleaned up: {message}", report.staged);
    }
    info!("Finished in {}ms", report.duration_ms);
}
