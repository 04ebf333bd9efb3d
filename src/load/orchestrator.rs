//! Load orchestrator

use super::types::{CleanupStatus, LoadOptions, LoadOutcome, LoadReport, LoadState};
use crate::error::{Error, Result};
use crate::polling::Poller;
use crate::schema::Column;
use crate::storage::{StagedObject, StagingStore};
use crate::warehouse::{JobHandle, JobStatus, LoadRequest, TableRef, Warehouse};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

/// Drives a staged object through visibility, submission, polling and cleanup
pub struct LoadOrchestrator {
    staging: Arc<dyn StagingStore>,
    warehouse: Arc<dyn Warehouse>,
    options: LoadOptions,
    cancel: CancellationToken,
}

impl LoadOrchestrator {
    /// Create an orchestrator
    pub fn new(
        staging: Arc<dyn StagingStore>,
        warehouse: Arc<dyn Warehouse>,
        options: LoadOptions,
    ) -> Self {
        Self {
            staging,
            warehouse,
            options,
            cancel: CancellationToken::new(),
        }
    }

    /// Stop polling loops when this token is cancelled
    #[must_use]
    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// Get the options
    pub fn options(&self) -> &LoadOptions {
        &self.options
    }

    /// Build the load request for a staged object
    pub fn build_request(
        &self,
        object: &StagedObject,
        destination: TableRef,
        schema: Vec<Column>,
    ) -> LoadRequest {
        LoadRequest::new(self.staging.uri(object), destination, schema)
    }

    /// Wait until the staged object is visible to the store
    pub async fn wait_visible(&self, object: &StagedObject) -> Result<()> {
        let poller = Poller::new(self.options.visibility.clone(), self.cancel.clone());
        let staging = &self.staging;
        let what = format!("staged object {}", staging.uri(object));

        poller
            .poll_until(&what, |attempt| async move {
                let visible = staging.object_exists(object).await?;
                if !visible {
                    debug!("{object} not visible yet (attempt {})", attempt + 1);
                }
                Ok(visible.then_some(()))
            })
            .await?;
        info!("{} is visible", staging.uri(object));
        Ok(())
    }

    /// Submit the load job
    pub async fn submit(&self, request: &LoadRequest) -> Result<JobHandle> {
        let job = self
            .warehouse
            .submit_load_job(request)
            .await
            .map_err(|e| match e {
                Error::JobSubmission { .. } => e,
                other => Error::job_submission(other.to_string()),
            })?;
        info!("Submitted load job {job} into {}", request.destination);
        Ok(job)
    }

    /// Poll the job until it finishes
    pub async fn wait_for_job(&self, job: &JobHandle) -> Result<JobStatus> {
        let poller = Poller::new(self.options.job.clone(), self.cancel.clone());
        let warehouse = &self.warehouse;
        let what = format!("load job {}", job.id);

        poller
            .poll_until(&what, |attempt| async move {
                let status = warehouse.job_status(job).await?;
                debug!("Job {} is {} (attempt {})", job.id, status.state, attempt + 1);
                Ok(status.state.is_terminal().then_some(status))
            })
            .await
    }

    /// Classify a finished job, logging each reported error
    pub fn classify(&self, status: JobStatus) -> LoadOutcome {
        let outcome = LoadOutcome::from_errors(status.errors);
        match &outcome {
            LoadOutcome::Success => info!("Load job SUCCESS"),
            LoadOutcome::Failure(errors) => {
                error!("Load job FAILURE with {} error(s)", errors.len());
                for err in errors {
                    error!(
                        "  location: {}, message: {}",
                        err.location.as_deref().unwrap_or("-"),
                        err.message
                    );
                }
            }
        }
        outcome
    }

    /// Delete the staged object, reporting rather than raising failures
    pub async fn cleanup(&self, object: &StagedObject) -> CleanupStatus {
        match self.staging.delete_object(object).await {
            Ok(()) => {
                info!("Deleted staged object {}", self.staging.uri(object));
                CleanupStatus::Deleted
            }
            Err(e) => {
                warn!("Cleanup failed: {e}");
                CleanupStatus::Failed(e.to_string())
            }
        }
    }

    /// Run the whole lifecycle for a staged object
    pub async fn run(
        &self,
        object: &StagedObject,
        destination: TableRef,
        schema: Vec<Column>,
    ) -> Result<LoadReport> {
        let request = self.build_request(object, destination, schema);
        info!(
            "Load configuration: {}",
            serde_json::to_string_pretty(&request.to_load_config())?
        );

        if self.options.dry_run {
            info!("Dry run: skipping load into {}", request.destination);
            return Ok(LoadReport {
                request,
                state: LoadState::DryRun,
                cleanup: CleanupStatus::Skipped,
            });
        }

        self.wait_visible(object).await?;
        let job = self.submit(&request).await?;

        if self.options.async_mode {
            info!("Async mode: not waiting for job {job}");
            return Ok(LoadReport {
                request,
                state: LoadState::Submitted(job),
                cleanup: CleanupStatus::Skipped,
            });
        }

        let status = self.wait_for_job(&job).await?;
        let outcome = self.classify(status);
        let cleanup = if outcome.is_success() && self.options.auto_clean {
            self.cleanup(object).await
        } else {
            CleanupStatus::Skipped
        };

        Ok(LoadReport {
            request,
            state: LoadState::Done { job, outcome },
            cleanup,
        })
    }
}
