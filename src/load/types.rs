//! Load lifecycle types

use crate::error::{Error, Result};
use crate::polling::PollConfig;
use crate::warehouse::{JobError, JobHandle, LoadRequest};

/// How a load is driven
#[derive(Debug, Clone, Default)]
pub struct LoadOptions {
    /// Polling for the staged object to become visible
    pub visibility: PollConfig,
    /// Polling for the job to finish
    pub job: PollConfig,
    /// Return right after submission
    pub async_mode: bool,
    /// Delete the staged object after a successful load
    pub auto_clean: bool,
    /// Build the request but do not submit it
    pub dry_run: bool,
}

/// Result of a finished job
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadOutcome {
    Success,
    Failure(Vec<JobError>),
}

impl LoadOutcome {
    /// Classify the errors of a finished job
    pub fn from_errors(errors: Vec<JobError>) -> Self {
        if errors.is_empty() {
            LoadOutcome::Success
        } else {
            LoadOutcome::Failure(errors)
        }
    }

    /// Check if the load succeeded
    pub fn is_success(&self) -> bool {
        matches!(self, LoadOutcome::Success)
    }
}

/// What happened to the staged object after the load
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum CleanupStatus {
    #[default]
    Skipped,
    Deleted,
    Failed(String),
}

/// How far the load got
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadState {
    /// Nothing was submitted
    DryRun,
    /// Submitted without waiting for the result
    Submitted(JobHandle),
    /// The job finished
    Done { job: JobHandle, outcome: LoadOutcome },
}

/// Report of one load
#[derive(Debug, Clone, PartialEq)]
pub struct LoadReport {
    /// The request that was (or would have been) submitted
    pub request: LoadRequest,
    pub state: LoadState,
    pub cleanup: CleanupStatus,
}

impl LoadReport {
    /// The submitted job, if any
    pub fn job(&self) -> Option<&JobHandle> {
        match &self.state {
            LoadState::DryRun => None,
            LoadState::Submitted(job) | LoadState::Done { job, .. } => Some(job),
        }
    }

    /// Turn a failed job or a failed cleanup into an error.
    ///
    /// A failed cleanup only surfaces after a successful load.
    pub fn ensure_success(&self) -> Result<()> {
        if let LoadState::Done {
            job,
            outcome: LoadOutcome::Failure(errors),
        } = &self.state
        {
            return Err(Error::JobFailure {
                job_id: job.id.clone(),
                errors: errors.clone(),
            });
        }
        if let CleanupStatus::Failed(message) = &self.cleanup {
            return Err(Error::cleanup(
                self.request.source_uris.join(","),
                message.clone(),
            ));
        }
        Ok(())
    }
}
