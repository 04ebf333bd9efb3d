//! Warehouse load jobs
//!
//! A [`Warehouse`] accepts bulk-load jobs that read staged newline-delimited
//! JSON into a table, and reports their status.
//!
//! # Overview
//!
//! - [`Warehouse`] - trait every warehouse client implements
//! - [`BigQueryClient`] - the BigQuery REST API
//! - [`LoadRequest`] - what to load and where
//! - [`JobHandle`] / [`JobStatus`] - a submitted job and its reported state

mod bigquery;
mod types;

pub(crate) use bigquery::check_status;
pub use bigquery::{BigQueryClient, BigQueryConfig, DEFAULT_ENDPOINT, TOKEN_ENV};
pub use types::{
    JobError, JobHandle, JobState, JobStatus, LoadRequest, TableRef, WRITE_DISPOSITION,
};

use crate::error::Result;
use async_trait::async_trait;

/// A warehouse that can run load jobs
#[async_trait]
pub trait Warehouse: Send + Sync {
    /// Submit a load job
    async fn submit_load_job(&self, request: &LoadRequest) -> Result<JobHandle>;

    /// Fetch the current status of a job
    async fn job_status(&self, job: &JobHandle) -> Result<JobStatus>;
}
