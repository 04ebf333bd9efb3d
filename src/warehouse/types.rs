//! Load job types

use crate::schema::Column;
use crate::types::JsonValue;
use serde::{Deserialize, Serialize};
use serde_json::json;

/// A fully qualified destination table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableRef {
    #[serde(rename = "projectId")]
    pub project: String,
    #[serde(rename = "datasetId")]
    pub dataset: String,
    #[serde(rename = "tableId")]
    pub table: String,
}

impl TableRef {
    /// Create a table reference
    pub fn new(
        project: impl Into<String>,
        dataset: impl Into<String>,
        table: impl Into<String>,
    ) -> Self {
        Self {
            project: project.into(),
            dataset: dataset.into(),
            table: table.into(),
        }
    }
}

impl std::fmt::Display for TableRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}.{}", self.project, self.dataset, self.table)
    }
}

/// Loads always replace the table contents
pub const WRITE_DISPOSITION: &str = "WRITE_TRUNCATE";

/// A bulk load of staged files into a table
#[derive(Debug, Clone, PartialEq)]
pub struct LoadRequest {
    /// Staged objects to read
    pub source_uris: Vec<String>,
    /// Table to write
    pub destination: TableRef,
    /// Table schema
    pub schema: Vec<Column>,
    /// Whether values for columns absent from the schema are dropped
    pub ignore_unknown_values: bool,
}

impl LoadRequest {
    /// Create a request that ignores unknown values
    pub fn new(source_uri: impl Into<String>, destination: TableRef, schema: Vec<Column>) -> Self {
        Self {
            source_uris: vec![source_uri.into()],
            destination,
            schema,
            ignore_unknown_values: true,
        }
    }

    /// The `configuration.load` object of a load job
    pub fn to_load_config(&self) -> JsonValue {
        json!({
            "sourceFormat": "NEWLINE_DELIMITED_JSON",
            "sourceUris": self.source_uris,
            "destinationTable": self.destination,
            "schema": { "fields": self.schema },
            "writeDisposition": WRITE_DISPOSITION,
            "ignoreUnknownValues": self.ignore_unknown_values,
        })
    }
}

/// A submitted job
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobHandle {
    /// Job identifier
    pub id: String,
    /// Region the job runs in, when the warehouse reports one
    pub location: Option<String>,
}

impl JobHandle {
    /// Create a handle
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            location: None,
        }
    }

    /// Set the location
    #[must_use]
    pub fn with_location(mut self, location: impl Into<String>) -> Self {
        self.location = Some(location.into());
        self
    }
}

impl std::fmt::Display for JobHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.location {
            Some(location) => write!(f, "{} ({location})", self.id),
            None => write!(f, "{}", self.id),
        }
    }
}

/// Lifecycle state of a job
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum JobState {
    #[serde(rename = "PENDING", alias = "SUBMITTED")]
    Submitted,
    Done,
    #[serde(other)]
    Running,
}

impl JobState {
    /// Check if the job has stopped
    pub fn is_terminal(&self) -> bool {
        matches!(self, JobState::Done)
    }
}

impl std::fmt::Display for JobState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            JobState::Submitted => write!(f, "SUBMITTED"),
            JobState::Running => write!(f, "RUNNING"),
            JobState::Done => write!(f, "DONE"),
        }
    }
}

/// One error reported by a finished job
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobError {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(default)]
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

impl JobError {
    /// Create an error with an optional location
    pub fn new(location: Option<&str>, message: impl Into<String>) -> Self {
        Self {
            location: location.map(str::to_string),
            message: message.into(),
            reason: None,
        }
    }
}

impl std::fmt::Display for JobError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.location {
            Some(location) => write!(f, "{location}: {}", self.message),
            None => write!(f, "{}", self.message),
        }
    }
}

/// Reported status of a job
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobStatus {
    pub state: JobState,
    /// Errors reported by the job. Non-empty on a finished job means failure.
    pub errors: Vec<JobError>,
}

impl JobStatus {
    /// A job still in progress
    pub fn running() -> Self {
        Self {
            state: JobState::Running,
            errors: Vec::new(),
        }
    }

    /// A finished job with its errors
    pub fn done(errors: Vec<JobError>) -> Self {
        Self {
            state: JobState::Done,
            errors,
        }
    }

    /// Check if the job finished without errors
    pub fn is_success(&self) -> bool {
        self.state.is_terminal() && self.errors.is_empty()
    }
}
