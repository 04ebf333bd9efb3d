//! Error types for doc2table
//!
//! This module defines the error hierarchy for the whole transfer.
//! All public APIs return `Result<T, Error>` where Error is defined here.

use crate::warehouse::JobError;
use thiserror::Error;

/// The main error type for doc2table
#[derive(Error, Debug)]
pub enum Error {
    // ============================================================================
    // Configuration Errors
    // ============================================================================
    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("Missing required config field: {field}")]
    MissingConfigField { field: String },

    #[error("Failed to parse YAML: {0}")]
    YamlParse(#[from] serde_yaml::Error),

    #[error("Failed to parse JSON: {0}")]
    JsonParse(#[from] serde_json::Error),

    // ============================================================================
    // Source Errors
    // ============================================================================
    #[error("Source connection failed: {message}")]
    SourceConnection { message: String },

    #[error("Invalid document at line {line}: {message}")]
    InvalidDocument { line: usize, message: String },

    #[error("No documents found in collection '{collection}'")]
    EmptyCollection { collection: String },

    // ============================================================================
    // Staging Errors
    // ============================================================================
    #[error("Failed to write staged object '{path}': {message}")]
    SinkWrite { path: String, message: String },

    #[error("Storage error: {0}")]
    Storage(#[from] object_store::Error),

    // ============================================================================
    // Warehouse Errors
    // ============================================================================
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("HTTP {status}: {body}")]
    HttpStatus { status: u16, body: String },

    #[error("Load job submission failed: {message}")]
    JobSubmission { message: String },

    #[error("Load job {job_id} failed with {} error(s)", errors.len())]
    JobFailure { job_id: String, errors: Vec<JobError> },

    #[error("Failed to clean up staged object '{path}': {message}")]
    Cleanup { path: String, message: String },

    // ============================================================================
    // Polling Errors
    // ============================================================================
    #[error("Gave up waiting for {what} after {attempts} attempts")]
    PollExhausted { what: String, attempts: u32 },

    #[error("Timed out waiting for {what} after {timeout_secs}s")]
    Timeout { what: String, timeout_secs: u64 },

    #[error("Cancelled while waiting for {what}")]
    Cancelled { what: String },

    // ============================================================================
    // I/O Errors
    // ============================================================================
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // ============================================================================
    // Generic Errors
    // ============================================================================
    #[error("{0}")]
    Other(String),

    #[error(transparent)]
    Anyhow(#[from] anyhow::Error),
}

impl Error {
    /// Create a config error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Create a missing field error
    pub fn missing_field(field: impl Into<String>) -> Self {
        Self::MissingConfigField {
            field: field.into(),
        }
    }

    /// Create a source connection error
    pub fn source(message: impl Into<String>) -> Self {
        Self::SourceConnection {
            message: message.into(),
        }
    }

    /// Create a sink write error
    pub fn sink_write(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self::SinkWrite {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Create a job submission error
    pub fn job_submission(message: impl Into<String>) -> Self {
        Self::JobSubmission {
            message: message.into(),
        }
    }

    /// Create a cleanup error
    pub fn cleanup(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Cleanup {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Create an HTTP status error
    pub fn http_status(status: u16, body: impl Into<String>) -> Self {
        Self::HttpStatus {
            status,
            body: body.into(),
        }
    }

    /// Process exit code for this error. Always non-zero.
    pub fn exit_code(&self) -> i32 {
        match self {
            Error::Config { .. }
            | Error::MissingConfigField { .. }
            | Error::YamlParse(_)
            | Error::JsonParse(_)
            | Error::InvalidUrl(_) => 2,
            Error::JobFailure { .. } => 3,
            Error::Cleanup { .. } => 4,
            _ => 1,
        }
    }
}

/// Result type alias for doc2table
pub type Result<T> = std::result::Result<T, Error>;

/// Extension trait for adding context to errors
pub trait ResultExt<T> {
    /// Add context to an error
    fn context(self, message: impl Into<String>) -> Result<T>;

    /// Add context with a closure (lazy evaluation)
    fn with_context<F: FnOnce() -> String>(self, f: F) -> Result<T>;
}

impl<T, E: Into<Error>> ResultExt<T> for std::result::Result<T, E> {
    fn context(self, message: impl Into<String>) -> Result<T> {
        self.map_err(|e| {
            let inner = e.into();
            Error::Other(format!("{}: {}", message.into(), inner))
        })
    }

    fn with_context<F: FnOnce() -> String>(self, f: F) -> Result<T> {
        self.map_err(|e| {
            let inner = e.into();
            Error::Other(format!("{}: {}", f(), inner))
        })
    }
}
