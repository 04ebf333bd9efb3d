//! Staged object naming

use crate::error::{Error, Result};
use crate::schema::sanitize_name;
use crate::types::Compression;
use chrono::{DateTime, Local};
use std::fmt::Write as _;

/// Default timestamp suffix for staged file names
pub const DEFAULT_SUFFIX_FORMAT: &str = "%Y%m%d%H%M%S";

/// Location of the staged file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StagedObject {
    /// Bucket (or container) name
    pub bucket: String,
    /// Object path inside the bucket, without leading slash
    pub path: String,
}

impl StagedObject {
    /// Create a staged object reference
    pub fn new(bucket: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            bucket: bucket.into(),
            path: path.into().trim_matches('/').to_string(),
        }
    }

    /// Name the staged file for a collection export.
    ///
    /// Format: `{prefix}/{collection}_{timestamp}.json[.gz]`
    pub fn for_collection(
        bucket: &str,
        prefix: &str,
        collection: &str,
        suffix_format: &str,
        compression: Compression,
        now: DateTime<Local>,
    ) -> Result<Self> {
        let mut suffix = String::new();
        write!(suffix, "{}", now.format(suffix_format))
            .map_err(|_| Error::config(format!("Invalid file suffix format: {suffix_format}")))?;

        let filename = format!(
            "{}_{suffix}.json{}",
            sanitize_name(collection),
            compression.extension()
        );
        let prefix = prefix.trim_matches('/');
        let path = if prefix.is_empty() {
            filename
        } else {
            format!("{prefix}/{filename}")
        };

        Ok(Self::new(bucket, path))
    }

    /// Full location with the given scheme, e.g. `gs://bucket/path`
    pub fn uri(&self, scheme: &str) -> String {
        format!("{scheme}://{}/{}", self.bucket, self.path)
    }
}

impl std::fmt::Display for StagedObject {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.bucket, self.path)
    }
}
