//! GCS bucket administration over the JSON API
//!
//! `object_store` reads and writes objects but cannot create buckets, so
//! bucket checks and creation for `gs://` roots go through
//! `storage/v1/b` directly.

use crate::error::{Error, Result, ResultExt};
use crate::warehouse::{check_status, TOKEN_ENV};
use reqwest::{Client, RequestBuilder, StatusCode};
use serde_json::json;
use std::time::Duration;
use tracing::debug;
use url::Url;

/// Public Cloud Storage JSON API endpoint
pub const DEFAULT_STORAGE_ENDPOINT: &str = "https://storage.googleapis.com/storage/v1";

/// Settings for the bucket client
#[derive(Debug, Clone)]
pub struct GcsBucketConfig {
    /// API base URL
    pub endpoint: String,
    /// Project new buckets are created in
    pub project: String,
    /// Bearer token; requests are sent unauthenticated when absent
    pub access_token: Option<String>,
    /// Request timeout
    pub timeout: Duration,
}

impl GcsBucketConfig {
    /// Config for a project, reading the token from the environment
    pub fn new(project: impl Into<String>) -> Self {
        Self {
            endpoint: DEFAULT_STORAGE_ENDPOINT.to_string(),
            project: project.into(),
            access_token: std::env::var(TOKEN_ENV).ok().filter(|t| !t.is_empty()),
            timeout: Duration::from_secs(30),
        }
    }

    /// Set the endpoint
    #[must_use]
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into().trim_end_matches('/').to_string();
        self
    }

    /// Set the access token
    #[must_use]
    pub fn with_access_token(mut self, token: impl Into<String>) -> Self {
        self.access_token = Some(token.into());
        self
    }
}

/// Checks and creates GCS buckets
#[derive(Debug, Clone)]
pub struct GcsBuckets {
    client: Client,
    config: GcsBucketConfig,
}

impl GcsBuckets {
    /// Create a bucket client
    pub fn new(config: GcsBucketConfig) -> Result<Self> {
        let endpoint = Url::parse(&config.endpoint)?;
        if !matches!(endpoint.scheme(), "http" | "https") {
            return Err(Error::config(format!(
                "Storage endpoint must be http(s), got '{endpoint}'"
            )));
        }
        let client = Client::builder()
            .timeout(config.timeout)
            .user_agent(format!("doc2table/{}", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self { client, config })
    }

    /// Get the config
    pub fn config(&self) -> &GcsBucketConfig {
        &self.config
    }

    fn authorize(&self, req: RequestBuilder) -> RequestBuilder {
        match &self.config.access_token {
            Some(token) => req.bearer_auth(token),
            None => req,
        }
    }

    /// Check if a bucket exists
    pub async fn exists(&self, bucket: &str) -> Result<bool> {
        let url = format!("{}/b/{bucket}", self.config.endpoint);
        debug!("GET {url}");

        let response = self.authorize(self.client.get(&url)).send().await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(false);
        }
        check_status(response)
            .await
            .with_context(|| format!("Failed to look up bucket '{bucket}'"))?;
        Ok(true)
    }

    /// Create a bucket in the configured project
    pub async fn create(&self, bucket: &str) -> Result<()> {
        let url = format!("{}/b", self.config.endpoint);
        debug!("POST {url}?project={}", self.config.project);

        let response = self
            .authorize(self.client.post(&url))
            .query(&[("project", self.config.project.as_str())])
            .json(&json!({ "name": bucket }))
            .send()
            .await?;
        // Another run may have created it since the existence check
        if response.status() == StatusCode::CONFLICT {
            debug!("Bucket '{bucket}' already exists");
            return Ok(());
        }
        check_status(response)
            .await
            .with_context(|| format!("Failed to create bucket '{bucket}'"))?;
        Ok(())
    }
}
