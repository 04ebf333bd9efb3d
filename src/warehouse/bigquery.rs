//! BigQuery REST client

use super::types::{JobError, JobHandle, JobState, JobStatus, LoadRequest};
use super::Warehouse;
use crate::error::{Error, Result};
use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response};
use serde::Deserialize;
use serde_json::json;
use std::time::Duration;
use tracing::debug;
use url::Url;

/// Public BigQuery v2 endpoint
pub const DEFAULT_ENDPOINT: &str = "https://bigquery.googleapis.com/bigquery/v2";

/// Environment variable holding an OAuth access token
pub const TOKEN_ENV: &str = "GOOGLE_OAUTH_ACCESS_TOKEN";

/// Configuration for the BigQuery client
#[derive(Debug, Clone)]
pub struct BigQueryConfig {
    /// API base URL
    pub endpoint: String,
    /// Project that owns the jobs
    pub project: String,
    /// Bearer token; requests are sent unauthenticated when absent
    pub access_token: Option<String>,
    /// Request timeout
    pub timeout: Duration,
}

impl BigQueryConfig {
    /// Config for a project, reading the token from the environment
    pub fn new(project: impl Into<String>) -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
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

    /// Set the request timeout
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

/// Warehouse client for the BigQuery jobs API
pub struct BigQueryClient {
    client: Client,
    config: BigQueryConfig,
}

impl BigQueryClient {
    /// Create a client
    pub fn new(config: BigQueryConfig) -> Result<Self> {
        let endpoint = Url::parse(&config.endpoint)?;
        if !matches!(endpoint.scheme(), "http" | "https") {
            return Err(Error::config(format!(
                "Warehouse endpoint must be http(s), got '{endpoint}'"
            )));
        }
        let client = Client::builder()
            .timeout(config.timeout)
            .user_agent(format!("doc2table/{}", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self { client, config })
    }

    /// Get the config
    pub fn config(&self) -> &BigQueryConfig {
        &self.config
    }

    fn jobs_url(&self) -> String {
        format!("{}/projects/{}/jobs", self.config.endpoint, self.config.project)
    }

    fn authorize(&self, req: RequestBuilder) -> RequestBuilder {
        match &self.config.access_token {
            Some(token) => req.bearer_auth(token),
            None => req,
        }
    }
}

#[async_trait]
impl Warehouse for BigQueryClient {
    async fn submit_load_job(&self, request: &LoadRequest) -> Result<JobHandle> {
        let body = json!({
            "configuration": { "load": request.to_load_config() }
        });
        debug!("POST {}", self.jobs_url());

        let response = self
            .authorize(self.client.post(self.jobs_url()))
            .json(&body)
            .send()
            .await
            .map_err(|e| Error::job_submission(e.to_string()))?;
        let response = check_status(response)
            .await
            .map_err(|e| Error::job_submission(e.to_string()))?;

        let job: JobResource = response
            .json()
            .await
            .map_err(|e| Error::job_submission(format!("Invalid job response: {e}")))?;
        let reference = job
            .job_reference
            .ok_or_else(|| Error::job_submission("Job response has no jobReference"))?;

        Ok(JobHandle {
            id: reference.job_id,
            location: reference.location,
        })
    }

    async fn job_status(&self, job: &JobHandle) -> Result<JobStatus> {
        let url = format!("{}/{}", self.jobs_url(), job.id);
        let mut req = self.authorize(self.client.get(&url));
        if let Some(location) = &job.location {
            req = req.query(&[("location", location)]);
        }

        let response = check_status(req.send().await?).await?;
        let job: JobResource = response.json().await?;
        Ok(job.status.map_or_else(JobStatus::running, JobStatusResource::into_status))
    }
}

pub(crate) async fn check_status(response: Response) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(Error::http_status(status.as_u16(), body))
}

// ============================================================================
// Wire types
// ============================================================================

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct JobResource {
    job_reference: Option<JobReference>,
    status: Option<JobStatusResource>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct JobReference {
    job_id: String,
    location: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct JobStatusResource {
    state: JobState,
    #[serde(default)]
    errors: Vec<JobError>,
    error_result: Option<JobError>,
}

impl JobStatusResource {
    fn into_status(self) -> JobStatus {
        let mut errors = self.errors;
        // errorResult alone still marks the job as failed
        if errors.is_empty() && self.state.is_terminal() {
            errors.extend(self.error_result);
        }
        JobStatus {
            state: self.state,
            errors,
        }
    }
}
