//! Staging store over `object_store`

use super::gcs::GcsBuckets;
use super::object::StagedObject;
use crate::error::{Error, Result, ResultExt};
use async_trait::async_trait;
use object_store::aws::AmazonS3Builder;
use object_store::azure::MicrosoftAzureBuilder;
use object_store::buffered::BufWriter;
use object_store::gcp::GoogleCloudStorageBuilder;
use object_store::local::LocalFileSystem;
use object_store::path::Path as ObjectPath;
use object_store::ObjectStore;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use tokio::io::AsyncWrite;
use tracing::debug;

/// Streaming writer for a staged object. Shut it down to complete the upload.
pub type StagingWriter = Box<dyn AsyncWrite + Send + Unpin>;

/// Operations a run needs from the staging store
#[async_trait]
pub trait StagingStore: Send + Sync {
    /// URL scheme of the store (`gs`, `s3`, `az`, `file`)
    fn scheme(&self) -> &str;

    /// Full location of a staged object
    fn uri(&self, object: &StagedObject) -> String {
        object.uri(self.scheme())
    }

    /// Check if a bucket exists
    async fn bucket_exists(&self, bucket: &str) -> Result<bool>;

    /// Create a bucket
    async fn create_bucket(&self, bucket: &str) -> Result<()>;

    /// Check if an object is visible
    async fn object_exists(&self, object: &StagedObject) -> Result<bool>;

    /// Open a streaming writer for an object
    async fn open_write_stream(&self, object: &StagedObject) -> Result<StagingWriter>;

    /// Delete an object
    async fn delete_object(&self, object: &StagedObject) -> Result<()>;
}

#[derive(Debug, Clone)]
enum StagingRoot {
    /// Buckets are directories under this path
    Local(PathBuf),
    S3,
    Gcs,
    Azure,
}

/// Staging store backed by the `object_store` crate
#[derive(Debug)]
pub struct ObjectStoreStaging {
    root: StagingRoot,
    stores: Mutex<HashMap<String, Arc<dyn ObjectStore>>>,
    /// Bucket checks and creation for `gs://` roots
    gcs_buckets: Option<GcsBuckets>,
}

impl ObjectStoreStaging {
    /// Parse a staging root
    ///
    /// Supported formats:
    /// - `gs://` - Google Cloud Storage (the default for `gs`)
    /// - `s3://` - AWS S3
    /// - `az://` - Azure Blob Storage
    /// - `/local/path/` or `file:///local/path` - buckets are subdirectories
    pub fn parse(root: &str) -> Result<Self> {
        let root = match root.trim_end_matches('/') {
            "gs:" | "gs" => StagingRoot::Gcs,
            "s3:" | "s3" => StagingRoot::S3,
            "az:" | "az" => StagingRoot::Azure,
            _ if root.contains("://") && !root.starts_with("file://") => {
                return Err(Error::config(format!(
                    "Staging root must be a bare scheme (gs://, s3://, az://) or a local path, got '{root}'"
                )));
            }
            _ => {
                let path = root.strip_prefix("file://").unwrap_or(root);
                StagingRoot::Local(PathBuf::from(if path.is_empty() { "." } else { path }))
            }
        };

        Ok(Self {
            root,
            stores: Mutex::new(HashMap::new()),
            gcs_buckets: None,
        })
    }

    /// Staging under a local directory
    pub fn local(root: impl Into<PathBuf>) -> Self {
        Self {
            root: StagingRoot::Local(root.into()),
            stores: Mutex::new(HashMap::new()),
            gcs_buckets: None,
        }
    }

    /// Manage buckets of a `gs://` root through this client. Ignored for
    /// other roots.
    #[must_use]
    pub fn with_gcs_buckets(mut self, buckets: GcsBuckets) -> Self {
        self.gcs_buckets = Some(buckets);
        self
    }

    /// Check if this is a cloud store (not local)
    pub fn is_cloud(&self) -> bool {
        !matches!(self.root, StagingRoot::Local(_))
    }

    fn bucket_dir(&self, bucket: &str) -> Option<PathBuf> {
        match &self.root {
            StagingRoot::Local(root) => Some(root.join(bucket)),
            _ => None,
        }
    }

    fn gcs_buckets(&self) -> Option<&GcsBuckets> {
        match self.root {
            StagingRoot::Gcs => self.gcs_buckets.as_ref(),
            _ => None,
        }
    }

    /// Get (or build) the store for a bucket
    fn store_for(&self, bucket: &str) -> Result<Arc<dyn ObjectStore>> {
        let mut stores = self
            .stores
            .lock()
            .map_err(|_| Error::Other("staging store cache poisoned".to_string()))?;
        if let Some(store) = stores.get(bucket) {
            return Ok(store.clone());
        }

        let store: Arc<dyn ObjectStore> = match &self.root {
            StagingRoot::Local(root) => {
                let dir = root.join(bucket);
                Arc::new(LocalFileSystem::new_with_prefix(&dir).map_err(|e| {
                    Error::config(format!(
                        "Failed to create local store at {}: {e}",
                        dir.display()
                    ))
                })?)
            }
            StagingRoot::S3 => Arc::new(
                AmazonS3Builder::from_env()
                    .with_bucket_name(bucket)
                    .build()
                    .map_err(|e| Error::config(format!("Failed to create S3 client: {e}")))?,
            ),
            StagingRoot::Gcs => Arc::new(
                GoogleCloudStorageBuilder::from_env()
                    .with_bucket_name(bucket)
                    .build()
                    .map_err(|e| Error::config(format!("Failed to create GCS client: {e}")))?,
            ),
            StagingRoot::Azure => Arc::new(
                MicrosoftAzureBuilder::from_env()
                    .with_container_name(bucket)
                    .build()
                    .map_err(|e| Error::config(format!("Failed to create Azure client: {e}")))?,
            ),
        };

        stores.insert(bucket.to_string(), store.clone());
        Ok(store)
    }
}

#[async_trait]
impl StagingStore for ObjectStoreStaging {
    fn scheme(&self) -> &str {
        match &self.root {
            StagingRoot::Local(_) => "file",
            StagingRoot::S3 => "s3",
            StagingRoot::Gcs => "gs",
            StagingRoot::Azure => "az",
        }
    }

    fn uri(&self, object: &StagedObject) -> String {
        match &self.root {
            StagingRoot::Local(root) => {
                format!("file://{}", root.join(&object.bucket).join(&object.path).display())
            }
            _ => object.uri(self.scheme()),
        }
    }

    async fn bucket_exists(&self, bucket: &str) -> Result<bool> {
        if let Some(dir) = self.bucket_dir(bucket) {
            return Ok(tokio::fs::metadata(&dir)
                .await
                .map(|m| m.is_dir())
                .unwrap_or(false));
        }
        if let Some(buckets) = self.gcs_buckets() {
            return buckets.exists(bucket).await;
        }

        let store = self.store_for(bucket)?;
        match store.list_with_delimiter(None).await {
            Ok(_) => Ok(true),
            Err(object_store::Error::NotFound { .. }) => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    async fn create_bucket(&self, bucket: &str) -> Result<()> {
        if let Some(dir) = self.bucket_dir(bucket) {
            tokio::fs::create_dir_all(&dir)
                .await
                .with_context(|| format!("Failed to create bucket directory {}", dir.display()))?;
            debug!("Created bucket directory {}", dir.display());
            return Ok(());
        }
        if let Some(buckets) = self.gcs_buckets() {
            buckets.create(bucket).await?;
            debug!("Created bucket gs://{bucket}");
            return Ok(());
        }
        Err(Error::config(format!(
            "Bucket '{bucket}' does not exist and cannot be created through {}://; create it first",
            self.scheme()
        )))
    }

    async fn object_exists(&self, object: &StagedObject) -> Result<bool> {
        let store = self.store_for(&object.bucket)?;
        match store.head(&ObjectPath::from(object.path.as_str())).await {
            Ok(_) => Ok(true),
            Err(object_store::Error::NotFound { .. }) => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    async fn open_write_stream(&self, object: &StagedObject) -> Result<StagingWriter> {
        let store = self.store_for(&object.bucket)?;
        let writer = BufWriter::new(store, ObjectPath::from(object.path.as_str()));
        Ok(Box::new(writer))
    }

    async fn delete_object(&self, object: &StagedObject) -> Result<()> {
        let store = self.store_for(&object.bucket)?;
        store
            .delete(&ObjectPath::from(object.path.as_str()))
            .await
            .map_err(|e| Error::cleanup(self.uri(object), e.to_string()))
    }
}
