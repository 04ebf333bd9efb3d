//! Staging storage
//!
//! The object store the export is staged in before the warehouse loads it.
//!
//! # Overview
//!
//! - [`StagingStore`] - the operations a run needs from the store
//! - [`ObjectStoreStaging`] - implementation over `object_store` (local, GCS, S3, Azure)
//! - [`GcsBuckets`] - bucket checks and creation for `gs://` roots
//! - [`StagedObject`] - bucket + path of the staged file

mod gcs;
mod object;
mod staging;

pub use gcs::{GcsBucketConfig, GcsBuckets, DEFAULT_STORAGE_ENDPOINT};
pub use object::{StagedObject, DEFAULT_SUFFIX_FORMAT};
pub use staging::{ObjectStoreStaging, StagingStore, StagingWriter};
