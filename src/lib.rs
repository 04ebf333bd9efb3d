// Allow common clippy pedantic lints that aren't critical for this codebase
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_sign_loss)]
#![allow(clippy::cast_lossless)]
#![allow(clippy::too_many_lines)]
#![allow(clippy::ref_option)]
#![allow(clippy::unused_self)]
#![allow(clippy::struct_excessive_bools)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::items_after_statements)]
#![allow(clippy::unnecessary_wraps)]
#![allow(clippy::match_same_arms)]
#![allow(clippy::match_wildcard_for_single_variants)]
#![allow(clippy::needless_pass_by_value)]
#![allow(clippy::unused_async)]

//! # doc2table
//!
//! Moves a document collection into a warehouse table: infers a table
//! schema from the documents, stages them as newline-delimited JSON in an
//! object store, then drives a bulk-load job to completion.
//!
//! ## Features
//!
//! - **Schema inference**: one pass over the data, nested documents become RECORD columns
//! - **Streaming export**: bounded memory, gzip optional, backpressure from the sink
//! - **Staging**: local directories, GCS, S3 and Azure via `object_store`
//! - **Load jobs**: BigQuery REST API, with polling, async and dry-run modes
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use doc2table::{RunConfig, Result};
//! use doc2table::cli::{Cli, Runner};
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     let config = RunConfig::from_file("transfer.yaml")?;
//!     let report = Runner::new(Cli::default()).engine(&config)?
//!         .run(&config.transfer_config()?)
//!         .await?;
//!     println!("{} records", report.records);
//!     Ok(())
//! }
//! ```
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────┐   ┌──────────────────┐   ┌───────────────┐   ┌──────────────────┐
//! │    Source    │──▶│ RecordTransformer │──▶│ ExportPipeline│──▶│   StagingStore   │
//! │ (documents)  │   │ + SchemaAccumulator│   │ (ndjson, gzip)│   │ (object_store)   │
//! └──────────────┘   └──────────────────┘   └───────────────┘   └────────┬─────────┘
//!                                                                         │
//!                              ┌──────────────────┐   ┌───────────────────▼┐
//!                              │    Warehouse     │◀──│  LoadOrchestrator  │
//!                              │ (load job API)   │   │ (poll, classify)   │
//!                              └──────────────────┘   └────────────────────┘
//! ```

#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::doc_markdown)]

// ============================================================================
// Module declarations
// ============================================================================

/// Error types
pub mod error;

/// Common types and type aliases
pub mod types;

/// Source document values
pub mod document;

/// Schema inference and accumulation
pub mod schema;

/// Document to record transformation
pub mod transform;

/// Document sources
pub mod source;

/// Streaming export to staging
pub mod export;

/// Staging object storage
pub mod storage;

/// Warehouse load jobs
pub mod warehouse;

/// Polling with backoff and cancellation
pub mod polling;

/// Load job lifecycle
pub mod load;

/// Main execution engine
pub mod engine;

/// Run configuration
pub mod config;

/// Command-line interface
pub mod cli;

// ============================================================================
// Re-exports
// ============================================================================

pub use config::RunConfig;
pub use engine::{TransferConfig, TransferEngine, TransferReport};
pub use error::{Error, Result};
pub use types::*;

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Crate name
pub const NAME: &str = env!("CARGO_PKG_NAME");
