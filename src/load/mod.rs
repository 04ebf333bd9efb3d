//! Load orchestration
//!
//! Takes a staged object through the load lifecycle:
//!
//! ```text
//! STAGED -> (visibility poll) -> VISIBLE -> SUBMITTED -> (status poll) -> DONE
//!                                                                          |
//!                                                       SUCCESS | FAILURE(errors)
//! ```
//!
//! Async mode stops after submission. Dry-run mode stops before anything
//! touches the warehouse.

mod orchestrator;
mod types;

pub use orchestrator::LoadOrchestrator;
pub use types::{CleanupStatus, LoadOptions, LoadOutcome, LoadReport, LoadState};
