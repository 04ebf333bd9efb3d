//! CLI module
//!
//! Command-line interface for running a transfer.
//!
//! The `doc2table` binary has a single command: its flags (optionally on top
//! of a `--config` file) describe the collection, staging location and
//! destination table.

mod commands;
mod runner;

pub use commands::Cli;
pub use runner::Runner;
