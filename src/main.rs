//! doc2table CLI
//!
//! Command-line interface for loading a collection into a warehouse table

use clap::Parser;
use doc2table::cli::{Cli, Runner};
use tokio_util::sync::CancellationToken;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // Initialize logging
    let level = if cli.verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into()),
        )
        .init();

    let cancel = CancellationToken::new();
    let on_signal = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Interrupted, stopping");
            on_signal.cancel();
        }
    });

    let runner = Runner::new(cli).with_cancellation(cancel);
    if let Err(e) = runner.run().await {
        eprintln!("Error: {e}");
        std::process::exit(e.exit_code());
    }
}
