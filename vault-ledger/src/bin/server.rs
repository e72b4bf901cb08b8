//! Vault ledger server binary
//!
//! Runs a ledger backed by the in-memory transfer sink and prints every
//! completed operation as a JSON line for downstream indexers.

use std::sync::Arc;
use tokio_stream::{wrappers::BroadcastStream, StreamExt};
use tracing_subscriber::EnvFilter;
use vault_ledger::{config::LogFormat, Config, InMemorySink, Ledger};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load configuration
    let config = match std::env::args().nth(1) {
        Some(path) => Config::from_file(path)?,
        None => Config::from_env()?,
    };

    // Initialize tracing
    let filter = EnvFilter::from_default_env().add_directive(tracing::Level::INFO.into());
    match config.log_format {
        LogFormat::Json => tracing_subscriber::fmt().json().with_env_filter(filter).init(),
        LogFormat::Pretty => tracing_subscriber::fmt().with_env_filter(filter).init(),
    }

    tracing::info!(
        service = %config.service_name,
        version = %config.service_version,
        "Starting vault ledger"
    );

    let sink = Arc::new(InMemorySink::new());
    let ledger = Ledger::open(config, sink).await?;

    // Stream notifications to stdout
    let mut events = BroadcastStream::new(ledger.subscribe());
    let printer = tokio::spawn(async move {
        while let Some(item) = events.next().await {
            match item {
                Ok(event) => match serde_json::to_string(&event) {
                    Ok(line) => println!("{}", line),
                    Err(e) => tracing::error!("Failed to encode event: {}", e),
                },
                Err(e) => tracing::warn!("Notification stream lagged: {}", e),
            }
        }
    });

    tokio::signal::ctrl_c().await?;

    tracing::info!("Shutting down vault ledger");
    match ledger.metrics().render() {
        Ok(text) => tracing::debug!("Final metrics:\n{}", text),
        Err(e) => tracing::warn!("Failed to render metrics: {}", e),
    }
    ledger.shutdown().await?;
    printer.await?;

    Ok(())
}
