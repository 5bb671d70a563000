//! tickwatch subscriber
//!
//! Usage: `tw-client <serverURL> <item1> [item2...]`
//!
//! Subscribes to the named items and logs every change the server pushes.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use tw_client::event::change_age_secs;
use tw_client::{ClientEvent, Connector};
use tw_core::config::{self, ClientConfig};

/// Events buffered between the connector and the logging task
const EVENT_CHANNEL_CAPACITY: usize = 64;

#[derive(Parser)]
#[command(name = "tw-client")]
#[command(about = "tickwatch subscriber - logs changes to the named items")]
#[command(version)]
struct Args {
    /// Server URL, e.g. ws://localhost:8080 (overrides config)
    server_url: Option<String>,

    /// Item names to subscribe to (override config)
    items: Vec<String>,

    /// Path to configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Log level (error, warn, info, debug, trace)
    #[arg(long, default_value = "info")]
    log_level: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| args.log_level.clone()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let default_path = config::default_client_config_path();
    let mut config: ClientConfig = config::load_or_default(args.config.as_deref(), &default_path)
        .with_context(|| match &args.config {
            Some(path) => format!("Failed to load config from {:?}", path),
            None => format!("Failed to load config from {:?}", default_path),
        })?;

    if let Some(url) = args.server_url {
        config.server_url = url;
    }
    if !args.items.is_empty() {
        config.items = args.items;
    }
    if config.items.is_empty() {
        anyhow::bail!("No items to subscribe to. Usage: tw-client <serverURL> <item1> [item2...]");
    }

    let (event_tx, mut event_rx) = mpsc::channel(EVENT_CHANNEL_CAPACITY);
    let connector = Connector::new(config, event_tx);
    tracing::info!("tickwatch client starting as {}", connector.identity());

    let logger = tokio::spawn(async move {
        while let Some(event) = event_rx.recv().await {
            log_event(event);
        }
    });

    let cancel = CancellationToken::new();
    let cancel_clone = cancel.clone();
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                tracing::info!("Received Ctrl+C, shutting down...");
                cancel_clone.cancel();
            }
            Err(e) => tracing::warn!("Failed to listen for Ctrl+C: {}", e),
        }
    });

    connector.run(cancel).await;
    drop(connector);

    if let Err(e) = logger.await {
        tracing::warn!("Event logger failed: {}", e);
    }
    Ok(())
}

fn log_event(event: ClientEvent) {
    match event {
        ClientEvent::Changes(changes) => {
            let now = std::time::SystemTime::now();
            for change in changes {
                tracing::info!(
                    age_secs = change_age_secs(&change, now),
                    "{}: ${:.2}",
                    change.name,
                    change.value
                );
            }
        }
        ClientEvent::Latency { sequence, rtt } => {
            tracing::info!(sequence, "Heartbeat round trip {:?}", rtt);
        }
        ClientEvent::Disconnected { error } => {
            tracing::debug!("Disconnected: {}", error);
        }
    }
}
