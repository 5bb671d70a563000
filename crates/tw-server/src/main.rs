//! tickwatch notification server
//!
//! Usage: `tw-server [listenAddress:port]`

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use tw_core::config::{self, ServerConfig};
use tw_server::source::run_mutator;
use tw_server::{NotificationServer, ServerState};

#[derive(Parser)]
#[command(name = "tw-server")]
#[command(about = "tickwatch change notification server")]
#[command(version)]
struct Args {
    /// Address to listen on, e.g. 127.0.0.1:8080 (overrides config)
    listen: Option<String>,

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

    let default_path = config::default_server_config_path();
    let mut config: ServerConfig = config::load_or_default(args.config.as_deref(), &default_path)
        .with_context(|| match &args.config {
            Some(path) => format!("Failed to load config from {:?}", path),
            None => format!("Failed to load config from {:?}", default_path),
        })?;

    if let Some(listen) = args.listen {
        config.bind_address = listen;
    }

    tracing::info!(
        "tickwatch server starting (heartbeat interval: {:?}, {} seed items)",
        config.liveness.heartbeat_interval,
        config.seed_items.len()
    );

    let bind_addr = config.bind_address.clone();
    let state = Arc::new(ServerState::new(config));
    let cancel = CancellationToken::new();

    spawn_signal_handler(cancel.clone())?;

    let mutator = tokio::spawn(run_mutator(Arc::clone(&state), cancel.clone()));

    let server = NotificationServer::bind(&bind_addr, Arc::clone(&state), cancel.clone()).await?;
    let result = server.run().await;

    cancel.cancel();
    if let Err(e) = mutator.await {
        tracing::warn!("Mutator task failed: {}", e);
    }

    tracing::info!("Server shutdown complete");
    result
}

/// Cancel `cancel` on Ctrl+C or SIGTERM
fn spawn_signal_handler(cancel: CancellationToken) -> Result<()> {
    #[cfg(unix)]
    let mut terminate =
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .context("Failed to install SIGTERM handler")?;

    tokio::spawn(async move {
        #[cfg(unix)]
        let terminate = terminate.recv();
        #[cfg(not(unix))]
        let terminate = std::future::pending::<Option<()>>();

        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("Received Ctrl+C, initiating shutdown...");
            }
            _ = terminate => {
                tracing::info!("Received SIGTERM, initiating shutdown...");
            }
        }

        cancel.cancel();
    });

    Ok(())
}
