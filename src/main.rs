//! ws-echo: A WebSocket echo server
//!
//! Accepts WebSocket connections and writes every text or binary message
//! back to the client that sent it, logging each one as it arrives.
//!
//! Features:
//! - Frame type preserved on echo (text stays text, binary stays binary)
//! - Strict per-connection ordering
//! - Concurrent connection cap
//! - Configuration via CLI arguments, `PORT` or a TOML file

mod config;
mod echo;
mod error;
mod server;

use config::{Config, PortSource};
use server::Server;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load configuration
    let config = Config::load()?;

    // Initialize logging
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();

    if let PortSource::InvalidEnv(ref value) = config.port_source {
        warn!(
            value = %value,
            port = config.port,
            "Ignoring invalid {} value",
            config::PORT_ENV
        );
    }

    info!(
        host = %config.host,
        port = config.port,
        port_source = ?config.port_source,
        max_connections = config.max_connections,
        workers = ?config.workers,
        "Starting ws-echo server"
    );

    let mut builder = tokio::runtime::Builder::new_multi_thread();
    if let Some(workers) = config.workers {
        builder.worker_threads(workers.max(1));
    }
    let runtime = builder.enable_all().build()?;

    runtime
        .block_on(async {
            let server = Server::bind(config).await?;
            server.run().await
        })
        .inspect_err(|e| error!(error = %e, "Server failed"))?;

    Ok(())
}
