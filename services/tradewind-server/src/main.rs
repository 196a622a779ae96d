//! Tradewind API Server
//!
//! REST API server for the Tradewind escrow ledger. Backs the trade
//! contract workflow: wallets, deposits, transfers, escrow funding and
//! release.
//!
//! ```bash
//! # Start with default settings
//! tradewind-server
//!
//! # Start with a config file
//! tradewind-server --config /path/to/config.toml
//!
//! # Environment overrides
//! TRADEWIND__SERVER__PORT=8080 tradewind-server
//! ```

mod config;

use std::time::Duration;

use clap::Parser;
use tokio::signal;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use tradewind_api::{create_router, AppState};
use tradewind_ledger::LedgerStore;

use crate::config::ServerConfig;

/// Tradewind API Server - escrow ledger for trade contracts
#[derive(Parser, Debug)]
#[command(name = "tradewind-server")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to configuration file (TOML)
    #[arg(short, long, env = "TRADEWIND_CONFIG")]
    config: Option<String>,

    /// Host to bind to
    #[arg(long, env = "TRADEWIND_HOST")]
    host: Option<String>,

    /// Port to listen on
    #[arg(short, long, env = "TRADEWIND_PORT")]
    port: Option<u16>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "TRADEWIND_LOG_LEVEL")]
    log_level: Option<String>,

    /// Log format (json, pretty)
    #[arg(long, env = "TRADEWIND_LOG_FORMAT")]
    log_format: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let mut server_config = ServerConfig::load(args.config.as_deref())?;
    if let Some(host) = args.host {
        server_config.server.host = host;
    }
    if let Some(port) = args.port {
        server_config.server.port = port;
    }
    if let Some(level) = args.log_level {
        server_config.logging.level = level;
    }
    if let Some(format) = args.log_format {
        server_config.logging.format = format;
    }

    init_logging(&server_config.logging)?;

    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        "Starting Tradewind API server"
    );

    let ledger = LedgerStore::new(server_config.ledger.lock_timeout());
    let state = AppState::new(ledger.clone());

    spawn_pending_sweeper(
        ledger,
        server_config.ledger.sweep_interval(),
        server_config.ledger.pending_expiry(),
    );

    let app = create_router(state);

    let addr = server_config.server.socket_addr()?;
    tracing::info!(
        host = %server_config.server.host,
        port = %server_config.server.port,
        "Server listening"
    );

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(server_config.server.shutdown_timeout()))
        .await?;

    tracing::info!("Server shutdown complete");
    Ok(())
}

/// Initialize tracing/logging
fn init_logging(config: &config::LoggingConfig) -> anyhow::Result<()> {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.level));

    let subscriber = tracing_subscriber::registry().with(env_filter);

    match config.format.as_str() {
        "json" => {
            subscriber.with(fmt::layer().json().with_target(true)).init();
        }
        _ => {
            subscriber
                .with(fmt::layer().pretty().with_target(true))
                .init();
        }
    }

    Ok(())
}

/// Periodically fail PENDING transactions whose caller never committed
fn spawn_pending_sweeper(ledger: LedgerStore, interval: Duration, max_age: Duration) {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        loop {
            ticker.tick().await;
            let expired = ledger.expire_pending(max_age).await;
            if expired > 0 {
                tracing::warn!(expired, "Swept stale pending transactions");
            }
        }
    });
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM)
async fn shutdown_signal(timeout: Duration) {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C, initiating graceful shutdown...");
        }
        _ = terminate => {
            tracing::info!("Received SIGTERM, initiating graceful shutdown...");
        }
    }

    tracing::info!(
        timeout_secs = timeout.as_secs(),
        "Waiting for in-flight requests to complete..."
    );
    tokio::time::sleep(timeout).await;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_parsing() {
        let args = Args::parse_from(["tradewind-server", "--port", "8080"]);
        assert_eq!(args.port, Some(8080));
    }
}
