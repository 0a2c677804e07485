//! ICMP Prober Binary Entry Point
//!
//! Serves on-demand ping bursts as Prometheus metrics.
//! Core functionality is provided by the `icmp_prober` library crate.

use std::net::SocketAddr;
use std::time::Duration;

use clap::Parser;
use icmp_prober::{
    config::{AppConfig, parse_duration},
    server::{AppState, create_router},
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// ICMP Prober - ping bursts as Prometheus metrics
#[derive(Parser, Debug)]
#[command(name = "icmp-prober", version, about, long_about = None)]
struct Cli {
    /// Path to configuration file (defaults apply when omitted)
    #[arg(short, long, env = "PROBER_CONFIG")]
    config: Option<String>,

    /// Server bind address (overrides config file)
    #[arg(long, env = "BIND")]
    bind: Option<String>,

    /// Server port (overrides config file)
    #[arg(long, env = "PORT")]
    port: Option<u16>,

    /// Path to the ping binary (overrides config file)
    #[arg(long, env = "PROBER_PING_PATH")]
    ping_path: Option<String>,

    /// Grace period past the ping deadline before the process is killed
    #[arg(long, env = "PROBER_DEADLINE_GRACE", value_parser = parse_duration)]
    deadline_grace: Option<Duration>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,icmp_prober=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("ICMP Prober");

    // Parse CLI arguments
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => {
            tracing::info!("Loading configuration from: {}", path);
            AppConfig::load(path)?
        }
        None => AppConfig::default(),
    };

    // Apply CLI/env overrides (CLI > ENV > config file)
    if let Some(bind) = cli.bind {
        config.server.bind = bind;
    }
    if let Some(port) = cli.port {
        config.server.port = port;
    }
    if let Some(path) = cli.ping_path {
        config.probe.ping_path = path;
    }
    if let Some(grace) = cli.deadline_grace {
        config.probe.deadline_grace = grace;
    }
    config.validate()?;

    tracing::info!(
        "Server: {}:{}, ping: {} (grace {:?})",
        config.server.bind,
        config.server.port,
        config.probe.ping_path,
        config.probe.deadline_grace,
    );

    let app = create_router(AppState {
        prober: config.probe.prober(),
    });

    // Parse bind address
    let addr: SocketAddr = format!("{}:{}", config.server.bind, config.server.port).parse()?;

    tracing::info!("Listening on: http://{}", addr);
    tracing::info!("Press Ctrl+C to shutdown");

    // Start server with graceful shutdown
    let listener = tokio::net::TcpListener::bind(addr).await?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Shutdown complete");
    Ok(())
}

/// Wait for Ctrl+C or SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C signal");
        }
        _ = terminate => {
            tracing::info!("Received terminate signal");
        }
    }
}
