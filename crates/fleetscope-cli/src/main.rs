//! Fleetscope daemon entrypoint.
//!
//! Connects to NATS, keeps the fleet topology in sync and serves snapshots
//! over HTTP until interrupted.

use anyhow::{Context, Result};
use clap::Parser;
use fleetscope_api::{AppState, create_router};
use fleetscope_nats::NatsBus;
use fleetscope_sync::SyncService;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{error, info, warn};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

mod config;

use config::{AppConfig, LogFormat, Overrides};

#[derive(Parser)]
#[command(name = "fleetscope")]
#[command(author, version, about = "Fleet topology aggregator for NATS-connected agents", long_about = None)]
struct Cli {
    /// NATS server URL(s), comma-separated [default: nats://127.0.0.1:4222]
    #[arg(long)]
    url: Option<String>,

    /// HTTP port to serve snapshots on [default: 8080]
    #[arg(long)]
    port: Option<u16>,

    /// Path to a YAML configuration file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Directory of static visualization assets
    #[arg(long)]
    static_dir: Option<PathBuf>,

    /// Log output format
    #[arg(long, value_enum)]
    log_format: Option<LogFormat>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = AppConfig::load(cli.config.as_deref())?;
    config.apply(Overrides {
        nats_urls: cli.url,
        port: cli.port,
        static_dir: cli.static_dir,
        log_format: cli.log_format,
    });

    init_tracing(config.log_format);

    let bus = match NatsBus::connect_with_config(config.nats_config()).await {
        Ok(bus) => bus,
        Err(e) => {
            error!(urls = %config.nats_urls, error = %e, "Could not connect to NATS");
            return Err(e).context("Failed to connect to NATS");
        }
    };

    let service = Arc::new(SyncService::new(Arc::new(bus.clone()), config.sync.clone()));
    service.start().await?;

    let mut state = AppState::new(Arc::clone(&service)).with_bus_metrics(Arc::clone(bus.metrics()));
    if let Some(dir) = &config.static_dir {
        state = state.with_static_dir(dir);
    }
    let app = create_router(Arc::new(state));

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    info!(%addr, "Serving topology snapshots");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("HTTP server failed")?;

    service.shutdown().await;
    if let Err(e) = bus.shutdown().await {
        warn!(error = %e, "Failed to drain NATS connection");
    }

    info!("Fleetscope stopped");
    Ok(())
}

fn init_tracing(format: LogFormat) {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let registry = tracing_subscriber::registry().with(env_filter);

    match format {
        LogFormat::Pretty => registry
            .with(tracing_subscriber::fmt::layer().with_target(true))
            .init(),
        LogFormat::Json => registry
            .with(tracing_subscriber::fmt::layer().json().with_target(true))
            .init(),
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
