//! Dependency-Track Exporter Binary Entry Point
//!
//! This binary polls a Dependency-Track server and serves the result as
//! Prometheus metrics. Core functionality is provided by the
//! `dtrack_exporter` library crate.

use clap::Parser;
use clap::builder::BoolishValueParser;
use dtrack_exporter::{
    DependencyTrackClient, PageFetcher, PortfolioCollector, ProjectCollector, SnapshotPoller,
    SnapshotSlot, ViolationCollector,
    config::{AppConfig, parse_poll_interval, parse_tags},
    server::{AppState, create_router},
};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Dependency-Track Exporter - Prometheus metrics for Dependency-Track
#[derive(Parser, Debug)]
#[command(name = "dtrack-exporter", version, about, long_about = None)]
struct Cli {
    /// Path to an optional configuration file
    #[arg(short, long, env = "EXPORTER_CONFIG")]
    config: Option<String>,

    /// Server bind address (overrides config file)
    #[arg(long, env = "EXPORTER_BIND")]
    bind: Option<String>,

    /// Server port (overrides config file)
    #[arg(long, env = "EXPORTER_PORT")]
    port: Option<u16>,

    /// Path under which to expose metrics (overrides config file)
    #[arg(long, env = "EXPORTER_METRICS_PATH")]
    metrics_path: Option<String>,

    /// Dependency-Track server address (overrides config file)
    #[arg(long, env = "DEPENDENCY_TRACK_ADDR")]
    dtrack_address: Option<String>,

    /// Dependency-Track API key (overrides config file)
    #[arg(long, env = "DEPENDENCY_TRACK_API_KEY", hide_env_values = true)]
    dtrack_api_key: Option<String>,

    /// Comma-separated project tags to export (overrides config file)
    #[arg(long, env = "DEPENDENCY_TRACK_PROJECT_TAGS")]
    project_tags: Option<String>,

    /// Interval between collection cycles, e.g. `6h` (overrides config file)
    #[arg(long, env = "DEPENDENCY_TRACK_POLL_INTERVAL", value_parser = parse_poll_interval)]
    poll_interval: Option<Duration>,

    /// Pre-seed policy violation series at 0, e.g. `true` or `0` (overrides config file)
    #[arg(
        long,
        env = "DEPENDENCY_TRACK_INITIALIZE_VIOLATION_METRICS",
        value_parser = BoolishValueParser::new()
    )]
    initialize_violation_metrics: Option<bool>,
}

impl Cli {
    /// Apply CLI/env overrides (CLI > ENV > config file).
    fn apply(self, config: &mut AppConfig) {
        if let Some(bind) = self.bind {
            config.server.bind = bind;
        }
        if let Some(port) = self.port {
            config.server.port = port;
        }
        if let Some(path) = self.metrics_path {
            config.server.metrics_path = path;
        }
        if let Some(address) = self.dtrack_address {
            config.dtrack.address = address;
        }
        if let Some(api_key) = self.dtrack_api_key {
            config.dtrack.api_key = api_key;
        }
        if let Some(tags) = self.project_tags {
            config.dtrack.project_tags = parse_tags(&tags);
        }
        if let Some(interval) = self.poll_interval {
            config.dtrack.poll_interval = interval;
        }
        if let Some(enabled) = self.initialize_violation_metrics {
            config.dtrack.initialize_violation_metrics = enabled;
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,dtrack_exporter=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        "Dependency-Track Exporter"
    );

    // Parse CLI arguments
    let cli = Cli::parse();

    // Load configuration from file, if any
    let mut config = match &cli.config {
        Some(path) => {
            tracing::info!("Loading configuration from: {}", path);
            AppConfig::load(path)?
        }
        None => AppConfig::default(),
    };
    cli.apply(&mut config);
    config.validate()?;

    tracing::info!(
        "Server: {}:{}{}, Dependency-Track: {}, poll interval: {}, tags: {:?}",
        config.server.bind,
        config.server.port,
        config.server.metrics_path,
        config.dtrack.address,
        humantime::format_duration(config.dtrack.poll_interval),
        config.dtrack.project_tags,
    );

    // Build upstream client and check connectivity
    let client = Arc::new(DependencyTrackClient::new(
        &config.dtrack.address,
        &config.dtrack.api_key,
        config.dtrack.request_timeout,
    )?);
    let about = client.server_version().await?;
    tracing::info!(
        application = %about.application,
        version = %about.version,
        "Connected to Dependency-Track"
    );

    // Assemble collectors and start polling
    let fetcher = PageFetcher::new(config.dtrack.page_size);
    let slot = SnapshotSlot::new();
    let poller = SnapshotPoller::new(slot.clone())
        .with_collector(PortfolioCollector::new(client.clone()))
        .with_collector(
            ProjectCollector::new(client.clone(), fetcher)
                .with_tags(config.dtrack.project_tags.clone())
                .with_initialize_violation_metrics(config.dtrack.initialize_violation_metrics),
        )
        .with_collector(ViolationCollector::new(client, fetcher));

    let cancel = CancellationToken::new();
    let interval = config.dtrack.poll_interval;
    let poller_task = tokio::spawn({
        let cancel = cancel.clone();
        async move { poller.run(interval, cancel).await }
    });

    // Build Axum router
    let app = create_router(AppState::new(slot).with_metrics_path(&config.server.metrics_path));

    // Parse bind address
    let addr: SocketAddr = format!("{}:{}", config.server.bind, config.server.port).parse()?;

    tracing::info!("Metrics server listening on: http://{}", addr);
    tracing::info!("Press Ctrl+C to shutdown");

    // Start server with graceful shutdown
    let listener = tokio::net::TcpListener::bind(addr).await?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(cancel.clone()))
        .await?;

    cancel.cancel();
    tracing::info!("Waiting for poller to stop...");
    if let Err(e) = poller_task.await {
        tracing::error!("Poller task failed: {}", e);
    }

    tracing::info!("Shutdown complete");
    Ok(())
}

/// Setup graceful shutdown signal handler.
async fn shutdown_signal(cancel: CancellationToken) {
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

    tracing::info!("Stopping collection...");
    cancel.cancel();
}
