//! Dependency-Track Exporter
//!
//! Exposes Dependency-Track portfolio, project and policy violation data as
//! Prometheus metrics. It can be used as a library by other Rust projects, or
//! run as a standalone binary with the `dtrack-exporter` executable.
//!
//! # Architecture
//!
//! - **Client**: authenticated Dependency-Track REST client
//! - **Pagination**: exhaustive walks over paged collections
//! - **Collectors**: turn upstream records into metric families
//! - **Snapshots**: one fresh registry per cycle, swapped in atomically
//! - **Server**: Prometheus scrape endpoint over the current snapshot
//!
//! # Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use std::time::Duration;
//!
//! use dtrack_exporter::{
//!     DependencyTrackClient, PageFetcher, PortfolioCollector, ProjectCollector, SnapshotPoller,
//!     SnapshotSlot, ViolationCollector,
//! };
//! use tokio_util::sync::CancellationToken;
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let client = Arc::new(DependencyTrackClient::new(
//!     "http://localhost:8080",
//!     "odt_secret",
//!     Duration::from_secs(30),
//! )?);
//! let fetcher = PageFetcher::default();
//!
//! let slot = SnapshotSlot::new();
//! let poller = SnapshotPoller::new(slot.clone())
//!     .with_collector(PortfolioCollector::new(client.clone()))
//!     .with_collector(ProjectCollector::new(client.clone(), fetcher))
//!     .with_collector(ViolationCollector::new(client, fetcher));
//!
//! poller.run(Duration::from_secs(6 * 3600), CancellationToken::new()).await;
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod collector;
pub mod config;
pub mod metrics;
pub mod pagination;
pub mod server;
pub mod snapshot;

pub use client::{ClientError, DependencyTrackApi, DependencyTrackClient};
pub use collector::{
    Collector, CollectorError, CycleContext, PortfolioCollector, ProjectCollector, ProjectScan,
    ViolationCollector,
};
pub use config::{AppConfig, ConfigError};
pub use pagination::{Page, PageFetcher, PageOptions};
pub use server::{AppState, create_router};
pub use snapshot::{PollerState, Snapshot, SnapshotPoller, SnapshotSlot};
