//! Collector Layer
//!
//! Collectors translate Dependency-Track records into metric families. All
//! of them write into the registry of a single [`CycleContext`], which the
//! snapshot poller creates fresh for every cycle.
//!
//! # Architecture
//!
//! - [`Collector`]: Core trait for implementing collectors
//! - [`PortfolioCollector`]: portfolio-wide aggregates from one request
//! - [`ProjectCollector`]: per-project series, optionally filtered by tag
//! - [`ViolationCollector`]: policy violation counts joined on the project scan
//!
//! Collectors run in that order. The violation collector relies on the
//! [`ProjectScan`] the project collector leaves in the cycle.
//!
//! # Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use std::time::Duration;
//!
//! use dtrack_exporter::{
//!     Collector, CycleContext, DependencyTrackClient, PageFetcher, ProjectCollector,
//! };
//! use tokio_util::sync::CancellationToken;
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let client = Arc::new(DependencyTrackClient::new(
//!     "http://localhost:8080",
//!     "odt_secret",
//!     Duration::from_secs(30),
//! )?);
//! let collector = ProjectCollector::new(client, PageFetcher::default())
//!     .with_tags(vec!["prod".to_string()]);
//!
//! let mut cycle = CycleContext::new(CancellationToken::new());
//! collector.collect(&mut cycle).await?;
//! # Ok(())
//! # }
//! ```

mod portfolio;
mod project;
mod traits;
mod violation;

pub use portfolio::PortfolioCollector;
pub use project::ProjectCollector;
pub use traits::{Collector, CollectorError, CycleContext, ProjectScan};
pub use violation::ViolationCollector;
