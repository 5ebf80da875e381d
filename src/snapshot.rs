//! Snapshot Layer
//!
//! A [`Snapshot`] is the complete result of one collection cycle. The
//! [`SnapshotPoller`] builds one per cycle from a fresh registry and swaps it
//! into the shared [`SnapshotSlot`], where the metrics endpoint picks it up.
//!
//! Readers only ever see whole snapshots: a cycle's registry is not visible
//! until the poller publishes it, and a published snapshot is never written
//! again.

mod poller;
mod slot;

use chrono::{DateTime, Utc};
use prometheus::{Encoder, Registry, TextEncoder};

pub use poller::{PollerState, SnapshotPoller};
pub use slot::SnapshotSlot;

/// Immutable metric set produced by one cycle.
pub struct Snapshot {
    registry: Registry,
    cycle: u64,
    completed_at: DateTime<Utc>,
    failed_collectors: Vec<&'static str>,
}

impl Snapshot {
    pub fn new(registry: Registry, cycle: u64, failed_collectors: Vec<&'static str>) -> Self {
        Self {
            registry,
            cycle,
            completed_at: Utc::now(),
            failed_collectors,
        }
    }

    /// Sequence number of the producing cycle, starting at 1.
    pub fn cycle(&self) -> u64 {
        self.cycle
    }

    pub fn completed_at(&self) -> DateTime<Utc> {
        self.completed_at
    }

    /// Collectors whose families are missing from this snapshot.
    pub fn failed_collectors(&self) -> &[&'static str] {
        &self.failed_collectors
    }

    pub fn is_complete(&self) -> bool {
        self.failed_collectors.is_empty()
    }

    /// Content type of [`Self::render`] output.
    pub fn content_type() -> &'static str {
        prometheus::TEXT_FORMAT
    }

    /// Encode every family in the Prometheus text exposition format.
    pub fn render(&self) -> Result<String, prometheus::Error> {
        let mut buffer = Vec::new();
        TextEncoder::new().encode(&self.registry.gather(), &mut buffer)?;
        Ok(String::from_utf8_lossy(&buffer).into_owned())
    }

    #[cfg(test)]
    pub(crate) fn registry(&self) -> &Registry {
        &self.registry
    }
}

impl std::fmt::Debug for Snapshot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Snapshot")
            .field("cycle", &self.cycle)
            .field("completed_at", &self.completed_at)
            .field("failed_collectors", &self.failed_collectors)
            .finish_non_exhaustive()
    }
}
