//! Periodic collection and snapshot publication.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

use strum_macros::{AsRefStr, Display};
use tokio::sync::watch;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

use super::{Snapshot, SnapshotSlot};
use crate::collector::{Collector, CollectorError, CycleContext};
use crate::metrics::register_build_info;

/// Shortest accepted poll interval.
const MIN_INTERVAL: Duration = Duration::from_millis(10);

/// Poller phase, observable through [`SnapshotPoller::subscribe`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, AsRefStr)]
#[strum(serialize_all = "lowercase")]
pub enum PollerState {
    Idle,
    Collecting,
    Publishing,
}

/// Runs the collectors in order once per interval and publishes the result.
///
/// Every cycle starts from an empty registry. A collector that fails is
/// logged and skipped; the others still run and the cycle is published with
/// whatever was collected. A cancelled cycle is discarded.
pub struct SnapshotPoller {
    collectors: Vec<Box<dyn Collector>>,
    slot: SnapshotSlot,
    state: watch::Sender<PollerState>,
    cycles: AtomicU64,
}

impl SnapshotPoller {
    pub fn new(slot: SnapshotSlot) -> Self {
        let (state, _) = watch::channel(PollerState::Idle);
        Self {
            collectors: Vec::new(),
            slot,
            state,
            cycles: AtomicU64::new(0),
        }
    }

    /// Append a collector. Collectors run in insertion order.
    pub fn with_collector<C: Collector>(mut self, collector: C) -> Self {
        self.collectors.push(Box::new(collector));
        self
    }

    pub fn slot(&self) -> &SnapshotSlot {
        &self.slot
    }

    pub fn subscribe(&self) -> watch::Receiver<PollerState> {
        self.state.subscribe()
    }

    pub fn state(&self) -> PollerState {
        *self.state.borrow()
    }

    /// Poll immediately, then every `interval` until `cancel` fires.
    ///
    /// A cycle that overruns the interval delays the next one instead of
    /// triggering a burst of catch-up cycles.
    pub async fn run(&self, interval: Duration, cancel: CancellationToken) {
        let mut ticker = tokio::time::interval(interval.max(MIN_INTERVAL));
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        tracing::info!(
            interval = %humantime::format_duration(interval),
            collectors = self.collectors.len(),
            "Snapshot poller started"
        );
        loop {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => break,
                _ = ticker.tick() => {}
            }
            if let Err(e) = self.poll_once(&cancel).await {
                tracing::info!(error = %e, "Collection cycle aborted");
                break;
            }
        }
        tracing::info!("Snapshot poller stopped");
    }

    /// Run one full cycle and publish it.
    ///
    /// Only cancellation fails a cycle; collector errors end up in
    /// [`Snapshot::failed_collectors`].
    pub async fn poll_once(
        &self,
        cancel: &CancellationToken,
    ) -> Result<Arc<Snapshot>, CollectorError> {
        let cycle_number = self.cycles.fetch_add(1, Ordering::Relaxed) + 1;
        let start = Instant::now();
        self.state.send_replace(PollerState::Collecting);

        let result = self.collect_cycle(cancel).await;
        let (cycle, failed) = match result {
            Ok(collected) => collected,
            Err(e) => {
                self.state.send_replace(PollerState::Idle);
                return Err(e);
            }
        };

        self.state.send_replace(PollerState::Publishing);
        let published = Arc::new(Snapshot::new(cycle.into_registry(), cycle_number, failed));
        self.slot.publish(Arc::clone(&published)).await;
        self.state.send_replace(PollerState::Idle);

        let duration_ms = start.elapsed().as_millis();
        let completed_at = published.completed_at().to_rfc3339();
        if published.is_complete() {
            tracing::info!(
                cycle = cycle_number,
                duration_ms,
                %completed_at,
                "Published snapshot"
            );
        } else {
            tracing::warn!(
                cycle = cycle_number,
                duration_ms,
                %completed_at,
                failed = ?published.failed_collectors(),
                "Published partial snapshot"
            );
        }
        Ok(published)
    }

    async fn collect_cycle(
        &self,
        cancel: &CancellationToken,
    ) -> Result<(CycleContext, Vec<&'static str>), CollectorError> {
        let mut cycle = CycleContext::new(cancel.clone());
        if let Err(e) = register_build_info(cycle.registry()) {
            tracing::warn!(error = %e, "Failed to register build info");
        }

        let mut failed = Vec::new();
        for collector in &self.collectors {
            match run_collection(collector.as_ref(), &mut cycle).await {
                Ok(()) => {}
                Err(e) if e.is_cancelled() => return Err(e),
                Err(_) => failed.push(collector.name()),
            }
        }
        Ok((cycle, failed))
    }
}

impl std::fmt::Debug for SnapshotPoller {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let names: Vec<_> = self.collectors.iter().map(|c| c.name()).collect();
        f.debug_struct("SnapshotPoller")
            .field("collectors", &names)
            .field("state", &self.state())
            .field("cycles", &self.cycles.load(Ordering::Relaxed))
            .finish_non_exhaustive()
    }
}

/// Execute a single collector and log the result.
async fn run_collection(
    collector: &dyn Collector,
    cycle: &mut CycleContext,
) -> Result<(), CollectorError> {
    let name = collector.name();
    let start = Instant::now();
    tracing::debug!(collector = %name, "Running collection");

    let result = collector.collect(cycle).await;
    let duration_ms = start.elapsed().as_millis();

    match &result {
        Ok(()) => tracing::debug!(collector = %name, duration_ms, "Collection succeeded"),
        Err(e) if e.is_cancelled() => {
            tracing::debug!(collector = %name, duration_ms, "Collection cancelled")
        }
        Err(e) => tracing::error!(collector = %name, error = %e, "Collection failed"),
    }
    result
}
