//! Shared handle to the latest published snapshot.

use std::sync::Arc;

use tokio::sync::RwLock;

use super::Snapshot;

/// The publicly visible snapshot, empty until the first cycle completes.
///
/// Locks are held only to clone or swap the `Arc`. Rendering happens on the
/// caller's copy, so a slow scrape never blocks publication.
#[derive(Debug, Clone, Default)]
pub struct SnapshotSlot {
    current: Arc<RwLock<Option<Arc<Snapshot>>>>,
}

impl SnapshotSlot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Latest snapshot, or `None` before the first publication.
    pub async fn current(&self) -> Option<Arc<Snapshot>> {
        self.current.read().await.clone()
    }

    pub async fn is_initialized(&self) -> bool {
        self.current.read().await.is_some()
    }

    /// Replace the visible snapshot, returning the one it displaced.
    pub async fn publish(&self, snapshot: Arc<Snapshot>) -> Option<Arc<Snapshot>> {
        self.current.write().await.replace(snapshot)
    }
}
