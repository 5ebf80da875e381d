//! Core collector traits and types.

use std::collections::HashMap;
use std::future::Future;

use prometheus::Registry;
use thiserror::Error;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use crate::client::ClientError;
use crate::metrics::{GaugeFamily, PolicyViolationLabels, ProjectKey};

/// Errors that can occur during collection.
#[derive(Debug, Error)]
pub enum CollectorError {
    /// Upstream request failed or was cancelled.
    #[error("upstream error: {0}")]
    Client(#[from] ClientError),

    /// Metric family could not be created or registered.
    #[error("metrics error: {0}")]
    Metrics(#[from] prometheus::Error),

    /// Policy violations need this cycle's project scan, which is missing.
    #[error("no project scan available in this cycle")]
    MissingProjectScan,
}

impl CollectorError {
    /// Whether collection stopped because shutdown was requested.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Client(e) if e.is_cancelled())
    }
}

/// Projects seen by this cycle's project collection.
///
/// Carries the policy violation family so that violation counts land in the
/// same series the project collector pre-seeded.
#[derive(Debug, Clone)]
pub struct ProjectScan {
    projects: HashMap<Uuid, ProjectKey>,
    policy_violations: GaugeFamily<PolicyViolationLabels>,
}

impl ProjectScan {
    pub fn new(
        projects: HashMap<Uuid, ProjectKey>,
        policy_violations: GaugeFamily<PolicyViolationLabels>,
    ) -> Self {
        Self {
            projects,
            policy_violations,
        }
    }

    /// Label key of a scanned project.
    pub fn project(&self, uuid: &Uuid) -> Option<&ProjectKey> {
        self.projects.get(uuid)
    }

    pub fn len(&self) -> usize {
        self.projects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.projects.is_empty()
    }

    pub fn policy_violations(&self) -> &GaugeFamily<PolicyViolationLabels> {
        &self.policy_violations
    }
}

/// State of one collection cycle.
///
/// Created empty for every cycle and handed to each collector in turn. The
/// registry it owns becomes the published snapshot once all collectors ran.
pub struct CycleContext {
    registry: Registry,
    cancel: CancellationToken,
    project_scan: Option<ProjectScan>,
}

impl CycleContext {
    /// Start a cycle with a fresh, empty registry.
    pub fn new(cancel: CancellationToken) -> Self {
        Self {
            registry: Registry::new(),
            cancel,
            project_scan: None,
        }
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn cancel_token(&self) -> &CancellationToken {
        &self.cancel
    }

    pub fn project_scan(&self) -> Option<&ProjectScan> {
        self.project_scan.as_ref()
    }

    pub fn set_project_scan(&mut self, scan: ProjectScan) {
        self.project_scan = Some(scan);
    }

    /// Run a single upstream request, aborting it on cancellation.
    pub async fn cancellable<T, F>(&self, request: F) -> Result<T, ClientError>
    where
        F: Future<Output = Result<T, ClientError>>,
    {
        tokio::select! {
            biased;
            _ = self.cancel.cancelled() => Err(ClientError::Cancelled),
            result = request => result,
        }
    }

    /// Finish the cycle, releasing the populated registry.
    pub fn into_registry(self) -> Registry {
        self.registry
    }
}

impl std::fmt::Debug for CycleContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CycleContext")
            .field("cancelled", &self.cancel.is_cancelled())
            .field("project_scan", &self.project_scan)
            .finish_non_exhaustive()
    }
}

/// A unit of metric collection run once per cycle.
///
/// Collectors own disjoint metric families and register them into the
/// cycle's registry only once their upstream data has been fetched in full,
/// so a failed collector leaves its families absent from the snapshot.
///
/// # Returns
///
/// - `Ok(())`: families registered and populated
/// - `Err(CollectorError::Client)`: upstream failure or cancellation
/// - `Err(CollectorError::Metrics)`: family creation or registration failed
#[async_trait::async_trait]
pub trait Collector: Send + Sync + 'static {
    /// Name used in logs.
    fn name(&self) -> &'static str;

    /// Perform this collector's part of the cycle.
    async fn collect(&self, cycle: &mut CycleContext) -> Result<(), CollectorError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_cancellable_passes_result_through() {
        let cycle = CycleContext::new(CancellationToken::new());
        let result = cycle.cancellable(async { Ok::<_, ClientError>(7) }).await;
        assert_eq!(result.unwrap(), 7);
    }

    #[tokio::test]
    async fn test_cancellable_aborts_on_cancel() {
        let cancel = CancellationToken::new();
        let cycle = CycleContext::new(cancel.clone());
        cancel.cancel();

        let result = cycle
            .cancellable(std::future::pending::<Result<(), ClientError>>())
            .await;
        assert!(result.unwrap_err().is_cancelled());
    }

    #[test]
    fn test_collector_error_is_cancelled() {
        assert!(CollectorError::from(ClientError::Cancelled).is_cancelled());
        assert!(!CollectorError::from(ClientError::MissingTotalCount).is_cancelled());
        assert!(!CollectorError::MissingProjectScan.is_cancelled());
    }

    #[test]
    fn test_new_cycle_has_no_scan() {
        let cycle = CycleContext::new(CancellationToken::new());
        assert!(cycle.project_scan().is_none());
        assert!(cycle.registry().gather().is_empty());
    }
}
