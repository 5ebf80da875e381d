//! Policy violation counts.

use std::sync::Arc;

use crate::client::DependencyTrackApi;
use crate::collector::{Collector, CollectorError, CycleContext};
use crate::metrics::PolicyViolationLabels;
use crate::pagination::PageFetcher;

/// Counts policy violations of the projects scanned earlier in the cycle.
///
/// Violations of projects the scan did not see, for example because a tag
/// filter excluded them, are dropped.
pub struct ViolationCollector {
    client: Arc<dyn DependencyTrackApi>,
    fetcher: PageFetcher,
}

impl ViolationCollector {
    pub fn new(client: Arc<dyn DependencyTrackApi>, fetcher: PageFetcher) -> Self {
        Self { client, fetcher }
    }
}

impl std::fmt::Debug for ViolationCollector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ViolationCollector")
            .field("fetcher", &self.fetcher)
            .finish_non_exhaustive()
    }
}

#[async_trait::async_trait]
impl Collector for ViolationCollector {
    fn name(&self) -> &'static str {
        "policy_violations"
    }

    async fn collect(&self, cycle: &mut CycleContext) -> Result<(), CollectorError> {
        let scan = cycle
            .project_scan()
            .ok_or(CollectorError::MissingProjectScan)?;

        let client = &self.client;
        let violations = self
            .fetcher
            .fetch_all(cycle.cancel_token(), |page| {
                client.get_policy_violations(page)
            })
            .await?;

        let family = scan.policy_violations();
        let mut counted = 0usize;
        for violation in &violations {
            let Some(project) = scan.project(&violation.project.uuid) else {
                continue;
            };
            family.inc(&PolicyViolationLabels {
                project: project.clone(),
                violation_type: violation.violation_type.clone(),
                state: violation.state().to_string(),
                analysis: violation.analysis_state().to_string(),
                suppressed: violation.is_suppressed(),
            });
            counted += 1;
        }

        tracing::debug!(
            fetched = violations.len(),
            counted,
            dropped = violations.len() - counted,
            "Collected policy violations"
        );
        Ok(())
    }
}
