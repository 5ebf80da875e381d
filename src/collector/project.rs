//! Per-project metrics.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use strum::IntoEnumIterator;
use uuid::Uuid;

use crate::client::{
    AnalysisState, ClientError, DependencyTrackApi, Project, Severity, ViolationState,
    ViolationType,
};
use crate::collector::{Collector, CollectorError, CycleContext, ProjectScan};
use crate::metrics::{
    GaugeFamily, PolicyViolationLabels, ProjectFamilies, ProjectInfoLabels, ProjectKey,
    ProjectSeverityLabels,
};
use crate::pagination::PageFetcher;

/// Exports project info, vulnerabilities, BOM import time and risk score.
///
/// Records the projects it saw as this cycle's [`ProjectScan`], which the
/// violation collector joins against.
pub struct ProjectCollector {
    client: Arc<dyn DependencyTrackApi>,
    fetcher: PageFetcher,
    tags: Vec<String>,
    initialize_violation_metrics: bool,
}

impl ProjectCollector {
    /// Collect all projects, with violation series pre-seeded.
    pub fn new(client: Arc<dyn DependencyTrackApi>, fetcher: PageFetcher) -> Self {
        Self {
            client,
            fetcher,
            tags: Vec::new(),
            initialize_violation_metrics: true,
        }
    }

    /// Only collect projects carrying at least one of `tags`.
    ///
    /// An empty list collects every project.
    pub fn with_tags(mut self, tags: Vec<String>) -> Self {
        self.tags = tags;
        self
    }

    /// Toggle zero-valued policy violation series for every project.
    pub fn with_initialize_violation_metrics(mut self, enabled: bool) -> Self {
        self.initialize_violation_metrics = enabled;
        self
    }

    async fn fetch_projects(&self, cycle: &CycleContext) -> Result<Vec<Project>, ClientError> {
        let cancel = cycle.cancel_token();
        if self.tags.is_empty() {
            let client = &self.client;
            return self
                .fetcher
                .fetch_all(cancel, |page| client.get_projects(page))
                .await;
        }

        let mut seen = HashSet::new();
        let mut projects = Vec::new();
        for tag in &self.tags {
            let client = &self.client;
            let tagged = self
                .fetcher
                .fetch_all(cancel, |page| client.get_projects_by_tag(tag, page))
                .await?;
            tracing::debug!(tag = %tag, count = tagged.len(), "Fetched tagged projects");
            projects.extend(tagged.into_iter().filter(|p| seen.insert(p.uuid)));
        }
        Ok(projects)
    }
}

impl std::fmt::Debug for ProjectCollector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProjectCollector")
            .field("fetcher", &self.fetcher)
            .field("tags", &self.tags)
            .field(
                "initialize_violation_metrics",
                &self.initialize_violation_metrics,
            )
            .finish_non_exhaustive()
    }
}

/// Write every violation label combination for `project` at 0.
///
/// The analysis dimension covers each [`AnalysisState`] plus the empty value
/// used for violations that were never analysed.
fn seed_violations(family: &GaugeFamily<PolicyViolationLabels>, project: &ProjectKey) {
    let analyses: Vec<String> = AnalysisState::iter()
        .map(|state| state.to_string())
        .chain(std::iter::once(String::new()))
        .collect();

    for violation_type in ViolationType::iter() {
        for state in ViolationState::iter() {
            for analysis in &analyses {
                for suppressed in [true, false] {
                    let labels = PolicyViolationLabels {
                        project: project.clone(),
                        violation_type: violation_type.to_string(),
                        state: state.to_string(),
                        analysis: analysis.clone(),
                        suppressed,
                    };
                    family.set(&labels, 0.0);
                }
            }
        }
    }
}

#[async_trait::async_trait]
impl Collector for ProjectCollector {
    fn name(&self) -> &'static str {
        "projects"
    }

    async fn collect(&self, cycle: &mut CycleContext) -> Result<(), CollectorError> {
        let projects = self.fetch_projects(cycle).await?;

        let families = ProjectFamilies::new()?;
        families.register(cycle.registry())?;

        let mut scanned: HashMap<Uuid, ProjectKey> = HashMap::with_capacity(projects.len());
        for project in &projects {
            let key = ProjectKey::from_project(project);
            let metrics = project.metrics.clone().unwrap_or_default();

            families
                .info
                .set(&ProjectInfoLabels::from_project(key.clone(), project), 1.0);
            for severity in Severity::iter() {
                let labels = ProjectSeverityLabels {
                    project: key.clone(),
                    severity,
                };
                families
                    .vulnerabilities
                    .set(&labels, metrics.vulnerabilities.count(severity) as f64);
            }
            families
                .last_bom_import
                .set(&key, project.last_bom_import_secs() as f64);
            families
                .inherited_risk_score
                .set(&key, metrics.inherited_risk_score);

            if self.initialize_violation_metrics {
                seed_violations(&families.policy_violations, &key);
            }
            scanned.insert(project.uuid, key);
        }

        tracing::debug!(
            projects = scanned.len(),
            tags = ?self.tags,
            "Collected project metrics"
        );
        cycle.set_project_scan(ProjectScan::new(scanned, families.policy_violations));
        Ok(())
    }
}
