//! Dependency-Track API client.
//!
//! # Architecture
//!
//! - [`DependencyTrackApi`]: the upstream operations the collectors rely on
//! - [`DependencyTrackClient`]: reqwest implementation authenticating with an API key
//! - Record types ([`Project`], [`PolicyViolation`], [`PortfolioMetrics`]) deserialized
//!   from the REST API
//!
//! Paginated operations return one [`Page`] per call; draining a whole
//! collection is the job of [`crate::pagination::PageFetcher`].

mod error;
mod http;
#[cfg(test)]
pub(crate) mod mock;
mod types;

pub use error::ClientError;
pub use http::{API_KEY_HEADER, DEFAULT_REQUEST_TIMEOUT, DependencyTrackClient, TOTAL_COUNT_HEADER};
pub use types::{
    About, AnalysisState, Policy, PolicyCondition, PolicyViolation, PortfolioMetrics, Project,
    ProjectMetrics, ProjectRef, Severity, Tag, ViolationAnalysis, ViolationState, ViolationType,
    VulnerabilityCounts,
};

use crate::pagination::{Page, PageOptions};

/// Upstream operations used by the collectors.
///
/// Implementations must be cheap to share across tasks; the poller holds one
/// behind an `Arc` for the whole process lifetime.
#[async_trait::async_trait]
pub trait DependencyTrackApi: Send + Sync + 'static {
    /// One page of all projects.
    async fn get_projects(&self, page: PageOptions) -> Result<Page<Project>, ClientError>;

    /// One page of the projects carrying `tag`.
    async fn get_projects_by_tag(
        &self,
        tag: &str,
        page: PageOptions,
    ) -> Result<Page<Project>, ClientError>;

    /// One page of all policy violations, suppressed ones included.
    async fn get_policy_violations(
        &self,
        page: PageOptions,
    ) -> Result<Page<PolicyViolation>, ClientError>;

    /// Latest portfolio-wide metrics.
    async fn latest_portfolio_metrics(&self) -> Result<PortfolioMetrics, ClientError>;
}
