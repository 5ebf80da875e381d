//! In-memory Dependency-Track double for collector and poller tests.

use std::collections::HashMap;
use std::sync::Mutex;

use reqwest::StatusCode;

use super::{ClientError, DependencyTrackApi, PolicyViolation, PortfolioMetrics, Project};
use crate::pagination::{Page, PageOptions};

#[derive(Default)]
struct State {
    projects: Vec<Project>,
    tagged: HashMap<String, Vec<Project>>,
    violations: Vec<PolicyViolation>,
    portfolio: Option<PortfolioMetrics>,
    fail_projects: bool,
    fail_violations: bool,
    requests: Vec<String>,
}

/// Serves fixed records with real pagination arithmetic.
#[derive(Default)]
pub(crate) struct MockDependencyTrack {
    state: Mutex<State>,
}

impl MockDependencyTrack {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn set_projects(&self, projects: Vec<Project>) {
        self.state.lock().unwrap().projects = projects;
    }

    pub(crate) fn set_tagged(&self, tag: &str, projects: Vec<Project>) {
        self.state
            .lock()
            .unwrap()
            .tagged
            .insert(tag.to_string(), projects);
    }

    pub(crate) fn set_violations(&self, violations: Vec<PolicyViolation>) {
        self.state.lock().unwrap().violations = violations;
    }

    pub(crate) fn set_portfolio(&self, portfolio: Option<PortfolioMetrics>) {
        self.state.lock().unwrap().portfolio = portfolio;
    }

    pub(crate) fn fail_projects(&self, fail: bool) {
        self.state.lock().unwrap().fail_projects = fail;
    }

    pub(crate) fn fail_violations(&self, fail: bool) {
        self.state.lock().unwrap().fail_violations = fail;
    }

    /// Request log, e.g. `projects?page=1` or `tag/prod?page=2`.
    pub(crate) fn requests(&self) -> Vec<String> {
        self.state.lock().unwrap().requests.clone()
    }
}

fn unavailable(what: &str) -> ClientError {
    ClientError::Status {
        status: StatusCode::SERVICE_UNAVAILABLE,
        url: format!("mock://{what}"),
    }
}

fn paginate<T: Clone>(all: &[T], page: PageOptions) -> Page<T> {
    let start = (page.page_size * (page.page_number - 1)).min(all.len());
    let end = (start + page.page_size).min(all.len());
    Page::new(all[start..end].to_vec(), all.len())
}

#[async_trait::async_trait]
impl DependencyTrackApi for MockDependencyTrack {
    async fn get_projects(&self, page: PageOptions) -> Result<Page<Project>, ClientError> {
        let mut state = self.state.lock().unwrap();
        state.requests.push(format!("projects?page={}", page.page_number));
        if state.fail_projects {
            return Err(unavailable("projects"));
        }
        Ok(paginate(&state.projects, page))
    }

    async fn get_projects_by_tag(
        &self,
        tag: &str,
        page: PageOptions,
    ) -> Result<Page<Project>, ClientError> {
        let mut state = self.state.lock().unwrap();
        state
            .requests
            .push(format!("tag/{tag}?page={}", page.page_number));
        if state.fail_projects {
            return Err(unavailable("projects"));
        }
        let projects = state.tagged.get(tag).cloned().unwrap_or_default();
        Ok(paginate(&projects, page))
    }

    async fn get_policy_violations(
        &self,
        page: PageOptions,
    ) -> Result<Page<PolicyViolation>, ClientError> {
        let mut state = self.state.lock().unwrap();
        state
            .requests
            .push(format!("violations?page={}", page.page_number));
        if state.fail_violations {
            return Err(unavailable("violations"));
        }
        Ok(paginate(&state.violations, page))
    }

    async fn latest_portfolio_metrics(&self) -> Result<PortfolioMetrics, ClientError> {
        let mut state = self.state.lock().unwrap();
        state.requests.push("portfolio".to_string());
        state
            .portfolio
            .clone()
            .ok_or_else(|| unavailable("portfolio"))
    }
}
