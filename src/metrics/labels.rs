//! Label records, one per metric kind.

use crate::client::{Project, Severity};

use super::LabelSet;

fn bool_label(value: bool) -> &'static str {
    if value { "true" } else { "false" }
}

/// Identity labels shared by every per-project metric.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ProjectKey {
    pub uuid: String,
    pub name: String,
    pub version: String,
}

impl ProjectKey {
    pub fn from_project(project: &Project) -> Self {
        Self {
            uuid: project.uuid.to_string(),
            name: project.name.clone(),
            version: project.version.clone().unwrap_or_default(),
        }
    }
}

impl LabelSet for ProjectKey {
    const NAMES: &'static [&'static str] = &["uuid", "name", "version"];

    fn values(&self) -> Vec<&str> {
        vec![self.uuid.as_str(), self.name.as_str(), self.version.as_str()]
    }
}

/// Labels of `project_info`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectInfoLabels {
    pub project: ProjectKey,
    pub classifier: String,
    pub active: bool,
    pub tags: String,
}

impl ProjectInfoLabels {
    pub fn from_project(key: ProjectKey, project: &Project) -> Self {
        Self {
            project: key,
            classifier: project.classifier.clone().unwrap_or_default(),
            active: project.active,
            tags: project.joined_tags(),
        }
    }
}

impl LabelSet for ProjectInfoLabels {
    const NAMES: &'static [&'static str] =
        &["uuid", "name", "version", "classifier", "active", "tags"];

    fn values(&self) -> Vec<&str> {
        vec![
            self.project.uuid.as_str(),
            self.project.name.as_str(),
            self.project.version.as_str(),
            self.classifier.as_str(),
            bool_label(self.active),
            self.tags.as_str(),
        ]
    }
}

/// Labels of `project_vulnerabilities`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectSeverityLabels {
    pub project: ProjectKey,
    pub severity: Severity,
}

impl LabelSet for ProjectSeverityLabels {
    const NAMES: &'static [&'static str] = &["uuid", "name", "version", "severity"];

    fn values(&self) -> Vec<&str> {
        vec![
            self.project.uuid.as_str(),
            self.project.name.as_str(),
            self.project.version.as_str(),
            self.severity.as_ref(),
        ]
    }
}

/// Labels of `project_policy_violations`.
///
/// Type, state and analysis are kept as upstream strings so that values
/// outside the known enumerations are still counted.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PolicyViolationLabels {
    pub project: ProjectKey,
    pub violation_type: String,
    pub state: String,
    pub analysis: String,
    pub suppressed: bool,
}

impl LabelSet for PolicyViolationLabels {
    const NAMES: &'static [&'static str] = &[
        "uuid",
        "name",
        "version",
        "type",
        "state",
        "analysis",
        "suppressed",
    ];

    fn values(&self) -> Vec<&str> {
        vec![
            self.project.uuid.as_str(),
            self.project.name.as_str(),
            self.project.version.as_str(),
            self.violation_type.as_str(),
            self.state.as_str(),
            self.analysis.as_str(),
            bool_label(self.suppressed),
        ]
    }
}

/// Labels of `portfolio_vulnerabilities`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SeverityLabels {
    pub severity: Severity,
}

impl LabelSet for SeverityLabels {
    const NAMES: &'static [&'static str] = &["severity"];

    fn values(&self) -> Vec<&str> {
        vec![self.severity.as_ref()]
    }
}

/// Labels of `portfolio_findings`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FindingsLabels {
    pub audited: bool,
}

impl LabelSet for FindingsLabels {
    const NAMES: &'static [&'static str] = &["audited"];

    fn values(&self) -> Vec<&str> {
        vec![bool_label(self.audited)]
    }
}

/// Labels of `exporter_build_info`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BuildInfoLabels {
    pub version: &'static str,
    pub target_os: &'static str,
    pub target_arch: &'static str,
}

impl BuildInfoLabels {
    /// Build information of the running binary.
    pub fn current() -> Self {
        Self {
            version: env!("CARGO_PKG_VERSION"),
            target_os: std::env::consts::OS,
            target_arch: std::env::consts::ARCH,
        }
    }
}

impl LabelSet for BuildInfoLabels {
    const NAMES: &'static [&'static str] = &["version", "target_os", "target_arch"];

    fn values(&self) -> Vec<&str> {
        vec![self.version, self.target_os, self.target_arch]
    }
}
