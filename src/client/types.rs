//! Dependency-Track API records.
//!
//! Only the fields needed to build metric labels are modelled. Unknown fields
//! are ignored and optional ones default, so schema additions upstream do not
//! break deserialization.

use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumIter, EnumString};
use uuid::Uuid;

/// Vulnerability severity buckets reported by Dependency-Track.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, EnumString, Display, AsRefStr,
)]
#[strum(serialize_all = "UPPERCASE", ascii_case_insensitive)]
pub enum Severity {
    Critical,
    High,
    Medium,
    Low,
    Unassigned,
}

/// Policy violation types.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, EnumString, Display, AsRefStr,
)]
#[strum(serialize_all = "UPPERCASE", ascii_case_insensitive)]
pub enum ViolationType {
    License,
    Operational,
    Security,
}

/// Violation state inherited from the violated policy.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, EnumString, Display, AsRefStr,
)]
#[strum(serialize_all = "UPPERCASE", ascii_case_insensitive)]
pub enum ViolationState {
    Info,
    Warn,
    Fail,
}

/// Triage outcome recorded on a violation analysis.
///
/// A violation without any analysis has no state at all; that case is
/// modelled as `Option::None` by callers.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, EnumString, Display, AsRefStr,
)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE", ascii_case_insensitive)]
pub enum AnalysisState {
    Approved,
    Rejected,
    NotSet,
}

/// Vulnerability counts by severity.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct VulnerabilityCounts {
    pub critical: u64,
    pub high: u64,
    pub medium: u64,
    pub low: u64,
    pub unassigned: u64,
}

impl VulnerabilityCounts {
    /// Count for a single severity bucket.
    pub fn count(&self, severity: Severity) -> u64 {
        match severity {
            Severity::Critical => self.critical,
            Severity::High => self.high,
            Severity::Medium => self.medium,
            Severity::Low => self.low,
            Severity::Unassigned => self.unassigned,
        }
    }
}

/// Metrics embedded in a project record.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ProjectMetrics {
    #[serde(flatten)]
    pub vulnerabilities: VulnerabilityCounts,
    pub inherited_risk_score: f64,
}

/// Project tag.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tag {
    pub name: String,
}

/// A project as returned by the project listing endpoints.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    pub uuid: Uuid,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub version: Option<String>,
    #[serde(default)]
    pub classifier: Option<String>,
    #[serde(default)]
    pub active: bool,
    #[serde(default)]
    pub tags: Vec<Tag>,
    #[serde(default)]
    pub metrics: Option<ProjectMetrics>,
    /// Last BOM import, epoch milliseconds.
    #[serde(default)]
    pub last_bom_import: Option<i64>,
}

impl Project {
    /// Create a project with only an identity and a name.
    pub fn new(uuid: Uuid, name: impl Into<String>) -> Self {
        Self {
            uuid,
            name: name.into(),
            version: None,
            classifier: None,
            active: true,
            tags: Vec::new(),
            metrics: None,
            last_bom_import: None,
        }
    }

    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = Some(version.into());
        self
    }

    pub fn with_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags = tags.into_iter().map(|name| Tag { name: name.into() }).collect();
        self
    }

    pub fn with_metrics(mut self, metrics: ProjectMetrics) -> Self {
        self.metrics = Some(metrics);
        self
    }

    /// Comma-joined tag names, in upstream order.
    pub fn joined_tags(&self) -> String {
        self.tags
            .iter()
            .map(|t| t.name.as_str())
            .collect::<Vec<_>>()
            .join(",")
    }

    /// Last BOM import as Unix seconds, 0 when never imported.
    pub fn last_bom_import_secs(&self) -> i64 {
        self.last_bom_import.map_or(0, |ms| ms.div_euclid(1000))
    }
}

/// Project reference embedded in a policy violation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectRef {
    pub uuid: Uuid,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub version: Option<String>,
}

/// Policy owning the violated condition.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Policy {
    pub name: String,
    pub violation_state: String,
}

/// Policy condition that produced a violation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PolicyCondition {
    pub policy: Policy,
}

/// Triage data attached to a violation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ViolationAnalysis {
    pub analysis_state: Option<String>,
    #[serde(rename = "isSuppressed")]
    pub suppressed: bool,
}

/// A single policy violation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PolicyViolation {
    pub uuid: Uuid,
    #[serde(rename = "type", default)]
    pub violation_type: String,
    pub project: ProjectRef,
    #[serde(default)]
    pub policy_condition: PolicyCondition,
    #[serde(default)]
    pub analysis: Option<ViolationAnalysis>,
}

impl PolicyViolation {
    /// Violation state of the owning policy.
    pub fn state(&self) -> &str {
        &self.policy_condition.policy.violation_state
    }

    /// Analysis state label, empty when no analysis exists.
    pub fn analysis_state(&self) -> &str {
        self.analysis
            .as_ref()
            .and_then(|a| a.analysis_state.as_deref())
            .unwrap_or("")
    }

    /// Whether the violation has been suppressed; `false` without analysis.
    pub fn is_suppressed(&self) -> bool {
        self.analysis.as_ref().is_some_and(|a| a.suppressed)
    }
}

/// Latest portfolio-wide metrics.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PortfolioMetrics {
    #[serde(flatten)]
    pub vulnerabilities: VulnerabilityCounts,
    pub inherited_risk_score: f64,
    pub findings_audited: u64,
    pub findings_unaudited: u64,
}

/// Server identification from `/api/version`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct About {
    pub application: String,
    pub version: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use strum::IntoEnumIterator;

    #[test]
    fn test_project_deserialize_full() {
        let uuid = Uuid::new_v4();
        let project: Project = serde_json::from_value(json!({
            "uuid": uuid,
            "name": "billing",
            "version": "1.2.0",
            "classifier": "APPLICATION",
            "active": true,
            "tags": [{"name": "prod"}, {"name": "team-a"}],
            "lastBomImport": 1_700_000_123_456_i64,
            "metrics": {
                "critical": 1, "high": 2, "medium": 3, "low": 4, "unassigned": 5,
                "inheritedRiskScore": 42.5,
                "components": 120
            }
        }))
        .unwrap();

        assert_eq!(project.uuid, uuid);
        assert_eq!(project.version.as_deref(), Some("1.2.0"));
        assert_eq!(project.joined_tags(), "prod,team-a");
        assert_eq!(project.last_bom_import_secs(), 1_700_000_123);
        let metrics = project.metrics.unwrap();
        assert_eq!(metrics.vulnerabilities.count(Severity::Medium), 3);
        assert_eq!(metrics.vulnerabilities.count(Severity::Unassigned), 5);
        assert_eq!(metrics.inherited_risk_score, 42.5);
    }

    #[test]
    fn test_project_deserialize_minimal() {
        let project: Project =
            serde_json::from_value(json!({ "uuid": Uuid::new_v4(), "version": null })).unwrap();

        assert_eq!(project.name, "");
        assert!(project.version.is_none());
        assert!(project.tags.is_empty());
        assert_eq!(project.joined_tags(), "");
        assert_eq!(project.last_bom_import_secs(), 0);
    }

    #[test]
    fn test_violation_without_analysis() {
        let violation: PolicyViolation = serde_json::from_value(json!({
            "uuid": Uuid::new_v4(),
            "type": "SECURITY",
            "project": { "uuid": Uuid::new_v4(), "name": "billing" },
            "policyCondition": { "policy": { "name": "no-critical", "violationState": "WARN" } }
        }))
        .unwrap();

        assert_eq!(violation.violation_type, "SECURITY");
        assert_eq!(violation.state(), "WARN");
        assert_eq!(violation.analysis_state(), "");
        assert!(!violation.is_suppressed());
    }

    #[test]
    fn test_violation_with_analysis() {
        let violation: PolicyViolation = serde_json::from_value(json!({
            "uuid": Uuid::new_v4(),
            "type": "LICENSE",
            "project": { "uuid": Uuid::new_v4() },
            "policyCondition": { "policy": { "violationState": "FAIL" } },
            "analysis": { "analysisState": "APPROVED", "isSuppressed": true }
        }))
        .unwrap();

        assert_eq!(violation.analysis_state(), "APPROVED");
        assert!(violation.is_suppressed());
    }

    #[test]
    fn test_enum_labels() {
        let severities: Vec<String> = Severity::iter().map(|s| s.to_string()).collect();
        assert_eq!(
            severities,
            ["CRITICAL", "HIGH", "MEDIUM", "LOW", "UNASSIGNED"]
        );
        assert_eq!(AnalysisState::NotSet.as_ref(), "NOT_SET");
        assert_eq!("warn".parse::<ViolationState>().ok(), Some(ViolationState::Warn));
        assert_eq!(ViolationType::iter().count(), 3);
    }
}
