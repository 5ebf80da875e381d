//! Metric catalog.
//!
//! Every exported series belongs to one of the families defined here. Label
//! schemas are fixed per family through [`LabelSet`] records, so a family can
//! only be written with its own label type.
//!
//! | Family | Labels |
//! |---|---|
//! | `dependency_track_portfolio_inherited_risk_score` | (none) |
//! | `dependency_track_portfolio_vulnerabilities` | severity |
//! | `dependency_track_portfolio_findings` | audited |
//! | `dependency_track_project_info` | uuid, name, version, classifier, active, tags |
//! | `dependency_track_project_vulnerabilities` | uuid, name, version, severity |
//! | `dependency_track_project_policy_violations` | uuid, name, version, type, state, analysis, suppressed |
//! | `dependency_track_project_last_bom_import` | uuid, name, version |
//! | `dependency_track_project_inherited_risk_score` | uuid, name, version |
//! | `dependency_track_exporter_build_info` | version, target_os, target_arch |

mod family;
mod labels;

use prometheus::{Gauge, Opts, Registry};

pub use family::{GaugeFamily, LabelSet};
pub use labels::{
    BuildInfoLabels, FindingsLabels, PolicyViolationLabels, ProjectInfoLabels, ProjectKey,
    ProjectSeverityLabels, SeverityLabels,
};

/// Prefix of every metric name.
pub const NAMESPACE: &str = "dependency_track";

/// Portfolio-wide families.
#[derive(Debug, Clone)]
pub struct PortfolioFamilies {
    pub inherited_risk_score: Gauge,
    pub vulnerabilities: GaugeFamily<SeverityLabels>,
    pub findings: GaugeFamily<FindingsLabels>,
}

impl PortfolioFamilies {
    pub fn new() -> Result<Self, prometheus::Error> {
        Ok(Self {
            inherited_risk_score: Gauge::with_opts(
                Opts::new(
                    "inherited_risk_score",
                    "The inherited risk score of the whole portfolio.",
                )
                .namespace(NAMESPACE)
                .subsystem("portfolio"),
            )?,
            vulnerabilities: GaugeFamily::new(
                "portfolio",
                "vulnerabilities",
                "Number of vulnerabilities across the whole portfolio, by severity.",
            )?,
            findings: GaugeFamily::new(
                "portfolio",
                "findings",
                "Number of findings across the whole portfolio, audited and unaudited.",
            )?,
        })
    }

    pub fn register(&self, registry: &Registry) -> Result<(), prometheus::Error> {
        registry.register(Box::new(self.inherited_risk_score.clone()))?;
        self.vulnerabilities.register(registry)?;
        self.findings.register(registry)
    }
}

/// Per-project families.
#[derive(Debug, Clone)]
pub struct ProjectFamilies {
    pub info: GaugeFamily<ProjectInfoLabels>,
    pub vulnerabilities: GaugeFamily<ProjectSeverityLabels>,
    pub policy_violations: GaugeFamily<PolicyViolationLabels>,
    pub last_bom_import: GaugeFamily<ProjectKey>,
    pub inherited_risk_score: GaugeFamily<ProjectKey>,
}

impl ProjectFamilies {
    pub fn new() -> Result<Self, prometheus::Error> {
        Ok(Self {
            info: GaugeFamily::new("project", "info", "Project information.")?,
            vulnerabilities: GaugeFamily::new(
                "project",
                "vulnerabilities",
                "Number of vulnerabilities for a project by severity.",
            )?,
            policy_violations: GaugeFamily::new(
                "project",
                "policy_violations",
                "Policy violations for a project.",
            )?,
            last_bom_import: GaugeFamily::new(
                "project",
                "last_bom_import",
                "Last BOM import date, represented as a Unix timestamp.",
            )?,
            inherited_risk_score: GaugeFamily::new(
                "project",
                "inherited_risk_score",
                "Inherited risk score for a project.",
            )?,
        })
    }

    pub fn register(&self, registry: &Registry) -> Result<(), prometheus::Error> {
        self.info.register(registry)?;
        self.vulnerabilities.register(registry)?;
        self.policy_violations.register(registry)?;
        self.last_bom_import.register(registry)?;
        self.inherited_risk_score.register(registry)
    }
}

/// Register `dependency_track_exporter_build_info` (always 1).
pub fn register_build_info(registry: &Registry) -> Result<(), prometheus::Error> {
    let family: GaugeFamily<BuildInfoLabels> = GaugeFamily::new(
        "exporter",
        "build_info",
        "A metric with a constant '1' value labeled by the exporter's version and target.",
    )?;
    family.register(registry)?;
    family.set(&BuildInfoLabels::current(), 1.0);
    Ok(())
}

/// Helpers for reading gathered series back in tests.
#[cfg(test)]
pub(crate) mod testing {
    use std::collections::BTreeMap;

    use prometheus::Registry;

    /// Every series of `name` as (labels, value).
    pub(crate) fn series(registry: &Registry, name: &str) -> Vec<(BTreeMap<String, String>, f64)> {
        registry
            .gather()
            .into_iter()
            .filter(|mf| mf.get_name() == name)
            .flat_map(|mf| mf.get_metric().to_vec())
            .map(|m| {
                let labels = m
                    .get_label()
                    .iter()
                    .map(|l| (l.get_name().to_string(), l.get_value().to_string()))
                    .collect();
                (labels, m.get_gauge().get_value())
            })
            .collect()
    }

    /// Value of the single series of `name` matching all `labels`.
    pub(crate) fn value(registry: &Registry, name: &str, labels: &[(&str, &str)]) -> Option<f64> {
        let matching: Vec<f64> = series(registry, name)
            .into_iter()
            .filter(|(have, _)| {
                labels
                    .iter()
                    .all(|(k, v)| have.get(*k).map(String::as_str) == Some(*v))
            })
            .map(|(_, v)| v)
            .collect();
        match matching.as_slice() {
            [v] => Some(*v),
            _ => None,
        }
    }

    /// Names of all non-empty families.
    pub(crate) fn family_names(registry: &Registry) -> Vec<String> {
        registry
            .gather()
            .iter()
            .map(|mf| mf.get_name().to_string())
            .collect()
    }
}
