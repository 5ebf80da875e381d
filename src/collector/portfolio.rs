//! Portfolio-wide aggregate metrics.

use std::sync::Arc;

use strum::IntoEnumIterator;

use crate::client::{DependencyTrackApi, Severity};
use crate::collector::{Collector, CollectorError, CycleContext};
use crate::metrics::{FindingsLabels, PortfolioFamilies, SeverityLabels};

/// Exports the latest portfolio metrics from a single request.
pub struct PortfolioCollector {
    client: Arc<dyn DependencyTrackApi>,
}

impl PortfolioCollector {
    pub fn new(client: Arc<dyn DependencyTrackApi>) -> Self {
        Self { client }
    }
}

impl std::fmt::Debug for PortfolioCollector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PortfolioCollector").finish_non_exhaustive()
    }
}

#[async_trait::async_trait]
impl Collector for PortfolioCollector {
    fn name(&self) -> &'static str {
        "portfolio"
    }

    async fn collect(&self, cycle: &mut CycleContext) -> Result<(), CollectorError> {
        let metrics = cycle
            .cancellable(self.client.latest_portfolio_metrics())
            .await?;

        let families = PortfolioFamilies::new()?;
        families.register(cycle.registry())?;

        families
            .inherited_risk_score
            .set(metrics.inherited_risk_score);
        for severity in Severity::iter() {
            families.vulnerabilities.set(
                &SeverityLabels { severity },
                metrics.vulnerabilities.count(severity) as f64,
            );
        }
        families
            .findings
            .set(&FindingsLabels { audited: true }, metrics.findings_audited as f64);
        families.findings.set(
            &FindingsLabels { audited: false },
            metrics.findings_unaudited as f64,
        );

        tracing::debug!(
            inherited_risk_score = metrics.inherited_risk_score,
            "Collected portfolio metrics"
        );
        Ok(())
    }
}
