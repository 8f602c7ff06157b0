//! Domain services containing business logic

use super::{Severity, VulnerabilityRecord};

/// Derives the risk level of a dependency
pub struct RiskAssessor;

impl RiskAssessor {
    /// Worst vulnerability severity if any, otherwise `Moderate` when outdated, otherwise `Low`
    pub fn risk_level(is_outdated: bool, vulnerabilities: &[VulnerabilityRecord]) -> Severity {
        vulnerabilities
            .iter()
            .map(|v| v.severity)
            .max()
            .unwrap_or(if is_outdated {
                Severity::Moderate
            } else {
                Severity::Low
            })
    }
}
