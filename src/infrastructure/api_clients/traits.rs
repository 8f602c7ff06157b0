//! Traits for vulnerability API clients

use crate::application::errors::VulnerabilityError;
use crate::domain::{Ecosystem, VulnerabilityRecord};
use async_trait::async_trait;
use tracing::warn;

/// Trait for vulnerability API clients
#[async_trait]
pub trait VulnerabilityApiClient: Send + Sync {
    /// Query known vulnerabilities for one package version
    async fn query_vulnerabilities(
        &self,
        name: &str,
        version: &str,
        ecosystem: Ecosystem,
    ) -> Result<Vec<VulnerabilityRecord>, VulnerabilityError>;

    /// Like [`VulnerabilityApiClient::query_vulnerabilities`], but any failure yields an empty list
    async fn check_vulnerabilities(
        &self,
        name: &str,
        version: &str,
        ecosystem: Ecosystem,
    ) -> Vec<VulnerabilityRecord> {
        match self.query_vulnerabilities(name, version, ecosystem).await {
            Ok(records) => records,
            Err(e) => {
                warn!(
                    %ecosystem,
                    package = name,
                    version,
                    error = %e,
                    "Vulnerability lookup failed, reporting no vulnerabilities"
                );
                Vec::new()
            }
        }
    }
}
