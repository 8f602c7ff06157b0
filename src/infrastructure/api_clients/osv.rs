//! OSV API client implementation

use super::traits::VulnerabilityApiClient;
use crate::application::errors::{ApiError, VulnerabilityError};
use crate::domain::{Ecosystem, Severity, VulnerabilityRecord};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, instrument};

const UNKNOWN_SUMMARY: &str = "Unknown vulnerability";

/// Request payload for OSV query endpoint
#[derive(Debug, Serialize)]
struct OsvQueryRequest<'a> {
    package: OsvPackage<'a>,
    version: &'a str,
}

#[derive(Debug, Serialize)]
struct OsvPackage<'a> {
    name: &'a str,
    ecosystem: &'static str,
}

/// Response from OSV query endpoint; `vulns` is omitted when there are none
#[derive(Debug, Deserialize)]
struct OsvQueryResponse {
    #[serde(default)]
    vulns: Vec<OsvVulnerability>,
}

/// OSV vulnerability data structure
#[derive(Debug, Deserialize)]
struct OsvVulnerability {
    id: String,
    summary: Option<String>,
    published: Option<String>,
    #[serde(default)]
    references: Vec<OsvReference>,
    #[serde(default)]
    affected: Vec<OsvAffected>,
    database_specific: Option<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
struct OsvReference {
    url: String,
}

#[derive(Debug, Deserialize)]
struct OsvAffected {
    #[serde(default)]
    ranges: Vec<OsvRange>,
}

#[derive(Debug, Deserialize)]
struct OsvRange {
    #[serde(default)]
    events: Vec<OsvEvent>,
}

#[derive(Debug, Deserialize)]
struct OsvEvent {
    fixed: Option<String>,
}

/// Client for the OSV (Open Source Vulnerability) API
pub struct OsvClient {
    client: Client,
    base_url: String,
}

impl OsvClient {
    /// Create a new OSV client with the given base URL and per-call timeout
    pub fn new(base_url: String, timeout: Duration) -> Result<Self, VulnerabilityError> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(concat!("depsight/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Convert domain ecosystem to OSV ecosystem string
    pub fn ecosystem_to_osv_string(ecosystem: Ecosystem) -> &'static str {
        match ecosystem {
            Ecosystem::Npm => "npm",
            Ecosystem::Pip => "PyPI",
            Ecosystem::Maven | Ecosystem::Gradle => "Maven",
            Ecosystem::Composer => "Packagist",
            Ecosystem::NuGet => "NuGet",
            Ecosystem::Go => "Go",
            Ecosystem::Cargo => "crates.io",
            Ecosystem::Gem => "RubyGems",
        }
    }

    /// Convert an OSV vulnerability into a normalized record
    fn convert_osv_vulnerability(osv_vuln: OsvVulnerability) -> VulnerabilityRecord {
        let severity_label = osv_vuln
            .database_specific
            .as_ref()
            .and_then(|specific| specific.get("severity"))
            .and_then(|severity| severity.as_str());

        let published_at = osv_vuln
            .published
            .as_deref()
            .and_then(|p| DateTime::parse_from_rfc3339(p).ok())
            .map(|dt| dt.with_timezone(&Utc));

        let mut patched_versions: Vec<String> = Vec::new();
        let fixed_events = osv_vuln
            .affected
            .iter()
            .flat_map(|affected| &affected.ranges)
            .flat_map(|range| &range.events)
            .filter_map(|event| event.fixed.as_ref());
        for fixed in fixed_events {
            if !patched_versions.contains(fixed) {
                patched_versions.push(fixed.clone());
            }
        }

        VulnerabilityRecord {
            summary: osv_vuln
                .summary
                .filter(|s| !s.trim().is_empty())
                .unwrap_or_else(|| UNKNOWN_SUMMARY.to_string()),
            severity: Severity::from_label(severity_label),
            published_at,
            patched_versions,
            references: osv_vuln.references.into_iter().map(|r| r.url).collect(),
            id: osv_vuln.id,
        }
    }
}

#[async_trait]
impl VulnerabilityApiClient for OsvClient {
    #[instrument(skip(self))]
    async fn query_vulnerabilities(
        &self,
        name: &str,
        version: &str,
        ecosystem: Ecosystem,
    ) -> Result<Vec<VulnerabilityRecord>, VulnerabilityError> {
        let request_payload = OsvQueryRequest {
            package: OsvPackage {
                name,
                ecosystem: Self::ecosystem_to_osv_string(ecosystem),
            },
            version,
        };

        let url = format!("{}/v1/query", self.base_url);
        let response = self.client.post(&url).json(&request_payload).send().await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let error_text = response.text().await.unwrap_or_default();
            return Err(VulnerabilityError::Api(ApiError::Http {
                status,
                message: format!("OSV API error: {}", error_text),
            }));
        }

        let body = response.text().await?;
        let osv_response: OsvQueryResponse = serde_json::from_str(&body)?;
        debug!(
            package = name,
            count = osv_response.vulns.len(),
            "OSV query complete"
        );

        Ok(osv_response
            .vulns
            .into_iter()
            .map(Self::convert_osv_vulnerability)
            .collect())
    }
}
