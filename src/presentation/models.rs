//! API request and response models

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::domain::{
    AnalysisReport, AnalyzedDependency, RepositoryOverview, RiskSummary, VulnerabilityRecord,
};

fn default_check_vulnerabilities() -> bool {
    true
}

/// Request for analyzing a GitHub repository's dependency manifests
#[derive(Debug, Deserialize, ToSchema)]
pub struct AnalyzeRepositoryRequest {
    /// Repository URL. Accepted forms: `https://github.com/owner/repo`,
    /// `https://github.com/owner/repo/tree/branch/path`, `git@github.com:owner/repo.git`,
    /// `git://github.com/owner/repo.git` and `github:owner/repo#branch`
    #[schema(example = "https://github.com/rust-lang/cargo")]
    pub repo_url: String,

    /// Include development-only dependencies
    #[serde(default)]
    #[schema(example = false)]
    pub include_dev_dependencies: bool,

    /// Query the vulnerability database for outdated dependencies
    #[serde(default = "default_check_vulnerabilities")]
    #[schema(example = true)]
    pub check_vulnerabilities: bool,
}

/// Request for resolving a repository URL into repository details
#[derive(Debug, Deserialize, ToSchema)]
pub struct ParseRepositoryRequest {
    #[schema(example = "https://github.com/rust-lang/cargo/tree/master")]
    pub url: String,
}

/// Vulnerability affecting a dependency
#[derive(Debug, Serialize, ToSchema)]
pub struct VulnerabilityDto {
    /// Advisory identifier
    #[schema(example = "GHSA-93q8-gq69-wqmw")]
    pub id: String,

    #[schema(example = "Inefficient Regular Expression Complexity in chalk/ansi-regex")]
    pub summary: String,

    /// One of `low`, `moderate`, `high`, `critical`
    #[schema(example = "high")]
    pub severity: String,

    /// Publication date, null when the advisory carries none
    #[schema(example = "2021-09-20T20:20:09Z")]
    pub published_at: Option<DateTime<Utc>>,

    #[schema(example = json!(["5.0.1"]))]
    pub patched_versions: Vec<String>,

    pub references: Vec<String>,
}

/// One analyzed dependency
#[derive(Debug, Serialize, ToSchema)]
pub struct DependencyReportDto {
    #[schema(example = "lodash")]
    pub name: String,

    #[schema(example = "4.17.15")]
    pub current_version: String,

    #[schema(example = "4.17.21")]
    pub latest_version: String,

    /// Ecosystem of the dependency
    #[schema(example = "npm")]
    pub dependency_type: String,

    #[schema(example = false)]
    pub is_dev: bool,

    #[schema(example = true)]
    pub is_outdated: bool,

    #[schema(example = true)]
    pub update_available: bool,

    pub vulnerabilities: Vec<VulnerabilityDto>,

    /// Highest vulnerability severity; otherwise `moderate` if outdated, else `low`
    #[schema(example = "high")]
    pub risk_level: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    #[schema(example = "Lodash modular utilities.")]
    pub description: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    #[schema(example = "https://lodash.com/")]
    pub homepage: Option<String>,
}

/// Count of dependencies per risk level
#[derive(Debug, Serialize, ToSchema)]
pub struct RiskSummaryDto {
    #[schema(example = 0)]
    pub critical: usize,
    #[schema(example = 1)]
    pub high: usize,
    #[schema(example = 2)]
    pub moderate: usize,
    #[schema(example = 40)]
    pub low: usize,
}

/// Consolidated dependency health report for a repository
#[derive(Debug, Serialize, ToSchema)]
pub struct AnalysisReportDto {
    #[schema(example = "cargo")]
    pub repository: String,

    #[schema(example = "rust-lang")]
    pub owner: String,

    #[schema(example = "2024-01-15T10:30:00Z")]
    pub analyzed_at: DateTime<Utc>,

    #[schema(example = 43)]
    pub total_dependencies: usize,

    #[schema(example = 12)]
    pub outdated_dependencies: usize,

    #[schema(example = 3)]
    pub vulnerable_dependencies: usize,

    pub risk_summary: RiskSummaryDto,

    pub dependencies: Vec<DependencyReportDto>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct RepositoryOwnerDto {
    #[schema(example = "rust-lang")]
    pub login: String,
    pub avatar_url: Option<String>,
    pub html_url: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct RepositoryStatsDto {
    pub stars: u64,
    pub watchers: u64,
    pub forks: u64,
    pub open_issues: u64,
}

/// Normalized repository details
#[derive(Debug, Serialize, ToSchema)]
pub struct RepositoryOverviewDto {
    #[schema(example = 724712)]
    pub id: u64,

    #[schema(example = "cargo")]
    pub name: String,

    #[schema(example = "rust-lang/cargo")]
    pub full_name: String,

    pub description: Option<String>,
    pub private: bool,
    pub fork: bool,
    pub owner: RepositoryOwnerDto,
    pub ssh_url: Option<String>,
    pub default_branch: Option<String>,
    pub stats: RepositoryStatsDto,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
    pub pushed_at: Option<DateTime<Utc>>,

    /// Branch named by the URL, `main` when it names none
    #[schema(example = "master")]
    pub branch: String,

    /// Bytes of code per language
    #[schema(example = json!({"Rust": 1843200, "Shell": 2048}))]
    pub languages: BTreeMap<String, u64>,

    pub topics: Vec<String>,
}

/// Error response model
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorResponse {
    /// Machine-readable error code
    #[schema(example = "INVALID_REPOSITORY_URL")]
    pub code: String,

    /// Human-readable error message
    #[schema(example = "The repository URL could not be parsed")]
    pub message: String,

    /// Additional error context
    #[schema(example = r#"{"type": "invalid_repository_url"}"#)]
    pub details: Option<serde_json::Value>,

    /// Unique request identifier for tracking and support
    #[schema(example = "550e8400-e29b-41d4-a716-446655440000")]
    pub request_id: Uuid,

    #[schema(example = "2024-01-15T10:30:00Z")]
    pub timestamp: DateTime<Utc>,
}

/// Health check response
#[derive(Debug, Serialize, ToSchema)]
pub struct HealthResponse {
    #[schema(example = "healthy")]
    pub status: String,

    #[schema(example = "0.1.0")]
    pub version: String,

    /// Date the binary was built, when known
    #[schema(example = "2024-01-10")]
    pub build_date: Option<String>,

    #[schema(example = "2024-01-15T10:30:00Z")]
    pub timestamp: DateTime<Utc>,
}

impl From<VulnerabilityRecord> for VulnerabilityDto {
    fn from(record: VulnerabilityRecord) -> Self {
        Self {
            id: record.id,
            summary: record.summary,
            severity: record.severity.to_string(),
            published_at: record.published_at,
            patched_versions: record.patched_versions,
            references: record.references,
        }
    }
}

impl From<AnalyzedDependency> for DependencyReportDto {
    fn from(dependency: AnalyzedDependency) -> Self {
        Self {
            name: dependency.name,
            current_version: dependency.current_version,
            latest_version: dependency.latest_version,
            dependency_type: dependency.dependency_type.to_string(),
            is_dev: dependency.is_dev,
            is_outdated: dependency.is_outdated,
            update_available: dependency.update_available,
            vulnerabilities: dependency
                .vulnerabilities
                .into_iter()
                .map(VulnerabilityDto::from)
                .collect(),
            risk_level: dependency.risk_level.to_string(),
            description: dependency.description,
            homepage: dependency.homepage,
        }
    }
}

impl From<RiskSummary> for RiskSummaryDto {
    fn from(summary: RiskSummary) -> Self {
        Self {
            critical: summary.critical,
            high: summary.high,
            moderate: summary.moderate,
            low: summary.low,
        }
    }
}

impl From<AnalysisReport> for AnalysisReportDto {
    fn from(report: AnalysisReport) -> Self {
        Self {
            repository: report.repository,
            owner: report.owner,
            analyzed_at: report.analyzed_at,
            total_dependencies: report.total_dependencies,
            outdated_dependencies: report.outdated_dependencies,
            vulnerable_dependencies: report.vulnerable_dependencies,
            risk_summary: report.risk_summary.into(),
            dependencies: report
                .dependencies
                .into_iter()
                .map(DependencyReportDto::from)
                .collect(),
        }
    }
}

impl From<RepositoryOverview> for RepositoryOverviewDto {
    fn from(overview: RepositoryOverview) -> Self {
        let info = overview.info;
        Self {
            id: info.id,
            name: info.name,
            full_name: info.full_name,
            description: info.description,
            private: info.private,
            fork: info.fork,
            owner: RepositoryOwnerDto {
                login: info.owner.login,
                avatar_url: info.owner.avatar_url,
                html_url: info.owner.html_url,
            },
            ssh_url: info.ssh_url,
            default_branch: info.default_branch,
            stats: RepositoryStatsDto {
                stars: info.stats.stars,
                watchers: info.stats.watchers,
                forks: info.stats.forks,
                open_issues: info.stats.open_issues,
            },
            created_at: info.created_at,
            updated_at: info.updated_at,
            pushed_at: info.pushed_at,
            branch: overview.branch,
            languages: overview.languages,
            topics: info.topics,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Dependency, Ecosystem, OutdatedCheckResult, Severity};

    #[test]
    fn test_analyze_request_defaults() {
        let request: AnalyzeRepositoryRequest =
            serde_json::from_str(r#"{"repo_url": "github:o/r"}"#).unwrap();
        assert!(!request.include_dev_dependencies);
        assert!(request.check_vulnerabilities);
    }

    #[test]
    fn test_dependency_dto_serializes_lowercase_labels() {
        let dependency = AnalyzedDependency::new(
            Dependency::new("requests", "2.0.0", Ecosystem::Pip),
            OutdatedCheckResult::compared("2.0.0", "2.31.0"),
            vec![VulnerabilityRecord {
                id: "PYSEC-1".to_string(),
                summary: "Leak".to_string(),
                severity: Severity::Moderate,
                published_at: None,
                patched_versions: vec![],
                references: vec![],
            }],
        );

        let json = serde_json::to_value(DependencyReportDto::from(dependency)).unwrap();
        assert_eq!(json["dependency_type"], "pip");
        assert_eq!(json["risk_level"], "moderate");
        assert_eq!(json["vulnerabilities"][0]["severity"], "moderate");
        assert!(json["vulnerabilities"][0]["published_at"].is_null());
        assert!(json.get("homepage").is_none());
    }

    #[test]
    fn test_dependency_dto_risk_level_follows_vulnerabilities_then_staleness() {
        let high = VulnerabilityRecord {
            id: "GHSA-1".to_string(),
            summary: "RCE".to_string(),
            severity: Severity::High,
            published_at: None,
            patched_versions: vec![],
            references: vec![],
        };
        let risk = |current: &str, latest: &str, vulnerabilities: Vec<VulnerabilityRecord>| {
            DependencyReportDto::from(AnalyzedDependency::new(
                Dependency::new("lodash", current, Ecosystem::Npm),
                OutdatedCheckResult::compared(current, latest),
                vulnerabilities,
            ))
            .risk_level
        };

        assert_eq!(risk("4.17.20", "4.17.21", vec![high.clone()]), "high");
        assert_eq!(risk("4.17.21", "4.17.21", vec![high]), "high");
        assert_eq!(risk("4.17.20", "4.17.21", vec![]), "moderate");
        assert_eq!(risk("4.17.21", "4.17.21", vec![]), "low");
    }
}
