//! Domain entities representing core business concepts

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::services::RiskAssessor;
use super::value_objects::*;

/// Sentinel version used when a manifest declares no version
pub const UNSPECIFIED_VERSION: &str = "latest";

/// A dependency declared in a manifest
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dependency {
    pub name: String,
    pub version: String,
    pub ecosystem: Ecosystem,
    pub is_dev: bool,
    /// Comparison operator for line-oriented manifests (e.g. `>=`)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub constraint: Option<String>,
}

impl Dependency {
    /// Create a dependency; an empty version falls back to [`UNSPECIFIED_VERSION`]
    pub fn new(name: impl Into<String>, version: impl Into<String>, ecosystem: Ecosystem) -> Self {
        let version = version.into();
        let version = if version.trim().is_empty() {
            UNSPECIFIED_VERSION.to_string()
        } else {
            version.trim().to_string()
        };

        Self {
            name: name.into().trim().to_string(),
            version,
            ecosystem,
            is_dev: false,
            constraint: None,
        }
    }

    pub fn dev(mut self, is_dev: bool) -> Self {
        self.is_dev = is_dev;
        self
    }

    pub fn with_constraint(mut self, constraint: impl Into<String>) -> Self {
        self.constraint = Some(constraint.into());
        self
    }
}

/// Outcome of asking a registry whether a dependency is outdated
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutdatedCheckResult {
    pub latest_version: String,
    pub is_outdated: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub homepage: Option<String>,
}

impl OutdatedCheckResult {
    /// Result for a lookup that failed or could not be performed.
    ///
    /// Never reports an update: the latest version is the current one.
    pub fn fail_closed(current_version: &str) -> Self {
        Self {
            latest_version: current_version.to_string(),
            is_outdated: false,
            description: None,
            homepage: None,
        }
    }

    /// Result for a successful lookup, compared by exact string equality
    pub fn compared(current_version: &str, latest_version: &str) -> Self {
        Self {
            latest_version: latest_version.to_string(),
            is_outdated: latest_version != current_version,
            description: None,
            homepage: None,
        }
    }
}

/// A known vulnerability affecting a dependency
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VulnerabilityRecord {
    pub id: String,
    pub summary: String,
    pub severity: Severity,
    pub published_at: Option<DateTime<Utc>>,
    pub patched_versions: Vec<String>,
    pub references: Vec<String>,
}

/// A dependency together with everything learned about it during analysis
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalyzedDependency {
    pub name: String,
    pub current_version: String,
    pub latest_version: String,
    pub dependency_type: Ecosystem,
    pub is_dev: bool,
    pub is_outdated: bool,
    pub update_available: bool,
    pub vulnerabilities: Vec<VulnerabilityRecord>,
    pub risk_level: Severity,
    pub description: Option<String>,
    pub homepage: Option<String>,
}

impl AnalyzedDependency {
    pub fn new(
        dependency: Dependency,
        outdated: OutdatedCheckResult,
        vulnerabilities: Vec<VulnerabilityRecord>,
    ) -> Self {
        let risk_level = RiskAssessor::risk_level(outdated.is_outdated, &vulnerabilities);

        Self {
            name: dependency.name,
            current_version: dependency.version,
            latest_version: outdated.latest_version,
            dependency_type: dependency.ecosystem,
            is_dev: dependency.is_dev,
            is_outdated: outdated.is_outdated,
            update_available: outdated.is_outdated,
            vulnerabilities,
            risk_level,
            description: outdated.description,
            homepage: outdated.homepage,
        }
    }

    pub fn is_vulnerable(&self) -> bool {
        !self.vulnerabilities.is_empty()
    }
}

/// Count of dependencies per risk level; every bucket is always present
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RiskSummary {
    pub critical: usize,
    pub high: usize,
    pub moderate: usize,
    pub low: usize,
}

impl RiskSummary {
    pub fn from_dependencies(dependencies: &[AnalyzedDependency]) -> Self {
        let mut summary = Self::default();

        for dependency in dependencies {
            match dependency.risk_level {
                Severity::Critical => summary.critical += 1,
                Severity::High => summary.high += 1,
                Severity::Moderate => summary.moderate += 1,
                Severity::Low => summary.low += 1,
            }
        }

        summary
    }

    pub fn total(&self) -> usize {
        self.critical + self.high + self.moderate + self.low
    }
}

/// Consolidated result of analyzing one repository
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalysisReport {
    pub repository: String,
    pub owner: String,
    pub analyzed_at: DateTime<Utc>,
    pub total_dependencies: usize,
    pub outdated_dependencies: usize,
    pub vulnerable_dependencies: usize,
    pub risk_summary: RiskSummary,
    pub dependencies: Vec<AnalyzedDependency>,
}

impl AnalysisReport {
    /// Build a report, deriving every count from the dependency list
    pub fn new(
        repository: impl Into<String>,
        owner: impl Into<String>,
        analyzed_at: DateTime<Utc>,
        dependencies: Vec<AnalyzedDependency>,
    ) -> Self {
        Self {
            repository: repository.into(),
            owner: owner.into(),
            analyzed_at,
            total_dependencies: dependencies.len(),
            outdated_dependencies: dependencies.iter().filter(|d| d.is_outdated).count(),
            vulnerable_dependencies: dependencies.iter().filter(|d| d.is_vulnerable()).count(),
            risk_summary: RiskSummary::from_dependencies(&dependencies),
            dependencies,
        }
    }

    /// Zero-valued report for a repository with no discoverable dependencies
    pub fn empty(
        repository: impl Into<String>,
        owner: impl Into<String>,
        analyzed_at: DateTime<Utc>,
    ) -> Self {
        Self::new(repository, owner, analyzed_at, Vec::new())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepositoryOwner {
    pub login: String,
    pub avatar_url: Option<String>,
    pub html_url: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepositoryStats {
    pub stars: u64,
    pub watchers: u64,
    pub forks: u64,
    pub open_issues: u64,
}

/// Repository metadata from the hosting service
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepositoryInfo {
    pub id: u64,
    pub name: String,
    pub full_name: String,
    pub description: Option<String>,
    pub private: bool,
    pub fork: bool,
    pub owner: RepositoryOwner,
    pub ssh_url: Option<String>,
    pub default_branch: Option<String>,
    pub stats: RepositoryStats,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
    pub pushed_at: Option<DateTime<Utc>>,
    pub topics: Vec<String>,
}

/// Repository metadata plus its language byte counts
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepositoryOverview {
    pub info: RepositoryInfo,
    pub branch: String,
    pub languages: BTreeMap<String, u64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn analyzed(name: &str, outdated: bool, severities: &[Severity]) -> AnalyzedDependency {
        let dependency = Dependency::new(name, "1.0.0", Ecosystem::Npm);
        let result = if outdated {
            OutdatedCheckResult::compared("1.0.0", "2.0.0")
        } else {
            OutdatedCheckResult::fail_closed("1.0.0")
        };
        let vulnerabilities = severities
            .iter()
            .enumerate()
            .map(|(i, severity)| VulnerabilityRecord {
                id: format!("GHSA-{}", i),
                summary: "test".to_string(),
                severity: *severity,
                published_at: None,
                patched_versions: vec![],
                references: vec![],
            })
            .collect();
        AnalyzedDependency::new(dependency, result, vulnerabilities)
    }

    #[test]
    fn test_dependency_empty_version_falls_back_to_latest() {
        let dependency = Dependency::new("flask", "  ", Ecosystem::Pip);
        assert_eq!(dependency.version, UNSPECIFIED_VERSION);
        assert_eq!(dependency.name, "flask");
    }

    #[test]
    fn test_outdated_check_result_comparison_is_exact() {
        assert!(!OutdatedCheckResult::compared("4.17.21", "4.17.21").is_outdated);
        assert!(OutdatedCheckResult::compared("1.0", "1.0.0").is_outdated);

        let failed = OutdatedCheckResult::fail_closed("1.2.3");
        assert_eq!(failed.latest_version, "1.2.3");
        assert!(!failed.is_outdated);
    }

    #[test]
    fn test_report_counts() {
        let report = AnalysisReport::new(
            "repo",
            "owner",
            Utc::now(),
            vec![
                analyzed("a", false, &[]),
                analyzed("b", true, &[]),
                analyzed("c", true, &[Severity::High, Severity::Critical]),
            ],
        );

        assert_eq!(report.total_dependencies, 3);
        assert_eq!(report.outdated_dependencies, 2);
        assert_eq!(report.vulnerable_dependencies, 1);
        assert_eq!(
            report.risk_summary,
            RiskSummary {
                critical: 1,
                high: 0,
                moderate: 1,
                low: 1
            }
        );
        assert_eq!(report.risk_summary.total(), report.total_dependencies);
    }

    #[test]
    fn test_empty_report_serializes_all_buckets() {
        let report = AnalysisReport::empty("repo", "owner", Utc::now());
        let json = serde_json::to_value(&report).unwrap();

        assert_eq!(json["total_dependencies"], 0);
        assert_eq!(json["dependencies"], serde_json::json!([]));
        for bucket in ["critical", "high", "moderate", "low"] {
            assert_eq!(json["risk_summary"][bucket], 0);
        }
    }
}
