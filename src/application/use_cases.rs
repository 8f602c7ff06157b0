//! Dependency analysis workflow: parse manifests, check every dependency
//! against its registry, check outdated ones for vulnerabilities, and reduce
//! the results into an [`AnalysisReport`].
//!
//! Lookups fan out on a [`JoinSet`] bounded by a semaphore. Each task carries
//! its index so results are matched back positionally regardless of
//! completion order. A task that panics is treated like a failed lookup.

use chrono::Utc;
use std::future::Future;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{debug, info, warn};

use crate::domain::{
    AnalysisReport, AnalyzedDependency, Dependency, ManifestKind, OutdatedCheckResult,
    VulnerabilityRecord,
};
use crate::infrastructure::api_clients::VulnerabilityApiClient;
use crate::infrastructure::parsers::ParserFactory;
use crate::infrastructure::registries::{PackageRegistryClient, RegistryTable};

/// Raw content of one manifest fetched from a repository
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManifestFile {
    pub kind: ManifestKind,
    pub content: String,
}

impl ManifestFile {
    pub fn new(kind: ManifestKind, content: impl Into<String>) -> Self {
        Self {
            kind,
            content: content.into(),
        }
    }
}

/// Run every future concurrently, at most `limit` at a time.
///
/// Slot `i` of the result holds the output of future `i`, or `None` if that
/// task panicked.
pub(crate) async fn gather<T, Fut>(tasks: Vec<Fut>, limit: usize) -> Vec<Option<T>>
where
    T: Send + 'static,
    Fut: Future<Output = T> + Send + 'static,
{
    let count = tasks.len();
    let semaphore = Arc::new(Semaphore::new(limit.max(1)));
    let mut join_set = JoinSet::new();

    for (idx, task) in tasks.into_iter().enumerate() {
        let semaphore = semaphore.clone();
        join_set.spawn(async move {
            // the semaphore is never closed, so acquiring only waits
            let _permit = semaphore.acquire_owned().await.ok();
            (idx, task.await)
        });
    }

    let mut results: Vec<Option<T>> = std::iter::repeat_with(|| None).take(count).collect();
    while let Some(joined) = join_set.join_next().await {
        match joined {
            Ok((idx, value)) => results[idx] = Some(value),
            Err(e) => warn!(error = %e, "Lookup task did not complete"),
        }
    }
    results
}

/// Aggregation engine for one analysis request at a time.
///
/// Holds no per-request state; a single instance is shared by all requests.
pub struct DependencyAnalyzer {
    registries: RegistryTable,
    vulnerability_client: Arc<dyn VulnerabilityApiClient>,
    max_concurrent_lookups: usize,
}

impl DependencyAnalyzer {
    pub fn new(
        registries: RegistryTable,
        vulnerability_client: Arc<dyn VulnerabilityApiClient>,
        max_concurrent_lookups: usize,
    ) -> Self {
        Self {
            registries,
            vulnerability_client,
            max_concurrent_lookups: max_concurrent_lookups.max(1),
        }
    }

    /// Parse every manifest and concatenate the results, grouped in
    /// [`ManifestKind::all`] order and in declaration order within a file.
    pub fn parse_manifests(manifests: &[ManifestFile], include_dev: bool) -> Vec<Dependency> {
        let mut ordered: Vec<&ManifestFile> = manifests.iter().collect();
        ordered.sort_by_key(|m| ManifestKind::all().iter().position(|k| *k == m.kind));

        ordered
            .into_iter()
            .flat_map(|manifest| {
                let dependencies =
                    ParserFactory::parser_for(manifest.kind).parse(&manifest.content, include_dev);
                debug!(
                    manifest = %manifest.kind,
                    count = dependencies.len(),
                    "Parsed manifest"
                );
                dependencies
            })
            .collect()
    }

    /// Analyze raw manifests (phases 2 to 6)
    pub async fn analyze(
        &self,
        repository: &str,
        owner: &str,
        manifests: &[ManifestFile],
        include_dev: bool,
        check_vulnerabilities: bool,
    ) -> AnalysisReport {
        let dependencies = Self::parse_manifests(manifests, include_dev);
        self.analyze_dependencies(repository, owner, dependencies, check_vulnerabilities)
            .await
    }

    /// Analyze already-parsed dependencies (phases 3 to 6)
    pub async fn analyze_dependencies(
        &self,
        repository: &str,
        owner: &str,
        dependencies: Vec<Dependency>,
        check_vulnerabilities: bool,
    ) -> AnalysisReport {
        if dependencies.is_empty() {
            info!(repository, "No dependencies found, skipping lookups");
            return AnalysisReport::empty(repository, owner, Utc::now());
        }

        // Dependencies of ecosystems without a registered client are dropped
        let total_parsed = dependencies.len();
        let checked: Vec<(Dependency, Arc<dyn PackageRegistryClient>)> = dependencies
            .into_iter()
            .filter_map(|dependency| {
                let client = self.registries.client_for(dependency.ecosystem)?;
                Some((dependency, client))
            })
            .collect();
        if checked.len() < total_parsed {
            debug!(
                dropped = total_parsed - checked.len(),
                "Dropped dependencies without a registry client"
            );
        }

        let outdated = self.check_outdated(&checked).await;
        let vulnerabilities = if check_vulnerabilities {
            self.check_vulnerabilities(&checked, &outdated).await
        } else {
            vec![Vec::new(); checked.len()]
        };

        let analyzed: Vec<AnalyzedDependency> = checked
            .into_iter()
            .zip(outdated)
            .zip(vulnerabilities)
            .map(|(((dependency, _), outdated), vulnerabilities)| {
                AnalyzedDependency::new(dependency, outdated, vulnerabilities)
            })
            .collect();

        let report = AnalysisReport::new(repository, owner, Utc::now(), analyzed);
        info!(
            repository,
            total = report.total_dependencies,
            outdated = report.outdated_dependencies,
            vulnerable = report.vulnerable_dependencies,
            "Dependency analysis complete"
        );
        report
    }

    async fn check_outdated(
        &self,
        checked: &[(Dependency, Arc<dyn PackageRegistryClient>)],
    ) -> Vec<OutdatedCheckResult> {
        let tasks: Vec<_> = checked
            .iter()
            .map(|(dependency, client)| {
                let client = client.clone();
                let name = dependency.name.clone();
                let version = dependency.version.clone();
                async move { client.check_outdated(&name, &version).await }
            })
            .collect();

        gather(tasks, self.max_concurrent_lookups)
            .await
            .into_iter()
            .zip(checked)
            .map(|(result, (dependency, _))| {
                result.unwrap_or_else(|| OutdatedCheckResult::fail_closed(&dependency.version))
            })
            .collect()
    }

    /// Query vulnerabilities for the outdated dependencies only
    async fn check_vulnerabilities(
        &self,
        checked: &[(Dependency, Arc<dyn PackageRegistryClient>)],
        outdated: &[OutdatedCheckResult],
    ) -> Vec<Vec<VulnerabilityRecord>> {
        let targets: Vec<usize> = outdated
            .iter()
            .enumerate()
            .filter(|(_, result)| result.is_outdated)
            .map(|(idx, _)| idx)
            .collect();

        let tasks: Vec<_> = targets
            .iter()
            .map(|&idx| {
                let client = self.vulnerability_client.clone();
                let dependency = checked[idx].0.clone();
                async move {
                    client
                        .check_vulnerabilities(
                            &dependency.name,
                            &dependency.version,
                            dependency.ecosystem,
                        )
                        .await
                }
            })
            .collect();

        let mut vulnerabilities = vec![Vec::new(); checked.len()];
        for (idx, records) in targets
            .into_iter()
            .zip(gather(tasks, self.max_concurrent_lookups).await)
        {
            vulnerabilities[idx] = records.unwrap_or_default();
        }
        vulnerabilities
    }
}
