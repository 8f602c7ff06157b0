//! Application services for orchestrating business logic

use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

use super::errors::{ApplicationError, CacheError, VulnerabilityError};
use super::use_cases::{DependencyAnalyzer, ManifestFile, gather};
use crate::domain::{
    AnalysisReport, DomainError, Ecosystem, ManifestKind, RepositoryOverview, VulnerabilityRecord,
};
use crate::infrastructure::api_clients::VulnerabilityApiClient;
use crate::infrastructure::cache::CacheRepository;
use crate::infrastructure::registries::{LatestVersionInfo, PackageRegistryClient, RegistryError};
use crate::infrastructure::repository_source::{
    ParsedRepositoryUrl, RepositorySourceClient, RepositorySourceError, RepositorySourceFactory,
    parse_github_repo_url,
};

/// Service for managing caching strategies
/// Note: This trait is not dyn-compatible due to generic methods
/// Use concrete implementations instead of trait objects
#[async_trait]
pub trait CacheService: Send + Sync {
    async fn get<T>(&self, key: &str) -> Result<Option<T>, ApplicationError>
    where
        T: serde::de::DeserializeOwned + Send;

    async fn set<T>(&self, key: &str, value: &T, ttl: Duration) -> Result<(), ApplicationError>
    where
        T: serde::Serialize + Send + Sync;

    async fn invalidate(&self, key: &str) -> Result<(), ApplicationError>;
}

/// Typed access over any [`CacheRepository`] backend
pub struct CacheServiceImpl {
    cache_repository: Arc<dyn CacheRepository>,
}

impl CacheServiceImpl {
    pub fn new(cache_repository: Arc<dyn CacheRepository>) -> Self {
        Self { cache_repository }
    }

    /// Cache key for a successful registry lookup
    pub fn latest_version_key(ecosystem: Ecosystem, name: &str) -> String {
        format!("latest:{}:{}", ecosystem.canonical_name(), name)
    }

    /// Cache key for a vulnerability lookup
    pub fn vulnerabilities_key(ecosystem: Ecosystem, name: &str, version: &str) -> String {
        format!("vuln:{}:{}:{}", ecosystem.canonical_name(), name, version)
    }
}

#[async_trait]
impl CacheService for CacheServiceImpl {
    async fn get<T>(&self, key: &str) -> Result<Option<T>, ApplicationError>
    where
        T: serde::de::DeserializeOwned + Send,
    {
        let Some(value) = self.cache_repository.get(key).await? else {
            return Ok(None);
        };
        let typed = serde_json::from_value(value).map_err(CacheError::from)?;
        Ok(Some(typed))
    }

    async fn set<T>(&self, key: &str, value: &T, ttl: Duration) -> Result<(), ApplicationError>
    where
        T: serde::Serialize + Send + Sync,
    {
        let value = serde_json::to_value(value).map_err(CacheError::from)?;
        Ok(self.cache_repository.set(key, value, ttl).await?)
    }

    async fn invalidate(&self, key: &str) -> Result<(), ApplicationError> {
        Ok(self.cache_repository.invalidate(key).await?)
    }
}

/// Registry client decorator that caches successful lookups.
///
/// Failures and "no lookup" answers are never cached, so a fail-closed
/// default is not persisted past the request that produced it.
pub struct CachingRegistryClient<C: CacheService> {
    ecosystem: Ecosystem,
    inner: Arc<dyn PackageRegistryClient>,
    cache_service: Arc<C>,
    ttl: Duration,
}

impl<C: CacheService> CachingRegistryClient<C> {
    pub fn new(
        ecosystem: Ecosystem,
        inner: Arc<dyn PackageRegistryClient>,
        cache_service: Arc<C>,
        ttl: Duration,
    ) -> Self {
        Self {
            ecosystem,
            inner,
            cache_service,
            ttl,
        }
    }
}

#[async_trait]
impl<C: CacheService> PackageRegistryClient for CachingRegistryClient<C> {
    async fn latest_version(&self, name: &str) -> Result<Option<LatestVersionInfo>, RegistryError> {
        let cache_key = CacheServiceImpl::latest_version_key(self.ecosystem, name);

        match self.cache_service.get::<LatestVersionInfo>(&cache_key).await {
            Ok(Some(cached)) => {
                debug!(key = %cache_key, "Cache hit");
                return Ok(Some(cached));
            }
            Ok(None) => {}
            Err(e) => warn!(key = %cache_key, error = %e, "Cache read failed"),
        }

        let latest = self.inner.latest_version(name).await?;
        if let Some(info) = &latest {
            if let Err(e) = self.cache_service.set(&cache_key, info, self.ttl).await {
                warn!(key = %cache_key, error = %e, "Failed to cache latest version");
            }
        }
        Ok(latest)
    }
}

/// Vulnerability client decorator that caches successful queries
pub struct CachingVulnerabilityClient<C: CacheService> {
    inner: Arc<dyn VulnerabilityApiClient>,
    cache_service: Arc<C>,
    ttl: Duration,
}

impl<C: CacheService> CachingVulnerabilityClient<C> {
    pub fn new(inner: Arc<dyn VulnerabilityApiClient>, cache_service: Arc<C>, ttl: Duration) -> Self {
        Self {
            inner,
            cache_service,
            ttl,
        }
    }
}

#[async_trait]
impl<C: CacheService> VulnerabilityApiClient for CachingVulnerabilityClient<C> {
    async fn query_vulnerabilities(
        &self,
        name: &str,
        version: &str,
        ecosystem: Ecosystem,
    ) -> Result<Vec<VulnerabilityRecord>, VulnerabilityError> {
        let cache_key = CacheServiceImpl::vulnerabilities_key(ecosystem, name, version);

        match self
            .cache_service
            .get::<Vec<VulnerabilityRecord>>(&cache_key)
            .await
        {
            Ok(Some(cached)) => {
                debug!(key = %cache_key, "Cache hit");
                return Ok(cached);
            }
            Ok(None) => {}
            Err(e) => warn!(key = %cache_key, error = %e, "Cache read failed"),
        }

        let records = self
            .inner
            .query_vulnerabilities(name, version, ecosystem)
            .await?;
        if let Err(e) = self.cache_service.set(&cache_key, &records, self.ttl).await {
            warn!(key = %cache_key, error = %e, "Failed to cache vulnerabilities");
        }
        Ok(records)
    }
}

/// Input for analyzing a repository by URL
#[derive(Debug, Clone)]
pub struct RepositoryAnalysisInput {
    pub repo_url: String,
    pub include_dev_dependencies: bool,
    pub check_vulnerabilities: bool,
    /// Caller-supplied credential for the repository host
    pub token: Option<String>,
}

/// Repository-level entry points used by the HTTP layer
#[async_trait]
pub trait RepositoryAnalysisService: Send + Sync {
    /// Fetch the repository's manifests and analyze their dependencies
    async fn analyze_repository(
        &self,
        input: RepositoryAnalysisInput,
    ) -> Result<AnalysisReport, ApplicationError>;

    /// Repository metadata, the branch named by the URL, and its languages
    async fn describe_repository(
        &self,
        repo_url: &str,
        token: Option<&str>,
    ) -> Result<RepositoryOverview, ApplicationError>;
}

pub struct RepositoryAnalysisServiceImpl {
    sources: Arc<dyn RepositorySourceFactory>,
    analyzer: Arc<DependencyAnalyzer>,
    max_concurrent_fetches: usize,
}

impl RepositoryAnalysisServiceImpl {
    pub fn new(
        sources: Arc<dyn RepositorySourceFactory>,
        analyzer: Arc<DependencyAnalyzer>,
        max_concurrent_fetches: usize,
    ) -> Self {
        Self {
            sources,
            analyzer,
            max_concurrent_fetches,
        }
    }

    fn parse_url(repo_url: &str) -> Result<ParsedRepositoryUrl, ApplicationError> {
        parse_github_repo_url(repo_url).ok_or_else(|| {
            DomainError::InvalidRepositoryUrl {
                url: repo_url.trim().to_string(),
            }
            .into()
        })
    }

    /// Phase 1: fetch the manifests selected by the repository's languages.
    ///
    /// A missing file excludes its manifest. A rate limit fails the request;
    /// any other fetch error is logged and the manifest treated as missing.
    async fn fetch_manifests(
        &self,
        client: Arc<dyn RepositorySourceClient>,
        parsed: &ParsedRepositoryUrl,
        kinds: Vec<ManifestKind>,
    ) -> Result<Vec<ManifestFile>, ApplicationError> {
        let tasks: Vec<_> = kinds
            .iter()
            .map(|kind| {
                let client = client.clone();
                let owner = parsed.owner.clone();
                let repo = parsed.repo.clone();
                let reference = parsed.r#ref.clone();
                let path = parsed.file_path(kind.filename());
                async move {
                    client
                        .get_file_content(&owner, &repo, &path, reference.as_deref())
                        .await
                }
            })
            .collect();

        let mut manifests = Vec::new();
        for (kind, fetched) in kinds
            .into_iter()
            .zip(gather(tasks, self.max_concurrent_fetches).await)
        {
            match fetched {
                Some(Ok(Some(content))) => manifests.push(ManifestFile::new(kind, content)),
                Some(Ok(None)) => debug!(manifest = %kind, "Manifest not present"),
                Some(Err(e @ RepositorySourceError::RateLimited { .. })) => return Err(e.into()),
                Some(Err(e)) => {
                    warn!(manifest = %kind, error = %e, "Failed to fetch manifest, skipping it")
                }
                None => warn!(manifest = %kind, "Manifest fetch did not complete, skipping it"),
            }
        }
        Ok(manifests)
    }
}

#[async_trait]
impl RepositoryAnalysisService for RepositoryAnalysisServiceImpl {
    async fn analyze_repository(
        &self,
        input: RepositoryAnalysisInput,
    ) -> Result<AnalysisReport, ApplicationError> {
        let parsed = Self::parse_url(&input.repo_url)?;
        info!(owner = %parsed.owner, repo = %parsed.repo, "Starting repository analysis");

        let client = self.sources.client(input.token.as_deref())?;
        let (info, languages) = tokio::try_join!(
            client.get_repository(&parsed.owner, &parsed.repo),
            client.get_languages(&parsed.owner, &parsed.repo),
        )?;

        let kinds: Vec<ManifestKind> = ManifestKind::all()
            .into_iter()
            .filter(|kind| kind.is_selected_by(languages.keys().map(String::as_str)))
            .collect();
        debug!(?kinds, "Probing manifests");

        let manifests = self.fetch_manifests(client, &parsed, kinds).await?;

        Ok(self
            .analyzer
            .analyze(
                &info.name,
                &info.owner.login,
                &manifests,
                input.include_dev_dependencies,
                input.check_vulnerabilities,
            )
            .await)
    }

    async fn describe_repository(
        &self,
        repo_url: &str,
        token: Option<&str>,
    ) -> Result<RepositoryOverview, ApplicationError> {
        let parsed = Self::parse_url(repo_url)?;
        let client = self.sources.client(token)?;
        let (info, languages) = tokio::try_join!(
            client.get_repository(&parsed.owner, &parsed.repo),
            client.get_languages(&parsed.owner, &parsed.repo),
        )?;

        Ok(RepositoryOverview {
            info,
            branch: parsed.branch().to_string(),
            languages,
        })
    }
}
