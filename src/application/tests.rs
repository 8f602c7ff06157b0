// Dependency analysis and repository analysis service tests
use async_trait::async_trait;
use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use super::{
    ApiError, ApplicationError, CacheServiceImpl, CachingRegistryClient,
    CachingVulnerabilityClient, DependencyAnalyzer, ManifestFile, RepositoryAnalysisInput,
    RepositoryAnalysisService, RepositoryAnalysisServiceImpl, VulnerabilityError,
};
use crate::domain::{
    AnalysisReport, Dependency, DomainError, Ecosystem, ManifestKind, RepositoryInfo,
    RepositoryOwner, Severity, VulnerabilityRecord,
};
use crate::infrastructure::api_clients::VulnerabilityApiClient;
use crate::infrastructure::cache::MemoryCacheRepository;
use crate::infrastructure::registries::{
    LatestVersionInfo, PackageRegistryClient, RegistryError, RegistryTable, StubRegistryClient,
};
use crate::infrastructure::repository_source::{
    RepositorySourceClient, RepositorySourceError, RepositorySourceFactory,
    RepositorySourceResult,
};

#[derive(Default)]
struct MockRegistry {
    latest: HashMap<&'static str, &'static str>,
    delays_ms: HashMap<&'static str, u64>,
    panic_on: Option<&'static str>,
    calls: AtomicUsize,
}

impl MockRegistry {
    fn with_latest(latest: &[(&'static str, &'static str)]) -> Self {
        Self {
            latest: latest.iter().copied().collect(),
            ..Self::default()
        }
    }
}

#[async_trait]
impl PackageRegistryClient for MockRegistry {
    async fn latest_version(&self, name: &str) -> Result<Option<LatestVersionInfo>, RegistryError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.delays_ms.get(name) {
            tokio::time::sleep(Duration::from_millis(*delay)).await;
        }
        if self.panic_on == Some(name) {
            panic!("registry client bug");
        }
        match self.latest.get(name) {
            Some(version) => Ok(Some(LatestVersionInfo::new(*version))),
            None => Err(RegistryError::NotFound(name.to_string())),
        }
    }
}

#[derive(Default)]
struct MockVulnerabilities {
    records: HashMap<&'static str, Vec<VulnerabilityRecord>>,
    failing: Vec<&'static str>,
    calls: AtomicUsize,
}

#[async_trait]
impl VulnerabilityApiClient for MockVulnerabilities {
    async fn query_vulnerabilities(
        &self,
        name: &str,
        _version: &str,
        _ecosystem: Ecosystem,
    ) -> Result<Vec<VulnerabilityRecord>, VulnerabilityError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.failing.iter().any(|f| *f == name) {
            return Err(ApiError::Http {
                status: 503,
                message: "unavailable".to_string(),
            }
            .into());
        }
        Ok(self.records.get(name).cloned().unwrap_or_default())
    }
}

fn vulnerability(id: &str, severity: Severity) -> VulnerabilityRecord {
    VulnerabilityRecord {
        id: id.to_string(),
        summary: format!("{} summary", id),
        severity,
        published_at: None,
        patched_versions: vec!["9.9.9".to_string()],
        references: vec![],
    }
}

fn analyzer(
    registry: Arc<MockRegistry>,
    vulnerabilities: Arc<MockVulnerabilities>,
) -> DependencyAnalyzer {
    let registries = RegistryTable::new()
        .register(Ecosystem::Npm, registry.clone())
        .register(Ecosystem::Pip, registry)
        .register(Ecosystem::Gem, Arc::new(StubRegistryClient));
    DependencyAnalyzer::new(registries, vulnerabilities, 4)
}

fn lodash_manifest() -> ManifestFile {
    ManifestFile::new(
        ManifestKind::PackageJson,
        r#"{"dependencies":{"lodash":"^4.17.21"}}"#,
    )
}

#[tokio::test]
async fn up_to_date_dependency_is_low_risk() {
    let registry = Arc::new(MockRegistry::with_latest(&[("lodash", "4.17.21")]));
    let vulns = Arc::new(MockVulnerabilities::default());

    let report = analyzer(registry, vulns.clone())
        .analyze("app", "acme", &[lodash_manifest()], false, true)
        .await;

    assert_eq!(report.total_dependencies, 1);
    let lodash = &report.dependencies[0];
    assert_eq!(lodash.name, "lodash");
    assert_eq!(lodash.current_version, "4.17.21");
    assert!(!lodash.is_outdated);
    assert_eq!(lodash.risk_level, Severity::Low);
    assert_eq!(vulns.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn outdated_dependency_risk_follows_vulnerabilities() {
    let registry = Arc::new(MockRegistry::with_latest(&[("lodash", "4.17.22")]));
    let report = analyzer(registry.clone(), Arc::new(MockVulnerabilities::default()))
        .analyze("app", "acme", &[lodash_manifest()], false, true)
        .await;
    assert!(report.dependencies[0].is_outdated);
    assert!(report.dependencies[0].update_available);
    assert_eq!(report.dependencies[0].latest_version, "4.17.22");
    assert_eq!(report.dependencies[0].risk_level, Severity::Moderate);
    assert_eq!(report.vulnerable_dependencies, 0);

    let vulns = Arc::new(MockVulnerabilities {
        records: HashMap::from([(
            "lodash",
            vec![
                vulnerability("GHSA-low", Severity::Low),
                vulnerability("GHSA-crit", Severity::Critical),
            ],
        )]),
        ..MockVulnerabilities::default()
    });
    let report = analyzer(registry, vulns)
        .analyze("app", "acme", &[lodash_manifest()], false, true)
        .await;
    assert_eq!(report.dependencies[0].risk_level, Severity::Critical);
    assert_eq!(report.vulnerable_dependencies, 1);
    assert_eq!(report.risk_summary.critical, 1);
}

#[tokio::test]
async fn failed_and_panicking_lookups_fail_closed() {
    let registry = Arc::new(MockRegistry {
        latest: HashMap::from([("react", "18.3.1")]),
        panic_on: Some("express"),
        ..MockRegistry::default()
    });
    let vulns = Arc::new(MockVulnerabilities::default());
    let dependencies = vec![
        Dependency::new("left-pad", "1.0.0", Ecosystem::Npm),
        Dependency::new("express", "4.18.0", Ecosystem::Npm),
        Dependency::new("react", "18.2.0", Ecosystem::Npm),
    ];

    let report = analyzer(registry.clone(), vulns.clone())
        .analyze_dependencies("app", "acme", dependencies, true)
        .await;

    assert_eq!(registry.calls.load(Ordering::SeqCst), 3);
    assert_eq!(report.total_dependencies, 3);

    for failed in &report.dependencies[..2] {
        assert!(!failed.is_outdated);
        assert_eq!(failed.latest_version, failed.current_version);
        assert_eq!(failed.risk_level, Severity::Low);
    }
    assert!(report.dependencies[2].is_outdated);
    // only the outdated one reaches the vulnerability database
    assert_eq!(vulns.calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn failing_vulnerability_lookup_yields_no_records() {
    let registry = Arc::new(MockRegistry::with_latest(&[("lodash", "4.17.22")]));
    let vulns = Arc::new(MockVulnerabilities {
        failing: vec!["lodash"],
        ..MockVulnerabilities::default()
    });

    let report = analyzer(registry, vulns.clone())
        .analyze("app", "acme", &[lodash_manifest()], false, true)
        .await;

    assert_eq!(vulns.calls.load(Ordering::SeqCst), 1);
    assert!(report.dependencies[0].vulnerabilities.is_empty());
    assert_eq!(report.dependencies[0].risk_level, Severity::Moderate);
}

#[tokio::test]
async fn vulnerability_checks_can_be_disabled() {
    let registry = Arc::new(MockRegistry::with_latest(&[("lodash", "4.17.22")]));
    let vulns = Arc::new(MockVulnerabilities::default());

    let report = analyzer(registry, vulns.clone())
        .analyze("app", "acme", &[lodash_manifest()], false, false)
        .await;

    assert!(report.dependencies[0].is_outdated);
    assert_eq!(vulns.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn empty_input_makes_no_lookups() {
    let registry = Arc::new(MockRegistry::default());
    let vulns = Arc::new(MockVulnerabilities::default());
    let manifests = vec![
        ManifestFile::new(ManifestKind::PackageJson, "{ not json"),
        ManifestFile::new(ManifestKind::RequirementsTxt, "# only comments\n\n"),
    ];

    let report = analyzer(registry.clone(), vulns.clone())
        .analyze("app", "acme", &manifests, true, true)
        .await;

    assert_eq!(report.total_dependencies, 0);
    assert_eq!(report.outdated_dependencies, 0);
    assert_eq!(report.vulnerable_dependencies, 0);
    assert_eq!(report.risk_summary.total(), 0);
    assert!(report.dependencies.is_empty());
    assert_eq!(registry.calls.load(Ordering::SeqCst), 0);
    assert_eq!(vulns.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn results_keep_discovery_order_and_drop_unregistered_ecosystems() {
    let registry = Arc::new(MockRegistry {
        latest: HashMap::from([("slow", "2.0.0"), ("fast", "1.0.0"), ("flask", "3.0.0")]),
        delays_ms: HashMap::from([("slow", 50)]),
        ..MockRegistry::default()
    });
    let dependencies = vec![
        Dependency::new("slow", "1.0.0", Ecosystem::Npm),
        Dependency::new("Newtonsoft.Json", "13.0.1", Ecosystem::NuGet),
        Dependency::new("fast", "1.0.0", Ecosystem::Npm),
        Dependency::new("flask", "3.0.0", Ecosystem::Pip),
    ];

    let report = analyzer(registry, Arc::new(MockVulnerabilities::default()))
        .analyze_dependencies("app", "acme", dependencies, false)
        .await;

    let names: Vec<&str> = report.dependencies.iter().map(|d| d.name.as_str()).collect();
    assert_eq!(names, vec!["slow", "fast", "flask"]);
    assert_eq!(report.dependencies[0].latest_version, "2.0.0");
    assert_eq!(report.dependencies[1].latest_version, "1.0.0");
    assert_eq!(report.outdated_dependencies, 1);
    assert_eq!(report.risk_summary.total(), report.total_dependencies);
}

#[test]
fn manifests_are_grouped_in_enumeration_order() {
    let manifests = vec![
        ManifestFile::new(ManifestKind::Gemfile, "gem \"rails\", \"7.1.0\"\n"),
        ManifestFile::new(ManifestKind::RequirementsTxt, "django==4.2.0\n"),
        ManifestFile::new(
            ManifestKind::PackageJson,
            r#"{"dependencies":{"react":"18.2.0","axios":"~1.6.0"},"devDependencies":{"jest":"^29.0.0"}}"#,
        ),
    ];

    let dependencies = DependencyAnalyzer::parse_manifests(&manifests, true);
    let names: Vec<&str> = dependencies.iter().map(|d| d.name.as_str()).collect();
    assert_eq!(names, vec!["react", "axios", "jest", "django", "rails"]);
    assert!(dependencies[2].is_dev);

    let without_dev = DependencyAnalyzer::parse_manifests(&manifests, false);
    assert_eq!(without_dev.len(), 4);
}

#[tokio::test]
async fn identical_inputs_give_identical_reports() {
    let registry = Arc::new(MockRegistry::with_latest(&[("lodash", "4.17.22")]));
    let vulns = Arc::new(MockVulnerabilities {
        records: HashMap::from([("lodash", vec![vulnerability("GHSA-1", Severity::High)])]),
        ..MockVulnerabilities::default()
    });
    let analyzer = analyzer(registry, vulns);

    let mut first = analyzer
        .analyze("app", "acme", &[lodash_manifest()], false, true)
        .await;
    let second = analyzer
        .analyze("app", "acme", &[lodash_manifest()], false, true)
        .await;
    first.analyzed_at = second.analyzed_at;

    assert_eq!(
        serde_json::to_string(&first).unwrap(),
        serde_json::to_string(&second).unwrap()
    );
}

#[tokio::test]
async fn caching_registry_client_caches_successes_only() {
    let cache = Arc::new(CacheServiceImpl::new(Arc::new(MemoryCacheRepository::new(
        1_000,
        Duration::from_secs(3600),
    ))));
    let inner = Arc::new(MockRegistry::with_latest(&[("lodash", "4.17.22")]));
    let client = CachingRegistryClient::new(
        Ecosystem::Npm,
        inner.clone(),
        cache,
        Duration::from_secs(60),
    );

    assert!(client.check_outdated("lodash", "4.17.21").await.is_outdated);
    assert!(client.check_outdated("lodash", "4.17.21").await.is_outdated);
    assert_eq!(inner.calls.load(Ordering::SeqCst), 1);

    client.check_outdated("missing", "1.0.0").await;
    client.check_outdated("missing", "1.0.0").await;
    assert_eq!(inner.calls.load(Ordering::SeqCst), 3);
}

#[tokio::test]
async fn caching_vulnerability_client_caches_successes_only() {
    let cache = Arc::new(CacheServiceImpl::new(Arc::new(MemoryCacheRepository::new(
        1_000,
        Duration::from_secs(3600),
    ))));
    let inner = Arc::new(MockVulnerabilities {
        records: HashMap::from([("django", vec![vulnerability("PYSEC-1", Severity::Moderate)])]),
        failing: vec!["flask"],
        ..MockVulnerabilities::default()
    });
    let client = CachingVulnerabilityClient::new(inner.clone(), cache, Duration::from_secs(60));

    for _ in 0..2 {
        let records = client
            .check_vulnerabilities("django", "3.2.0", Ecosystem::Pip)
            .await;
        assert_eq!(records.len(), 1);
    }
    assert_eq!(inner.calls.load(Ordering::SeqCst), 1);

    for _ in 0..2 {
        assert!(client
            .check_vulnerabilities("flask", "2.0.0", Ecosystem::Pip)
            .await
            .is_empty());
    }
    assert_eq!(inner.calls.load(Ordering::SeqCst), 3);
}

// Repository source mocks

#[derive(Default)]
struct MockSource {
    languages: BTreeMap<String, u64>,
    files: HashMap<String, String>,
    failing_files: HashMap<String, fn() -> RepositorySourceError>,
    fetched: Mutex<Vec<(String, Option<String>)>>,
    metadata_calls: AtomicUsize,
}

impl MockSource {
    fn new(languages: &[&str]) -> Self {
        Self {
            languages: languages
                .iter()
                .map(|l| (l.to_string(), 1000))
                .collect(),
            ..Self::default()
        }
    }

    fn with_file(mut self, path: &str, content: &str) -> Self {
        self.files.insert(path.to_string(), content.to_string());
        self
    }

    fn fetched_paths(&self) -> Vec<String> {
        let mut paths: Vec<String> = self
            .fetched
            .lock()
            .unwrap()
            .iter()
            .map(|(path, _)| path.clone())
            .collect();
        paths.sort();
        paths
    }
}

#[async_trait]
impl RepositorySourceClient for MockSource {
    async fn get_repository(&self, owner: &str, repo: &str) -> RepositorySourceResult<RepositoryInfo> {
        self.metadata_calls.fetch_add(1, Ordering::SeqCst);
        Ok(RepositoryInfo {
            id: 1,
            name: repo.to_string(),
            full_name: format!("{}/{}", owner, repo),
            owner: RepositoryOwner {
                login: owner.to_string(),
                ..RepositoryOwner::default()
            },
            ..RepositoryInfo::default()
        })
    }

    async fn get_languages(
        &self,
        _owner: &str,
        _repo: &str,
    ) -> RepositorySourceResult<BTreeMap<String, u64>> {
        self.metadata_calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.languages.clone())
    }

    async fn get_file_content(
        &self,
        _owner: &str,
        _repo: &str,
        path: &str,
        r#ref: Option<&str>,
    ) -> RepositorySourceResult<Option<String>> {
        self.fetched
            .lock()
            .unwrap()
            .push((path.to_string(), r#ref.map(str::to_string)));
        if let Some(make_error) = self.failing_files.get(path) {
            return Err(make_error());
        }
        Ok(self.files.get(path).cloned())
    }
}

struct MockFactory {
    source: Arc<MockSource>,
    tokens: Mutex<Vec<Option<String>>>,
}

impl MockFactory {
    fn new(source: Arc<MockSource>) -> Self {
        Self {
            source,
            tokens: Mutex::new(Vec::new()),
        }
    }
}

impl RepositorySourceFactory for MockFactory {
    fn client(&self, token: Option<&str>) -> RepositorySourceResult<Arc<dyn RepositorySourceClient>> {
        self.tokens.lock().unwrap().push(token.map(str::to_string));
        Ok(self.source.clone())
    }
}

fn service(factory: Arc<MockFactory>, registry: Arc<MockRegistry>) -> RepositoryAnalysisServiceImpl {
    let analyzer = Arc::new(analyzer(registry, Arc::new(MockVulnerabilities::default())));
    RepositoryAnalysisServiceImpl::new(factory, analyzer, 4)
}

fn input(repo_url: &str) -> RepositoryAnalysisInput {
    RepositoryAnalysisInput {
        repo_url: repo_url.to_string(),
        include_dev_dependencies: false,
        check_vulnerabilities: true,
        token: None,
    }
}

#[tokio::test]
async fn repository_analysis_probes_manifests_by_language() {
    let source = Arc::new(
        MockSource::new(&["TypeScript", "Ruby", "Shell"])
            .with_file("package.json", r#"{"dependencies":{"lodash":"4.17.21"}}"#),
    );
    let factory = Arc::new(MockFactory::new(source.clone()));
    let registry = Arc::new(MockRegistry::with_latest(&[("lodash", "4.17.21")]));

    let report: AnalysisReport = service(factory, registry)
        .analyze_repository(input("https://github.com/acme/shop"))
        .await
        .unwrap();

    assert_eq!(source.fetched_paths(), vec!["Gemfile", "package.json"]);
    assert!(source.fetched.lock().unwrap().iter().all(|(_, r)| r.is_none()));
    assert_eq!(report.repository, "shop");
    assert_eq!(report.owner, "acme");
    assert_eq!(report.total_dependencies, 1);
    assert_eq!(report.dependencies[0].dependency_type, Ecosystem::Npm);
}

#[tokio::test]
async fn repository_analysis_honors_branch_and_path() {
    let source = Arc::new(
        MockSource::new(&["Python"]).with_file("services/api/requirements.txt", "flask==2.0.0\n"),
    );
    let factory = Arc::new(MockFactory::new(source.clone()));
    let registry = Arc::new(MockRegistry::with_latest(&[("flask", "3.0.0")]));

    let mut request = input("https://github.com/acme/shop/tree/release/services/api");
    request.token = Some("ghp_caller".to_string());
    let report = service(factory.clone(), registry)
        .analyze_repository(request)
        .await
        .unwrap();

    let fetched = source.fetched.lock().unwrap().clone();
    assert_eq!(
        fetched,
        vec![(
            "services/api/requirements.txt".to_string(),
            Some("release".to_string())
        )]
    );
    assert_eq!(
        factory.tokens.lock().unwrap().clone(),
        vec![Some("ghp_caller".to_string())]
    );
    assert_eq!(report.outdated_dependencies, 1);
}

#[tokio::test]
async fn repository_analysis_skips_failed_fetches_but_not_rate_limits() {
    let mut source = MockSource::new(&["JavaScript", "Go"])
        .with_file("package.json", r#"{"dependencies":{"lodash":"4.17.21"}}"#);
    source.failing_files.insert("go.mod".to_string(), || {
        RepositorySourceError::Network("connection reset".to_string())
    });
    let source = Arc::new(source);
    let registry = Arc::new(MockRegistry::with_latest(&[("lodash", "4.17.21")]));

    let report = service(Arc::new(MockFactory::new(source)), registry.clone())
        .analyze_repository(input("github:acme/shop"))
        .await
        .unwrap();
    assert_eq!(report.total_dependencies, 1);

    let mut limited = MockSource::new(&["Go"]);
    limited.failing_files.insert("go.mod".to_string(), || {
        RepositorySourceError::RateLimited {
            retry_after: None,
            message: "API rate limit exceeded".to_string(),
        }
    });
    let err = service(Arc::new(MockFactory::new(Arc::new(limited))), registry)
        .analyze_repository(input("github:acme/shop"))
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        ApplicationError::RepositorySource(RepositorySourceError::RateLimited { .. })
    ));
}

#[tokio::test]
async fn repository_without_manifests_reports_zero() {
    let source = Arc::new(MockSource::new(&["JavaScript", "Python"]));
    let registry = Arc::new(MockRegistry::default());

    let report = service(Arc::new(MockFactory::new(source)), registry.clone())
        .analyze_repository(input("git@github.com:acme/empty.git"))
        .await
        .unwrap();

    assert_eq!(report.total_dependencies, 0);
    assert_eq!(report.repository, "empty");
    assert_eq!(registry.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn invalid_url_is_rejected_before_any_call() {
    let source = Arc::new(MockSource::new(&["JavaScript"]));
    let factory = Arc::new(MockFactory::new(source.clone()));

    let err = service(factory.clone(), Arc::new(MockRegistry::default()))
        .analyze_repository(input("https://gitlab.com/acme/shop"))
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        ApplicationError::Domain(DomainError::InvalidRepositoryUrl { .. })
    ));
    assert!(factory.tokens.lock().unwrap().is_empty());
    assert_eq!(source.metadata_calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn describe_repository_reports_branch_and_languages() {
    let source = Arc::new(MockSource::new(&["Rust", "Shell"]));
    let svc = service(
        Arc::new(MockFactory::new(source)),
        Arc::new(MockRegistry::default()),
    );

    let overview = svc
        .describe_repository("https://github.com/acme/engine", None)
        .await
        .unwrap();
    assert_eq!(overview.info.full_name, "acme/engine");
    assert_eq!(overview.branch, "main");
    assert_eq!(overview.languages.len(), 2);

    let overview = svc
        .describe_repository("github:acme/engine#v2", None)
        .await
        .unwrap();
    assert_eq!(overview.branch, "v2");
}
