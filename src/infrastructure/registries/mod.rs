/*
 Infrastructure: Package Registry Clients

 Each ecosystem gets at most one client answering "what is the latest
 published version of this package?". Clients report failures as
 `RegistryError`; the provided `check_outdated` turns any failure into the
 fail-closed result so that callers never see an error.

 Ecosystems without a public lookup use `StubRegistryClient`, which always
 reports not-outdated.
*/

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tracing::warn;

use crate::config::RegistriesConfig;
use crate::domain::{Ecosystem, OutdatedCheckResult};

pub mod npm;
pub mod pypi;
pub mod stub;

pub use npm::NpmRegistryClient;
pub use pypi::PyPiRegistryClient;
pub use stub::StubRegistryClient;

/// Latest published version of a package plus descriptive metadata
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LatestVersionInfo {
    pub version: String,
    pub description: Option<String>,
    pub homepage: Option<String>,
}

impl LatestVersionInfo {
    pub fn new(version: impl Into<String>) -> Self {
        Self {
            version: version.into(),
            description: None,
            homepage: None,
        }
    }
}

/// Error type for registry operations.
#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    /// Non-success HTTP status.
    #[error("registry HTTP error: {message}, status={status}")]
    Http { message: String, status: u16 },

    /// Package not found (or deleted).
    #[error("package not found: {0}")]
    NotFound(String),

    /// Connection failure, timeout or undecodable body.
    #[error("registry network error: {0}")]
    Network(#[from] reqwest::Error),

    /// The response did not have the expected shape.
    #[error("registry parse error: {0}")]
    Parse(String),
}

/// Trait for asking a package registry about the latest version of a package.
#[async_trait]
pub trait PackageRegistryClient: Send + Sync {
    /// Look up the latest version of a package.
    ///
    /// `Ok(None)` means this client performs no lookup for its ecosystem.
    async fn latest_version(&self, name: &str) -> Result<Option<LatestVersionInfo>, RegistryError>;

    /// Compare the declared version against the registry.
    ///
    /// Never fails: any lookup error yields [`OutdatedCheckResult::fail_closed`].
    async fn check_outdated(&self, name: &str, current_version: &str) -> OutdatedCheckResult {
        match self.latest_version(name).await {
            Ok(Some(latest)) => OutdatedCheckResult {
                description: latest.description,
                homepage: latest.homepage,
                ..OutdatedCheckResult::compared(current_version, &latest.version)
            },
            Ok(None) => OutdatedCheckResult::fail_closed(current_version),
            Err(e) => {
                warn!(
                    package = name,
                    error = %e,
                    "Registry lookup failed, treating package as up to date"
                );
                OutdatedCheckResult::fail_closed(current_version)
            }
        }
    }
}

/// Build the HTTP client shared by the registry clients of one table
pub(crate) fn http_client(timeout: Duration) -> Result<reqwest::Client, RegistryError> {
    Ok(reqwest::Client::builder()
        .timeout(timeout)
        .user_agent(concat!("depsight/", env!("CARGO_PKG_VERSION")))
        .build()?)
}

/// Map a registry response to JSON, classifying failures
pub(crate) async fn json_body(
    response: reqwest::Response,
    name: &str,
) -> Result<serde_json::Value, RegistryError> {
    let status = response.status();
    if status == reqwest::StatusCode::NOT_FOUND {
        return Err(RegistryError::NotFound(name.to_string()));
    }
    if !status.is_success() {
        return Err(RegistryError::Http {
            message: format!("status {}", status),
            status: status.as_u16(),
        });
    }

    Ok(response.json().await?)
}

/// The registered outdated-check client per ecosystem.
///
/// An ecosystem with an empty slot has no registered client; dependencies of
/// that ecosystem are left out of the outdated check and of the report.
#[derive(Clone, Default)]
pub struct RegistryTable {
    npm: Option<Arc<dyn PackageRegistryClient>>,
    pip: Option<Arc<dyn PackageRegistryClient>>,
    maven: Option<Arc<dyn PackageRegistryClient>>,
    gradle: Option<Arc<dyn PackageRegistryClient>>,
    composer: Option<Arc<dyn PackageRegistryClient>>,
    nuget: Option<Arc<dyn PackageRegistryClient>>,
    go: Option<Arc<dyn PackageRegistryClient>>,
    cargo: Option<Arc<dyn PackageRegistryClient>>,
    gem: Option<Arc<dyn PackageRegistryClient>>,
}

impl RegistryTable {
    /// A table with no registered clients
    pub fn new() -> Self {
        Self::default()
    }

    /// npm and PyPI lookups; stubs for go, maven, cargo, composer and gem
    pub fn standard(config: &RegistriesConfig) -> Result<Self, RegistryError> {
        let client = http_client(Duration::from_secs(config.timeout_seconds))?;

        Ok(Self::new()
            .register(
                Ecosystem::Npm,
                Arc::new(NpmRegistryClient::with_client(
                    client.clone(),
                    config.npm_base_url.clone(),
                )),
            )
            .register(
                Ecosystem::Pip,
                Arc::new(PyPiRegistryClient::with_client(
                    client,
                    config.pypi_base_url.clone(),
                )),
            )
            .register(Ecosystem::Go, Arc::new(StubRegistryClient))
            .register(Ecosystem::Maven, Arc::new(StubRegistryClient))
            .register(Ecosystem::Cargo, Arc::new(StubRegistryClient))
            .register(Ecosystem::Composer, Arc::new(StubRegistryClient))
            .register(Ecosystem::Gem, Arc::new(StubRegistryClient)))
    }

    /// Register (or replace) the client for an ecosystem
    pub fn register(mut self, ecosystem: Ecosystem, client: Arc<dyn PackageRegistryClient>) -> Self {
        *self.slot_mut(ecosystem) = Some(client);
        self
    }

    /// Wrap every registered client, e.g. with a caching decorator
    pub fn map_clients<F>(mut self, wrap: F) -> Self
    where
        F: Fn(Ecosystem, Arc<dyn PackageRegistryClient>) -> Arc<dyn PackageRegistryClient>,
    {
        for ecosystem in Ecosystem::all() {
            let slot = self.slot_mut(ecosystem);
            if let Some(client) = slot.take() {
                *slot = Some(wrap(ecosystem, client));
            }
        }
        self
    }

    pub fn client_for(&self, ecosystem: Ecosystem) -> Option<Arc<dyn PackageRegistryClient>> {
        let slot = match ecosystem {
            Ecosystem::Npm => &self.npm,
            Ecosystem::Pip => &self.pip,
            Ecosystem::Maven => &self.maven,
            Ecosystem::Gradle => &self.gradle,
            Ecosystem::Composer => &self.composer,
            Ecosystem::NuGet => &self.nuget,
            Ecosystem::Go => &self.go,
            Ecosystem::Cargo => &self.cargo,
            Ecosystem::Gem => &self.gem,
        };
        slot.clone()
    }

    pub fn is_registered(&self, ecosystem: Ecosystem) -> bool {
        self.client_for(ecosystem).is_some()
    }

    fn slot_mut(&mut self, ecosystem: Ecosystem) -> &mut Option<Arc<dyn PackageRegistryClient>> {
        match ecosystem {
            Ecosystem::Npm => &mut self.npm,
            Ecosystem::Pip => &mut self.pip,
            Ecosystem::Maven => &mut self.maven,
            Ecosystem::Gradle => &mut self.gradle,
            Ecosystem::Composer => &mut self.composer,
            Ecosystem::NuGet => &mut self.nuget,
            Ecosystem::Go => &mut self.go,
            Ecosystem::Cargo => &mut self.cargo,
            Ecosystem::Gem => &mut self.gem,
        }
    }
}
