//! npm registry client (`{base}/{name}`)

use async_trait::async_trait;
use std::time::Duration;
use tracing::{debug, instrument};

use super::{LatestVersionInfo, PackageRegistryClient, RegistryError, http_client, json_body};

pub struct NpmRegistryClient {
    client: reqwest::Client,
    base_url: String,
}

impl NpmRegistryClient {
    pub fn new(base_url: String, timeout: Duration) -> Result<Self, RegistryError> {
        Ok(Self::with_client(http_client(timeout)?, base_url))
    }

    pub fn with_client(client: reqwest::Client, base_url: String) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    /// Scoped packages (`@scope/name`) need the slash escaped
    fn package_url(&self, name: &str) -> String {
        format!("{}/{}", self.base_url, name.replace('/', "%2F"))
    }
}

#[async_trait]
impl PackageRegistryClient for NpmRegistryClient {
    #[instrument(skip(self))]
    async fn latest_version(&self, name: &str) -> Result<Option<LatestVersionInfo>, RegistryError> {
        let response = self.client.get(self.package_url(name)).send().await?;
        let json = json_body(response, name).await?;

        let version = json
            .get("dist-tags")
            .and_then(|tags| tags.get("latest"))
            .and_then(|v| v.as_str())
            .ok_or_else(|| RegistryError::Parse("missing dist-tags.latest".to_string()))?;
        debug!(package = name, latest = version, "npm lookup complete");

        Ok(Some(LatestVersionInfo {
            version: version.to_string(),
            description: json
                .get("description")
                .and_then(|v| v.as_str())
                .map(str::to_string),
            homepage: json
                .get("homepage")
                .and_then(|v| v.as_str())
                .map(str::to_string),
        }))
    }
}
