//! PyPI registry client (`{base}/pypi/{name}/json`)

use async_trait::async_trait;
use std::time::Duration;
use tracing::{debug, instrument};

use super::{LatestVersionInfo, PackageRegistryClient, RegistryError, http_client, json_body};

pub struct PyPiRegistryClient {
    client: reqwest::Client,
    base_url: String,
}

impl PyPiRegistryClient {
    pub fn new(base_url: String, timeout: Duration) -> Result<Self, RegistryError> {
        Ok(Self::with_client(http_client(timeout)?, base_url))
    }

    pub fn with_client(client: reqwest::Client, base_url: String) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }
}

#[async_trait]
impl PackageRegistryClient for PyPiRegistryClient {
    #[instrument(skip(self))]
    async fn latest_version(&self, name: &str) -> Result<Option<LatestVersionInfo>, RegistryError> {
        let url = format!("{}/pypi/{}/json", self.base_url, name);
        let response = self.client.get(&url).send().await?;
        let json = json_body(response, name).await?;

        let info = json
            .get("info")
            .ok_or_else(|| RegistryError::Parse("missing info object".to_string()))?;
        let version = info
            .get("version")
            .and_then(|v| v.as_str())
            .ok_or_else(|| RegistryError::Parse("missing info.version".to_string()))?;
        debug!(package = name, latest = version, "PyPI lookup complete");

        let text = |key: &str| {
            info.get(key)
                .and_then(|v| v.as_str())
                .filter(|s| !s.is_empty())
                .map(str::to_string)
        };

        Ok(Some(LatestVersionInfo {
            version: version.to_string(),
            description: text("summary"),
            homepage: text("home_page"),
        }))
    }
}
