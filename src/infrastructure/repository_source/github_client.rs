//! GitHub repository source client implementation

use async_trait::async_trait;
use base64::Engine;
use chrono::{DateTime, Utc};
use octocrab::Octocrab;
use serde::Deserialize;
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, instrument};

use super::{
    RepositorySourceClient, RepositorySourceError, RepositorySourceFactory,
    RepositorySourceResult,
};
use crate::config::GitHubConfig;
use crate::domain::{RepositoryInfo, RepositoryOwner, RepositoryStats};

#[derive(Debug, Deserialize)]
struct GitHubOwner {
    login: String,
    avatar_url: Option<String>,
    html_url: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GitHubRepository {
    id: u64,
    name: String,
    full_name: String,
    description: Option<String>,
    #[serde(default)]
    private: bool,
    #[serde(default)]
    fork: bool,
    owner: GitHubOwner,
    ssh_url: Option<String>,
    default_branch: Option<String>,
    #[serde(default)]
    stargazers_count: u64,
    #[serde(default)]
    watchers_count: u64,
    #[serde(default)]
    forks_count: u64,
    #[serde(default)]
    open_issues_count: u64,
    created_at: Option<DateTime<Utc>>,
    updated_at: Option<DateTime<Utc>>,
    pushed_at: Option<DateTime<Utc>>,
    #[serde(default)]
    topics: Vec<String>,
}

impl From<GitHubRepository> for RepositoryInfo {
    fn from(repo: GitHubRepository) -> Self {
        Self {
            id: repo.id,
            name: repo.name,
            full_name: repo.full_name,
            description: repo.description,
            private: repo.private,
            fork: repo.fork,
            owner: RepositoryOwner {
                login: repo.owner.login,
                avatar_url: repo.owner.avatar_url,
                html_url: repo.owner.html_url,
            },
            ssh_url: repo.ssh_url,
            default_branch: repo.default_branch,
            stats: RepositoryStats {
                stars: repo.stargazers_count,
                watchers: repo.watchers_count,
                forks: repo.forks_count,
                open_issues: repo.open_issues_count,
            },
            created_at: repo.created_at,
            updated_at: repo.updated_at,
            pushed_at: repo.pushed_at,
            topics: repo.topics,
        }
    }
}

/// Repository source backed by the GitHub REST API
pub struct GitHubRepositoryClient {
    octo: Octocrab,
}

impl GitHubRepositoryClient {
    pub fn new(octo: Octocrab) -> Self {
        Self { octo }
    }

    /// Build a client; a blank token means unauthenticated access
    pub fn from_token(
        token: Option<&str>,
        base_url: &str,
        timeout: Duration,
    ) -> RepositorySourceResult<Self> {
        let mut builder = Octocrab::builder()
            .set_connect_timeout(Some(timeout))
            .set_read_timeout(Some(timeout))
            .base_uri(base_url)
            .map_err(|e| RepositorySourceError::Configuration(e.to_string()))?;

        if let Some(t) = token.map(str::trim).filter(|t| !t.is_empty()) {
            builder = builder.personal_token(t.to_string());
        }

        let octo = builder
            .build()
            .map_err(|e| RepositorySourceError::Internal(e.to_string()))?;
        Ok(Self::new(octo))
    }
}

#[async_trait]
impl RepositorySourceClient for GitHubRepositoryClient {
    #[instrument(skip(self))]
    async fn get_repository(&self, owner: &str, repo: &str) -> RepositorySourceResult<RepositoryInfo> {
        let repository: GitHubRepository = self
            .octo
            .get(format!("/repos/{}/{}", owner, repo), None::<&()>)
            .await
            .map_err(classify_octocrab_error)?;
        Ok(repository.into())
    }

    #[instrument(skip(self))]
    async fn get_languages(
        &self,
        owner: &str,
        repo: &str,
    ) -> RepositorySourceResult<BTreeMap<String, u64>> {
        self.octo
            .get(format!("/repos/{}/{}/languages", owner, repo), None::<&()>)
            .await
            .map_err(classify_octocrab_error)
    }

    #[instrument(skip(self))]
    async fn get_file_content(
        &self,
        owner: &str,
        repo: &str,
        path: &str,
        r#ref: Option<&str>,
    ) -> RepositorySourceResult<Option<String>> {
        let route = format!("/repos/{}/{}/contents/{}", owner, repo, path);
        let response: Result<Value, octocrab::Error> = match r#ref {
            Some(reference) => self.octo.get(route, Some(&[("ref", reference)])).await,
            None => self.octo.get(route, None::<&()>).await,
        };

        let content_json = match response.map_err(classify_octocrab_error) {
            Ok(json) => json,
            Err(RepositorySourceError::NotFound(_)) => {
                debug!(path, "file not present");
                return Ok(None);
            }
            Err(e) => return Err(e),
        };

        // Directories come back as arrays and have no `content`
        let Some(encoded) = content_json.get("content").and_then(|v| v.as_str()) else {
            return Ok(None);
        };
        decode_content(encoded).map(Some)
    }
}

/// Decode the base64 payload of the contents API, which embeds newlines
fn decode_content(encoded: &str) -> RepositorySourceResult<String> {
    let cleaned: String = encoded.chars().filter(|c| !c.is_whitespace()).collect();
    let bytes = base64::engine::general_purpose::STANDARD
        .decode(cleaned.as_bytes())
        .map_err(|e| RepositorySourceError::Decode(e.to_string()))?;
    String::from_utf8(bytes).map_err(|e| RepositorySourceError::Decode(e.to_string()))
}

/// Hands out GitHub clients: one shared default, one fresh client per caller token
pub struct GitHubSourceFactory {
    default_client: Arc<GitHubRepositoryClient>,
    base_url: String,
    timeout: Duration,
}

impl GitHubSourceFactory {
    pub fn new(config: &GitHubConfig) -> RepositorySourceResult<Self> {
        let timeout = Duration::from_secs(config.timeout_seconds);
        let default_client =
            GitHubRepositoryClient::from_token(config.token.as_deref(), &config.base_url, timeout)?;

        Ok(Self {
            default_client: Arc::new(default_client),
            base_url: config.base_url.clone(),
            timeout,
        })
    }
}

impl RepositorySourceFactory for GitHubSourceFactory {
    fn client(&self, token: Option<&str>) -> RepositorySourceResult<Arc<dyn RepositorySourceClient>> {
        let client: Arc<dyn RepositorySourceClient> =
            match token.map(str::trim).filter(|t| !t.is_empty()) {
                Some(t) => Arc::new(GitHubRepositoryClient::from_token(
                    Some(t),
                    &self.base_url,
                    self.timeout,
                )?),
                None => self.default_client.clone(),
            };
        Ok(client)
    }
}

fn classify_octocrab_error(e: octocrab::Error) -> RepositorySourceError {
    classify_error_message(e.to_string())
}

/// octocrab folds the status into the message, so classify on its text
fn classify_error_message(msg: String) -> RepositorySourceError {
    let lower = msg.to_lowercase();
    if lower.contains("rate limit") {
        return RepositorySourceError::RateLimited {
            retry_after: None,
            message: msg,
        };
    }
    if lower.contains("not found") || lower.contains("404") {
        return RepositorySourceError::NotFound(msg);
    }
    if lower.contains("forbidden")
        || lower.contains("requires authentication")
        || lower.contains("unauthorized")
        || lower.contains("bad credentials")
        || lower.contains("401")
        || lower.contains("403")
    {
        return RepositorySourceError::AccessDenied(msg);
    }
    RepositorySourceError::Network(msg)
}
