//! Repository Source Abstractions
//!
//! Traits for reading repository metadata and raw manifest contents from a
//! hosting service, plus a factory that hands out clients per credential.
//! `GitHubRepositoryClient` is the implementation used by the server.

use async_trait::async_trait;
use std::collections::BTreeMap;
use std::sync::Arc;
use thiserror::Error;

pub mod github_client;
pub mod url_parser;
pub use github_client::{GitHubRepositoryClient, GitHubSourceFactory};
pub use url_parser::{DEFAULT_BRANCH, ParsedRepositoryUrl, parse_github_repo_url};

use crate::domain::RepositoryInfo;

#[derive(Debug, Error)]
pub enum RepositorySourceError {
    #[error("network error: {0}")]
    Network(String),
    #[error("rate limited: retry_after={retry_after:?} message={message}")]
    RateLimited {
        retry_after: Option<u64>,
        message: String,
    },
    #[error("not found: {0}")]
    NotFound(String),
    #[error("access denied: {0}")]
    AccessDenied(String),
    #[error("decode error: {0}")]
    Decode(String),
    #[error("internal: {0}")]
    Internal(String),
    #[error("configuration error: {0}")]
    Configuration(String),
}

pub type RepositorySourceResult<T> = Result<T, RepositorySourceError>;

#[async_trait]
pub trait RepositorySourceClient: Send + Sync {
    async fn get_repository(&self, owner: &str, repo: &str)
    -> RepositorySourceResult<RepositoryInfo>;

    /// Bytes of code per language, as reported by the host
    async fn get_languages(
        &self,
        owner: &str,
        repo: &str,
    ) -> RepositorySourceResult<BTreeMap<String, u64>>;

    /// Raw text of one file; `Ok(None)` when the file does not exist.
    /// `r#ref` of `None` reads the default branch.
    async fn get_file_content(
        &self,
        owner: &str,
        repo: &str,
        path: &str,
        r#ref: Option<&str>,
    ) -> RepositorySourceResult<Option<String>>;
}

/// Hands out a source client for the caller's credential
pub trait RepositorySourceFactory: Send + Sync {
    /// `None` (or a blank token) yields the server's default client
    fn client(&self, token: Option<&str>) -> RepositorySourceResult<Arc<dyn RepositorySourceClient>>;
}
