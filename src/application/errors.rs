//! Application layer error types

use crate::domain::DomainError;
use crate::infrastructure::repository_source::RepositorySourceError;
use thiserror::Error;

/// Application-level errors
#[derive(Error, Debug)]
pub enum ApplicationError {
    #[error("Domain error: {0}")]
    Domain(#[from] DomainError),

    #[error("Cache error: {0}")]
    Cache(#[from] CacheError),

    #[error("Repository source error: {0}")]
    RepositorySource(#[from] RepositorySourceError),

    #[error("Internal error: {message}")]
    Internal { message: String },
}

#[derive(Error, Debug)]
pub enum ParseError {
    #[error("Invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid TOML: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("Invalid pattern: {0}")]
    Regex(#[from] regex::Error),

    #[error("Missing required section: {section}")]
    MissingSection { section: String },
}

#[derive(Error, Debug)]
pub enum VulnerabilityError {
    #[error("API error: {0}")]
    Api(#[from] ApiError),

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("HTTP error {status}: {message}")]
    Http { status: u16, message: String },
}

#[derive(Error, Debug)]
pub enum CacheError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

impl ApplicationError {
    /// Get the error type as a string for API responses
    pub fn error_type(&self) -> &'static str {
        match self {
            ApplicationError::Domain(DomainError::InvalidRepositoryUrl { .. }) => {
                "invalid_repository_url"
            }
            ApplicationError::Domain(_) => "invalid_input",
            ApplicationError::Cache(_) => "cache_error",
            ApplicationError::RepositorySource(e) => match e {
                RepositorySourceError::NotFound(_) => "repository_not_found",
                RepositorySourceError::RateLimited { .. } => "rate_limited",
                RepositorySourceError::AccessDenied(_) => "access_denied",
                _ => "repository_source_error",
            },
            ApplicationError::Internal { .. } => "internal_error",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_type_classification() {
        let err: ApplicationError = DomainError::InvalidRepositoryUrl {
            url: "ftp://example.com".to_string(),
        }
        .into();
        assert_eq!(err.error_type(), "invalid_repository_url");

        let err: ApplicationError = RepositorySourceError::RateLimited {
            retry_after: Some(60),
            message: "API rate limit exceeded".to_string(),
        }
        .into();
        assert_eq!(err.error_type(), "rate_limited");

        let err: ApplicationError =
            RepositorySourceError::Network("connection reset".to_string()).into();
        assert_eq!(err.error_type(), "repository_source_error");
    }
}
