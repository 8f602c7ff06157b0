//! Domain-specific error types

use thiserror::Error;

/// Domain-level errors for dependency analysis
#[derive(Error, Debug)]
pub enum DomainError {
    #[error("Invalid repository URL: {url}")]
    InvalidRepositoryUrl { url: String },

    #[error("Invalid input for field {field}: {message}")]
    InvalidInput { field: String, message: String },
}
