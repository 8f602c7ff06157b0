//! HTTP middleware for the web server

use axum::{
    http::{HeaderValue, Request, StatusCode, header},
    middleware::Next,
    response::{IntoResponse, Json, Response},
};
use chrono::Utc;
use std::time::Instant;
use uuid::Uuid;

use crate::application::errors::ApplicationError;
use crate::domain::DomainError;
use crate::infrastructure::repository_source::RepositorySourceError;
use crate::presentation::models::ErrorResponse;

/// Error handling middleware
impl IntoResponse for ApplicationError {
    fn into_response(self) -> Response {
        let request_id = Uuid::new_v4();
        let mut retry_after = None;

        let (status, code, message) = match &self {
            ApplicationError::Domain(DomainError::InvalidRepositoryUrl { .. }) => (
                StatusCode::BAD_REQUEST,
                "INVALID_REPOSITORY_URL",
                "The repository URL could not be parsed".to_string(),
            ),
            ApplicationError::Domain(e) => {
                (StatusCode::BAD_REQUEST, "INVALID_INPUT", e.to_string())
            }
            ApplicationError::RepositorySource(e) => match e {
                RepositorySourceError::NotFound(_) => (
                    StatusCode::NOT_FOUND,
                    "REPOSITORY_NOT_FOUND",
                    "Repository not found or not accessible".to_string(),
                ),
                RepositorySourceError::RateLimited {
                    retry_after: seconds,
                    ..
                } => {
                    retry_after = *seconds;
                    (
                        StatusCode::TOO_MANY_REQUESTS,
                        "RATE_LIMITED",
                        "Upstream rate limit exceeded, retry later".to_string(),
                    )
                }
                RepositorySourceError::AccessDenied(_) => (
                    StatusCode::FORBIDDEN,
                    "ACCESS_DENIED",
                    "Access to the repository was denied".to_string(),
                ),
                _ => (
                    StatusCode::BAD_GATEWAY,
                    "REPOSITORY_SOURCE_ERROR",
                    "The repository host could not be reached".to_string(),
                ),
            },
            _ => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "INTERNAL_ERROR",
                "An internal error occurred".to_string(),
            ),
        };

        // 5xx details stay in the server log
        let details = if status.is_server_error() {
            tracing::error!(
                request_id = %request_id,
                error_type = self.error_type(),
                error = %self,
                "Request failed"
            );
            Some(serde_json::json!({ "type": self.error_type() }))
        } else {
            Some(serde_json::json!({ "type": self.error_type(), "error": self.to_string() }))
        };

        let error_response = ErrorResponse {
            code: code.to_string(),
            message,
            details,
            request_id,
            timestamp: Utc::now(),
        };

        let mut response = (status, Json(error_response)).into_response();
        if let Some(seconds) = retry_after {
            if let Ok(value) = HeaderValue::from_str(&seconds.to_string()) {
                response.headers_mut().insert(header::RETRY_AFTER, value);
            }
        }
        response
    }
}

/// Request logging middleware with timing and request ID
pub async fn logging_middleware(request: Request<axum::body::Body>, next: Next) -> Response {
    let method = request.method().clone();
    let uri = request.uri().clone();
    let request_id = Uuid::new_v4();
    let start_time = Instant::now();

    tracing::debug!(
        request_id = %request_id,
        method = %method,
        uri = %uri,
        "Processing request"
    );

    let response = next.run(request).await;

    tracing::info!(
        request_id = %request_id,
        method = %method,
        uri = %uri,
        status = %response.status(),
        duration_ms = start_time.elapsed().as_millis(),
        "Request completed"
    );

    response
}
