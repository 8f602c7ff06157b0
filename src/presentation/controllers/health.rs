//! Health check controller

use axum::response::Json;
use chrono::Utc;

use crate::presentation::models::HealthResponse;

/// Liveness endpoint reporting the running build
#[utoipa::path(
    get,
    path = "/health",
    tag = "health",
    responses(
        (status = 200, description = "Service is healthy", body = HealthResponse)
    )
)]
pub async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        build_date: option_env!("VERGEN_BUILD_DATE").map(str::to_string),
        timestamp: Utc::now(),
    })
}
