//! Repository analysis endpoints

use axum::{
    extract::State,
    http::{HeaderMap, header},
    response::Json,
};
use std::sync::Arc;

use crate::application::{
    RepositoryAnalysisInput, RepositoryAnalysisService, errors::ApplicationError,
};
use crate::domain::DomainError;
use crate::presentation::models::{
    AnalysisReportDto, AnalyzeRepositoryRequest, ErrorResponse, ParseRepositoryRequest,
    RepositoryOverviewDto,
};

/// Application state shared by all handlers
#[derive(Clone)]
pub struct AppState {
    pub repository_analysis_service: Arc<dyn RepositoryAnalysisService>,
}

/// Token from an `Authorization: Bearer <token>` header, if any
pub fn bearer_token(headers: &HeaderMap) -> Option<String> {
    let value = headers.get(header::AUTHORIZATION)?.to_str().ok()?.trim();
    let (scheme, token) = value.split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("bearer") {
        return None;
    }
    let token = token.trim();
    (!token.is_empty()).then(|| token.to_string())
}

fn require_url(field: &str, value: &str) -> Result<(), ApplicationError> {
    if value.trim().is_empty() {
        return Err(DomainError::InvalidInput {
            field: field.to_string(),
            message: "must not be empty".to_string(),
        }
        .into());
    }
    Ok(())
}

/// Analyze the dependency manifests of a GitHub repository
#[utoipa::path(
    post,
    path = "/api/v1/analyze-repository",
    tag = "analysis",
    request_body = AnalyzeRepositoryRequest,
    params(
        ("Authorization" = Option<String>, Header, description = "Optional `Bearer <token>` for the repository host")
    ),
    responses(
        (status = 200, description = "Analysis completed", body = AnalysisReportDto),
        (status = 400, description = "Invalid request or repository URL", body = ErrorResponse),
        (status = 403, description = "Access to the repository denied", body = ErrorResponse),
        (status = 404, description = "Repository not found", body = ErrorResponse),
        (status = 429, description = "Repository host rate limit exceeded", body = ErrorResponse),
        (status = 502, description = "Repository host failure", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
pub async fn analyze_repository(
    State(app_state): State<AppState>,
    headers: HeaderMap,
    Json(request): Json<AnalyzeRepositoryRequest>,
) -> Result<Json<AnalysisReportDto>, ApplicationError> {
    require_url("repo_url", &request.repo_url)?;

    let input = RepositoryAnalysisInput {
        repo_url: request.repo_url,
        include_dev_dependencies: request.include_dev_dependencies,
        check_vulnerabilities: request.check_vulnerabilities,
        token: bearer_token(&headers),
    };

    let report = app_state
        .repository_analysis_service
        .analyze_repository(input)
        .await?;

    Ok(Json(report.into()))
}

/// Resolve a repository URL into repository details, branch and languages
#[utoipa::path(
    post,
    path = "/api/v1/parse",
    tag = "analysis",
    request_body = ParseRepositoryRequest,
    params(
        ("Authorization" = Option<String>, Header, description = "Optional `Bearer <token>` for the repository host")
    ),
    responses(
        (status = 200, description = "Repository resolved", body = RepositoryOverviewDto),
        (status = 400, description = "Invalid repository URL", body = ErrorResponse),
        (status = 404, description = "Repository not found", body = ErrorResponse),
        (status = 429, description = "Repository host rate limit exceeded", body = ErrorResponse),
        (status = 502, description = "Repository host failure", body = ErrorResponse)
    )
)]
pub async fn parse_repository(
    State(app_state): State<AppState>,
    headers: HeaderMap,
    Json(request): Json<ParseRepositoryRequest>,
) -> Result<Json<RepositoryOverviewDto>, ApplicationError> {
    require_url("url", &request.url)?;

    let token = bearer_token(&headers);
    let overview = app_state
        .repository_analysis_service
        .describe_repository(&request.url, token.as_deref())
        .await?;

    Ok(Json(overview.into()))
}
