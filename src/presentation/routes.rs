//! Route definitions and server setup

use axum::{
    Router,
    http::{HeaderValue, Method, header},
    middleware,
    routing::{get, post},
};
use std::time::Duration;
use tower::ServiceBuilder;
use tower_http::{
    cors::{AllowOrigin, Any, CorsLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::config::{Config, ServerConfig};
use crate::presentation::{
    controllers::{
        analysis::{AppState, analyze_repository, parse_repository},
        health::health_check,
    },
    middleware::logging_middleware,
    models::*,
};

/// OpenAPI documentation
#[derive(OpenApi)]
#[openapi(
    paths(
        crate::presentation::controllers::analysis::analyze_repository,
        crate::presentation::controllers::analysis::parse_repository,
        crate::presentation::controllers::health::health_check
    ),
    components(
        schemas(
            AnalyzeRepositoryRequest,
            ParseRepositoryRequest,
            AnalysisReportDto,
            DependencyReportDto,
            VulnerabilityDto,
            RiskSummaryDto,
            RepositoryOverviewDto,
            RepositoryOwnerDto,
            RepositoryStatsDto,
            ErrorResponse,
            HealthResponse
        )
    ),
    tags(
        (name = "analysis", description = "Repository dependency health analysis"),
        (name = "health", description = "Service health")
    ),
    info(
        title = "Depsight API",
        version = "0.1.0",
        description = "Finds the dependency manifests of a GitHub repository, checks every dependency against its package registry and reports outdated and vulnerable packages. Supports npm, PyPI, Go modules, Maven, Cargo, Composer and RubyGems manifests."
    ),
    servers(
        (url = "http://localhost:3000", description = "Local development server")
    )
)]
pub struct ApiDoc;

fn cors_layer(server: &ServerConfig) -> CorsLayer {
    let origins = if server.allowed_origins.iter().any(|o| o == "*") {
        AllowOrigin::from(Any)
    } else {
        let list: Vec<HeaderValue> = server
            .allowed_origins
            .iter()
            .filter_map(|origin| match HeaderValue::from_str(origin) {
                Ok(value) => Some(value),
                Err(_) => {
                    tracing::warn!(origin = %origin, "Ignoring invalid CORS origin");
                    None
                }
            })
            .collect();
        AllowOrigin::list(list)
    };

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION, header::ACCEPT])
        .max_age(Duration::from_secs(3600))
}

/// Create the application router with its middleware stack
pub fn create_router(app_state: AppState, config: &Config) -> Router {
    let api_routes = Router::new()
        .route("/analyze-repository", post(analyze_repository))
        .route("/parse", post(parse_repository));

    let mut router = Router::new()
        .nest("/api/v1", api_routes)
        .route("/health", get(health_check));

    if config.server.enable_docs {
        router = router
            .merge(SwaggerUi::new("/docs").url("/api-docs/openapi.json", ApiDoc::openapi()));
    }

    router
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors_layer(&config.server))
                .layer(TimeoutLayer::new(Duration::from_secs(
                    config.server.request_timeout_seconds,
                )))
                .layer(middleware::from_fn(logging_middleware)),
        )
        .with_state(app_state)
}
