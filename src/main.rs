//! Depsight - Main application entry point

use std::{net::SocketAddr, sync::Arc, time::Duration};
use tokio::{net::TcpListener, signal};

use depsight::{
    Config,
    application::{
        CachingRegistryClient, CachingVulnerabilityClient, CacheServiceImpl, DependencyAnalyzer,
        RepositoryAnalysisService, RepositoryAnalysisServiceImpl,
    },
    config::CacheBackend,
    infrastructure::{
        api_clients::{OsvClient, VulnerabilityApiClient},
        cache::{CacheRepository, FileCacheRepository, MemoryCacheRepository},
        registries::{PackageRegistryClient, RegistryTable},
        repository_source::GitHubSourceFactory,
    },
    init_tracing,
    presentation::{AppState, create_router},
};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load configuration
    let config = Config::load().unwrap_or_else(|e| {
        eprintln!("Failed to load configuration ({e}), using defaults");
        Config::default()
    });

    init_tracing(&config.logging)?;

    tracing::info!("Starting Depsight server...");
    tracing::info!(
        "Configuration loaded: server={}:{}",
        config.server.host,
        config.server.port
    );

    // Cache backend
    let cache_ttl = Duration::from_secs(config.cache.ttl_seconds);
    let cache_repository: Arc<dyn CacheRepository> = match config.cache.backend {
        CacheBackend::Memory => Arc::new(MemoryCacheRepository::new(
            config.cache.max_entries,
            cache_ttl,
        )),
        CacheBackend::File => {
            let file_cache = FileCacheRepository::new(config.cache.directory.clone());
            match file_cache.cleanup_expired_entries().await {
                Ok(removed) if removed > 0 => {
                    tracing::info!(removed, "Removed expired cache entries")
                }
                Ok(_) => {}
                Err(e) => tracing::warn!(error = %e, "Cache cleanup failed"),
            }
            Arc::new(file_cache)
        }
    };
    let cache_service = Arc::new(CacheServiceImpl::new(cache_repository));

    // Registry clients, each behind the cache
    let registries = RegistryTable::standard(&config.registries)?.map_clients(|ecosystem, client| {
        Arc::new(CachingRegistryClient::new(
            ecosystem,
            client,
            cache_service.clone(),
            cache_ttl,
        )) as Arc<dyn PackageRegistryClient>
    });

    let osv_client = Arc::new(OsvClient::new(
        config.apis.osv.base_url.clone(),
        Duration::from_secs(config.apis.osv.timeout_seconds),
    )?);
    let vulnerability_client: Arc<dyn VulnerabilityApiClient> = Arc::new(
        CachingVulnerabilityClient::new(osv_client, cache_service.clone(), cache_ttl),
    );

    let analyzer = Arc::new(DependencyAnalyzer::new(
        registries,
        vulnerability_client,
        config.analysis.max_concurrent_lookups,
    ));

    if config.github.token.is_none() {
        tracing::info!(
            "No GitHub token configured; unauthenticated requests are subject to lower rate limits"
        );
    }
    let sources = Arc::new(GitHubSourceFactory::new(&config.github)?);
    let repository_analysis_service: Arc<dyn RepositoryAnalysisService> =
        Arc::new(RepositoryAnalysisServiceImpl::new(
            sources,
            analyzer,
            config.analysis.max_concurrent_lookups,
        ));

    let app_state = AppState {
        repository_analysis_service,
    };

    let app = create_router(app_state, &config);

    let addr = SocketAddr::new(config.server.host.parse()?, config.server.port);

    tracing::info!("Server listening on {}", addr);
    if config.server.enable_docs {
        tracing::info!("API documentation available at http://{}/docs", addr);
    } else {
        tracing::info!("API documentation disabled (enable_docs=false)");
    }

    // Start server with graceful shutdown
    let listener = TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server shutdown complete");
    Ok(())
}

/// Resolve when Ctrl+C or SIGTERM arrives
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C, initiating graceful shutdown");
        },
        _ = terminate => {
            tracing::info!("Received SIGTERM, initiating graceful shutdown");
        },
    }
}
