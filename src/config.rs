//! Configuration management

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub analysis: AnalysisConfig,
    pub registries: RegistriesConfig,
    pub apis: ApiConfig,
    pub github: GitHubConfig,
    pub cache: CacheConfig,
    pub logging: LoggingConfig,
}

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Whether to expose interactive API docs (Swagger UI). Should be false in hardened production.
    pub enable_docs: bool,
    /// Global request timeout in seconds applied at the HTTP layer.
    pub request_timeout_seconds: u64,
    /// Allowed CORS origins. Use ["*"] to allow any (development only). Empty vector -> no external origins.
    pub allowed_origins: Vec<String>,
}

/// Dependency analysis tuning
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisConfig {
    /// Upper bound on registry and vulnerability lookups in flight per request
    pub max_concurrent_lookups: usize,
}

/// Package registry endpoints
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegistriesConfig {
    pub npm_base_url: String,
    pub pypi_base_url: String,
    pub timeout_seconds: u64,
}

impl Default for RegistriesConfig {
    fn default() -> Self {
        Self {
            npm_base_url: "https://registry.npmjs.org".to_string(),
            pypi_base_url: "https://pypi.org".to_string(),
            timeout_seconds: 10,
        }
    }
}

/// External API configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    pub osv: OsvConfig,
}

/// OSV API configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OsvConfig {
    pub base_url: String,
    pub timeout_seconds: u64,
}

/// GitHub API access used to read repositories
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GitHubConfig {
    pub base_url: String,
    /// Server-wide token; falls back to `GITHUB_TOKEN`
    pub token: Option<String>,
    pub timeout_seconds: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CacheBackend {
    Memory,
    File,
}

/// Cache configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    pub backend: CacheBackend,
    /// Only read by the file backend
    pub directory: PathBuf,
    pub ttl_seconds: u64,
    /// Upper bound on entries held by the memory backend
    pub max_entries: u64,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
    /// `json`, `pretty` or `compact`
    pub format: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server: ServerConfig {
                host: "0.0.0.0".to_string(),
                port: 3000,
                enable_docs: true,
                request_timeout_seconds: 60,
                allowed_origins: vec!["*".to_string()],
            },
            analysis: AnalysisConfig {
                max_concurrent_lookups: 16,
            },
            registries: RegistriesConfig::default(),
            apis: ApiConfig {
                osv: OsvConfig {
                    base_url: "https://api.osv.dev".to_string(),
                    timeout_seconds: 10,
                },
            },
            github: GitHubConfig {
                base_url: "https://api.github.com".to_string(),
                token: None,
                timeout_seconds: 30,
            },
            cache: CacheConfig {
                backend: CacheBackend::Memory,
                directory: PathBuf::from(".depsight_cache"),
                ttl_seconds: 3600,
                max_entries: 10_000,
            },
            logging: LoggingConfig {
                level: "info".to_string(),
                format: "json".to_string(),
            },
        }
    }
}

impl Config {
    /// Load configuration: defaults, then config files, then `DEPSIGHT__*` environment variables
    pub fn load() -> Result<Self, config::ConfigError> {
        let mut builder = config::Config::builder()
            .add_source(config::Config::try_from(&Config::default())?)
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name("config/local").required(false));

        if let Ok(env) = std::env::var("ENV") {
            builder = builder
                .add_source(config::File::with_name(&format!("config/{}", env)).required(false));
        }

        let mut config: Config = builder
            .add_source(config::Environment::with_prefix("DEPSIGHT").separator("__"))
            .build()?
            .try_deserialize()?;

        config.github.token = config
            .github
            .token
            .take()
            .or_else(|| std::env::var("GITHUB_TOKEN").ok())
            .filter(|t| !t.trim().is_empty());

        Ok(config)
    }
}
