//! Logging and tracing configuration

use crate::config::LoggingConfig;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Initialize tracing based on configuration; `RUST_LOG` overrides the configured level
pub fn init_tracing(config: &LoggingConfig) -> Result<(), Box<dyn std::error::Error>> {
    let env_filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(&config.level)?,
    };

    let registry = tracing_subscriber::registry().with(env_filter);
    match config.format.as_str() {
        "json" => registry
            .with(fmt::layer().with_target(false).json())
            .try_init()?,
        "pretty" => registry.with(fmt::layer().pretty()).try_init()?,
        "compact" => registry.with(fmt::layer().compact()).try_init()?,
        _ => registry.with(fmt::layer()).try_init()?,
    }

    Ok(())
}
