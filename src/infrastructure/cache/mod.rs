//! Cache backends
//!
//! Both backends store JSON values with an expiry. Typed access and key
//! naming live in the application layer (`CacheServiceImpl`).

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use crate::application::errors::CacheError;

pub mod file_cache;
pub mod memory_cache;

pub use file_cache::FileCacheRepository;
pub use memory_cache::MemoryCacheRepository;

/// Stored value plus its lifetime, in seconds since the UNIX epoch
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheEntry {
    pub data: serde_json::Value,
    pub created_at: u64,
    pub expires_at: u64,
}

impl CacheEntry {
    pub fn new(data: serde_json::Value, ttl: Duration) -> Self {
        let now = current_timestamp();
        Self {
            data,
            created_at: now,
            expires_at: now.saturating_add(ttl.as_secs()),
        }
    }

    pub fn is_expired(&self) -> bool {
        current_timestamp() >= self.expires_at
    }
}

/// Key/value store with per-entry expiry. Expired entries read as absent.
#[async_trait]
pub trait CacheRepository: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<serde_json::Value>, CacheError>;

    async fn set(&self, key: &str, value: serde_json::Value, ttl: Duration)
    -> Result<(), CacheError>;

    async fn invalidate(&self, key: &str) -> Result<(), CacheError>;
}

pub(crate) fn current_timestamp() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}
