//! In-process cache backed by moka, lives as long as the server

use async_trait::async_trait;
use moka::future::Cache;
use std::time::Duration;
use tracing::debug;

use super::{CacheEntry, CacheRepository};
use crate::application::errors::CacheError;

/// Bounded in-memory cache. Entries leave on whichever comes first: the
/// cache-wide time to live, the per-call ttl, or capacity eviction.
#[derive(Clone)]
pub struct MemoryCacheRepository {
    cache: Cache<String, CacheEntry>,
}

impl MemoryCacheRepository {
    /// Create a cache holding at most `max_entries` values for at most `ttl`
    pub fn new(max_entries: u64, ttl: Duration) -> Self {
        let cache = Cache::builder()
            .max_capacity(max_entries)
            .time_to_live(ttl)
            .build();

        Self { cache }
    }

    /// Number of live entries after pending evictions have been applied
    pub async fn entry_count(&self) -> u64 {
        self.cache.run_pending_tasks().await;
        self.cache.entry_count()
    }
}

#[async_trait]
impl CacheRepository for MemoryCacheRepository {
    async fn get(&self, key: &str) -> Result<Option<serde_json::Value>, CacheError> {
        match self.cache.get(key).await {
            Some(entry) if !entry.is_expired() => Ok(Some(entry.data)),
            Some(_) => {
                // Per-call ttl shorter than the cache-wide one
                self.cache.invalidate(key).await;
                debug!(key, "Evicted expired cache entry");
                Ok(None)
            }
            None => Ok(None),
        }
    }

    async fn set(
        &self,
        key: &str,
        value: serde_json::Value,
        ttl: Duration,
    ) -> Result<(), CacheError> {
        self.cache
            .insert(key.to_string(), CacheEntry::new(value, ttl))
            .await;
        Ok(())
    }

    async fn invalidate(&self, key: &str) -> Result<(), CacheError> {
        self.cache.invalidate(key).await;
        Ok(())
    }
}
