//! File-based cache implementation

use async_trait::async_trait;
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::fs;
use tokio::sync::Mutex;
use tracing::{debug, error, info, warn};

use super::{CacheEntry, CacheRepository};
use crate::application::errors::CacheError;

/// One JSON file per key, named by the SHA-256 of the key
pub struct FileCacheRepository {
    cache_dir: PathBuf,
    /// Per-key locks so concurrent writers of one key do not interleave.
    /// An entry only lives while some operation holds its lock.
    file_locks: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl FileCacheRepository {
    pub fn new(cache_dir: impl Into<PathBuf>) -> Self {
        Self {
            cache_dir: cache_dir.into(),
            file_locks: Mutex::new(HashMap::new()),
        }
    }

    pub fn cache_dir(&self) -> &Path {
        &self.cache_dir
    }

    /// Hash the key so that any string yields a safe file name
    fn cache_key(key: &str) -> String {
        let mut hasher = Sha256::new();
        hasher.update(key.as_bytes());
        hex::encode(hasher.finalize())
    }

    fn cache_path(&self, hashed: &str) -> PathBuf {
        self.cache_dir.join(format!("{}.json", hashed))
    }

    fn temp_cache_path(&self, hashed: &str) -> PathBuf {
        self.cache_dir.join(format!("{}.tmp", hashed))
    }

    async fn get_file_lock(&self, hashed: &str) -> Arc<Mutex<()>> {
        let mut locks = self.file_locks.lock().await;
        locks
            .entry(hashed.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }

    /// Drop the caller's handle and forget the lock once nobody else holds it
    async fn release_file_lock(&self, hashed: &str, file_lock: Arc<Mutex<()>>) {
        let mut locks = self.file_locks.lock().await;
        drop(file_lock);
        if locks
            .get(hashed)
            .is_some_and(|lock| Arc::strong_count(lock) == 1)
        {
            locks.remove(hashed);
        }
    }

    #[cfg(test)]
    async fn lock_count(&self) -> usize {
        self.file_locks.lock().await.len()
    }

    /// Read and validate one entry; callers hold the key's lock
    async fn read_entry(
        &self,
        key: &str,
        path: &Path,
    ) -> Result<Option<serde_json::Value>, CacheError> {
        let bytes = match fs::read(path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        let entry: CacheEntry = match serde_json::from_slice(&bytes) {
            Ok(entry) => entry,
            Err(e) => {
                warn!(key, error = %e, "Discarding corrupted cache entry");
                Self::remove_if_present(path).await?;
                return Ok(None);
            }
        };

        if entry.is_expired() {
            debug!(key, "Cache entry expired");
            Self::remove_if_present(path).await?;
            return Ok(None);
        }

        Ok(Some(entry.data))
    }

    async fn ensure_cache_dir(&self) -> Result<(), CacheError> {
        if !fs::try_exists(&self.cache_dir).await? {
            fs::create_dir_all(&self.cache_dir).await.map_err(|e| {
                error!("Failed to create cache directory: {}", e);
                e
            })?;
            debug!("Created cache directory: {:?}", self.cache_dir);
        }
        Ok(())
    }

    /// Write to a temporary file, then rename over the final path
    async fn atomic_write(&self, hashed: &str, entry: &CacheEntry) -> Result<(), CacheError> {
        let temp_path = self.temp_cache_path(hashed);
        let final_path = self.cache_path(hashed);

        let content = serde_json::to_vec(entry)?;
        fs::write(&temp_path, content).await?;
        fs::rename(&temp_path, &final_path).await?;

        debug!("Cached entry {}", hashed);
        Ok(())
    }

    async fn remove_if_present(path: &Path) -> Result<(), CacheError> {
        match fs::remove_file(path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    /// Remove expired and unreadable entries; returns how many were removed
    pub async fn cleanup_expired_entries(&self) -> Result<u64, CacheError> {
        if !fs::try_exists(&self.cache_dir).await? {
            return Ok(0);
        }

        let mut cleaned_count = 0u64;
        let mut entries = fs::read_dir(&self.cache_dir).await?;

        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if !path.extension().is_some_and(|ext| ext == "json") {
                continue;
            }

            let stale = match fs::read(&path).await {
                Ok(bytes) => match serde_json::from_slice::<CacheEntry>(&bytes) {
                    Ok(cached) => cached.is_expired(),
                    Err(e) => {
                        warn!("Corrupted cache file {:?}: {}", path, e);
                        true
                    }
                },
                Err(e) => {
                    warn!("Failed to read cache file {:?}: {}", path, e);
                    false
                }
            };

            if stale {
                match fs::remove_file(&path).await {
                    Ok(()) => cleaned_count += 1,
                    Err(e) => warn!("Failed to remove cache file {:?}: {}", path, e),
                }
            }
        }

        if cleaned_count > 0 {
            info!("Cleaned up {} expired cache entries", cleaned_count);
        }
        Ok(cleaned_count)
    }
}

#[async_trait]
impl CacheRepository for FileCacheRepository {
    async fn get(&self, key: &str) -> Result<Option<serde_json::Value>, CacheError> {
        let hashed = Self::cache_key(key);
        let path = self.cache_path(&hashed);

        let file_lock = self.get_file_lock(&hashed).await;
        let result = {
            let _guard = file_lock.lock().await;
            self.read_entry(key, &path).await
        };
        self.release_file_lock(&hashed, file_lock).await;
        result
    }

    async fn set(
        &self,
        key: &str,
        value: serde_json::Value,
        ttl: Duration,
    ) -> Result<(), CacheError> {
        self.ensure_cache_dir().await?;

        let hashed = Self::cache_key(key);
        let file_lock = self.get_file_lock(&hashed).await;
        let result = {
            let _guard = file_lock.lock().await;
            self.atomic_write(&hashed, &CacheEntry::new(value, ttl)).await
        };
        self.release_file_lock(&hashed, file_lock).await;
        result
    }

    async fn invalidate(&self, key: &str) -> Result<(), CacheError> {
        let hashed = Self::cache_key(key);
        let file_lock = self.get_file_lock(&hashed).await;
        let result = {
            let _guard = file_lock.lock().await;
            Self::remove_if_present(&self.cache_path(&hashed)).await
        };
        self.release_file_lock(&hashed, file_lock).await;
        result
    }
}
