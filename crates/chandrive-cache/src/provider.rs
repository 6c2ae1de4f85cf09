//! Cache manager that wraps the configured provider.

use std::sync::Arc;

use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::debug;

use chandrive_core::config::CacheConfig;
use chandrive_core::result::AppResult;
use chandrive_core::traits::cache::CacheProvider;

use crate::memory::MemoryCacheProvider;

/// Cache manager that wraps the configured cache provider and adds
/// JSON-typed accessors.
#[derive(Debug, Clone)]
pub struct CacheManager {
    inner: Arc<dyn CacheProvider>,
}

impl CacheManager {
    /// Create a new cache manager from configuration.
    pub fn new(config: &CacheConfig) -> Self {
        Self {
            inner: Arc::new(MemoryCacheProvider::new(config)),
        }
    }

    /// Create a cache manager from an existing provider (for testing).
    pub fn from_provider(provider: Arc<dyn CacheProvider>) -> Self {
        Self { inner: provider }
    }

    /// Fetch and deserialize a cached JSON value.
    pub async fn get_json<T: DeserializeOwned>(&self, key: &str) -> AppResult<Option<T>> {
        match self.inner.get(key).await? {
            Some(raw) => Ok(Some(serde_json::from_str(&raw)?)),
            None => Ok(None),
        }
    }

    /// Serialize and store a JSON value.
    pub async fn set_json<T: Serialize>(&self, key: &str, value: &T) -> AppResult<()> {
        let raw = serde_json::to_string(value)?;
        self.inner.set(key, &raw).await
    }

    /// Delete a key.
    pub async fn delete(&self, key: &str) -> AppResult<()> {
        debug!(key, "Invalidating cache entry");
        self.inner.delete(key).await
    }

    /// Check whether a key exists.
    pub async fn exists(&self, key: &str) -> AppResult<bool> {
        self.inner.exists(key).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct Entry {
        id: String,
        size: i64,
    }

    #[tokio::test]
    async fn test_json_round_trip() {
        let cache = CacheManager::new(&CacheConfig::default());
        let entry = Entry {
            id: "f1".into(),
            size: 42,
        };
        cache.set_json("files:f1", &entry).await.unwrap();
        let got: Option<Entry> = cache.get_json("files:f1").await.unwrap();
        assert_eq!(got, Some(entry));
    }

    #[tokio::test]
    async fn test_invalidation_by_delete() {
        let cache = CacheManager::new(&CacheConfig::default());
        cache.set_json("files:f2", &1u32).await.unwrap();
        cache.delete("files:f2").await.unwrap();
        let got: Option<u32> = cache.get_json("files:f2").await.unwrap();
        assert_eq!(got, None);
    }
}
