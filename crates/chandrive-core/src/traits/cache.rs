//! Cache provider trait.

use async_trait::async_trait;

use crate::result::AppResult;

/// Trait for shared, thread-safe key/value caches.
///
/// The metadata cache stores serialized entities keyed by the builders in
/// `chandrive-cache::keys`. Invalidation on update is by key delete.
#[async_trait]
pub trait CacheProvider: Send + Sync + std::fmt::Debug + 'static {
    /// Fetch a value by key.
    async fn get(&self, key: &str) -> AppResult<Option<String>>;

    /// Store a value. Entries live until deleted or evicted by capacity.
    async fn set(&self, key: &str, value: &str) -> AppResult<()>;

    /// Delete a key. Deleting a missing key is not an error.
    async fn delete(&self, key: &str) -> AppResult<()>;

    /// Check whether a key exists.
    async fn exists(&self, key: &str) -> AppResult<bool>;
}
