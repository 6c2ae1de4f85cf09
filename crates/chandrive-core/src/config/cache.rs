//! Cache configuration.

use serde::{Deserialize, Serialize};

/// In-memory cache settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Maximum number of cached entries.
    pub max_capacity: u64,
    /// Entry time-to-live in seconds. Zero disables expiry; file metadata
    /// relies on explicit invalidation instead of TTL.
    pub time_to_live_seconds: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            max_capacity: 10_000,
            time_to_live_seconds: 0,
        }
    }
}
