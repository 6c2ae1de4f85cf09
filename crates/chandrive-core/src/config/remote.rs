//! Chat-platform RPC gateway configuration.

use serde::{Deserialize, Serialize};

/// Settings for the remote chat-platform API adapter.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RemoteConfig {
    /// Base URL of the platform RPC gateway.
    pub base_url: String,
    /// Per-request timeout in seconds.
    #[serde(default = "default_timeout")]
    pub timeout_seconds: u64,
}

fn default_timeout() -> u64 {
    120
}
