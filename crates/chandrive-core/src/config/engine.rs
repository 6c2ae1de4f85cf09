//! File I/O engine configuration.

use serde::{Deserialize, Serialize};

/// Tunables for the upload/download engines and the worker pools.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Force user-credential streaming even when bot tokens exist.
    pub disable_stream_bots: bool,
    /// Do not keep bot clients warm; log in on demand for each request.
    pub lazy_stream_bots: bool,
    /// Cap on the number of warm stream workers per channel.
    pub bg_bots_limit: usize,
    /// Age cutoff in days for listing and pruning upload parts.
    pub upload_retention_days: i64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            disable_stream_bots: false,
            lazy_stream_bots: false,
            bg_bots_limit: 4,
            upload_retention_days: 14,
        }
    }
}
