//! Response DTOs.

use serde::{Deserialize, Serialize};

use chandrive_entity::file::File;
use chandrive_entity::upload::Upload;

/// Paged file listing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileListResponse {
    /// Files of this page.
    pub results: Vec<File>,
    /// Keyset token for the next page; empty when exhausted.
    pub next_page_token: String,
}

/// Committed parts of one upload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadPartsResponse {
    /// Parts ordered by part number.
    pub parts: Vec<Upload>,
}

/// Generic status message.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageResponse {
    /// Whether the operation succeeded.
    pub status: bool,
    /// Human-readable outcome.
    pub message: String,
}

impl MessageResponse {
    /// A success message.
    pub fn ok(message: impl Into<String>) -> Self {
        Self {
            status: true,
            message: message.into(),
        }
    }
}
