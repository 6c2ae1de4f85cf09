//! File entity model.
//!
//! A row is either a folder (absolute `path`, non-zero `depth`) or a file
//! (empty path, `parent_id` + backing `channel_id` + ordered part list).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use sqlx::types::Json;

/// One message-backed slice of a logical file's bytes.
///
/// Position is implicit by list order; the concatenation of parts' bytes
/// in order equals the file's bytes. Sizes are discovered at read time
/// from the remote document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Part {
    /// Remote message identifier within the file's channel.
    pub id: i64,
}

/// Ordered part list stored as JSONB on the file row.
pub type Parts = Json<Vec<Part>>;

/// A node in the virtual file tree.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct File {
    /// Opaque unique identifier.
    pub id: String,
    /// Node name.
    pub name: String,
    /// Node kind: `"file"` or `"folder"`.
    #[sqlx(rename = "type")]
    #[serde(rename = "type")]
    pub kind: String,
    /// Absolute path for folders; empty for files.
    pub path: Option<String>,
    /// Number of path segments minus one, for folders.
    pub depth: Option<i32>,
    /// Parent folder id, for files.
    pub parent_id: Option<String>,
    /// Size in bytes, for files.
    pub size: Option<i64>,
    /// MIME type, for files.
    pub mime_type: Option<String>,
    /// Backing channel, for files.
    pub channel_id: Option<i64>,
    /// Ordered list of message parts holding the file's bytes.
    pub parts: Option<Parts>,
    /// Owning user.
    pub user_id: i64,
    /// Row status: `"active"` or `"pending_delete"`.
    pub status: String,
    /// Starred flag.
    pub starred: bool,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last update timestamp.
    pub updated_at: DateTime<Utc>,
}

impl File {
    /// Whether this row is a folder.
    pub fn is_folder(&self) -> bool {
        self.kind == "folder"
    }

    /// Part ids in list order; empty for folders and zero-byte files.
    pub fn part_ids(&self) -> Vec<i64> {
        self.parts
            .as_ref()
            .map(|p| p.0.iter().map(|part| part.id).collect())
            .unwrap_or_default()
    }
}

/// Data required to create a new file row.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateFile {
    /// Node name.
    pub name: String,
    /// Node kind: `"file"` or `"folder"`.
    #[serde(rename = "type")]
    pub kind: String,
    /// Absolute path for folders.
    pub path: Option<String>,
    /// Folder depth.
    pub depth: Option<i32>,
    /// Parent folder id.
    pub parent_id: Option<String>,
    /// Size in bytes.
    pub size: Option<i64>,
    /// MIME type.
    pub mime_type: Option<String>,
    /// Backing channel.
    pub channel_id: Option<i64>,
    /// Ordered part list.
    pub parts: Option<Vec<Part>>,
    /// Owning user.
    pub user_id: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_part_ids_in_order() {
        let file = File {
            id: "f1".into(),
            name: "movie.mkv".into(),
            kind: "file".into(),
            path: None,
            depth: None,
            parent_id: Some("root".into()),
            size: Some(3),
            mime_type: Some("video/x-matroska".into()),
            channel_id: Some(77),
            parts: Some(Json(vec![Part { id: 9 }, Part { id: 4 }, Part { id: 11 }])),
            user_id: 1,
            status: "active".into(),
            starred: false,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        assert_eq!(file.part_ids(), vec![9, 4, 11]);
        assert!(!file.is_folder());
    }
}
