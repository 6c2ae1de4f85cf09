//! Upload part entity model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// One committed part of a multi-part upload in progress.
///
/// Rows are grouped by `upload_id`; once `total_parts` rows exist the
/// client snapshots them into a file row with its part list.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Upload {
    /// Client-chosen opaque correlation id.
    pub upload_id: String,
    /// File name supplied with the part.
    pub name: String,
    /// 1-based part number.
    pub part_no: i32,
    /// Total number of parts the client intends to upload.
    pub total_parts: i32,
    /// Remote message id carrying this part's bytes.
    pub part_id: i64,
    /// Channel the part was committed to.
    pub channel_id: i64,
    /// Part size in bytes.
    pub size: i64,
    /// Owning user.
    pub user_id: i64,
    /// When the part row was created.
    pub created_at: DateTime<Utc>,
}
