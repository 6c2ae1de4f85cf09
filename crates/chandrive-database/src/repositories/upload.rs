//! Upload-part repository.

use sqlx::PgPool;

use chandrive_core::error::{AppError, ErrorKind};
use chandrive_core::result::AppResult;
use chandrive_entity::upload::Upload;

/// Repository for rows in `chandrive.uploads`.
#[derive(Debug, Clone)]
pub struct UploadRepository {
    pool: PgPool,
}

/// Data for one committed upload part.
#[derive(Debug, Clone)]
pub struct InsertUploadPart {
    /// Client-chosen correlation id.
    pub upload_id: String,
    /// File name supplied with the part.
    pub name: String,
    /// 1-based part number.
    pub part_no: i32,
    /// Total number of parts expected for the upload.
    pub total_parts: i32,
    /// Remote message id carrying this part.
    pub part_id: i64,
    /// Channel the part was committed to.
    pub channel_id: i64,
    /// Part size in bytes.
    pub size: i64,
    /// Owning user.
    pub user_id: i64,
}

impl UploadRepository {
    /// Create a new upload repository.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// List committed parts for an upload id, ordered by part number.
    ///
    /// Rows older than the retention window are excluded; a background
    /// prune may remove them at any time, so clients must not rely on them.
    pub async fn parts(&self, upload_id: &str, retention_days: i64) -> AppResult<Vec<Upload>> {
        sqlx::query_as::<_, Upload>(
            "SELECT * FROM chandrive.uploads \
             WHERE upload_id = $1 AND created_at >= NOW() - make_interval(days => $2) \
             ORDER BY part_no",
        )
        .bind(upload_id)
        .bind(retention_days as i32)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to list upload parts", e))
    }

    /// Record one committed part.
    pub async fn insert(&self, part: &InsertUploadPart) -> AppResult<Upload> {
        sqlx::query_as::<_, Upload>(
            "INSERT INTO chandrive.uploads \
             (upload_id, name, part_no, total_parts, part_id, channel_id, size, user_id) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8) RETURNING *",
        )
        .bind(&part.upload_id)
        .bind(&part.name)
        .bind(part.part_no)
        .bind(part.total_parts)
        .bind(part.part_id)
        .bind(part.channel_id)
        .bind(part.size)
        .bind(part.user_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to record upload part", e))
    }

    /// Delete all rows for an upload id.
    pub async fn delete(&self, upload_id: &str) -> AppResult<u64> {
        let result = sqlx::query("DELETE FROM chandrive.uploads WHERE upload_id = $1")
            .bind(upload_id)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                AppError::with_source(ErrorKind::Database, "Failed to delete upload", e)
            })?;
        Ok(result.rows_affected())
    }

    /// Prune rows older than the retention window across all uploads.
    pub async fn prune_expired(&self, retention_days: i64) -> AppResult<u64> {
        let result = sqlx::query(
            "DELETE FROM chandrive.uploads WHERE created_at < NOW() - make_interval(days => $1)",
        )
        .bind(retention_days as i32)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to prune uploads", e))?;
        Ok(result.rows_affected())
    }
}
