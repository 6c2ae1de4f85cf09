//! Channel and bot-token repository.

use sqlx::PgPool;

use chandrive_core::error::{AppError, ErrorKind};
use chandrive_core::result::AppResult;
use chandrive_entity::channel::Channel;

/// Repository for `chandrive.channels` and `chandrive.bot_tokens`.
#[derive(Debug, Clone)]
pub struct ChannelRepository {
    pool: PgPool,
}

impl ChannelRepository {
    /// Create a new channel repository.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// The user's default upload channel id.
    pub async fn default_channel(&self, user_id: i64) -> AppResult<i64> {
        sqlx::query_scalar::<_, i64>(
            "SELECT channel_id FROM chandrive.channels WHERE user_id = $1 AND selected = TRUE",
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to resolve default channel", e)
        })?
        .ok_or_else(|| AppError::not_found("no default channel configured"))
    }

    /// All channels registered for a user.
    pub async fn list(&self, user_id: i64) -> AppResult<Vec<Channel>> {
        sqlx::query_as::<_, Channel>(
            "SELECT * FROM chandrive.channels WHERE user_id = $1 ORDER BY channel_name",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to list channels", e))
    }

    /// Bot credentials bound to `(user_id, channel_id)`.
    pub async fn bot_tokens(&self, user_id: i64, channel_id: i64) -> AppResult<Vec<String>> {
        sqlx::query_scalar::<_, String>(
            "SELECT token FROM chandrive.bot_tokens \
             WHERE user_id = $1 AND channel_id = $2 ORDER BY token",
        )
        .bind(user_id)
        .bind(channel_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to fetch bot tokens", e))
    }
}
