//! Session repository.

use sqlx::PgPool;

use chandrive_core::error::{AppError, ErrorKind};
use chandrive_core::result::AppResult;
use chandrive_entity::session::Session;

/// Repository for rows in `chandrive.sessions`.
#[derive(Debug, Clone)]
pub struct SessionRepository {
    pool: PgPool,
}

impl SessionRepository {
    /// Create a new session repository.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Resolve a session by its lookup hash.
    pub async fn find_by_hash(&self, hash: &str) -> AppResult<Option<Session>> {
        sqlx::query_as::<_, Session>("SELECT * FROM chandrive.sessions WHERE hash = $1")
            .bind(hash)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to find session", e))
    }
}
