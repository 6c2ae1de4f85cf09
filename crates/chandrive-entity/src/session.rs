//! Session entity model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// An authenticated platform session.
///
/// The `hash` is handed to clients and resolved back here for both the
/// JSON API and the stream endpoint's `hash` query parameter. The
/// `session` string is the platform credential used for user-client login.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Session {
    /// Opaque lookup hash.
    pub hash: String,
    /// Owning user.
    pub user_id: i64,
    /// Serialized platform session credential.
    pub session: String,
    /// When the session was created.
    pub created_at: DateTime<Utc>,
}
