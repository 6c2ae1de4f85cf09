//! `AuthUser` extractor — resolves the bearer token to a session row.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;

use chandrive_cache::keys;
use chandrive_core::error::AppError;
use chandrive_entity::session::Session;

use crate::state::AppState;

/// Extracted authenticated session available in handlers.
#[derive(Debug, Clone)]
pub struct AuthUser(pub Session);

impl std::ops::Deref for AuthUser {
    type Target = Session;
    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let auth_header = parts
            .headers
            .get("authorization")
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| AppError::unauthorized("Missing Authorization header"))?;

        let hash = auth_header
            .strip_prefix("Bearer ")
            .ok_or_else(|| AppError::unauthorized("Invalid Authorization header format"))?;

        let key = keys::session_by_hash(hash);
        if let Some(session) = state.cache.get_json::<Session>(&key).await? {
            return Ok(AuthUser(session));
        }

        let session = state
            .session_repo
            .find_by_hash(hash)
            .await?
            .ok_or_else(|| AppError::unauthorized("Invalid session"))?;
        state.cache.set_json(&key, &session).await?;

        Ok(AuthUser(session))
    }
}
