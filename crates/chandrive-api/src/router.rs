//! Route definitions for the chandrive HTTP API.
//!
//! All routes are mounted under `/api`. GET routes also serve HEAD; the
//! stream handler inspects the method and skips body work for HEAD.

use axum::{
    Router,
    extract::DefaultBodyLimit,
    routing::{get, post},
};
use tower_http::trace::TraceLayer;

use crate::handlers;
use crate::state::AppState;

/// Build the complete axum router with all routes and middleware.
pub fn build_router(state: AppState) -> Router {
    let max_body = state.config.server.max_body_size_bytes as usize;

    let api_routes = Router::new()
        .route(
            "/files",
            post(handlers::file::create_file).get(handlers::file::list_files),
        )
        .route("/files/mkdir", post(handlers::file::make_directory))
        .route("/files/copy", post(handlers::file::copy_file))
        .route("/files/move", post(handlers::file::move_files))
        .route("/files/delete", post(handlers::file::delete_files))
        .route(
            "/files/directories/move",
            post(handlers::file::move_directory),
        )
        .route(
            "/files/{file_id}",
            get(handlers::file::get_file).patch(handlers::file::update_file),
        )
        .route(
            "/files/{file_id}/stream",
            get(handlers::stream::stream_file),
        )
        .route(
            "/uploads/{id}",
            post(handlers::upload::upload_part)
                .put(handlers::upload::upload_part)
                .get(handlers::upload::list_upload_parts)
                .delete(handlers::upload::delete_upload),
        )
        .route(
            "/uploads/{id}/parts",
            post(handlers::upload::create_upload_part),
        );

    Router::new()
        .nest("/api", api_routes)
        .layer(DefaultBodyLimit::max(max_body))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
