//! Application builder — wires state and router, then serves.

use sqlx::PgPool;
use tracing::info;

use chandrive_core::config::AppConfig;
use chandrive_core::error::AppError;
use chandrive_core::result::AppResult;

use crate::router::build_router;
use crate::state::AppState;

/// Build the application state and serve HTTP until shutdown.
pub async fn run_server(config: AppConfig, db_pool: PgPool) -> AppResult<()> {
    let addr = format!("{}:{}", config.server.host, config.server.port);
    let state = AppState::new(config, db_pool);
    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| AppError::internal(format!("Failed to bind {addr}: {e}")))?;

    info!(%addr, "chandrive listening");
    axum::serve(listener, app)
        .await
        .map_err(|e| AppError::internal(format!("Server error: {e}")))
}
