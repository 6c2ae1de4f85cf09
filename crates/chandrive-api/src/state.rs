//! Application state shared across all handlers.

use std::sync::Arc;

use sqlx::PgPool;

use chandrive_cache::CacheManager;
use chandrive_core::config::AppConfig;
use chandrive_database::repositories::channel::ChannelRepository;
use chandrive_database::repositories::file::FileRepository;
use chandrive_database::repositories::session::SessionRepository;
use chandrive_database::repositories::upload::UploadRepository;
use chandrive_engine::{CopyEngine, DownloadEngine, StreamWorkers, UploadEngine};

/// Application state containing all shared dependencies.
///
/// Passed to every axum handler via `State<AppState>`. All fields are
/// `Arc`-wrapped (or internally shared) for cheap cloning across tasks.
#[derive(Clone)]
pub struct AppState {
    /// Application configuration.
    pub config: Arc<AppConfig>,
    /// PostgreSQL connection pool.
    pub db_pool: PgPool,
    /// Shared metadata cache.
    pub cache: CacheManager,

    /// File repository.
    pub file_repo: Arc<FileRepository>,
    /// Upload-part repository.
    pub upload_repo: Arc<UploadRepository>,
    /// Channel and bot-token repository.
    pub channel_repo: Arc<ChannelRepository>,
    /// Session repository.
    pub session_repo: Arc<SessionRepository>,

    /// Upload engine.
    pub upload_engine: Arc<UploadEngine>,
    /// Copy engine.
    pub copy_engine: Arc<CopyEngine>,
    /// Download engine.
    pub download_engine: Arc<DownloadEngine>,
}

impl AppState {
    /// Wire repositories, cache, pools, and engines from configuration.
    pub fn new(config: AppConfig, db_pool: PgPool) -> Self {
        let cache = CacheManager::new(&config.cache);

        let file_repo = Arc::new(FileRepository::new(db_pool.clone()));
        let upload_repo = Arc::new(UploadRepository::new(db_pool.clone()));
        let channel_repo = Arc::new(ChannelRepository::new(db_pool.clone()));
        let session_repo = Arc::new(SessionRepository::new(db_pool.clone()));

        let stream_workers = Arc::new(StreamWorkers::new(config.engine.bg_bots_limit));

        let upload_engine = Arc::new(UploadEngine::new(
            Arc::clone(&upload_repo),
            Arc::clone(&channel_repo),
            config.remote.clone(),
        ));
        let copy_engine = Arc::new(CopyEngine::new(
            Arc::clone(&file_repo),
            config.remote.clone(),
        ));
        let download_engine = Arc::new(DownloadEngine::new(
            Arc::clone(&file_repo),
            Arc::clone(&session_repo),
            Arc::clone(&channel_repo),
            cache.clone(),
            stream_workers,
            config.remote.clone(),
            config.engine.clone(),
        ));

        Self {
            config: Arc::new(config),
            db_pool,
            cache,
            file_repo,
            upload_repo,
            channel_repo,
            session_repo,
            upload_engine,
            copy_engine,
            download_engine,
        }
    }
}
