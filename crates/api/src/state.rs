use std::sync::Arc;

use showcase_core::photo::PhotoIngestor;
use showcase_db::admission::VoteAdmission;
use tokio::sync::Semaphore;

use crate::config::ServerConfig;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// Cheaply cloneable: inner data is behind `Arc` or is already `Clone`.
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool.
    pub pool: showcase_db::DbPool,
    pub config: Arc<ServerConfig>,
    pub ingestor: Arc<PhotoIngestor>,
    pub admission: Arc<VoteAdmission>,
    /// Bounds concurrent CPU-bound photo ingestions.
    pub ingest_permits: Arc<Semaphore>,
}

impl AppState {
    /// Build state whose engines are configured from `config`.
    pub fn new(pool: showcase_db::DbPool, config: ServerConfig) -> Self {
        let ingestor = PhotoIngestor::new(config.ingest_config());
        let admission = VoteAdmission::new(config.vote_policy());
        let ingest_permits = Semaphore::new(config.max_concurrent_ingestions.max(1));

        Self {
            pool,
            config: Arc::new(config),
            ingestor: Arc::new(ingestor),
            admission: Arc::new(admission),
            ingest_permits: Arc::new(ingest_permits),
        }
    }
}
