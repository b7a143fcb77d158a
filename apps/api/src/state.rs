use std::sync::Arc;

use sqlx::PgPool;

use crate::config::Config;
use crate::llm_client::CompletionClient;
use crate::storage::blobs::BlobStore;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub db: PgPool,
    /// Uploaded resume storage. S3 in production.
    pub blobs: Arc<dyn BlobStore>,
    /// Completion client. Gemini in production, a fake in tests.
    pub llm: Arc<dyn CompletionClient>,
    pub config: Config,
}
