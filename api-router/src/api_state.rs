use std::sync::Arc;

use common::{
    error::AppError,
    storage::{db::SurrealDbClient, types::index_meta::IndexMeta},
    utils::{config::AppConfig, embedding::EmbeddingProvider},
};
use indexing_pipeline::IndexingPipeline;
use retrieval_pipeline::answer::LlmClient;
use tokio::sync::Mutex;
use tracing::info;

/// Shared state for the query surface. Owns the store handle for the
/// process lifetime; the indexing pipeline writes through it, the
/// retriever reads through it.
#[derive(Clone)]
pub struct ApiState {
    pub db: Arc<SurrealDbClient>,
    pub config: AppConfig,
    pub embedding_provider: Arc<EmbeddingProvider>,
    pub llm: Arc<dyn LlmClient>,
    indexing: Arc<IndexingPipeline>,
    bootstrap_lock: Arc<Mutex<()>>,
}

impl ApiState {
    pub fn new(
        db: Arc<SurrealDbClient>,
        config: AppConfig,
        embedding_provider: Arc<EmbeddingProvider>,
        llm: Arc<dyn LlmClient>,
    ) -> Result<Self, AppError> {
        let indexing = Arc::new(IndexingPipeline::new(
            Arc::clone(&db),
            Arc::clone(&embedding_provider),
            config.clone(),
        )?);

        Ok(Self {
            db,
            config,
            embedding_provider,
            llm,
            indexing,
            bootstrap_lock: Arc::new(Mutex::new(())),
        })
    }

    /// Whether the collection has been bootstrapped.
    pub async fn is_ready(&self) -> Result<bool, AppError> {
        Ok(IndexMeta::get_current(&self.db).await?.is_some())
    }

    /// Uninitialized -> Ready transition: builds the collection from the
    /// configured data source if it does not exist yet. The lock keeps
    /// concurrent first requests from racing the bootstrap; the marker
    /// re-check after acquiring it makes the bootstrap at-most-once.
    pub async fn ensure_ready(&self) -> Result<(), AppError> {
        if self.is_ready().await? {
            return Ok(());
        }

        let _guard = self.bootstrap_lock.lock().await;
        if self.is_ready().await? {
            return Ok(());
        }

        info!("collection not bootstrapped; running indexing pipeline");
        self.indexing.run().await?;

        Ok(())
    }
}
