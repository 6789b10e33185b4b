use common::{
    storage::db::SurrealDbClient,
    utils::{config::get_config, embedding::EmbeddingProvider},
};
use indexing_pipeline::IndexingPipeline;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// One-shot indexing run against the configured data source. The same
/// merge also happens lazily on the first query; this binary exists so
/// operators can (re)index ahead of traffic.
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::from_default_env())
        .try_init()
        .ok();

    let config = get_config()?;

    let db = Arc::new(SurrealDbClient::open(&config.index_db_path).await?);

    let openai_client = Arc::new(async_openai::Client::with_config(
        async_openai::config::OpenAIConfig::new()
            .with_api_key(&config.openai_api_key)
            .with_api_base(&config.openai_base_url),
    ));
    let embedding_provider = Arc::new(EmbeddingProvider::from_config(&config, openai_client)?);

    db.ensure_indexes(embedding_provider.dimension()).await?;

    let pipeline = IndexingPipeline::new(db, embedding_provider, config)?;
    let report = pipeline.run().await?;

    info!(
        loaded = report.loaded,
        kept = report.kept,
        chunks = report.chunks,
        inserted = report.inserted,
        skipped = report.skipped,
        total_stored = report.total_stored,
        "indexing finished"
    );

    Ok(())
}
