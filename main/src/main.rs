use api_router::{api_routes_v1, api_state::ApiState};
use common::{
    storage::db::SurrealDbClient,
    utils::{config::get_config, embedding::EmbeddingProvider},
};
use retrieval_pipeline::answer::{LlmClient, OpenAiLlmClient};
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Set up tracing
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::from_default_env())
        .try_init()
        .ok();

    // Get config
    let config = get_config()?;

    // Open the persistent collection once; indexer and retriever share
    // this handle for the process lifetime.
    let db = Arc::new(SurrealDbClient::open(&config.index_db_path).await?);

    let openai_client = Arc::new(async_openai::Client::with_config(
        async_openai::config::OpenAIConfig::new()
            .with_api_key(&config.openai_api_key)
            .with_api_base(&config.openai_base_url),
    ));

    let embedding_provider = Arc::new(EmbeddingProvider::from_config(
        &config,
        Arc::clone(&openai_client),
    )?);
    info!(
        embedding_backend = embedding_provider.backend_label(),
        embedding_dimension = embedding_provider.dimension(),
        "Embedding provider initialized"
    );

    db.ensure_indexes(embedding_provider.dimension()).await?;

    let llm: Arc<dyn LlmClient> = Arc::new(OpenAiLlmClient::new(
        openai_client,
        config.llm_model_name.clone(),
        config.llm_timeout_secs,
    ));

    let state = ApiState::new(db, config.clone(), embedding_provider, llm)?;
    let app = api_routes_v1().with_state(state);

    let listener =
        tokio::net::TcpListener::bind((config.api_host.as_str(), config.api_port)).await?;
    info!("listening on {}", listener.local_addr()?);
    axum::serve(listener, app).await?;

    Ok(())
}
