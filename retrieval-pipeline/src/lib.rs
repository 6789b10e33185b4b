#![allow(clippy::missing_docs_in_private_items)]

pub mod answer;
pub mod prompt;

use common::{
    error::AppError,
    storage::{
        db::SurrealDbClient,
        types::{index_entry::IndexEntry, StoredObject},
    },
    utils::embedding::EmbeddingProvider,
};
use serde::Deserialize;
use tracing::{debug, instrument};

/// Search breadth for the HNSW knn operator.
const KNN_EF: usize = 40;

/// A stored chunk returned by the similarity search, ordered by ascending
/// distance to the query embedding.
#[derive(Debug, Clone, Deserialize)]
pub struct RetrievedChunk {
    pub content: String,
    pub content_hash: String,
    pub distance: f32,
}

/// Finds the `top_k` stored chunks closest to the (already normalized)
/// query. An empty store or no sufficiently similar neighbors yields an
/// empty vector, never an error.
#[instrument(skip_all, fields(top_k))]
pub async fn retrieve_chunks(
    db: &SurrealDbClient,
    embedding_provider: &EmbeddingProvider,
    query: &str,
    top_k: u8,
) -> Result<Vec<RetrievedChunk>, AppError> {
    let query_embedding = embedding_provider.embed(query).await?;

    let knn_query = format!(
        "SELECT content, content_hash, vector::distance::knn() AS distance \
         FROM {} WHERE embedding <|{top_k},{KNN_EF}|> $embedding ORDER BY distance",
        IndexEntry::table_name()
    );

    let mut response = db
        .query(knn_query)
        .bind(("embedding", query_embedding))
        .await?;
    let chunks: Vec<RetrievedChunk> = response.take(0)?;

    debug!(found = chunks.len(), "similarity search complete");
    Ok(chunks)
}
