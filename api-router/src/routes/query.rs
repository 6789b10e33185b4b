use axum::{extract::State, Json};
use common::utils::text::normalize;
use retrieval_pipeline::{
    prompt::{build_prompt, NOTHING_FOUND_ANSWER},
    retrieve_chunks,
};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::{api_state::ApiState, error::ApiError};

#[derive(Debug, Deserialize)]
pub struct QueryRequest {
    pub query: String,
}

#[derive(Debug, Serialize)]
pub struct QueryResponse {
    pub answer: String,
}

/// Answers one query: makes sure the collection is bootstrapped,
/// retrieves the closest chunks for the normalized query and either
/// short-circuits with the fixed nothing-found answer or asks the LLM
/// with the assembled context prompt.
pub async fn query_endpoint(
    State(state): State<ApiState>,
    Json(request): Json<QueryRequest>,
) -> Result<Json<QueryResponse>, ApiError> {
    if request.query.trim().is_empty() {
        return Err(ApiError::ValidationError("query must not be empty".into()));
    }

    // Any failure to reach Ready is unavailability, whatever stage of
    // the bootstrap it came from.
    state
        .ensure_ready()
        .await
        .map_err(|e| ApiError::ServiceUnavailable(e.to_string()))?;

    // Same canonical form as at indexing time, so the embeddings match.
    let normalized = normalize(&request.query);
    info!(query = %normalized, "received query");

    let chunks = retrieve_chunks(
        &state.db,
        &state.embedding_provider,
        &normalized,
        state.config.retrieval_top_k,
    )
    .await?;

    if chunks.is_empty() {
        info!("no relevant chunks found; returning fallback answer");
        return Ok(Json(QueryResponse {
            answer: NOTHING_FOUND_ANSWER.to_string(),
        }));
    }

    let contexts: Vec<String> = chunks.into_iter().map(|chunk| chunk.content).collect();
    let prompt = build_prompt(&normalized, &contexts);

    let answer = state.llm.answer(prompt).await?;
    Ok(Json(QueryResponse { answer }))
}
