use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use serde_json::json;

use crate::api_state::ApiState;

/// Readiness probe: 200 once the collection has been bootstrapped, 503
/// before the first indexing run or when the store is unreachable.
pub async fn ready(State(state): State<ApiState>) -> impl IntoResponse {
    match state.is_ready().await {
        Ok(true) => (
            StatusCode::OK,
            Json(json!({
                "status": "ok",
                "checks": { "index": "ok" }
            })),
        ),
        Ok(false) => (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(json!({
                "status": "error",
                "checks": { "index": "not bootstrapped" }
            })),
        ),
        Err(e) => (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(json!({
                "status": "error",
                "checks": { "index": "fail" },
                "reason": e.to_string()
            })),
        ),
    }
}
