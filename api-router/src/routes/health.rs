use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use common::error::AppError;
use serde_json::json;
use tracing::warn;

use crate::api_state::ApiState;

/// Always 200 while the process is up.
pub async fn live() -> impl IntoResponse {
    (StatusCode::OK, Json(json!({"status": "ok"})))
}

/// 200 when the vector store answers queries, 503 otherwise.
pub async fn ready(State(state): State<ApiState>) -> impl IntoResponse {
    let check = async {
        state.db.ping().await.map_err(AppError::from)?;
        state.index.count().await
    };

    match check.await {
        Ok(chunks) => (
            StatusCode::OK,
            Json(json!({
                "status": "ok",
                "checks": { "vector_store": "ok" },
                "chunks": chunks
            })),
        ),
        Err(e) => {
            warn!(error = %e, "readiness check failed");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({
                    "status": "error",
                    "checks": { "vector_store": "fail" },
                    "reason": e.to_string()
                })),
            )
        }
    }
}
