use axum::{
    extract::{rejection::JsonRejection, State},
    Json,
};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::{api_state::ApiState, error::ApiError};

#[derive(Debug, Default, Deserialize)]
pub struct ChatRequest {
    /// Missing or null is treated as an empty question.
    #[serde(default)]
    pub question: Option<String>,
    #[serde(default)]
    pub session_id: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ChatResponse {
    pub answer: String,
    pub session_id: String,
    pub sources: Vec<String>,
}

pub async fn chat(
    State(state): State<ApiState>,
    payload: Result<Json<ChatRequest>, JsonRejection>,
) -> Result<Json<ChatResponse>, ApiError> {
    let Json(request) = payload.map_err(|rejection| ApiError::ValidationError(rejection.body_text()))?;
    let question = request.question.unwrap_or_default();

    info!(
        question_chars = question.chars().count(),
        has_session = request.session_id.is_some(),
        "Received chat request"
    );

    let answer = state
        .chain
        .ask(request.session_id.as_deref(), &question)
        .await?;

    Ok(Json(ChatResponse {
        answer: answer.answer,
        session_id: answer.session_id,
        sources: answer.sources,
    }))
}
