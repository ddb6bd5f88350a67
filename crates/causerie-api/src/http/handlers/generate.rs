//! POST /generate - run one turn through the orchestrator.

use axum::Json;
use axum::extract::State;
use serde::{Deserialize, Serialize};

use causerie_types::conversation::ConversationId;
use causerie_types::error::ConversationError;

use crate::http::error::AppError;
use crate::state::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct GenerateRequest {
    #[serde(default)]
    pub conversation_id: Option<String>,
    #[serde(default)]
    pub prompt: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct GenerateResponse {
    pub response: String,
    pub conversation_id: ConversationId,
}

/// POST /generate - `{conversation_id, prompt}` to `{response, conversation_id}`.
///
/// An empty prompt is rejected before the conversation id is looked at.
pub async fn generate(
    State(state): State<AppState>,
    body: Option<Json<GenerateRequest>>,
) -> Result<Json<GenerateResponse>, AppError> {
    let req = body.map(|Json(b)| b).unwrap_or_default();

    let prompt = req.prompt.unwrap_or_default();
    if prompt.trim().is_empty() {
        return Err(ConversationError::EmptyInput.into());
    }

    let conversation_id = req
        .conversation_id
        .map(ConversationId::from)
        .ok_or_else(|| AppError::Validation("conversation_id is required".to_string()))?;

    let reply = state
        .conversation_service
        .generate(&conversation_id, &prompt)
        .await?;

    Ok(Json(GenerateResponse {
        response: reply.reply,
        conversation_id: reply.conversation_id,
    }))
}
