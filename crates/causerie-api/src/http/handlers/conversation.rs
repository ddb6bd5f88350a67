//! Conversation lifecycle HTTP handlers.
//!
//! Endpoints:
//! - POST   /new_conversation               - Create a conversation
//! - GET    /get_conversation/{id}          - All turns of a conversation
//! - GET    /list_conversations             - Every conversation id
//! - POST   /update_pre_prompt/{id}         - Replace the system prompt
//! - GET    /get_pre_prompt/{id}            - Read the system prompt
//! - DELETE /delete_conversation/{id}       - Delete a conversation and its turns
//! - POST   /reset_db                       - Delete everything

use axum::Json;
use axum::extract::{Path, State};
use serde::{Deserialize, Serialize};

use causerie_types::conversation::ConversationId;

use crate::http::error::AppError;
use crate::state::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct NewConversationRequest {
    #[serde(default)]
    pub pre_prompt: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct NewConversationResponse {
    pub conversation_id: ConversationId,
}

#[derive(Debug, Serialize)]
pub struct MessageView {
    pub user: String,
    pub bot: String,
}

#[derive(Debug, Serialize)]
pub struct ConversationView {
    pub conversation_id: ConversationId,
    pub messages: Vec<MessageView>,
}

#[derive(Debug, Serialize)]
pub struct ConversationList {
    pub conversations: Vec<ConversationId>,
}

#[derive(Debug, Default, Deserialize)]
pub struct UpdatePrePromptRequest {
    #[serde(default)]
    pub pre_prompt: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct PrePromptView {
    pub pre_prompt: String,
}

#[derive(Debug, Serialize)]
pub struct ActionResponse {
    pub message: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub conversation_id: Option<ConversationId>,
}

/// POST /new_conversation - Create a conversation.
///
/// The body is optional; without `pre_prompt` the default system prompt applies.
pub async fn new_conversation(
    State(state): State<AppState>,
    body: Option<Json<NewConversationRequest>>,
) -> Result<Json<NewConversationResponse>, AppError> {
    let req = body.map(|Json(b)| b).unwrap_or_default();

    let conversation = state
        .conversation_service
        .create_conversation(req.pre_prompt)
        .await?;

    Ok(Json(NewConversationResponse {
        conversation_id: conversation.id,
    }))
}

/// GET /get_conversation/{id} - Turns oldest first; unknown ids yield an empty list.
pub async fn get_conversation(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<ConversationView>, AppError> {
    let conversation_id = ConversationId::from(id);
    let turns = state.conversation_service.get_turns(&conversation_id).await?;

    let messages = turns
        .into_iter()
        .map(|t| MessageView {
            user: t.user_text,
            bot: t.bot_text,
        })
        .collect();

    Ok(Json(ConversationView {
        conversation_id,
        messages,
    }))
}

/// GET /list_conversations - Every conversation id in creation order.
pub async fn list_conversations(
    State(state): State<AppState>,
) -> Result<Json<ConversationList>, AppError> {
    let conversations = state
        .conversation_service
        .list_conversations()
        .await?
        .into_iter()
        .map(|c| c.id)
        .collect();

    Ok(Json(ConversationList { conversations }))
}

/// POST /update_pre_prompt/{id} - Replace the system prompt.
///
/// A missing `pre_prompt` sets it to the empty string.
pub async fn update_pre_prompt(
    State(state): State<AppState>,
    Path(id): Path<String>,
    body: Option<Json<UpdatePrePromptRequest>>,
) -> Result<Json<ActionResponse>, AppError> {
    let conversation_id = ConversationId::from(id);
    let req = body.map(|Json(b)| b).unwrap_or_default();
    let pre_prompt = req.pre_prompt.unwrap_or_default();

    state
        .conversation_service
        .update_system_prompt(&conversation_id, &pre_prompt)
        .await?;

    Ok(Json(ActionResponse {
        message: "System prompt updated",
        conversation_id: Some(conversation_id),
    }))
}

/// GET /get_pre_prompt/{id} - 404 when the conversation does not exist.
pub async fn get_pre_prompt(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<PrePromptView>, AppError> {
    let pre_prompt = state
        .conversation_service
        .get_system_prompt(&ConversationId::from(id))
        .await?;

    Ok(Json(PrePromptView { pre_prompt }))
}

/// DELETE /delete_conversation/{id} - Remove turns, then the conversation.
pub async fn delete_conversation(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<ActionResponse>, AppError> {
    let conversation_id = ConversationId::from(id);
    state
        .conversation_service
        .delete_conversation(&conversation_id)
        .await?;

    Ok(Json(ActionResponse {
        message: "Conversation deleted",
        conversation_id: Some(conversation_id),
    }))
}

/// POST /reset_db - Delete every turn and conversation.
pub async fn reset_db(State(state): State<AppState>) -> Result<Json<ActionResponse>, AppError> {
    state.conversation_service.reset().await?;

    Ok(Json(ActionResponse {
        message: "Database reset",
        conversation_id: None,
    }))
}
