//! Application error type mapping to HTTP status codes.
//!
//! Every error body is `{"error": "<message>"}`.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;

use causerie_types::error::ConversationError;

/// Application-level error that maps to HTTP responses.
#[derive(Debug)]
pub enum AppError {
    /// Conversation-related errors.
    Conversation(ConversationError),
    /// Malformed or incomplete request.
    Validation(String),
}

impl From<ConversationError> for AppError {
    fn from(e: ConversationError) -> Self {
        AppError::Conversation(e)
    }
}

impl AppError {
    fn status_and_message(&self) -> (StatusCode, String) {
        match self {
            AppError::Conversation(ConversationError::EmptyInput) => {
                (StatusCode::BAD_REQUEST, "No prompt provided".to_string())
            }
            AppError::Conversation(ConversationError::NotFound) => {
                (StatusCode::NOT_FOUND, "Conversation not found".to_string())
            }
            AppError::Conversation(e) => (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()),
            AppError::Validation(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = self.status_and_message();

        if status.is_server_error() {
            tracing::error!(error = %message, "Request failed");
        }

        (status, Json(json!({ "error": message }))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use causerie_types::error::RepositoryError;
    use causerie_types::llm::LlmError;

    #[test]
    fn test_status_mapping() {
        let cases = [
            (AppError::from(ConversationError::EmptyInput), StatusCode::BAD_REQUEST),
            (AppError::from(ConversationError::NotFound), StatusCode::NOT_FOUND),
            (
                AppError::from(ConversationError::Repository(RepositoryError::Query("disk I/O error".to_string()))),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
            (
                AppError::from(ConversationError::Inference(LlmError::AuthenticationFailed)),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
            (
                AppError::Validation("conversation_id is required".to_string()),
                StatusCode::BAD_REQUEST,
            ),
        ];

        for (err, expected) in cases {
            assert_eq!(err.into_response().status(), expected);
        }
    }

    #[test]
    fn test_inference_failure_message_is_surfaced() {
        let err = AppError::from(ConversationError::Inference(LlmError::Overloaded(
            "busy".to_string(),
        )));
        let (_, message) = err.status_and_message();
        assert_eq!(message, "inference error: provider overloaded: busy");
    }
}
