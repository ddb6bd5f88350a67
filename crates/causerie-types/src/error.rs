use thiserror::Error;

use crate::llm::LlmError;

/// Errors from repository operations (used by trait definitions in causerie-core).
#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("query error: {0}")]
    Query(String),

    #[error("entity not found")]
    NotFound,

    #[error("conflict: {0}")]
    Conflict(String),
}

/// Errors surfaced by conversation operations.
#[derive(Debug, Error)]
pub enum ConversationError {
    #[error("no prompt provided")]
    EmptyInput,

    #[error("conversation not found")]
    NotFound,

    #[error("storage error: {0}")]
    Repository(#[from] RepositoryError),

    #[error("inference error: {0}")]
    Inference(#[from] LlmError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_repository_error_display() {
        let err = RepositoryError::Query("syntax error".to_string());
        assert_eq!(err.to_string(), "query error: syntax error");
    }

    #[test]
    fn test_conversation_error_wraps_sources() {
        let err: ConversationError = RepositoryError::NotFound.into();
        assert_eq!(err.to_string(), "storage error: entity not found");

        let err: ConversationError = LlmError::AuthenticationFailed.into();
        assert_eq!(err.to_string(), "inference error: authentication failed");
    }
}
