//! Conversation repository trait definition.

use std::collections::HashMap;

use causerie_types::conversation::{Conversation, ConversationId, NewTurn, Turn};
use causerie_types::error::RepositoryError;

/// Repository trait for conversations and their turns.
///
/// Implementations live in causerie-infra (e.g., `SqliteConversationRepository`).
/// Uses native async fn in traits (Rust 2024 edition, no async_trait macro).
pub trait ConversationRepository: Send + Sync {
    /// Create a new conversation. Returns the created conversation.
    fn create_conversation(
        &self,
        conversation: &Conversation,
    ) -> impl std::future::Future<Output = Result<Conversation, RepositoryError>> + Send;

    /// Get a conversation by its identifier.
    fn get_conversation(
        &self,
        id: &ConversationId,
    ) -> impl std::future::Future<Output = Result<Option<Conversation>, RepositoryError>> + Send;

    /// List every conversation, oldest first.
    fn list_conversations(
        &self,
    ) -> impl std::future::Future<Output = Result<Vec<Conversation>, RepositoryError>> + Send;

    /// Replace a conversation's system prompt.
    ///
    /// Returns `false` when no conversation has this id.
    fn update_system_prompt(
        &self,
        id: &ConversationId,
        system_prompt: &str,
    ) -> impl std::future::Future<Output = Result<bool, RepositoryError>> + Send;

    /// Delete a conversation and all of its turns atomically.
    ///
    /// Returns `false` when no conversation has this id.
    fn delete_conversation(
        &self,
        id: &ConversationId,
    ) -> impl std::future::Future<Output = Result<bool, RepositoryError>> + Send;

    /// Delete every turn and every conversation atomically.
    fn reset(&self) -> impl std::future::Future<Output = Result<(), RepositoryError>> + Send;

    /// Append a turn to an existing conversation.
    ///
    /// Fails with `RepositoryError::NotFound` if the conversation does not exist.
    fn append_turn(
        &self,
        turn: &NewTurn,
    ) -> impl std::future::Future<Output = Result<Turn, RepositoryError>> + Send;

    /// All turns of a conversation in creation order. Empty for unknown ids.
    fn get_turns(
        &self,
        id: &ConversationId,
    ) -> impl std::future::Future<Output = Result<Vec<Turn>, RepositoryError>> + Send;

    /// The `limit` most recent turns of a conversation, oldest first.
    fn get_recent_turns(
        &self,
        id: &ConversationId,
        limit: u32,
    ) -> impl std::future::Future<Output = Result<Vec<Turn>, RepositoryError>> + Send;

    /// Count all conversations.
    fn count_conversations(
        &self,
    ) -> impl std::future::Future<Output = Result<u64, RepositoryError>> + Send;

    /// Count all turns across all conversations.
    fn count_turns(&self) -> impl std::future::Future<Output = Result<u64, RepositoryError>> + Send;

    /// Turn count per conversation. Conversations without turns are absent.
    fn count_turns_by_conversation(
        &self,
    ) -> impl std::future::Future<Output = Result<HashMap<ConversationId, u64>, RepositoryError>> + Send;
}
