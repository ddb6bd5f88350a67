//! Conversation and turn types.
//!
//! A conversation groups a system prompt with an append-only list of turns.
//! Each turn is one user prompt paired with the bot's sanitized reply.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use std::fmt;

/// System prompt used when a conversation is created without one.
pub const DEFAULT_SYSTEM_PROMPT: &str = "Tu es un assistant utile.";

/// Opaque conversation identifier.
///
/// New identifiers are random UUID v4 values (122 bits of entropy, unguessable).
/// Identifiers arriving from callers are kept verbatim, so lookups of unknown or
/// malformed ids simply find nothing.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConversationId(pub String);

impl ConversationId {
    /// Generate a fresh random identifier.
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ConversationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for ConversationId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for ConversationId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// A conversation: its identifier and the system prompt prefixed to every generation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Conversation {
    pub id: ConversationId,
    pub system_prompt: String,
    pub created_at: DateTime<Utc>,
}

impl Conversation {
    /// Build a new conversation with a fresh identifier.
    pub fn new(system_prompt: impl Into<String>) -> Self {
        Self {
            id: ConversationId::generate(),
            system_prompt: system_prompt.into(),
            created_at: Utc::now(),
        }
    }
}

/// One recorded user-prompt/bot-response pair. Immutable once written.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Turn {
    /// Store-wide sequence number; later turns always have larger ids.
    pub id: i64,
    pub conversation_id: ConversationId,
    pub user_text: String,
    pub bot_text: String,
    pub created_at: DateTime<Utc>,
}

/// A turn that has not been persisted yet (no sequence id).
#[derive(Debug, Clone, PartialEq)]
pub struct NewTurn {
    pub conversation_id: ConversationId,
    pub user_text: String,
    pub bot_text: String,
}

/// Result of a successful generation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeneratedReply {
    pub conversation_id: ConversationId,
    pub reply: String,
}

/// Aggregate counts across the whole store.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreStats {
    pub conversations: u64,
    pub turns: u64,
}
