//! Conversation orchestration for Causerie.
//!
//! - `context`: prompt assembly and sanitation of user/bot text
//! - `service`: `ConversationService`, the turn orchestrator

pub mod context;
pub mod service;
