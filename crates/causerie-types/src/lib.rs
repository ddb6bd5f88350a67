//! Shared domain types for Causerie.
//!
//! Conversations, turns, inference request/response shapes, configuration,
//! and the error enums shared by every layer.
//!
//! Zero infrastructure dependencies -- only serde, uuid, chrono, thiserror.

pub mod config;
pub mod conversation;
pub mod error;
pub mod llm;
