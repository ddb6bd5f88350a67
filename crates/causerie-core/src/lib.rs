//! Business logic and repository trait definitions for Causerie.
//!
//! This crate defines the "ports" (repository and inference provider traits)
//! that the infrastructure layer implements, plus the turn orchestration logic.
//! It depends only on `causerie-types` -- never on `causerie-infra` or any
//! database/IO crate.

pub mod conversation;
pub mod llm;
pub mod repository;
