//! Infrastructure layer for Causerie.
//!
//! Contains implementations of the traits defined in `causerie-core`:
//! SQLite conversation storage, HTTP clients for inference servers, and the
//! `config.toml` loader.

pub mod config;
pub mod llm;
pub mod sqlite;
