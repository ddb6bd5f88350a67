//! llama.cpp `llama-server` provider.
//!
//! Talks to the native `/completion` endpoint, which accepts a raw prompt
//! string and needs no chat template.

pub mod client;
pub mod types;

pub use client::LlamaCppProvider;
