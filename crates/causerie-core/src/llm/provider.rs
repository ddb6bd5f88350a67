//! LlmProvider trait definition.
//!
//! This is the core abstraction that every inference backend implements.

use causerie_types::llm::{CompletionRequest, CompletionResponse, LlmError};

/// Trait for text-completion backends (llama.cpp server, OpenAI-compatible, ...).
///
/// Uses native async fn in traits (RPITIT, Rust 2024 edition).
/// Implementations live in causerie-infra (e.g., `LlamaCppProvider`).
pub trait LlmProvider: Send + Sync {
    /// Human-readable provider name (e.g., "llama_cpp", "openai_compatible").
    fn name(&self) -> &str;

    /// Send a completion request and receive the full generated text.
    fn complete(
        &self,
        request: &CompletionRequest,
    ) -> impl std::future::Future<Output = Result<CompletionResponse, LlmError>> + Send;
}
