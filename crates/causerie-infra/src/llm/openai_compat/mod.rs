//! Provider for servers exposing the OpenAI text-completions protocol.
//!
//! vLLM, LM Studio, Ollama and llama.cpp's own `/v1` routes all accept the
//! legacy `/completions` request, which takes a raw prompt rather than chat
//! messages.

pub mod client;
pub mod types;

pub use client::OpenAiCompletionsProvider;
