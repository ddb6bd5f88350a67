//! llama.cpp server `/completion` wire types.
//!
//! Only the fields Causerie sends or reads are modelled; the server returns
//! many more (timings, generation settings) which serde ignores.

use serde::{Deserialize, Serialize};

/// Request body for `POST /completion`.
#[derive(Debug, Clone, Serialize)]
pub struct LlamaCompletionRequest {
    pub prompt: String,
    pub n_predict: u32,
    pub temperature: f64,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub stop: Vec<String>,
    pub stream: bool,
    /// Reuse the KV cache for the shared prompt prefix between turns.
    pub cache_prompt: bool,
}

/// Non-streaming response from `POST /completion`.
#[derive(Debug, Clone, Deserialize)]
pub struct LlamaCompletionResponse {
    pub content: String,
    #[serde(default)]
    pub model: Option<String>,
    /// `"eos"`, `"word"` (stop string), `"limit"` (n_predict), or `"none"`.
    #[serde(default)]
    pub stop_type: Option<String>,
    #[serde(default)]
    pub tokens_evaluated: Option<u32>,
    #[serde(default)]
    pub tokens_predicted: Option<u32>,
}
