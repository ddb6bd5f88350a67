//! Inference request/response types for Causerie.
//!
//! The inference engine is a plain text-completion collaborator: it receives
//! one prompt string plus sampling parameters and returns generated text.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Request to an inference provider for a text completion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompletionRequest {
    pub prompt: String,
    pub max_tokens: u32,
    pub temperature: f64,
    /// Generation halts at the first occurrence of any of these.
    #[serde(default)]
    pub stop_sequences: Vec<String>,
}

/// Response from an inference provider.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompletionResponse {
    /// Raw generated text, before any sanitation.
    pub text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    pub stop_reason: StopReason,
    pub usage: Usage,
}

/// Reason why the engine stopped generating.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StopReason {
    EndOfText,
    StopSequence,
    MaxTokens,
    Unknown,
}

impl fmt::Display for StopReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StopReason::EndOfText => write!(f, "end_of_text"),
            StopReason::StopSequence => write!(f, "stop_sequence"),
            StopReason::MaxTokens => write!(f, "max_tokens"),
            StopReason::Unknown => write!(f, "unknown"),
        }
    }
}

impl FromStr for StopReason {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "end_of_text" => Ok(StopReason::EndOfText),
            "stop_sequence" => Ok(StopReason::StopSequence),
            "max_tokens" => Ok(StopReason::MaxTokens),
            "unknown" => Ok(StopReason::Unknown),
            other => Err(format!("invalid stop reason: '{other}'")),
        }
    }
}

/// Token usage reported by the engine, when it reports any.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Usage {
    pub input_tokens: u32,
    pub output_tokens: u32,
}

/// Errors from inference provider operations.
#[derive(Debug, thiserror::Error)]
pub enum LlmError {
    #[error("provider error: {message}")]
    Provider { message: String },

    #[error("deserialization error: {0}")]
    Deserialization(String),

    #[error("rate limited (retry after {retry_after_ms:?}ms)")]
    RateLimited { retry_after_ms: Option<u64> },

    #[error("provider overloaded: {0}")]
    Overloaded(String),

    #[error("authentication failed")]
    AuthenticationFailed,

    #[error("invalid request: {0}")]
    InvalidRequest(String),
}

/// Backend protocol spoken by the inference server.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProviderType {
    /// llama.cpp `llama-server` native `/completion` endpoint.
    #[default]
    LlamaCpp,
    /// Any server exposing the OpenAI legacy `/v1/completions` endpoint
    /// (vLLM, llama.cpp, LM Studio, Ollama, ...).
    #[serde(rename = "openai_compatible")]
    OpenAiCompatible,
}

impl fmt::Display for ProviderType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProviderType::LlamaCpp => write!(f, "llama_cpp"),
            ProviderType::OpenAiCompatible => write!(f, "openai_compatible"),
        }
    }
}

impl FromStr for ProviderType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "llama_cpp" => Ok(ProviderType::LlamaCpp),
            "openai_compatible" => Ok(ProviderType::OpenAiCompatible),
            other => Err(format!("invalid provider type: '{other}'")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stop_reason_roundtrip() {
        for reason in [
            StopReason::EndOfText,
            StopReason::StopSequence,
            StopReason::MaxTokens,
            StopReason::Unknown,
        ] {
            let s = reason.to_string();
            let parsed: StopReason = s.parse().unwrap();
            assert_eq!(reason, parsed);
        }
    }

    #[test]
    fn test_provider_type_serde() {
        let pt = ProviderType::OpenAiCompatible;
        let json = serde_json::to_string(&pt).unwrap();
        assert_eq!(json, "\"openai_compatible\"");
        let parsed: ProviderType = serde_json::from_str("\"llama_cpp\"").unwrap();
        assert_eq!(parsed, ProviderType::LlamaCpp);
    }

    #[test]
    fn test_provider_type_rejects_unknown() {
        let err = "bedrock".parse::<ProviderType>().unwrap_err();
        assert!(err.contains("bedrock"));
    }

    #[test]
    fn test_completion_request_stop_sequences_default() {
        let json = r#"{"prompt":"hi","max_tokens":10,"temperature":0.5}"#;
        let req: CompletionRequest = serde_json::from_str(json).unwrap();
        assert!(req.stop_sequences.is_empty());
    }

    #[test]
    fn test_llm_error_display() {
        let err = LlmError::Provider {
            message: "HTTP 500: boom".to_string(),
        };
        assert_eq!(err.to_string(), "provider error: HTTP 500: boom");
    }
}
