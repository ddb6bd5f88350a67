//! LlamaCppProvider -- [`LlmProvider`] for a llama.cpp `llama-server`.
//!
//! Sends the fully rendered prompt to `POST {base_url}/completion` with
//! streaming disabled and maps the server's stop type and token counters
//! onto the generic response.

use std::time::Duration;

use causerie_core::llm::provider::LlmProvider;
use causerie_types::llm::{CompletionRequest, CompletionResponse, LlmError, StopReason, Usage};

use super::types::{LlamaCompletionRequest, LlamaCompletionResponse};
use crate::llm::error_for_status;

/// llama.cpp native completion provider.
pub struct LlamaCppProvider {
    client: reqwest::Client,
    base_url: String,
}

impl LlamaCppProvider {
    /// Create a provider for the server at `base_url` (e.g. `http://127.0.0.1:8080`).
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, LlmError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| LlmError::Provider {
                message: format!("failed to create HTTP client: {e}"),
            })?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn to_llama_request(request: &CompletionRequest) -> LlamaCompletionRequest {
        LlamaCompletionRequest {
            prompt: request.prompt.clone(),
            n_predict: request.max_tokens,
            temperature: request.temperature,
            stop: request.stop_sequences.clone(),
            stream: false,
            cache_prompt: true,
        }
    }
}

fn map_stop_type(stop_type: Option<&str>) -> StopReason {
    match stop_type {
        Some("eos") => StopReason::EndOfText,
        Some("word") => StopReason::StopSequence,
        Some("limit") => StopReason::MaxTokens,
        _ => StopReason::Unknown,
    }
}

impl LlmProvider for LlamaCppProvider {
    fn name(&self) -> &str {
        "llama_cpp"
    }

    async fn complete(&self, request: &CompletionRequest) -> Result<CompletionResponse, LlmError> {
        let body = Self::to_llama_request(request);
        let url = format!("{}/completion", self.base_url);

        tracing::debug!(%url, prompt_chars = body.prompt.len(), "Sending completion request");

        let response = self
            .client
            .post(&url)
            .json(&body)
            .send()
            .await
            .map_err(|e| LlmError::Provider {
                message: format!("HTTP request failed: {e}"),
            })?;

        let status = response.status();
        if !status.is_success() {
            let headers = response.headers().clone();
            let error_body = response.text().await.unwrap_or_default();
            return Err(error_for_status(status, &headers, error_body));
        }

        let llama_resp: LlamaCompletionResponse = response.json().await.map_err(|e| {
            LlmError::Deserialization(format!("failed to parse response: {e}"))
        })?;

        Ok(CompletionResponse {
            stop_reason: map_stop_type(llama_resp.stop_type.as_deref()),
            text: llama_resp.content,
            model: llama_resp.model,
            usage: Usage {
                input_tokens: llama_resp.tokens_evaluated.unwrap_or(0),
                output_tokens: llama_resp.tokens_predicted.unwrap_or(0),
            },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Matcher;
    use serde_json::json;

    fn request() -> CompletionRequest {
        CompletionRequest {
            prompt: "Be brief.\n\nUser: Hello\nBot:".to_string(),
            max_tokens: 3000,
            temperature: 0.8,
            stop_sequences: vec!["\nUser:".to_string(), "\nBot:".to_string()],
        }
    }

    #[test]
    fn test_to_llama_request() {
        let body = LlamaCppProvider::to_llama_request(&request());
        assert_eq!(body.n_predict, 3000);
        assert!(!body.stream);
        assert!(body.cache_prompt);

        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["stop"], json!(["\nUser:", "\nBot:"]));
        assert_eq!(json["prompt"], "Be brief.\n\nUser: Hello\nBot:");
    }

    #[test]
    fn test_base_url_trailing_slash_trimmed() {
        let provider = LlamaCppProvider::new("http://localhost:8080/", Duration::from_secs(5)).unwrap();
        assert_eq!(provider.base_url(), "http://localhost:8080");
    }

    #[test]
    fn test_map_stop_type() {
        assert_eq!(map_stop_type(Some("eos")), StopReason::EndOfText);
        assert_eq!(map_stop_type(Some("word")), StopReason::StopSequence);
        assert_eq!(map_stop_type(Some("limit")), StopReason::MaxTokens);
        assert_eq!(map_stop_type(Some("none")), StopReason::Unknown);
        assert_eq!(map_stop_type(None), StopReason::Unknown);
    }

    #[tokio::test]
    async fn test_complete_success() {
        let mut server = mockito::Server::new_async().await;
        let handler = server
            .mock("POST", "/completion")
            .match_body(Matcher::PartialJson(json!({
                "prompt": "Be brief.\n\nUser: Hello\nBot:",
                "n_predict": 3000,
                "stream": false,
            })))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                json!({
                    "content": " Hi there!",
                    "model": "mistral-7b.gguf",
                    "stop_type": "word",
                    "tokens_evaluated": 12,
                    "tokens_predicted": 4,
                    "timings": {"predicted_ms": 10.0}
                })
                .to_string(),
            )
            .create_async()
            .await;

        let provider = LlamaCppProvider::new(server.url(), Duration::from_secs(5)).unwrap();
        let response = provider.complete(&request()).await.unwrap();

        assert_eq!(response.text, " Hi there!");
        assert_eq!(response.model.as_deref(), Some("mistral-7b.gguf"));
        assert_eq!(response.stop_reason, StopReason::StopSequence);
        assert_eq!(response.usage.input_tokens, 12);
        assert_eq!(response.usage.output_tokens, 4);
        handler.assert_async().await;
    }

    #[tokio::test]
    async fn test_complete_server_error() {
        let mut server = mockito::Server::new_async().await;
        let _handler = server
            .mock("POST", "/completion")
            .with_status(500)
            .with_body("model not loaded")
            .create_async()
            .await;

        let provider = LlamaCppProvider::new(server.url(), Duration::from_secs(5)).unwrap();
        let err = provider.complete(&request()).await.unwrap_err();

        match err {
            LlmError::Provider { message } => assert!(message.contains("model not loaded")),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_complete_busy_server_is_overloaded() {
        let mut server = mockito::Server::new_async().await;
        let _handler = server
            .mock("POST", "/completion")
            .with_status(503)
            .with_body("no slot available")
            .create_async()
            .await;

        let provider = LlamaCppProvider::new(server.url(), Duration::from_secs(5)).unwrap();
        let err = provider.complete(&request()).await.unwrap_err();
        assert!(matches!(err, LlmError::Overloaded(_)));
    }

    #[tokio::test]
    async fn test_complete_malformed_body() {
        let mut server = mockito::Server::new_async().await;
        let _handler = server
            .mock("POST", "/completion")
            .with_status(200)
            .with_body("not json")
            .create_async()
            .await;

        let provider = LlamaCppProvider::new(server.url(), Duration::from_secs(5)).unwrap();
        let err = provider.complete(&request()).await.unwrap_err();
        assert!(matches!(err, LlmError::Deserialization(_)));
    }
}
