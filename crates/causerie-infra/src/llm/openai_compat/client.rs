//! OpenAiCompletionsProvider -- [`LlmProvider`] over `POST {base_url}/completions`.
//!
//! The optional API key is wrapped in [`secrecy::SecretString`] and only
//! exposed when building the `Authorization` header.

use std::time::Duration;

use secrecy::{ExposeSecret, SecretString};

use causerie_core::llm::provider::LlmProvider;
use causerie_types::llm::{CompletionRequest, CompletionResponse, LlmError, StopReason, Usage};

use super::types::{OpenAiCompletionRequest, OpenAiCompletionResponse};
use crate::llm::error_for_status;

/// OpenAI-compatible text-completions provider.
///
/// `base_url` includes the version prefix, e.g. `http://localhost:8000/v1`.
pub struct OpenAiCompletionsProvider {
    client: reqwest::Client,
    base_url: String,
    model: Option<String>,
    api_key: Option<SecretString>,
}

impl OpenAiCompletionsProvider {
    pub fn new(
        base_url: impl Into<String>,
        model: Option<String>,
        api_key: Option<SecretString>,
        timeout: Duration,
    ) -> Result<Self, LlmError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| LlmError::Provider {
                message: format!("failed to create HTTP client: {e}"),
            })?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            model,
            api_key,
        })
    }

    pub fn model(&self) -> Option<&str> {
        self.model.as_deref()
    }

    fn to_openai_request(&self, request: &CompletionRequest) -> OpenAiCompletionRequest {
        OpenAiCompletionRequest {
            model: self.model.clone(),
            prompt: request.prompt.clone(),
            max_tokens: request.max_tokens,
            temperature: request.temperature,
            stop: request.stop_sequences.clone(),
        }
    }
}

fn map_finish_reason(reason: Option<&str>) -> StopReason {
    match reason {
        // "stop" covers both end-of-text and a matched stop string.
        Some("stop") => StopReason::StopSequence,
        Some("length") => StopReason::MaxTokens,
        _ => StopReason::Unknown,
    }
}

impl LlmProvider for OpenAiCompletionsProvider {
    fn name(&self) -> &str {
        "openai_compatible"
    }

    async fn complete(&self, request: &CompletionRequest) -> Result<CompletionResponse, LlmError> {
        let body = self.to_openai_request(request);
        let url = format!("{}/completions", self.base_url);

        tracing::debug!(%url, model = ?self.model, "Sending completion request");

        let mut builder = self.client.post(&url).json(&body);
        if let Some(key) = &self.api_key {
            builder = builder.bearer_auth(key.expose_secret());
        }

        let response = builder.send().await.map_err(|e| LlmError::Provider {
            message: format!("HTTP request failed: {e}"),
        })?;

        let status = response.status();
        if !status.is_success() {
            let headers = response.headers().clone();
            let error_body = response.text().await.unwrap_or_default();
            return Err(error_for_status(status, &headers, error_body));
        }

        let oai_resp: OpenAiCompletionResponse = response.json().await.map_err(|e| {
            LlmError::Deserialization(format!("failed to parse response: {e}"))
        })?;

        let choice = oai_resp
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| LlmError::Deserialization("response has no choices".to_string()))?;

        let usage = oai_resp
            .usage
            .map(|u| Usage {
                input_tokens: u.prompt_tokens,
                output_tokens: u.completion_tokens,
            })
            .unwrap_or_default();

        Ok(CompletionResponse {
            stop_reason: map_finish_reason(choice.finish_reason.as_deref()),
            text: choice.text,
            model: oai_resp.model,
            usage,
        })
    }
}
