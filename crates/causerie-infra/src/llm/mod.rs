//! Inference provider implementations.
//!
//! Contains concrete implementations of the [`LlmProvider`] trait defined in
//! `causerie-core` for the two protocols Causerie speaks, a factory
//! ([`create_provider`]) that picks one from [`InferenceConfig`], and a
//! connection test ([`test_provider_connection`]) for the `check` command.
//!
//! [`LlmProvider`]: causerie_core::llm::provider::LlmProvider

pub mod llama_cpp;
pub mod openai_compat;

use std::time::Duration;

use reqwest::StatusCode;
use reqwest::header::{HeaderMap, RETRY_AFTER};
use secrecy::SecretString;

use causerie_core::llm::box_provider::BoxLlmProvider;
use causerie_types::config::InferenceConfig;
use causerie_types::llm::{CompletionRequest, LlmError, ProviderType};

use self::llama_cpp::LlamaCppProvider;
use self::openai_compat::OpenAiCompletionsProvider;

/// Create a [`BoxLlmProvider`] from the `[inference]` configuration section.
///
/// `api_key` is only used by the OpenAI-compatible provider; llama.cpp's
/// native endpoint has no authentication.
pub fn create_provider(
    config: &InferenceConfig,
    api_key: Option<SecretString>,
) -> Result<BoxLlmProvider, LlmError> {
    let timeout = Duration::from_secs(config.timeout_secs);

    match config.provider {
        ProviderType::LlamaCpp => {
            let provider = LlamaCppProvider::new(config.base_url.clone(), timeout)?;
            Ok(BoxLlmProvider::new(provider))
        }
        ProviderType::OpenAiCompatible => {
            let provider = OpenAiCompletionsProvider::new(
                config.base_url.clone(),
                config.model.clone(),
                api_key,
                timeout,
            )?;
            Ok(BoxLlmProvider::new(provider))
        }
    }
}

/// Test provider connectivity by sending a minimal completion request.
pub async fn test_provider_connection(provider: &BoxLlmProvider) -> Result<(), LlmError> {
    let request = CompletionRequest {
        prompt: "Hello".to_string(),
        max_tokens: 1,
        temperature: 0.0,
        stop_sequences: Vec::new(),
    };
    provider.complete(&request).await?;
    Ok(())
}

/// Map a non-success HTTP status from an inference server to an [`LlmError`].
pub(crate) fn error_for_status(status: StatusCode, headers: &HeaderMap, body: String) -> LlmError {
    match status.as_u16() {
        401 | 403 => LlmError::AuthenticationFailed,
        429 => LlmError::RateLimited {
            retry_after_ms: retry_after_ms(headers),
        },
        // llama-server answers 503 while loading the model or when every slot is busy.
        503 | 529 => LlmError::Overloaded(body),
        400 | 404 | 422 => LlmError::InvalidRequest(format!("HTTP {status}: {body}")),
        _ => LlmError::Provider {
            message: format!("HTTP {status}: {body}"),
        },
    }
}

/// `Retry-After` in delay-seconds form, as milliseconds. HTTP-date values are ignored.
fn retry_after_ms(headers: &HeaderMap) -> Option<u64> {
    headers
        .get(RETRY_AFTER)?
        .to_str()
        .ok()?
        .trim()
        .parse::<u64>()
        .ok()
        .map(|secs| secs.saturating_mul(1000))
}
