//! Configuration types for Causerie.
//!
//! `AppConfig` mirrors `config.toml` in the data directory. Every section and
//! field has a default, so an empty or missing file yields a working server.

use serde::{Deserialize, Serialize};

use crate::conversation::DEFAULT_SYSTEM_PROMPT;
use crate::llm::ProviderType;

/// Top-level configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Override the SQLite URL (defaults to `conversations.db` in the data dir).
    #[serde(default)]
    pub database_url: Option<String>,

    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub inference: InferenceConfig,

    #[serde(default)]
    pub generation: GenerationConfig,
}

/// HTTP listener settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    5000
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

/// Where and how to reach the inference engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InferenceConfig {
    #[serde(default)]
    pub provider: ProviderType,

    /// Base URL of the inference server, without a trailing path.
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Model name sent to OpenAI-compatible servers.
    #[serde(default)]
    pub model: Option<String>,

    /// Name of the environment variable holding the API key, if the server needs one.
    #[serde(default)]
    pub api_key_env: Option<String>,

    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_base_url() -> String {
    "http://127.0.0.1:8080".to_string()
}

fn default_timeout_secs() -> u64 {
    300
}

impl Default for InferenceConfig {
    fn default() -> Self {
        Self {
            provider: ProviderType::default(),
            base_url: default_base_url(),
            model: None,
            api_key_env: None,
            timeout_secs: default_timeout_secs(),
        }
    }
}

/// Sampling parameters and context window used for every turn.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationConfig {
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,

    #[serde(default = "default_temperature")]
    pub temperature: f64,

    /// Number of most recent turns replayed as context.
    #[serde(default = "default_context_turns")]
    pub context_turns: u32,

    #[serde(default = "default_system_prompt")]
    pub default_system_prompt: String,
}

fn default_max_tokens() -> u32 {
    3000
}

fn default_temperature() -> f64 {
    0.8
}

fn default_context_turns() -> u32 {
    2
}

fn default_system_prompt() -> String {
    DEFAULT_SYSTEM_PROMPT.to_string()
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            max_tokens: default_max_tokens(),
            temperature: default_temperature(),
            context_turns: default_context_turns(),
            default_system_prompt: default_system_prompt(),
        }
    }
}
