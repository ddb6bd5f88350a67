//! Application state wiring the store, the inference provider and the orchestrator.
//!
//! AppState holds the concrete service instance used by both CLI and HTTP API.
//! `ConversationService` is generic over its repository; AppState pins it to
//! the SQLite implementation.

use std::path::PathBuf;
use std::sync::Arc;

use causerie_core::conversation::service::ConversationService;
use causerie_core::llm::box_provider::BoxLlmProvider;
use causerie_infra::config::{load_config, resolve_api_key, resolve_data_dir, resolve_database_url};
use causerie_infra::llm::create_provider;
use causerie_infra::sqlite::conversation::SqliteConversationRepository;
use causerie_infra::sqlite::pool::DatabasePool;
use causerie_types::config::AppConfig;

pub type ConcreteConversationService = ConversationService<SqliteConversationRepository>;

/// Shared application state.
///
/// Used by both CLI commands and HTTP handlers.
#[derive(Clone)]
pub struct AppState {
    pub conversation_service: Arc<ConcreteConversationService>,
    pub config: Arc<AppConfig>,
    pub data_dir: PathBuf,
    pub db_pool: DatabasePool,
}

impl AppState {
    /// Initialize the application state: read config, connect to DB, build the provider.
    pub async fn init() -> anyhow::Result<Self> {
        let data_dir = resolve_data_dir();

        // Ensure data directory exists
        tokio::fs::create_dir_all(&data_dir).await?;

        let config = load_config(&data_dir).await;
        Self::from_config(data_dir, config).await
    }

    /// Build state from an already loaded configuration.
    pub async fn from_config(data_dir: PathBuf, config: AppConfig) -> anyhow::Result<Self> {
        let db_url = resolve_database_url(&config, &data_dir);
        let db_pool = DatabasePool::new(&db_url).await?;

        let api_key = resolve_api_key(&config.inference);
        let provider = create_provider(&config.inference, api_key)?;

        tracing::info!(
            provider = provider.name(),
            base_url = %config.inference.base_url,
            "Inference provider configured"
        );

        Ok(Self::with_provider(data_dir, config, db_pool, provider))
    }

    /// Wire the orchestrator around an explicit provider.
    pub fn with_provider(
        data_dir: PathBuf,
        config: AppConfig,
        db_pool: DatabasePool,
        provider: BoxLlmProvider,
    ) -> Self {
        let repo = SqliteConversationRepository::new(db_pool.clone());
        let service = ConversationService::new(repo, provider, config.generation.clone());

        Self {
            conversation_service: Arc::new(service),
            config: Arc::new(config),
            data_dir,
            db_pool,
        }
    }
}
