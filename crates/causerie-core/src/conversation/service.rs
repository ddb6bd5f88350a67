//! Turn orchestration and conversation management.
//!
//! `ConversationService` owns the repository and the injected inference
//! provider. `generate` is the only operation that talks to the engine; all
//! other operations are thin wrappers over the repository.

use std::collections::HashMap;

use causerie_types::config::GenerationConfig;
use causerie_types::conversation::{
    Conversation, ConversationId, GeneratedReply, NewTurn, StoreStats, Turn,
};
use causerie_types::error::{ConversationError, RepositoryError};
use causerie_types::llm::CompletionRequest;
use tracing::{Instrument, debug, info, info_span, warn};

use crate::llm::box_provider::BoxLlmProvider;
use crate::repository::conversation::ConversationRepository;

use super::context::{build_prompt, sanitize_reply, sanitize_user_text, stop_sequences};

/// Orchestrates conversations: creation, turn generation, and history access.
///
/// Generic over `ConversationRepository` so causerie-core never depends on
/// causerie-infra. The provider is type-erased and chosen at startup.
pub struct ConversationService<R: ConversationRepository> {
    repo: R,
    provider: BoxLlmProvider,
    config: GenerationConfig,
}

impl<R: ConversationRepository> ConversationService<R> {
    pub fn new(repo: R, provider: BoxLlmProvider, config: GenerationConfig) -> Self {
        Self {
            repo,
            provider,
            config,
        }
    }

    /// Access the conversation repository.
    pub fn repo(&self) -> &R {
        &self.repo
    }

    /// Access the inference provider.
    pub fn provider(&self) -> &BoxLlmProvider {
        &self.provider
    }

    pub fn config(&self) -> &GenerationConfig {
        &self.config
    }

    /// Create a conversation, falling back to the configured default system prompt.
    ///
    /// A supplied prompt is stored verbatim, including an empty one.
    pub async fn create_conversation(
        &self,
        system_prompt: Option<String>,
    ) -> Result<Conversation, ConversationError> {
        let system_prompt =
            system_prompt.unwrap_or_else(|| self.config.default_system_prompt.clone());
        let conversation = self
            .repo
            .create_conversation(&Conversation::new(system_prompt))
            .await?;

        info!(conversation_id = %conversation.id, "Conversation created");
        Ok(conversation)
    }

    /// Generate the bot's reply to `user_prompt` and record the new turn.
    ///
    /// An unknown conversation fails with `NotFound` before the engine is
    /// called. Nothing is written when the engine fails.
    pub async fn generate(
        &self,
        conversation_id: &ConversationId,
        user_prompt: &str,
    ) -> Result<GeneratedReply, ConversationError> {
        let user_prompt = user_prompt.trim();
        if user_prompt.is_empty() {
            return Err(ConversationError::EmptyInput);
        }

        let Some(conversation) = self.repo.get_conversation(conversation_id).await? else {
            warn!(conversation_id = %conversation_id, "Generation requested for non-existent conversation");
            return Err(ConversationError::NotFound);
        };
        let system_prompt = conversation.system_prompt;
        let history = self
            .repo
            .get_recent_turns(conversation_id, self.config.context_turns)
            .await?;

        let request = CompletionRequest {
            prompt: build_prompt(&system_prompt, &history, user_prompt),
            max_tokens: self.config.max_tokens,
            temperature: self.config.temperature,
            stop_sequences: stop_sequences(),
        };

        let span = info_span!(
            "gen_ai.complete",
            gen_ai.system = self.provider.name(),
            gen_ai.request.max_tokens = request.max_tokens,
            gen_ai.request.temperature = request.temperature,
            conversation_id = %conversation_id,
            history_turns = history.len(),
        );
        let response = self.provider.complete(&request).instrument(span).await?;

        debug!(
            stop_reason = %response.stop_reason,
            input_tokens = response.usage.input_tokens,
            output_tokens = response.usage.output_tokens,
            "Engine returned"
        );

        let reply = sanitize_reply(&response.text);
        let turn = NewTurn {
            conversation_id: conversation_id.clone(),
            user_text: sanitize_user_text(user_prompt, &system_prompt),
            bot_text: reply.clone(),
        };

        let stored = self.repo.append_turn(&turn).await.map_err(|e| match e {
            RepositoryError::NotFound => ConversationError::NotFound,
            other => other.into(),
        })?;

        info!(conversation_id = %conversation_id, turn_id = stored.id, "Turn recorded");

        Ok(GeneratedReply {
            conversation_id: conversation_id.clone(),
            reply,
        })
    }

    /// Every turn of a conversation, oldest first (empty for unknown ids).
    pub async fn get_turns(
        &self,
        conversation_id: &ConversationId,
    ) -> Result<Vec<Turn>, ConversationError> {
        Ok(self.repo.get_turns(conversation_id).await?)
    }

    pub async fn list_conversations(&self) -> Result<Vec<Conversation>, ConversationError> {
        Ok(self.repo.list_conversations().await?)
    }

    /// Look up a conversation's system prompt.
    pub async fn get_system_prompt(
        &self,
        conversation_id: &ConversationId,
    ) -> Result<String, ConversationError> {
        self.repo
            .get_conversation(conversation_id)
            .await?
            .map(|c| c.system_prompt)
            .ok_or(ConversationError::NotFound)
    }

    /// Replace a conversation's system prompt. Unknown ids are a logged no-op.
    pub async fn update_system_prompt(
        &self,
        conversation_id: &ConversationId,
        system_prompt: &str,
    ) -> Result<(), ConversationError> {
        if self
            .repo
            .update_system_prompt(conversation_id, system_prompt)
            .await?
        {
            info!(conversation_id = %conversation_id, "System prompt updated");
        } else {
            warn!(conversation_id = %conversation_id, "Attempted to update system prompt of non-existent conversation");
        }
        Ok(())
    }

    /// Delete a conversation and its turns. Unknown ids are a logged no-op.
    pub async fn delete_conversation(
        &self,
        conversation_id: &ConversationId,
    ) -> Result<(), ConversationError> {
        if self.repo.delete_conversation(conversation_id).await? {
            info!(conversation_id = %conversation_id, "Conversation deleted");
        } else {
            warn!(conversation_id = %conversation_id, "Attempted to delete non-existent conversation");
        }
        Ok(())
    }

    /// Remove every conversation and turn.
    pub async fn reset(&self) -> Result<(), ConversationError> {
        self.repo.reset().await?;
        warn!("Conversation store reset");
        Ok(())
    }

    /// Turn count per conversation; conversations without turns are absent.
    pub async fn turn_counts(&self) -> Result<HashMap<ConversationId, u64>, ConversationError> {
        Ok(self.repo.count_turns_by_conversation().await?)
    }

    pub async fn stats(&self) -> Result<StoreStats, ConversationError> {
        Ok(StoreStats {
            conversations: self.repo.count_conversations().await?,
            turns: self.repo.count_turns().await?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::provider::LlmProvider;
    use causerie_types::conversation::DEFAULT_SYSTEM_PROMPT;
    use causerie_types::llm::{CompletionResponse, LlmError, StopReason, Usage};
    use chrono::Utc;
    use std::sync::{Arc, Mutex};

    // --- In-memory repository ---

    #[derive(Default)]
    struct MockState {
        conversations: Vec<Conversation>,
        turns: Vec<Turn>,
        next_turn_id: i64,
    }

    #[derive(Clone, Default)]
    struct MockRepository {
        state: Arc<Mutex<MockState>>,
    }

    impl ConversationRepository for MockRepository {
        async fn create_conversation(
            &self,
            conversation: &Conversation,
        ) -> Result<Conversation, RepositoryError> {
            let mut state = self.state.lock().unwrap();
            state.conversations.push(conversation.clone());
            Ok(conversation.clone())
        }

        async fn get_conversation(
            &self,
            id: &ConversationId,
        ) -> Result<Option<Conversation>, RepositoryError> {
            let state = self.state.lock().unwrap();
            Ok(state.conversations.iter().find(|c| &c.id == id).cloned())
        }

        async fn list_conversations(&self) -> Result<Vec<Conversation>, RepositoryError> {
            Ok(self.state.lock().unwrap().conversations.clone())
        }

        async fn update_system_prompt(
            &self,
            id: &ConversationId,
            system_prompt: &str,
        ) -> Result<bool, RepositoryError> {
            let mut state = self.state.lock().unwrap();
            match state.conversations.iter_mut().find(|c| &c.id == id) {
                Some(conv) => {
                    conv.system_prompt = system_prompt.to_string();
                    Ok(true)
                }
                None => Ok(false),
            }
        }

        async fn delete_conversation(&self, id: &ConversationId) -> Result<bool, RepositoryError> {
            let mut state = self.state.lock().unwrap();
            state.turns.retain(|t| &t.conversation_id != id);
            let before = state.conversations.len();
            state.conversations.retain(|c| &c.id != id);
            Ok(state.conversations.len() != before)
        }

        async fn reset(&self) -> Result<(), RepositoryError> {
            let mut state = self.state.lock().unwrap();
            state.turns.clear();
            state.conversations.clear();
            Ok(())
        }

        async fn append_turn(&self, turn: &NewTurn) -> Result<Turn, RepositoryError> {
            let mut state = self.state.lock().unwrap();
            if !state
                .conversations
                .iter()
                .any(|c| c.id == turn.conversation_id)
            {
                return Err(RepositoryError::NotFound);
            }
            state.next_turn_id += 1;
            let stored = Turn {
                id: state.next_turn_id,
                conversation_id: turn.conversation_id.clone(),
                user_text: turn.user_text.clone(),
                bot_text: turn.bot_text.clone(),
                created_at: Utc::now(),
            };
            state.turns.push(stored.clone());
            Ok(stored)
        }

        async fn get_turns(&self, id: &ConversationId) -> Result<Vec<Turn>, RepositoryError> {
            let state = self.state.lock().unwrap();
            Ok(state
                .turns
                .iter()
                .filter(|t| &t.conversation_id == id)
                .cloned()
                .collect())
        }

        async fn get_recent_turns(
            &self,
            id: &ConversationId,
            limit: u32,
        ) -> Result<Vec<Turn>, RepositoryError> {
            let all = self.get_turns(id).await?;
            let skip = all.len().saturating_sub(limit as usize);
            Ok(all.into_iter().skip(skip).collect())
        }

        async fn count_conversations(&self) -> Result<u64, RepositoryError> {
            Ok(self.state.lock().unwrap().conversations.len() as u64)
        }

        async fn count_turns(&self) -> Result<u64, RepositoryError> {
            Ok(self.state.lock().unwrap().turns.len() as u64)
        }

        async fn count_turns_by_conversation(
            &self,
        ) -> Result<HashMap<ConversationId, u64>, RepositoryError> {
            let mut counts = HashMap::new();
            for turn in &self.state.lock().unwrap().turns {
                *counts.entry(turn.conversation_id.clone()).or_insert(0) += 1;
            }
            Ok(counts)
        }
    }

    // --- Scripted provider ---

    /// Replies with a fixed text (or fails) and records every request it sees.
    struct MockProvider {
        reply: Option<String>,
        requests: Arc<Mutex<Vec<CompletionRequest>>>,
    }

    impl LlmProvider for MockProvider {
        fn name(&self) -> &str {
            "mock"
        }

        async fn complete(
            &self,
            request: &CompletionRequest,
        ) -> Result<CompletionResponse, LlmError> {
            self.requests.lock().unwrap().push(request.clone());
            match &self.reply {
                Some(text) => Ok(CompletionResponse {
                    text: text.clone(),
                    model: Some("mock-model".to_string()),
                    stop_reason: StopReason::StopSequence,
                    usage: Usage::default(),
                }),
                None => Err(LlmError::Provider {
                    message: "engine unavailable".to_string(),
                }),
            }
        }
    }

    struct Harness {
        service: ConversationService<MockRepository>,
        repo: MockRepository,
        requests: Arc<Mutex<Vec<CompletionRequest>>>,
    }

    fn harness(reply: Option<&str>) -> Harness {
        let repo = MockRepository::default();
        let requests = Arc::new(Mutex::new(Vec::new()));
        let provider = MockProvider {
            reply: reply.map(str::to_string),
            requests: requests.clone(),
        };
        let service = ConversationService::new(
            repo.clone(),
            BoxLlmProvider::new(provider),
            GenerationConfig::default(),
        );
        Harness {
            service,
            repo,
            requests,
        }
    }

    #[tokio::test]
    async fn test_create_conversation_uses_default_prompt() {
        let h = harness(Some("ok"));
        let conv = h.service.create_conversation(None).await.unwrap();
        assert_eq!(conv.system_prompt, DEFAULT_SYSTEM_PROMPT);

        let stored = h.service.get_system_prompt(&conv.id).await.unwrap();
        assert_eq!(stored, DEFAULT_SYSTEM_PROMPT);
    }

    #[tokio::test]
    async fn test_create_conversation_stores_prompt_verbatim() {
        let h = harness(Some("ok"));
        let conv = h
            .service
            .create_conversation(Some("  You are a pirate. ".to_string()))
            .await
            .unwrap();
        let stored = h.service.get_system_prompt(&conv.id).await.unwrap();
        assert_eq!(stored, "  You are a pirate. ");
    }

    #[tokio::test]
    async fn test_generate_rejects_blank_prompt_without_side_effects() {
        let h = harness(Some("ok"));
        let conv = h.service.create_conversation(None).await.unwrap();

        for prompt in ["", "   ", "\n\t"] {
            let err = h.service.generate(&conv.id, prompt).await.unwrap_err();
            assert!(matches!(err, ConversationError::EmptyInput));
        }

        assert!(h.requests.lock().unwrap().is_empty());
        assert!(h.service.get_turns(&conv.id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_generate_sends_parameters_and_sanitizes_reply() {
        let h = harness(Some("  Bot: Bonjour ! User:"));
        let conv = h.service.create_conversation(None).await.unwrap();

        let reply = h.service.generate(&conv.id, "  Salut  ").await.unwrap();
        assert_eq!(reply.reply, "Bonjour !");
        assert_eq!(reply.conversation_id, conv.id);

        let requests = h.requests.lock().unwrap();
        assert_eq!(requests.len(), 1);
        let req = &requests[0];
        assert_eq!(req.prompt, "Tu es un assistant utile.\n\nUser: Salut\nBot:");
        assert_eq!(req.max_tokens, 3000);
        assert!((req.temperature - 0.8).abs() < f64::EPSILON);
        assert_eq!(req.stop_sequences, vec!["\nUser:", "\nBot:"]);
    }

    #[tokio::test]
    async fn test_generate_appends_turns_in_order() {
        let h = harness(Some("reply"));
        let conv = h.service.create_conversation(None).await.unwrap();

        for prompt in ["first", "second", "third"] {
            h.service.generate(&conv.id, prompt).await.unwrap();
        }

        let turns = h.service.get_turns(&conv.id).await.unwrap();
        let users: Vec<&str> = turns.iter().map(|t| t.user_text.as_str()).collect();
        assert_eq!(users, vec!["first", "second", "third"]);
        assert!(turns.iter().all(|t| t.bot_text == "reply"));
    }

    #[tokio::test]
    async fn test_generate_context_holds_two_most_recent_turns() {
        let h = harness(Some("ok"));
        let conv = h
            .service
            .create_conversation(Some("System.".to_string()))
            .await
            .unwrap();

        for prompt in ["one", "two", "three", "four"] {
            h.service.generate(&conv.id, prompt).await.unwrap();
        }

        let requests = h.requests.lock().unwrap();
        assert_eq!(
            requests[3].prompt,
            "System.\nUser: two\nBot: ok\nUser: three\nBot: ok\nUser: four\nBot:"
        );
    }

    #[tokio::test]
    async fn test_generate_uses_updated_system_prompt() {
        let h = harness(Some("ok"));
        let conv = h.service.create_conversation(None).await.unwrap();
        h.service
            .update_system_prompt(&conv.id, "Réponds en une phrase.")
            .await
            .unwrap();

        h.service.generate(&conv.id, "Pourquoi ?").await.unwrap();

        let requests = h.requests.lock().unwrap();
        assert!(requests[0].prompt.starts_with("Réponds en une phrase.\n"));
    }

    #[tokio::test]
    async fn test_generate_strips_system_prompt_from_stored_user_text() {
        let h = harness(Some("ok"));
        let conv = h
            .service
            .create_conversation(Some("Be brief.".to_string()))
            .await
            .unwrap();

        h.service
            .generate(&conv.id, "Be brief. What is a monad?")
            .await
            .unwrap();

        let turns = h.service.get_turns(&conv.id).await.unwrap();
        assert_eq!(turns[0].user_text, "What is a monad?");
    }

    #[tokio::test]
    async fn test_generate_keeps_user_text_with_single_char_system_prompt() {
        let h = harness(Some("ok"));
        let conv = h
            .service
            .create_conversation(Some(" ".to_string()))
            .await
            .unwrap();
        h.service
            .update_system_prompt(&conv.id, "a")
            .await
            .unwrap();

        h.service.generate(&conv.id, "banana split").await.unwrap();
        h.service.generate(&conv.id, "and a cherry").await.unwrap();

        let turns = h.service.get_turns(&conv.id).await.unwrap();
        assert_eq!(turns[0].user_text, "banana split");
        assert_eq!(turns[1].user_text, "and a cherry");

        let requests = h.requests.lock().unwrap();
        assert_eq!(
            requests[1].prompt,
            "a\nUser: banana split\nBot: ok\nUser: and a cherry\nBot:"
        );
    }

    #[tokio::test]
    async fn test_generate_engine_failure_writes_nothing() {
        let h = harness(None);
        let conv = h.service.create_conversation(None).await.unwrap();

        let err = h.service.generate(&conv.id, "hello").await.unwrap_err();
        assert!(matches!(err, ConversationError::Inference(_)));
        assert!(h.service.get_turns(&conv.id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_generate_unknown_conversation_is_not_found() {
        let h = harness(Some("ok"));
        let id = ConversationId::from("missing");

        let err = h.service.generate(&id, "hello").await.unwrap_err();
        assert!(matches!(err, ConversationError::NotFound));

        assert!(h.requests.lock().unwrap().is_empty());
        assert_eq!(h.repo.count_turns().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_get_system_prompt_unknown_is_not_found() {
        let h = harness(Some("ok"));
        let err = h
            .service
            .get_system_prompt(&ConversationId::from("nope"))
            .await
            .unwrap_err();
        assert!(matches!(err, ConversationError::NotFound));
    }

    #[tokio::test]
    async fn test_update_and_delete_unknown_are_noops() {
        let h = harness(Some("ok"));
        let id = ConversationId::from("ghost");
        h.service.update_system_prompt(&id, "x").await.unwrap();
        h.service.delete_conversation(&id).await.unwrap();
    }

    #[tokio::test]
    async fn test_delete_conversation_removes_turns() {
        let h = harness(Some("ok"));
        let keep = h.service.create_conversation(None).await.unwrap();
        let gone = h.service.create_conversation(None).await.unwrap();
        h.service.generate(&keep.id, "a").await.unwrap();
        h.service.generate(&gone.id, "b").await.unwrap();

        h.service.delete_conversation(&gone.id).await.unwrap();

        assert!(h.service.get_turns(&gone.id).await.unwrap().is_empty());
        assert_eq!(h.service.get_turns(&keep.id).await.unwrap().len(), 1);
        let ids: Vec<ConversationId> = h
            .service
            .list_conversations()
            .await
            .unwrap()
            .into_iter()
            .map(|c| c.id)
            .collect();
        assert_eq!(ids, vec![keep.id]);
    }

    #[tokio::test]
    async fn test_reset_empties_store() {
        let h = harness(Some("ok"));
        let conv = h.service.create_conversation(None).await.unwrap();
        h.service.generate(&conv.id, "a").await.unwrap();

        assert_eq!(
            h.service.stats().await.unwrap(),
            StoreStats {
                conversations: 1,
                turns: 1
            }
        );

        let counts = h.service.turn_counts().await.unwrap();
        assert_eq!(counts.get(&conv.id), Some(&1));

        h.service.reset().await.unwrap();

        assert!(h.service.turn_counts().await.unwrap().is_empty());
        assert!(h.service.list_conversations().await.unwrap().is_empty());
        assert_eq!(h.service.stats().await.unwrap(), StoreStats::default());
    }
}
