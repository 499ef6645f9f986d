//! Turn pipeline
//!
//! Each call to [`Session::handle_turn`] runs, in order:
//!
//! 1. Classify the user's emotion (degrades to neutral on failure)
//! 2. Assemble the reply prompt from every memory layer
//! 3. Generate the reply (degrades to a fixed apology on failure)
//! 4. Record the turn and any preference statements
//! 5. Persist the state
//! 6. Compact the oldest turns if history reached the trigger
//!
//! Only a persistence failure aborts the turn.

use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use tracing::Instrument;
use uuid::Uuid;

use crate::config::Config;
use crate::llm::{self, LLMProvider};
use crate::memory::{
    CompactionOutcome, CompactionPolicy, Compactor, ContextAssembler, EmotionClassifier,
    EmotionRecord, PreferenceTracker, PreferenceUpdate, SessionState, SessionStore, Turn,
};
use sdk::errors::EngineError;

/// Reply stored and shown when generation fails
pub const GENERATION_FALLBACK: &str = "Sorry, I couldn't generate a response right now.";

const EXIT_COMMANDS: [&str; 3] = ["quit", "exit", "bye"];

/// Whether `input` ends the interactive loop
pub fn is_exit_command(input: &str) -> bool {
    let trimmed = input.trim();
    EXIT_COMMANDS
        .iter()
        .any(|cmd| trimmed.eq_ignore_ascii_case(cmd))
}

/// Result of one processed turn
#[derive(Debug, Clone, Serialize)]
pub struct TurnOutcome {
    pub reply: String,
    pub emotion: EmotionRecord,
    pub generation_failed: bool,
    pub preferences: PreferenceUpdate,
    pub compaction: CompactionOutcome,
}

/// One user's conversation with the assistant
pub struct Session {
    session_id: String,
    state: SessionState,
    store: SessionStore,
    provider: Arc<dyn LLMProvider>,
    timeout: Duration,
    classifier: EmotionClassifier,
    tracker: PreferenceTracker,
    assembler: ContextAssembler,
    compactor: Compactor,
}

impl Session {
    pub fn new(
        state: SessionState,
        store: SessionStore,
        provider: Arc<dyn LLMProvider>,
        timeout: Duration,
        assembler: ContextAssembler,
        policy: CompactionPolicy,
    ) -> Self {
        Self {
            session_id: Uuid::new_v4().to_string(),
            state,
            classifier: EmotionClassifier::new(Arc::clone(&provider), timeout),
            compactor: Compactor::new(Arc::clone(&provider), timeout, policy),
            tracker: PreferenceTracker::new(),
            assembler,
            store,
            provider,
            timeout,
        }
    }

    /// Build a session from configuration, loading any saved state.
    pub fn from_config(config: &Config, provider: Arc<dyn LLMProvider>) -> Self {
        let store = SessionStore::new(config.state_file_path(), config.memory.history_capacity);
        let state = store.load();

        tracing::info!(
            path = %store.path().display(),
            history = state.history().len(),
            summaries = state.summaries().len(),
            provider = provider.name(),
            model = provider.model(),
            "session ready"
        );

        Self::new(
            state,
            store,
            provider,
            config.llm.timeout(),
            ContextAssembler::from_config(&config.memory, &config.session),
            CompactionPolicy::from(&config.memory),
        )
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn store(&self) -> &SessionStore {
        &self.store
    }

    pub fn provider(&self) -> &dyn LLMProvider {
        self.provider.as_ref()
    }

    /// Process one user message.
    ///
    /// # Errors
    /// Returns `EngineError::Persistence` if the state cannot be saved. The
    /// in-memory state has already been updated at that point.
    pub async fn handle_turn(&mut self, user_text: &str) -> Result<TurnOutcome, EngineError> {
        let span = tracing::info_span!("turn", session_id = %self.session_id);
        self.run_turn(user_text).instrument(span).await
    }

    async fn run_turn(&mut self, user_text: &str) -> Result<TurnOutcome, EngineError> {
        let emotion = self.classifier.classify(user_text).await;
        let prompt = self.assembler.build_prompt(user_text, &emotion, &self.state);

        let (reply, generation_failed) =
            match llm::generate_with_timeout(self.provider.as_ref(), &prompt, self.timeout).await {
                Ok(text) => (text.trim().to_string(), false),
                Err(e) => {
                    tracing::warn!(
                        error = %crate::secrets::scrub(&e.to_string()),
                        "reply generation failed, sending fallback"
                    );
                    (GENERATION_FALLBACK.to_string(), true)
                }
            };

        let evicted = self
            .state
            .record_turn(Turn::new(user_text, reply.clone(), emotion.clone()));
        if evicted > 0 {
            tracing::debug!(evicted, "history at capacity, dropped oldest turns");
        }

        let preferences = self.tracker.track(user_text, &reply, &mut self.state);

        self.store.save(&mut self.state)?;

        let compaction = self
            .compactor
            .maybe_compact(&mut self.state, &self.store)
            .await?;

        tracing::debug!(
            emotion = %emotion.emotion,
            generation_failed,
            history = self.state.history().len(),
            "turn complete"
        );

        Ok(TurnOutcome {
            reply,
            emotion,
            generation_failed,
            preferences,
            compaction,
        })
    }
}
