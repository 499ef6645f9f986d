//! Long-term memory compaction.
//!
//! Once history reaches the trigger size, the oldest slice of turns is sent to
//! the completion service for a short digest. The digest is appended to the
//! summaries and the slice is evicted in one `SessionState::apply_compaction`
//! call, only after the digest was obtained. At most one compaction runs per
//! call; a long history shrinks by one slice per turn.

use sdk::errors::EngineError;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;

use super::state::SessionState;
use super::store::SessionStore;
use super::types::Turn;
use crate::config::MemoryConfig;
use crate::llm::{self, LLMProvider};

/// Size thresholds driving compaction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CompactionPolicy {
    /// History length at which `maybe_compact` acts
    pub trigger: usize,
    /// Floor below which nothing is compacted, even by `compact`
    pub min_summarize: usize,
    /// Turns folded into each summary
    pub slice: usize,
}

impl Default for CompactionPolicy {
    fn default() -> Self {
        Self {
            trigger: 20,
            min_summarize: 10,
            slice: 5,
        }
    }
}

impl From<&MemoryConfig> for CompactionPolicy {
    fn from(config: &MemoryConfig) -> Self {
        Self {
            trigger: config.compaction_trigger,
            min_summarize: config.min_summarize,
            slice: config.compaction_slice,
        }
    }
}

/// Why no compaction was attempted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum SkipReason {
    BelowTrigger { len: usize, trigger: usize },
    BelowGuard { len: usize, min_summarize: usize },
}

/// Result of one compaction pass
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum CompactionOutcome {
    /// Nothing was attempted
    Skipped(SkipReason),
    /// One summary appended, `summarized` turns evicted
    Compacted {
        summarized: usize,
        history_len: usize,
        summaries: usize,
    },
    /// The summary call failed; state is unchanged
    Failed { reason: String },
}

impl CompactionOutcome {
    pub fn is_compacted(&self) -> bool {
        matches!(self, CompactionOutcome::Compacted { .. })
    }
}

/// Folds the oldest turns into long-term summaries
pub struct Compactor {
    provider: Arc<dyn LLMProvider>,
    timeout: Duration,
    policy: CompactionPolicy,
}

impl Compactor {
    pub fn new(provider: Arc<dyn LLMProvider>, timeout: Duration, policy: CompactionPolicy) -> Self {
        Self {
            provider,
            timeout,
            policy,
        }
    }

    pub fn policy(&self) -> CompactionPolicy {
        self.policy
    }

    /// Compact once if history has reached the trigger size.
    ///
    /// # Errors
    /// Only a failure to persist the compacted state is returned.
    pub async fn maybe_compact(
        &self,
        state: &mut SessionState,
        store: &SessionStore,
    ) -> Result<CompactionOutcome, EngineError> {
        let len = state.history().len();
        if len < self.policy.trigger {
            return Ok(CompactionOutcome::Skipped(SkipReason::BelowTrigger {
                len,
                trigger: self.policy.trigger,
            }));
        }
        self.compact(state, store).await
    }

    /// Compact once regardless of the trigger, still honoring the guard.
    ///
    /// # Errors
    /// Only a failure to persist the compacted state is returned.
    pub async fn compact(
        &self,
        state: &mut SessionState,
        store: &SessionStore,
    ) -> Result<CompactionOutcome, EngineError> {
        let len = state.history().len();
        if len < self.policy.min_summarize || len < self.policy.slice {
            return Ok(CompactionOutcome::Skipped(SkipReason::BelowGuard {
                len,
                min_summarize: self.policy.min_summarize,
            }));
        }

        let slice = state.history().oldest(self.policy.slice);
        let prompt = summary_prompt(&slice);

        let summary =
            match llm::generate_with_timeout(self.provider.as_ref(), &prompt, self.timeout).await {
                Ok(text) => text.trim().to_string(),
                Err(e) => {
                    let reason = crate::secrets::scrub(&e.to_string());
                    tracing::warn!(error = %reason, "summarization failed, keeping history as is");
                    return Ok(CompactionOutcome::Failed { reason });
                }
            };

        if summary.is_empty() {
            tracing::warn!("summarization returned no text, keeping history as is");
            return Ok(CompactionOutcome::Failed {
                reason: "empty summary".to_string(),
            });
        }

        if let Err(e) = state.apply_compaction(summary, self.policy.slice) {
            return Ok(CompactionOutcome::Failed {
                reason: e.to_string(),
            });
        }

        store.save(state)?;

        let outcome = CompactionOutcome::Compacted {
            summarized: self.policy.slice,
            history_len: state.history().len(),
            summaries: state.summaries().len(),
        };
        tracing::info!(
            summarized = self.policy.slice,
            history_len = state.history().len(),
            summaries = state.summaries().len(),
            "compacted oldest turns into long-term memory"
        );
        Ok(outcome)
    }
}

/// Prompt asking for a three-bullet digest of `turns`
pub fn summary_prompt(turns: &[Turn]) -> String {
    let mut prompt = String::from(
        "Summarize the following interaction into 3 key bullet points regarding user facts or mood:\n",
    );
    for turn in turns {
        prompt.push_str(&format!(
            "\nUser ({}, {}): {}\nBot: {}\n",
            turn.emotion.emotion, turn.emotion.intensity, turn.user, turn.bot
        ));
    }
    prompt
}
