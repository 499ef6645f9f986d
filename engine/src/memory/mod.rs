//! Conversation Memory
//!
//! Three memory layers feed every completion call:
//!
//! - **Recent history** (`history`): a bounded FIFO window of raw turns
//! - **Preferences** (`preferences`): likes and dislikes spotted in user messages
//! - **Long-term summaries** (`compactor`): digests of the oldest turns, produced
//!   when the window grows past a trigger size
//!
//! `context` turns those layers plus the current emotion (`emotion`) into one
//! prompt, and `store` persists the whole `SessionState` as a single JSON file.

pub mod compactor;
pub mod context;
pub mod emotion;
pub mod history;
pub mod preferences;
pub mod state;
pub mod store;
pub mod types;

pub use compactor::{CompactionOutcome, CompactionPolicy, Compactor, SkipReason};
pub use context::ContextAssembler;
pub use emotion::{decode_emotion, ClassificationError, EmotionClassifier};
pub use history::HistoryBuffer;
pub use preferences::{PreferenceTracker, PreferenceUpdate};
pub use state::{PersistedPreferences, PersistedState, SessionState};
pub use store::SessionStore;
pub use types::{Emotion, EmotionRecord, Intensity, PreferenceStatement, Turn};

/// Errors raised by the in-memory structures themselves
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MemoryError {
    #[error("cannot evict {requested} turns: only {available} in history")]
    InsufficientHistory { requested: usize, available: usize },
}
