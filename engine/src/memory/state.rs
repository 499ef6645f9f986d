//! The session aggregate and its on-disk shape.
//!
//! `SessionState` is the only unit of persistence. Its collections only grow:
//! the sole way turns leave history (apart from capacity eviction) is
//! `apply_compaction`, which swaps an exact slice for one summary in a single
//! call.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::history::HistoryBuffer;
use super::types::{PreferenceStatement, Turn};
use super::MemoryError;

/// In-memory session state
#[derive(Debug, Clone, PartialEq)]
pub struct SessionState {
    history: HistoryBuffer,
    likes: Vec<PreferenceStatement>,
    dislikes: Vec<PreferenceStatement>,
    topics_discussed: Map<String, Value>,
    emotional_patterns: Vec<Value>,
    summaries: Vec<String>,
    last_updated: Option<String>,
}

impl SessionState {
    /// Empty state whose history holds at most `capacity` turns
    pub fn new(capacity: usize) -> Self {
        Self {
            history: HistoryBuffer::with_capacity(capacity),
            likes: Vec::new(),
            dislikes: Vec::new(),
            topics_discussed: Map::new(),
            emotional_patterns: Vec::new(),
            summaries: Vec::new(),
            last_updated: None,
        }
    }

    /// Rebuild state from its persisted form.
    ///
    /// Stored history longer than `capacity` keeps only the newest turns.
    pub fn from_persisted(persisted: PersistedState, capacity: usize) -> Self {
        let PersistedState {
            history,
            preferences,
            last_updated,
        } = persisted;

        Self {
            history: HistoryBuffer::from_turns(history, capacity),
            likes: preferences.likes,
            dislikes: preferences.dislikes,
            topics_discussed: preferences.topics_discussed,
            emotional_patterns: preferences.emotional_patterns,
            summaries: preferences.summaries,
            last_updated,
        }
    }

    /// Snapshot in the persisted schema
    pub fn to_persisted(&self) -> PersistedState {
        PersistedState {
            history: self.history.iter().cloned().collect(),
            preferences: PersistedPreferences {
                likes: self.likes.clone(),
                dislikes: self.dislikes.clone(),
                topics_discussed: self.topics_discussed.clone(),
                emotional_patterns: self.emotional_patterns.clone(),
                summaries: self.summaries.clone(),
            },
            last_updated: self.last_updated.clone(),
        }
    }

    pub fn history(&self) -> &HistoryBuffer {
        &self.history
    }

    pub fn likes(&self) -> &[PreferenceStatement] {
        &self.likes
    }

    pub fn dislikes(&self) -> &[PreferenceStatement] {
        &self.dislikes
    }

    pub fn summaries(&self) -> &[String] {
        &self.summaries
    }

    pub fn last_updated(&self) -> Option<&str> {
        self.last_updated.as_deref()
    }

    /// Append a turn to history; returns how many old turns fell off the head.
    pub fn record_turn(&mut self, turn: Turn) -> usize {
        self.history.append(turn)
    }

    pub fn add_like(&mut self, statement: PreferenceStatement) {
        self.likes.push(statement);
    }

    pub fn add_dislike(&mut self, statement: PreferenceStatement) {
        self.dislikes.push(statement);
    }

    /// Replace the oldest `k` turns with one summary entry.
    ///
    /// Either both changes happen or neither does.
    pub fn apply_compaction(
        &mut self,
        summary: String,
        k: usize,
    ) -> Result<Vec<Turn>, MemoryError> {
        let removed = self.history.evict_oldest(k)?;
        self.summaries.push(summary);
        Ok(removed)
    }

    pub(crate) fn set_last_updated(&mut self, timestamp: String) {
        self.last_updated = Some(timestamp);
    }
}

/// On-disk session document
///
/// ```json
/// {
///   "history": [ {"user", "bot", "emotion": {...}, "timestamp"} ],
///   "preferences": {
///     "likes": [], "dislikes": [],
///     "topics_discussed": {}, "emotional_patterns": [],
///     "summaries": []
///   },
///   "last_updated": "..."
/// }
/// ```
///
/// Every key is optional on read; missing keys become empty containers and
/// unknown keys are ignored.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PersistedState {
    #[serde(default)]
    pub history: Vec<Turn>,

    #[serde(default)]
    pub preferences: PersistedPreferences,

    #[serde(default)]
    pub last_updated: Option<String>,
}

/// The `preferences` object of the session document
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PersistedPreferences {
    #[serde(default)]
    pub likes: Vec<PreferenceStatement>,

    #[serde(default)]
    pub dislikes: Vec<PreferenceStatement>,

    /// Reserved; carried through untouched
    #[serde(default)]
    pub topics_discussed: Map<String, Value>,

    /// Reserved; carried through untouched
    #[serde(default)]
    pub emotional_patterns: Vec<Value>,

    #[serde(default)]
    pub summaries: Vec<String>,
}
