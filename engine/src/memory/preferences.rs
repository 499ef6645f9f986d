//! Like/dislike extraction from user messages.
//!
//! A lower-cased substring search against two fixed marker sets. "unlike"
//! counts as a like and "dislike" counts as both a like and a dislike. Both
//! lists may grow from one message.

use serde::Serialize;

use super::state::SessionState;
use super::types::PreferenceStatement;

/// Substrings that mark a message as expressing a like
pub const LIKE_MARKERS: [&str; 4] = ["love", "like", "enjoy", "favourite"];

/// Substrings that mark a message as expressing a dislike
pub const DISLIKE_MARKERS: [&str; 4] = ["hate", "dislike", "don't like", "annoying"];

/// Which preference lists a single `track` call appended to
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct PreferenceUpdate {
    pub liked: bool,
    pub disliked: bool,
}

impl PreferenceUpdate {
    pub fn any(&self) -> bool {
        self.liked || self.disliked
    }
}

/// Appends timestamped preference statements to the session state
#[derive(Debug, Clone, Copy, Default)]
pub struct PreferenceTracker;

impl PreferenceTracker {
    pub fn new() -> Self {
        Self
    }

    /// Scan `user_text` and append it verbatim to `likes` and/or `dislikes`.
    ///
    /// The bot reply is accepted for symmetry with the turn record but is not
    /// inspected.
    pub fn track(
        &self,
        user_text: &str,
        _bot_text: &str,
        state: &mut SessionState,
    ) -> PreferenceUpdate {
        let update = PreferenceUpdate {
            liked: expresses_like(user_text),
            disliked: expresses_dislike(user_text),
        };

        if update.liked {
            state.add_like(PreferenceStatement::new(user_text));
        }
        if update.disliked {
            state.add_dislike(PreferenceStatement::new(user_text));
        }

        if update.any() {
            tracing::debug!(
                liked = update.liked,
                disliked = update.disliked,
                "recorded user preference"
            );
        }

        update
    }
}

pub fn expresses_like(text: &str) -> bool {
    contains_any(text, &LIKE_MARKERS)
}

pub fn expresses_dislike(text: &str) -> bool {
    contains_any(text, &DISLIKE_MARKERS)
}

fn contains_any(text: &str, markers: &[&str]) -> bool {
    let lowered = text.to_lowercase();
    markers.iter().any(|marker| lowered.contains(marker))
}
