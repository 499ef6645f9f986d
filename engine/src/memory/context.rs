//! Prompt assembly.
//!
//! `ContextAssembler::build_prompt` is a pure function of the user message,
//! the current emotion and the session state. Every section is always present;
//! empty layers render a fixed placeholder so the downstream model sees the
//! same structure on the first turn as on the hundredth.

use super::state::SessionState;
use super::types::{EmotionRecord, PreferenceStatement};
use crate::config::{MemoryConfig, SessionConfig};

pub const NO_LONG_TERM_MEMORY: &str = "No long-term memories yet.";
pub const PREFERENCE_UNKNOWN: &str = "Not yet known";
pub const NO_CONVERSATION: &str = "No previous conversation";

/// Composes the bounded context payload for a reply
#[derive(Debug, Clone)]
pub struct ContextAssembler {
    assistant_name: String,
    recent_turns: usize,
    preference_window: usize,
    long_term_window: usize,
}

impl ContextAssembler {
    pub fn new(
        assistant_name: impl Into<String>,
        recent_turns: usize,
        preference_window: usize,
        long_term_window: usize,
    ) -> Self {
        Self {
            assistant_name: assistant_name.into(),
            recent_turns,
            preference_window,
            long_term_window,
        }
    }

    pub fn from_config(memory: &MemoryConfig, session: &SessionConfig) -> Self {
        Self::new(
            session.assistant_name.clone(),
            memory.recent_turns,
            memory.preference_window,
            memory.long_term_window,
        )
    }

    /// Build the reply prompt. No I/O, no mutation.
    pub fn build_prompt(
        &self,
        user_text: &str,
        emotion: &EmotionRecord,
        state: &SessionState,
    ) -> String {
        let long_term = self.long_term_section(state.summaries());
        let likes = self.preference_line(state.likes());
        let dislikes = self.preference_line(state.dislikes());
        let recent = self.recent_section(state);

        format!(
            "You are {name}, an empathetic and helpful assistant.\n\
             \n\
             LONG-TERM MEMORY (Past Interactions):\n\
             {long_term}\n\
             \n\
             EMOTIONAL CONTEXT:\n\
             User's current emotion: {emotion} (intensity: {intensity})\n\
             \n\
             USER PREFERENCES:\n\
             Things they like: {likes}\n\
             Things they dislike: {dislikes}\n\
             \n\
             RECENT CONVERSATION:\n\
             {recent}\n\
             \n\
             CURRENT MESSAGE: {user_text}\n\
             \n\
             Respond empathetically based on their emotional state. If they seem {emotion}, \
             acknowledge it naturally and adjust your tone accordingly. Be helpful and warm.",
            name = self.assistant_name,
            emotion = emotion.emotion,
            intensity = emotion.intensity,
        )
    }

    /// The newest `long_term_window` summaries, oldest first
    fn long_term_section(&self, summaries: &[String]) -> String {
        if summaries.is_empty() {
            return NO_LONG_TERM_MEMORY.to_string();
        }
        let skip = summaries.len().saturating_sub(self.long_term_window);
        summaries[skip..].join("\n")
    }

    fn preference_line(&self, statements: &[PreferenceStatement]) -> String {
        if statements.is_empty() {
            return PREFERENCE_UNKNOWN.to_string();
        }
        let skip = statements.len().saturating_sub(self.preference_window);
        statements[skip..]
            .iter()
            .map(|s| s.statement.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    }

    fn recent_section(&self, state: &SessionState) -> String {
        let turns = state.history().snapshot(self.recent_turns);
        if turns.is_empty() {
            return NO_CONVERSATION.to_string();
        }
        turns
            .iter()
            .map(|t| format!("User: {}\nBot: {}", t.user, t.bot))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

impl Default for ContextAssembler {
    fn default() -> Self {
        Self::from_config(&MemoryConfig::default(), &SessionConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::types::{Emotion, Intensity, Turn};

    fn state_with_turns(n: usize) -> SessionState {
        let mut state = SessionState::new(50);
        for i in 0..n {
            state.record_turn(Turn::new(
                format!("question {}", i),
                format!("answer {}", i),
                EmotionRecord::neutral(),
            ));
        }
        state
    }

    #[test]
    fn test_empty_state_uses_placeholders() {
        let prompt = ContextAssembler::default().build_prompt(
            "hello",
            &EmotionRecord::neutral(),
            &SessionState::new(50),
        );

        assert!(prompt.contains(NO_LONG_TERM_MEMORY));
        assert!(prompt.contains(&format!("Things they like: {}", PREFERENCE_UNKNOWN)));
        assert!(prompt.contains(&format!("Things they dislike: {}", PREFERENCE_UNKNOWN)));
        assert!(prompt.contains(NO_CONVERSATION));
        assert!(prompt.contains("User's current emotion: neutral (intensity: low)"));
        assert!(prompt.contains("CURRENT MESSAGE: hello"));
        assert!(prompt.starts_with("You are Doccy"));
    }

    #[test]
    fn test_sections_in_fixed_order() {
        let prompt = ContextAssembler::default().build_prompt(
            "hi",
            &EmotionRecord::neutral(),
            &SessionState::new(50),
        );
        let order = [
            "LONG-TERM MEMORY",
            "EMOTIONAL CONTEXT",
            "USER PREFERENCES",
            "RECENT CONVERSATION",
            "CURRENT MESSAGE",
            "Respond empathetically",
        ];
        let positions: Vec<usize> = order.iter().map(|h| prompt.find(h).unwrap()).collect();
        assert!(positions.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn test_recent_conversation_is_last_five_in_order() {
        let state = state_with_turns(8);
        let prompt =
            ContextAssembler::default().build_prompt("now", &EmotionRecord::neutral(), &state);

        assert!(!prompt.contains("question 2"));
        assert!(prompt.contains(
            "User: question 3\nBot: answer 3\nUser: question 4\nBot: answer 4\nUser: question 5"
        ));
        assert!(prompt.contains("User: question 7\nBot: answer 7"));
        assert!(!prompt.contains(NO_CONVERSATION));
    }

    #[test]
    fn test_preferences_last_three_joined() {
        let mut state = SessionState::new(50);
        for s in ["I like a", "I like b", "I like c", "I like d"] {
            state.add_like(PreferenceStatement::new(s));
        }
        state.add_dislike(PreferenceStatement::new("I hate z"));

        let prompt =
            ContextAssembler::default().build_prompt("x", &EmotionRecord::neutral(), &state);
        assert!(prompt.contains("Things they like: I like b, I like c, I like d\n"));
        assert!(prompt.contains("Things they dislike: I hate z\n"));
    }

    #[test]
    fn test_long_term_memory_is_most_recent_summary() {
        let mut state = state_with_turns(10);
        state.apply_compaction("- first digest".to_string(), 5).unwrap();
        state.apply_compaction("- second digest".to_string(), 5).unwrap();

        let prompt =
            ContextAssembler::default().build_prompt("x", &EmotionRecord::neutral(), &state);
        assert!(prompt.contains("LONG-TERM MEMORY (Past Interactions):\n- second digest\n"));
        assert!(!prompt.contains("first digest"));
    }

    #[test]
    fn test_wider_long_term_window_joins_summaries() {
        let mut state = state_with_turns(10);
        state.apply_compaction("- first digest".to_string(), 5).unwrap();
        state.apply_compaction("- second digest".to_string(), 5).unwrap();

        let assembler = ContextAssembler::new("Doccy", 5, 3, 3);
        let prompt = assembler.build_prompt("x", &EmotionRecord::neutral(), &state);
        assert!(prompt.contains("- first digest\n- second digest"));
    }

    #[test]
    fn test_emotion_instruction() {
        let emotion = EmotionRecord::new(Emotion::Frustrated, Intensity::High, vec![]);
        let prompt =
            ContextAssembler::default().build_prompt("ugh", &emotion, &SessionState::new(50));
        assert!(prompt.contains("User's current emotion: frustrated (intensity: high)"));
        assert!(prompt.contains("If they seem frustrated, acknowledge it"));
    }

    #[test]
    fn test_build_prompt_is_pure() {
        let state = state_with_turns(3);
        let before = state.clone();
        let assembler = ContextAssembler::default();
        let a = assembler.build_prompt("same", &EmotionRecord::neutral(), &state);
        let b = assembler.build_prompt("same", &EmotionRecord::neutral(), &state);
        assert_eq!(a, b);
        assert_eq!(state, before);
    }
}
