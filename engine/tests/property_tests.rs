use proptest::prelude::*;
use doccy_engine::config::{Config, MemoryConfig};
use doccy_engine::memory::{
    EmotionRecord, HistoryBuffer, PreferenceTracker, SessionState, Turn,
};

fn turn(i: usize) -> Turn {
    Turn::new(format!("u{}", i), format!("b{}", i), EmotionRecord::neutral())
}

// History never exceeds its capacity and keeps the newest turns in order
proptest! {
    #[test]
    fn test_history_bounded_fifo(capacity in 1usize..64, appends in 0usize..200) {
        let mut buffer = HistoryBuffer::with_capacity(capacity);
        let mut evicted_total = 0;
        for i in 0..appends {
            evicted_total += buffer.append(turn(i));
            prop_assert!(buffer.len() <= capacity);
        }

        let expected_len = appends.min(capacity);
        prop_assert_eq!(buffer.len(), expected_len);
        prop_assert_eq!(evicted_total, appends - expected_len);

        let users: Vec<String> = buffer.iter().map(|t| t.user.clone()).collect();
        let expected: Vec<String> = (appends - expected_len..appends)
            .map(|i| format!("u{}", i))
            .collect();
        prop_assert_eq!(users, expected);
    }
}

// Snapshot returns the last min(n, len) turns oldest first
proptest! {
    #[test]
    fn test_snapshot_is_suffix(len in 0usize..50, n in 0usize..60) {
        let buffer = HistoryBuffer::from_turns((0..len).map(turn), 50);
        let snap = buffer.snapshot(n);
        prop_assert_eq!(snap.len(), n.min(len));

        let all: Vec<Turn> = buffer.iter().cloned().collect();
        prop_assert_eq!(&snap[..], &all[all.len() - snap.len()..]);
    }
}

// Compaction either removes k turns and adds one summary, or changes nothing
proptest! {
    #[test]
    fn test_compaction_is_atomic(len in 0usize..50, k in 0usize..60) {
        let mut state = SessionState::new(50);
        for i in 0..len {
            state.record_turn(turn(i));
        }
        let before = state.clone();

        match state.apply_compaction("- digest".to_string(), k) {
            Ok(removed) => {
                prop_assert!(k <= len);
                prop_assert_eq!(removed.len(), k);
                prop_assert_eq!(state.history().len(), len - k);
                prop_assert_eq!(state.summaries().len(), before.summaries().len() + 1);
                if let Some(first) = state.history().iter().next() {
                    prop_assert_eq!(&first.user, &format!("u{}", k));
                }
            }
            Err(_) => {
                prop_assert!(k > len);
                prop_assert_eq!(&state, &before);
            }
        }
    }
}

// Preference tracking appends the raw text once per matching list
proptest! {
    #[test]
    fn test_preferences_append_verbatim(
        prefix in "[a-z ]{0,12}",
        marker in "love|like|enjoy|favourite|hate|dislike|annoying|(no marker)",
        suffix in "[a-z ]{0,12}",
    ) {
        let text = format!("{}{}{}", prefix, marker, suffix);
        let lower = text.to_lowercase();
        let likes = ["love", "like", "enjoy", "favourite"].iter().any(|m| lower.contains(m));
        let dislikes = ["hate", "dislike", "don't like", "annoying"]
            .iter()
            .any(|m| lower.contains(m));

        let mut state = SessionState::new(50);
        let update = PreferenceTracker::new().track(&text, "reply", &mut state);

        prop_assert_eq!(update.liked, likes);
        prop_assert_eq!(update.disliked, dislikes);
        prop_assert_eq!(state.likes().len(), usize::from(likes));
        prop_assert_eq!(state.dislikes().len(), usize::from(dislikes));
        for statement in state.likes().iter().chain(state.dislikes()) {
            prop_assert_eq!(&statement.statement, &text);
        }
    }
}

// Memory configuration survives a TOML round trip
proptest! {
    #[test]
    fn test_memory_config_round_trip(
        slice in 1usize..10,
        extra_min in 0usize..10,
        extra_trigger in 0usize..20,
        extra_capacity in 0usize..50,
        recent in 1usize..20,
        window in 1usize..10,
    ) {
        let min_summarize = slice + extra_min;
        let trigger = min_summarize + extra_trigger;
        let memory = MemoryConfig {
            history_capacity: trigger + extra_capacity,
            compaction_trigger: trigger,
            min_summarize,
            compaction_slice: slice,
            recent_turns: recent,
            preference_window: window,
            long_term_window: window,
        };
        prop_assert!(memory.validate().is_ok());

        let mut config = Config::default_config();
        config.memory = memory.clone();

        let serialized = toml::to_string(&config).unwrap();
        let parsed: Config = toml::from_str(&serialized).unwrap();
        prop_assert_eq!(parsed.memory, memory);
    }
}
