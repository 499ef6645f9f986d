//! Integration tests for session persistence
//!
//! Covers missing, corrupt, partial and forward-compatible session files and
//! the save/load fixed point.

use serde_json::{json, Value};
use tempfile::TempDir;

use doccy_engine::memory::{
    Emotion, EmotionRecord, Intensity, PreferenceStatement, SessionState, SessionStore, Turn,
};

fn sample_state() -> SessionState {
    let mut state = SessionState::new(50);
    for i in 0..12 {
        state.record_turn(Turn::new(
            format!("user says {}", i),
            format!("bot says {}", i),
            EmotionRecord::new(Emotion::Neutral, Intensity::Low, vec!["steady".to_string()]),
        ));
    }
    state.add_like(PreferenceStatement::new("I love jazz"));
    state.add_dislike(PreferenceStatement::new("I hate mornings"));
    state
        .apply_compaction("- likes jazz\n- neutral mood\n- dislikes mornings".to_string(), 5)
        .unwrap();
    state
}

fn without_last_updated(text: &str) -> Value {
    let mut value: Value = serde_json::from_str(text).unwrap();
    value.as_object_mut().unwrap().remove("last_updated");
    value
}

#[test]
fn test_missing_file_loads_empty() {
    let temp = TempDir::new().unwrap();
    let store = SessionStore::new(temp.path().join("nope.json"), 50);

    assert!(!store.exists());
    let state = store.load();
    assert!(state.history().is_empty());
    assert!(state.likes().is_empty());
    assert!(state.summaries().is_empty());
    assert!(state.last_updated().is_none());
}

#[test]
fn test_corrupt_file_loads_empty() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("chat_data.json");
    std::fs::write(&path, "{\"history\": [ this is not json").unwrap();

    let state = SessionStore::new(&path, 50).load();
    assert!(state.history().is_empty());

    // the corrupt file is left alone until the next save
    assert!(std::fs::read_to_string(&path).unwrap().starts_with("{\"history\""));
}

#[test]
fn test_partial_document_fills_defaults() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("chat_data.json");
    std::fs::write(
        &path,
        json!({
            "preferences": {
                "likes": [{"statement": "I like tea", "timestamp": "2024-01-01T00:00:00.000000+00:00"}]
            }
        })
        .to_string(),
    )
    .unwrap();

    let state = SessionStore::new(&path, 50).load();
    assert!(state.history().is_empty());
    assert_eq!(state.likes().len(), 1);
    assert_eq!(state.likes()[0].statement, "I like tea");
    assert!(state.dislikes().is_empty());
    assert!(state.summaries().is_empty());
}

#[test]
fn test_unknown_keys_are_ignored() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("chat_data.json");
    std::fs::write(
        &path,
        json!({
            "schema": 7,
            "history": [{
                "user": "hi",
                "bot": "hello",
                "emotion": {"emotion": "excited", "intensity": "high", "keywords": [], "score": 0.9},
                "timestamp": "2024-01-01T00:00:00.000000+00:00",
                "channel": "cli"
            }],
            "preferences": {"summaries": ["- greeted"], "mood_graph": {}},
            "last_updated": "2024-01-01T00:00:00.000000+00:00"
        })
        .to_string(),
    )
    .unwrap();

    let state = SessionStore::new(&path, 50).load();
    assert_eq!(state.history().len(), 1);
    let turn = state.history().iter().next().unwrap();
    assert_eq!(turn.emotion.emotion, Emotion::Excited);
    assert_eq!(turn.emotion.intensity, Intensity::High);
    assert_eq!(state.summaries(), ["- greeted".to_string()]);
    assert_eq!(
        state.last_updated(),
        Some("2024-01-01T00:00:00.000000+00:00")
    );
}

#[test]
fn test_capitalized_labels_keep_the_whole_file() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("chat_data.json");
    std::fs::write(
        &path,
        json!({
            "history": [{
                "user": "we won",
                "bot": "congratulations",
                "emotion": {"emotion": "Happy", "intensity": "High", "keywords": ["won"]},
                "timestamp": "2024-01-01T00:00:00.000000+00:00"
            }],
            "preferences": {
                "likes": [{"statement": "I love football", "timestamp": "2024-01-01T00:00:00.000000+00:00"}],
                "summaries": ["- likes football"]
            }
        })
        .to_string(),
    )
    .unwrap();

    let store = SessionStore::new(&path, 50);
    let mut state = store.load();
    assert_eq!(state.history().len(), 1);
    assert_eq!(state.likes().len(), 1);
    assert_eq!(state.summaries().len(), 1);
    let turn = state.history().iter().next().unwrap();
    assert_eq!(turn.emotion.emotion, Emotion::Happy);
    assert_eq!(turn.emotion.intensity, Intensity::High);

    store.save(&mut state).unwrap();
    let saved: Value = serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
    assert_eq!(saved["history"][0]["emotion"]["emotion"], "happy");
    assert_eq!(saved["history"][0]["emotion"]["intensity"], "high");
}

#[test]
fn test_reserved_fields_survive_round_trip() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("chat_data.json");
    std::fs::write(
        &path,
        json!({
            "history": [],
            "preferences": {
                "likes": [], "dislikes": [],
                "topics_discussed": {"music": 3},
                "emotional_patterns": [{"emotion": "sad", "count": 2}],
                "summaries": []
            }
        })
        .to_string(),
    )
    .unwrap();

    let store = SessionStore::new(&path, 50);
    let mut state = store.load();
    store.save(&mut state).unwrap();

    let saved: Value = serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
    assert_eq!(saved["preferences"]["topics_discussed"], json!({"music": 3}));
    assert_eq!(
        saved["preferences"]["emotional_patterns"],
        json!([{"emotion": "sad", "count": 2}])
    );
}

#[test]
fn test_oversized_history_is_trimmed_to_capacity() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("chat_data.json");
    let history: Vec<Value> = (0..60)
        .map(|i| {
            json!({
                "user": format!("u{}", i),
                "bot": format!("b{}", i),
                "emotion": {"emotion": "neutral", "intensity": "low", "keywords": []},
                "timestamp": "2024-01-01T00:00:00.000000+00:00"
            })
        })
        .collect();
    std::fs::write(&path, json!({ "history": history }).to_string()).unwrap();

    let state = SessionStore::new(&path, 50).load();
    assert_eq!(state.history().len(), 50);
    assert_eq!(state.history().iter().next().unwrap().user, "u10");
    assert_eq!(state.history().iter().last().unwrap().user, "u59");
}

#[test]
fn test_save_load_fixed_point() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("chat_data.json");
    let store = SessionStore::new(&path, 50);

    let mut state = sample_state();
    store.save(&mut state).unwrap();
    let first = std::fs::read_to_string(&path).unwrap();

    let mut reloaded = store.load();
    assert_eq!(reloaded.history(), state.history());
    assert_eq!(reloaded.likes(), state.likes());
    assert_eq!(reloaded.dislikes(), state.dislikes());
    assert_eq!(reloaded.summaries(), state.summaries());

    store.save(&mut reloaded).unwrap();
    let second = std::fs::read_to_string(&path).unwrap();

    assert_eq!(without_last_updated(&first), without_last_updated(&second));
}

#[test]
fn test_save_writes_expected_layout() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("nested").join("dir").join("chat_data.json");
    let store = SessionStore::new(&path, 50);

    let mut state = sample_state();
    store.save(&mut state).unwrap();

    let text = std::fs::read_to_string(&path).unwrap();
    assert!(text.contains('\n'), "session file should be pretty-printed");
    assert!(!temp.path().join("nested/dir/chat_data.json.tmp").exists());

    let saved: Value = serde_json::from_str(&text).unwrap();
    assert_eq!(saved["history"].as_array().unwrap().len(), 7);
    assert_eq!(saved["history"][0]["user"], "user says 5");
    assert_eq!(saved["history"][0]["emotion"]["emotion"], "neutral");
    assert_eq!(saved["history"][0]["emotion"]["intensity"], "low");
    assert_eq!(saved["preferences"]["likes"][0]["statement"], "I love jazz");
    assert_eq!(saved["preferences"]["dislikes"][0]["statement"], "I hate mornings");
    assert_eq!(saved["preferences"]["summaries"].as_array().unwrap().len(), 1);
    assert!(saved["preferences"]["topics_discussed"].is_object());
    assert!(saved["preferences"]["emotional_patterns"].is_array());
    assert!(saved["last_updated"].is_string());
}

#[test]
fn test_reset_then_load_is_empty() {
    let temp = TempDir::new().unwrap();
    let store = SessionStore::new(temp.path().join("chat_data.json"), 50);

    let mut state = sample_state();
    store.save(&mut state).unwrap();
    assert!(store.reset().unwrap());
    assert!(!store.reset().unwrap());
    assert!(store.load().history().is_empty());
}
