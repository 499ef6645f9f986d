//! Value types shared by every memory layer.
//!
//! All of these are immutable once built: a `Turn` is never edited after it
//! enters the history buffer and a `PreferenceStatement` is never edited
//! after it is appended.

use serde::{de, Deserialize, Deserializer, Serialize};
use std::fmt;
use std::str::FromStr;

/// Current time as an ISO 8601 / RFC 3339 timestamp (UTC, microseconds).
pub fn now_timestamp() -> String {
    chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Micros, true)
}

/// Emotion label attached to every user message
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Emotion {
    Happy,
    Sad,
    Angry,
    Anxious,
    Neutral,
    Excited,
    Frustrated,
}

impl Emotion {
    pub const ALL: [Emotion; 7] = [
        Emotion::Happy,
        Emotion::Sad,
        Emotion::Angry,
        Emotion::Anxious,
        Emotion::Neutral,
        Emotion::Excited,
        Emotion::Frustrated,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Emotion::Happy => "happy",
            Emotion::Sad => "sad",
            Emotion::Angry => "angry",
            Emotion::Anxious => "anxious",
            Emotion::Neutral => "neutral",
            Emotion::Excited => "excited",
            Emotion::Frustrated => "frustrated",
        }
    }
}

impl fmt::Display for Emotion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Emotion {
    type Err = String;

    /// Case-insensitive, surrounding whitespace ignored.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase();
        Emotion::ALL
            .into_iter()
            .find(|e| e.as_str() == wanted)
            .ok_or_else(|| s.to_string())
    }
}

/// How strongly the emotion is expressed
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Intensity {
    Low,
    Medium,
    High,
}

impl Intensity {
    pub const ALL: [Intensity; 3] = [Intensity::Low, Intensity::Medium, Intensity::High];

    pub fn as_str(&self) -> &'static str {
        match self {
            Intensity::Low => "low",
            Intensity::Medium => "medium",
            Intensity::High => "high",
        }
    }
}

impl fmt::Display for Intensity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Intensity {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase();
        Intensity::ALL
            .into_iter()
            .find(|i| i.as_str() == wanted)
            .ok_or_else(|| s.to_string())
    }
}

/// Older session files stored labels exactly as the model returned them,
/// so loading goes through the case-insensitive `FromStr`.
fn deserialize_label<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: FromStr<Err = String>,
{
    let raw = String::deserialize(deserializer)?;
    raw.parse()
        .map_err(|bad| de::Error::custom(format!("unknown label '{}'", bad)))
}

impl<'de> Deserialize<'de> for Emotion {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserialize_label(deserializer)
    }
}

impl<'de> Deserialize<'de> for Intensity {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserialize_label(deserializer)
    }
}

/// Structured emotion classification of one user message
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct EmotionRecord {
    pub emotion: Emotion,
    pub intensity: Intensity,
    #[serde(default)]
    pub keywords: Vec<String>,
}

impl EmotionRecord {
    pub fn new(emotion: Emotion, intensity: Intensity, keywords: Vec<String>) -> Self {
        Self {
            emotion,
            intensity,
            keywords,
        }
    }

    /// The fallback used whenever classification fails: neutral, low, no keywords.
    pub fn neutral() -> Self {
        Self::new(Emotion::Neutral, Intensity::Low, Vec::new())
    }
}

impl Default for EmotionRecord {
    fn default() -> Self {
        Self::neutral()
    }
}

/// One user-message/bot-reply exchange
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Turn {
    pub user: String,
    pub bot: String,
    pub emotion: EmotionRecord,
    pub timestamp: String,
}

impl Turn {
    /// Create a turn stamped with the current time
    pub fn new(user: impl Into<String>, bot: impl Into<String>, emotion: EmotionRecord) -> Self {
        Self {
            user: user.into(),
            bot: bot.into(),
            emotion,
            timestamp: now_timestamp(),
        }
    }
}

/// A remembered like or dislike, stored with the user's original wording
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PreferenceStatement {
    pub statement: String,
    pub timestamp: String,
}

impl PreferenceStatement {
    pub fn new(statement: impl Into<String>) -> Self {
        Self {
            statement: statement.into(),
            timestamp: now_timestamp(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_emotion_parse_is_case_insensitive() {
        assert_eq!(" Happy ".parse::<Emotion>(), Ok(Emotion::Happy));
        assert_eq!("FRUSTRATED".parse::<Emotion>(), Ok(Emotion::Frustrated));
        assert!("confused".parse::<Emotion>().is_err());
    }

    #[test]
    fn test_capitalized_labels_deserialize() {
        let record: EmotionRecord = serde_json::from_str(
            r#"{"emotion": "Happy", "intensity": "HIGH", "keywords": ["party"]}"#,
        )
        .unwrap();
        assert_eq!(record.emotion, Emotion::Happy);
        assert_eq!(record.intensity, Intensity::High);

        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["emotion"], "happy");
        assert_eq!(json["intensity"], "high");
    }

    #[test]
    fn test_unknown_label_is_rejected_on_load() {
        let result = serde_json::from_str::<Emotion>(r#""calm""#);
        assert!(result.is_err());
    }

    #[test]
    fn test_intensity_parse() {
        assert_eq!("medium".parse::<Intensity>(), Ok(Intensity::Medium));
        assert!("extreme".parse::<Intensity>().is_err());
    }

    #[test]
    fn test_neutral_default() {
        let record = EmotionRecord::default();
        assert_eq!(record.emotion, Emotion::Neutral);
        assert_eq!(record.intensity, Intensity::Low);
        assert!(record.keywords.is_empty());
    }

    #[test]
    fn test_turn_wire_format() {
        let turn = Turn {
            user: "hi".to_string(),
            bot: "hello".to_string(),
            emotion: EmotionRecord::new(Emotion::Excited, Intensity::High, vec!["yay".into()]),
            timestamp: "2026-01-01T00:00:00.000000Z".to_string(),
        };
        let value = serde_json::to_value(&turn).unwrap();
        assert_eq!(value["emotion"]["emotion"], "excited");
        assert_eq!(value["emotion"]["intensity"], "high");
        assert_eq!(value["emotion"]["keywords"][0], "yay");
    }

    #[test]
    fn test_timestamp_is_rfc3339() {
        let ts = now_timestamp();
        assert!(chrono::DateTime::parse_from_rfc3339(&ts).is_ok());
    }
}
