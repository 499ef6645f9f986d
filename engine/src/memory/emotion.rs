//! Emotion classification of user messages.
//!
//! The classifier asks the completion service for a small JSON object and
//! decodes it strictly. Any failure along the way (transport, timeout, no JSON,
//! wrong shape, unknown label) degrades to `EmotionRecord::neutral()`; a chat
//! turn never fails because its emotion could not be read.

use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;

use super::types::{Emotion, EmotionRecord, Intensity};
use crate::llm::{self, LLMError, LLMProvider};

/// Why a classification attempt produced no usable record
#[derive(Debug, thiserror::Error)]
pub enum ClassificationError {
    #[error("completion failed: {0}")]
    Provider(#[from] LLMError),

    #[error("no JSON object in classifier output")]
    NoJson,

    #[error("malformed classifier output: {0}")]
    Malformed(String),

    #[error("unknown emotion label '{0}'")]
    UnknownEmotion(String),

    #[error("unknown intensity '{0}'")]
    UnknownIntensity(String),
}

/// Wire shape expected from the model. All three fields are required.
#[derive(Debug, Deserialize)]
struct RawEmotion {
    emotion: String,
    intensity: String,
    keywords: Vec<String>,
}

/// Decode classifier output into an `EmotionRecord`.
///
/// The object may be bare, fenced, or embedded in prose. Extra fields are
/// ignored; labels are matched case-insensitively.
pub fn decode_emotion(raw: &str) -> Result<EmotionRecord, ClassificationError> {
    let json = llm::extract_json_object(raw).ok_or(ClassificationError::NoJson)?;
    let parsed: RawEmotion =
        serde_json::from_str(json).map_err(|e| ClassificationError::Malformed(e.to_string()))?;

    let emotion: Emotion = parsed
        .emotion
        .parse()
        .map_err(ClassificationError::UnknownEmotion)?;
    let intensity: Intensity = parsed
        .intensity
        .parse()
        .map_err(ClassificationError::UnknownIntensity)?;

    let keywords = parsed
        .keywords
        .into_iter()
        .map(|k| k.trim().to_string())
        .filter(|k| !k.is_empty())
        .collect();

    Ok(EmotionRecord::new(emotion, intensity, keywords))
}

/// Prompt sent to the completion service for one user message
pub fn classification_prompt(text: &str) -> String {
    let emotions: Vec<&str> = Emotion::ALL.iter().map(|e| e.as_str()).collect();
    let intensities: Vec<&str> = Intensity::ALL.iter().map(|i| i.as_str()).collect();

    format!(
        "Analyze the emotion in this message and respond with only a JSON object:\n\
         Message: \"{}\"\n\
         Return format:\n\
         {{\"emotion\": \"{}\", \"intensity\": \"{}\", \"keywords\": [\"word1\", \"word2\"]}}",
        text,
        emotions.join("/"),
        intensities.join("/")
    )
}

/// Turns raw user text into an `EmotionRecord` via one completion call
pub struct EmotionClassifier {
    provider: Arc<dyn LLMProvider>,
    timeout: Duration,
}

impl EmotionClassifier {
    pub fn new(provider: Arc<dyn LLMProvider>, timeout: Duration) -> Self {
        Self { provider, timeout }
    }

    /// Classify `text`, falling back to neutral/low/no keywords on any failure.
    pub async fn classify(&self, text: &str) -> EmotionRecord {
        match self.try_classify(text).await {
            Ok(record) => {
                tracing::debug!(
                    emotion = %record.emotion,
                    intensity = %record.intensity,
                    "classified user emotion"
                );
                record
            }
            Err(e) => {
                tracing::warn!(
                    error = %crate::secrets::scrub(&e.to_string()),
                    "emotion classification failed, assuming neutral"
                );
                EmotionRecord::neutral()
            }
        }
    }

    /// Classify `text`, reporting why it failed instead of degrading.
    ///
    /// Single attempt; no retries.
    pub async fn try_classify(&self, text: &str) -> Result<EmotionRecord, ClassificationError> {
        let prompt = classification_prompt(text);
        let raw = llm::generate_with_timeout(self.provider.as_ref(), &prompt, self.timeout).await?;
        decode_emotion(&raw)
    }
}
