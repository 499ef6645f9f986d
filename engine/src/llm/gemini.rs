//! Gemini Provider
//!
//! Talks to the Google Generative Language REST API (`models/{model}:generateContent`).
//! The API key travels as a `key=` query parameter, so every error string derived
//! from a reqwest error is scrubbed before it leaves this module.

use super::{LLMError, LLMProvider};
use crate::config::GeminiConfig;
use crate::secrets::{self, SecretString};
use async_trait::async_trait;
use serde_json::json;

/// Secret name the Gemini API key is stored under (env var `GEMINI_API_KEY`)
pub const API_KEY_NAME: &str = "gemini_api_key";

pub struct GeminiProvider {
    config: GeminiConfig,
    api_key: SecretString,
    client: reqwest::Client,
}

impl GeminiProvider {
    pub fn new(config: GeminiConfig, api_key: SecretString) -> Self {
        Self {
            config,
            api_key,
            client: reqwest::Client::new(),
        }
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/models/{}:generateContent?key={}",
            self.config.base_url.trim_end_matches('/'),
            self.config.model,
            self.api_key.unsecure()
        )
    }
}

#[async_trait]
impl LLMProvider for GeminiProvider {
    fn name(&self) -> &str {
        "gemini"
    }

    fn model(&self) -> &str {
        &self.config.model
    }

    fn is_local(&self) -> bool {
        false
    }

    async fn check_health(&self) -> bool {
        !self.api_key.is_blank()
    }

    async fn generate(&self, prompt: &str) -> super::Result<String> {
        let payload = json!({
            "contents": [{
                "role": "user",
                "parts": [{"text": prompt}]
            }]
        });

        let response = self
            .client
            .post(self.endpoint())
            .header("Content-Type", "application/json")
            .json(&payload)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    LLMError::Timeout
                } else {
                    LLMError::NetworkError(secrets::scrub(&e.to_string()))
                }
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let text = secrets::scrub(&response.text().await.unwrap_or_default());

            return Err(match status.as_u16() {
                400 | 404 => LLMError::InvalidRequest(text),
                429 => LLMError::RateLimitExceeded,
                401 | 403 => LLMError::AuthenticationFailed(text),
                _ => LLMError::ProviderUnavailable(format!(
                    "Gemini API error ({}): {}",
                    status, text
                )),
            });
        }

        let data: serde_json::Value = response
            .json()
            .await
            .map_err(|e| LLMError::ParseError(secrets::scrub(&e.to_string())))?;

        extract_candidate_text(&data)
    }
}

/// Concatenate the text parts of the first candidate.
fn extract_candidate_text(data: &serde_json::Value) -> super::Result<String> {
    let candidate = data
        .get("candidates")
        .and_then(|c| c.as_array())
        .and_then(|c| c.first())
        .ok_or_else(|| LLMError::ParseError("No candidates in response".to_string()))?;

    let parts = candidate
        .get("content")
        .and_then(|c| c.get("parts"))
        .and_then(|p| p.as_array())
        .ok_or_else(|| LLMError::ParseError("No parts in candidate content".to_string()))?;

    let full_text: String = parts
        .iter()
        .filter_map(|part| part.get("text").and_then(|t| t.as_str()))
        .collect();

    if full_text.trim().is_empty() {
        return Err(LLMError::EmptyResponse);
    }

    Ok(full_text)
}
