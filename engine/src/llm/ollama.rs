//! Ollama Provider
//!
//! Local completions through a running Ollama server (default
//! `http://localhost:11434`). Each prompt is sent to `/api/chat` as a single
//! user message with streaming off. No credentials are involved.

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};

use super::{LLMError, LLMProvider};

pub struct OllamaProvider {
    base_url: String,
    model: String,
    client: Client,
}

impl OllamaProvider {
    pub fn new(base_url: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            model: model.into(),
            client: Client::new(),
        }
    }

    fn url(&self, route: &str) -> String {
        format!("{}{}", self.base_url.trim_end_matches('/'), route)
    }

    fn transport_error(&self, err: reqwest::Error) -> LLMError {
        if err.is_timeout() {
            LLMError::Timeout
        } else if err.is_connect() {
            LLMError::ProviderUnavailable(format!(
                "Cannot connect to Ollama at {}. Is `ollama serve` running?",
                self.base_url
            ))
        } else {
            LLMError::NetworkError(err.to_string())
        }
    }
}

#[async_trait]
impl LLMProvider for OllamaProvider {
    fn name(&self) -> &str {
        "ollama"
    }

    fn model(&self) -> &str {
        &self.model
    }

    fn is_local(&self) -> bool {
        true
    }

    /// Ollama answers `GET /api/tags` whenever the daemon is up.
    async fn check_health(&self) -> bool {
        match self.client.get(self.url("/api/tags")).send().await {
            Ok(response) => response.status().is_success(),
            Err(_) => false,
        }
    }

    async fn generate(&self, prompt: &str) -> super::Result<String> {
        let body = ChatRequest {
            model: &self.model,
            messages: [ChatMessage {
                role: "user",
                content: prompt,
            }],
            stream: false,
        };

        let response = self
            .client
            .post(self.url("/api/chat"))
            .json(&body)
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            return Err(match status {
                StatusCode::NOT_FOUND => LLMError::InvalidRequest(format!(
                    "model '{}' is not available on the Ollama server: {}",
                    self.model, detail
                )),
                _ => LLMError::ProviderUnavailable(format!(
                    "Ollama API error ({}): {}",
                    status, detail
                )),
            });
        }

        let reply: ChatResponse = response
            .json()
            .await
            .map_err(|e| LLMError::ParseError(format!("Unexpected Ollama response: {}", e)))?;

        if reply.message.content.trim().is_empty() {
            return Err(LLMError::EmptyResponse);
        }
        Ok(reply.message.content)
    }
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: [ChatMessage<'a>; 1],
    stream: bool,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatResponse {
    message: ReplyMessage,
}

#[derive(Deserialize)]
struct ReplyMessage {
    #[serde(default)]
    content: String,
}
