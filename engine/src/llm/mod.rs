//! Completion Provider Abstraction Layer
//!
//! Everything the memory subsystem needs from a language model is one
//! operation: send a prompt, get text back. The `LLMProvider` trait captures
//! that contract for Gemini (the default) and a local Ollama server, and
//! `generate_with_timeout` bounds every call so a stalled provider turns into
//! an ordinary failure the caller can degrade on.

use async_trait::async_trait;
use sdk::errors::EngineError;
use std::time::Duration;

use crate::config::LLMConfig;
use crate::secrets::SecretManager;

pub mod gemini;
pub mod ollama;

/// Result type for LLM operations
pub type Result<T> = std::result::Result<T, LLMError>;

/// Errors that can occur during LLM operations
#[derive(Debug, thiserror::Error)]
pub enum LLMError {
    #[error("Provider unavailable: {0}")]
    ProviderUnavailable(String),

    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    #[error("Rate limit exceeded")]
    RateLimitExceeded,

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Network error: {0}")]
    NetworkError(String),

    #[error("Timeout")]
    Timeout,

    #[error("Parse error: {0}")]
    ParseError(String),

    #[error("Provider returned an empty completion")]
    EmptyResponse,
}

impl From<LLMError> for EngineError {
    fn from(err: LLMError) -> Self {
        match err {
            LLMError::Timeout => EngineError::LLMTimeout,
            other => EngineError::LLMProvider(other.to_string()),
        }
    }
}

/// LLM Provider trait that all providers must implement
#[async_trait]
pub trait LLMProvider: Send + Sync {
    /// Returns the name of the provider (e.g., "gemini", "ollama")
    fn name(&self) -> &str;

    /// Returns the model identifier requests are sent to
    fn model(&self) -> &str;

    /// Returns true if this is a local provider (e.g., Ollama), false for cloud providers
    fn is_local(&self) -> bool;

    /// Generate a completion for a single prompt
    ///
    /// # Returns
    /// * `Ok(String)` - The completion text, untrimmed
    /// * `Err(LLMError)` - If the request fails or the response has no text
    async fn generate(&self, prompt: &str) -> Result<String>;

    /// Check if the provider is currently healthy and available
    /// Default implementation returns true.
    async fn check_health(&self) -> bool {
        true
    }
}

/// Run `provider.generate(prompt)` with an upper bound on wall time.
///
/// Expiry is reported as `LLMError::Timeout`, indistinguishable to callers from
/// any other provider failure.
pub async fn generate_with_timeout(
    provider: &dyn LLMProvider,
    prompt: &str,
    limit: Duration,
) -> Result<String> {
    let started = std::time::Instant::now();
    let result = match tokio::time::timeout(limit, provider.generate(prompt)).await {
        Ok(result) => result,
        Err(_) => Err(LLMError::Timeout),
    };

    tracing::debug!(
        provider = provider.name(),
        model = provider.model(),
        prompt_chars = prompt.len(),
        elapsed_ms = started.elapsed().as_millis() as u64,
        ok = result.is_ok(),
        "completion call finished"
    );

    result
}

/// Build the provider named by `config.default_provider`.
///
/// # Errors
/// Returns an error for an unknown provider name, or when a cloud provider's
/// API key cannot be found.
pub fn build_provider(
    config: &LLMConfig,
    secrets: &SecretManager,
) -> std::result::Result<Box<dyn LLMProvider>, EngineError> {
    match config.default_provider.as_str() {
        "gemini" => {
            let api_key = secrets.get_secret(gemini::API_KEY_NAME)?;
            Ok(Box::new(gemini::GeminiProvider::new(
                config.gemini.clone(),
                api_key,
            )))
        }
        "ollama" => Ok(Box::new(ollama::OllamaProvider::new(
            config.ollama.base_url.clone(),
            config.ollama.model.clone(),
        ))),
        other => Err(EngineError::Config(format!(
            "Unknown completion provider '{}'",
            other
        ))),
    }
}

/// Locate a JSON object in model output.
///
/// Handles the shapes models actually produce:
/// 1. Raw JSON: the whole (trimmed) content is an object
/// 2. Fenced JSON: ` ```json\n{...}\n``` `, with or without surrounding prose
/// 3. JSON embedded in prose: the first balanced `{...}`
pub fn extract_json_object(content: &str) -> Option<&str> {
    let trimmed = content.trim();

    // Pattern 1: Raw JSON
    if trimmed.starts_with('{') && trimmed.ends_with('}') {
        return Some(trimmed);
    }

    // Pattern 2: Extract from markdown code fences (even with trailing text)
    if let Some(inner) = extract_fenced_block(trimmed) {
        let inner = inner.trim();
        if inner.starts_with('{') {
            if let Some(json) = extract_balanced_json(inner) {
                return Some(json);
            }
        }
    }

    // Pattern 3: Scan for the first balanced object anywhere in the content
    let pos = trimmed.find('{')?;
    extract_balanced_json(&trimmed[pos..])
}

/// Extract the body of the first markdown code fence in the text.
///
/// Works even when there is trailing prose after the closing ```.
/// Returns `None` if no fenced block is found.
fn extract_fenced_block(content: &str) -> Option<&str> {
    // Find opening fence
    let fence_start = content.find("```")?;
    let after_opening = &content[fence_start + 3..];

    // Skip the language tag line (e.g. "json\n")
    let body_start_rel = after_opening.find('\n')? + 1;
    let body_start = fence_start + 3 + body_start_rel;

    // Find closing fence after the body starts
    let closing = content[body_start..].find("```")?;
    let body_end = body_start + closing;

    if body_start >= body_end {
        return None;
    }

    Some(&content[body_start..body_end])
}

/// Extract a balanced JSON object starting at position 0 of `s`.
///
/// Counts `{` / `}` depth, respecting string literals, to find the
/// matching close brace.
fn extract_balanced_json(s: &str) -> Option<&str> {
    if !s.starts_with('{') {
        return None;
    }
    let mut depth = 0i32;
    let mut in_string = false;
    let mut escape_next = false;

    for (i, ch) in s.char_indices() {
        if escape_next {
            escape_next = false;
            continue;
        }
        match ch {
            '\\' if in_string => escape_next = true,
            '"' => in_string = !in_string,
            '{' if !in_string => depth += 1,
            '}' if !in_string => {
                depth -= 1;
                if depth == 0 {
                    return Some(&s[..=i]);
                }
            }
            _ => {}
        }
    }
    None
}
