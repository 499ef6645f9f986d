//! Error types and handling
//!
//! This module provides the error types used throughout the Doccy engine.
//! All errors implement the `DoccyErrorExt` trait which provides user-friendly
//! hints and indicates whether errors are recoverable.
//!
//! Most failures inside a chat turn never reach this type: emotion
//! classification, summarization and reply generation all degrade locally.
//! What remains here is what the caller must actually act on.

use std::path::PathBuf;
use thiserror::Error;

/// Trait for Doccy error extensions
///
/// This trait provides additional context for errors, including user-friendly
/// hints and recoverability information. All engine errors implement this trait.
pub trait DoccyErrorExt {
    /// Returns a user-friendly hint for the error
    ///
    /// The hint is safe to display to end users and does not contain
    /// secrets, file paths or internal implementation details.
    fn user_hint(&self) -> &str;

    /// Returns whether the error is recoverable
    ///
    /// Recoverable errors can be retried or worked around. Non-recoverable
    /// errors end the chat session.
    fn is_recoverable(&self) -> bool;
}

/// Main engine error type
///
/// # Error Categories
///
/// - **Configuration**: Invalid or missing configuration
/// - **LLM Provider**: API failures, authentication errors, timeouts
/// - **Persistence**: The session state file could not be written
/// - **Secrets**: Keychain access and missing API keys
///
/// # Examples
///
/// ```
/// use sdk::errors::{DoccyErrorExt, EngineError};
/// use std::path::PathBuf;
///
/// let error = EngineError::Config("bad log level".to_string());
/// println!("Hint: {}", error.user_hint());
/// assert!(error.is_recoverable());
///
/// let fatal = EngineError::Persistence {
///     path: PathBuf::from("chat_data.json"),
///     reason: "disk full".to_string(),
/// };
/// assert!(!fatal.is_recoverable());
/// ```
#[derive(Debug, Error)]
pub enum EngineError {
    // Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    // LLM provider errors
    #[error("LLM provider error: {0}")]
    LLMProvider(String),

    #[error("LLM call timed out")]
    LLMTimeout,

    // Persistence errors
    #[error("Failed to persist session state to {path:?}: {reason}")]
    Persistence { path: PathBuf, reason: String },

    // Keyring errors
    #[error("Keyring error: {0}")]
    KeyringError(String),

    #[error("Missing secret: {0}")]
    MissingSecret(String),

    // Generic IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl DoccyErrorExt for EngineError {
    fn user_hint(&self) -> &str {
        match self {
            // Configuration errors
            Self::Config(_) => "Check your config.toml file for errors",

            // LLM provider errors
            Self::LLMProvider(_) => "LLM provider unavailable. Check your API keys and network",
            Self::LLMTimeout => "LLM provider took too long to respond. Try again",

            // Persistence errors
            Self::Persistence { .. } => {
                "Could not save the conversation. Check disk space and permissions"
            }

            // Keyring errors
            Self::KeyringError(_) => "Failed to access secure storage. Check system keychain",
            Self::MissingSecret(_) => {
                "API key not found. Set GEMINI_API_KEY or store it in the system keychain"
            }

            // Generic IO error
            Self::Io(_) => "File system operation failed",
        }
    }

    fn is_recoverable(&self) -> bool {
        !matches!(self, Self::Persistence { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_persistence_is_fatal() {
        let err = EngineError::Persistence {
            path: PathBuf::from("/tmp/chat_data.json"),
            reason: "read-only file system".to_string(),
        };
        assert!(!err.is_recoverable());
        assert!(!err.user_hint().contains("/tmp"));
    }

    #[test]
    fn test_provider_errors_are_recoverable() {
        assert!(EngineError::LLMTimeout.is_recoverable());
        assert!(EngineError::LLMProvider("503".to_string()).is_recoverable());
        assert!(EngineError::MissingSecret("gemini_api_key".to_string()).is_recoverable());
    }

    #[test]
    fn test_io_error_conversion() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        let err: EngineError = io.into();
        assert!(matches!(err, EngineError::Io(_)));
        assert_eq!(err.user_hint(), "File system operation failed");
    }
}
