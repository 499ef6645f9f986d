//! Doccy Engine Library
//!
//! Memory subsystem and conversation loop for the Doccy assistant.
//! It is used by both the main binary and integration tests.

/// Configuration management module
pub mod config;

/// Secret management module
pub mod secrets;

/// LLM provider abstraction layer
pub mod llm;

/// Conversational memory: history, preferences, emotions, summaries, persistence
pub mod memory;

/// Per-user conversation session
pub mod agent;

/// Telemetry and Observability
pub mod telemetry;

/// CLI interface module
pub mod cli;

/// Command handlers module
pub mod handlers;
