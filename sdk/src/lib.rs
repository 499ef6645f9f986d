//! Doccy SDK
//!
//! Shared library providing the error taxonomy used across Doccy components.
//! The engine and its integration tests both depend on it.

/// Error types and handling
pub mod errors;

// Re-export commonly used types
pub use errors::{DoccyErrorExt, EngineError};
