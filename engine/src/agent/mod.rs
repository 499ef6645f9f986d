//! Conversation session
//!
//! A `Session` owns one user's memory state and drives a single turn through
//! classification, prompt assembly, reply generation, persistence and
//! compaction.

pub mod session;

pub use session::{is_exit_command, Session, TurnOutcome, GENERATION_FALLBACK};
