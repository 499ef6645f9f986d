//! CLI interface for Doccy
//!
//! Defines the commands and global flags using clap's derive API.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Doccy, an empathetic assistant that remembers
///
/// Chats with you through a configured LLM provider while keeping a bounded,
/// persistent memory of the conversation, your preferences and your mood.
#[derive(Parser, Debug)]
#[command(name = "doccy")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Output in JSON format
    #[arg(long, global = true)]
    pub json: bool,

    /// Set log level (error, warn, info, debug, trace)
    #[arg(long, global = true, value_name = "LEVEL")]
    pub log: Option<String>,

    /// Specify alternate configuration file
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Use this session state file instead of the configured one
    #[arg(long, global = true, value_name = "PATH")]
    pub state_file: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Command>,
}

impl Cli {
    /// The requested command, `chat` when none was given
    pub fn command(&self) -> Command {
        self.command.clone().unwrap_or(Command::Chat)
    }
}

/// Available commands
#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Start an interactive conversation (default)
    Chat,

    /// Send a single message and print the reply
    Say {
        /// The message to send
        message: String,
    },

    /// Show what the assistant remembers
    Memory {
        /// Number of recent turns to show (default: 5)
        #[arg(short, long, default_value = "5")]
        limit: usize,
    },

    /// Show configuration and provider availability
    Status,

    /// Forget everything and start a fresh session
    Reset {
        /// Confirm deletion of the session file
        #[arg(long)]
        yes: bool,
    },

    /// Manage the Gemini API key in the OS keychain
    Key {
        #[command(subcommand)]
        action: KeyAction,
    },
}

/// Keychain actions for the Gemini API key
#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum KeyAction {
    /// Store a key read from stdin
    Set,

    /// Delete the stored key
    Remove,

    /// Show whether a key is available and where it comes from
    Status,
}
