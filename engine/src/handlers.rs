//! Command handlers for CLI operations
//!
//! - chat: interactive conversation loop
//! - say: one turn, non-interactively
//! - memory: inspect the persisted memory layers
//! - status: configuration and provider health
//! - reset: delete the session file
//! - key: store, remove or inspect the Gemini API key

use anyhow::{Context, Result};
use serde_json::json;
use std::io::{BufRead, Write};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};

use crate::agent::{is_exit_command, Session, TurnOutcome};
use crate::cli::KeyAction;
use crate::config::Config;
use crate::llm::{self, gemini, LLMProvider};
use crate::memory::{SessionStore, Turn};
use crate::secrets::SecretManager;

/// Keychain service name for provider credentials
pub const SECRET_SERVICE: &str = "doccy";

/// Output format for command results
#[derive(Debug, Clone, Copy)]
pub enum OutputFormat {
    /// Human-readable text output
    Text,
    /// JSON output for machine consumption
    Json,
}

/// Construct the configured completion provider.
pub fn build_provider(config: &Config) -> Result<Arc<dyn LLMProvider>> {
    let secrets = SecretManager::new(SECRET_SERVICE);
    let provider = llm::build_provider(&config.llm, &secrets)
        .context("Failed to set up the completion provider")?;
    Ok(Arc::from(provider))
}

fn open_session(config: &Config) -> Result<Session> {
    let provider = build_provider(config)?;
    Ok(Session::from_config(config, provider))
}

/// Run the interactive conversation loop
///
/// Reads one message per line from stdin until EOF or an exit word.
pub async fn handle_chat(config: &Config, format: OutputFormat) -> Result<()> {
    let mut session = open_session(config)?;
    let name = config.session.assistant_name.clone();

    if let OutputFormat::Text = format {
        println!(
            "{}: Hi! I'm {}. Type 'quit', 'exit' or 'bye' to leave.",
            name, name
        );
    }

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        if let OutputFormat::Text = format {
            print!("You: ");
            std::io::stdout().flush().ok();
        }

        let Some(line) = lines.next_line().await.context("Failed to read input")? else {
            break;
        };
        let input = line.trim();
        if input.is_empty() {
            continue;
        }
        if is_exit_command(input) {
            match format {
                OutputFormat::Text => println!("{}: Take care! Talk to you soon.", name),
                OutputFormat::Json => println!("{}", json!({ "status": "ended" })),
            }
            break;
        }

        let outcome = session.handle_turn(input).await?;
        print_outcome(&name, &outcome, format)?;
    }

    Ok(())
}

/// Process one message and print the reply
pub async fn handle_say(message: String, config: &Config, format: OutputFormat) -> Result<()> {
    let mut session = open_session(config)?;
    let outcome = session.handle_turn(message.trim()).await?;
    print_outcome(&config.session.assistant_name, &outcome, format)
}

fn print_outcome(name: &str, outcome: &TurnOutcome, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Text => println!("{}: {}", name, outcome.reply),
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(outcome)?),
    }
    Ok(())
}

/// Show the persisted memory layers
pub fn handle_memory(limit: usize, config: &Config, format: OutputFormat) -> Result<()> {
    let store = SessionStore::new(config.state_file_path(), config.memory.history_capacity);
    let state = store.load();
    let recent = state.history().snapshot(limit);

    match format {
        OutputFormat::Text => {
            println!("Session file: {}", store.path().display());
            println!(
                "Last updated: {}",
                state.last_updated().unwrap_or("never")
            );
            println!(
                "History: {} of {} turns",
                state.history().len(),
                state.history().capacity()
            );
            println!();

            println!("Recent turns:");
            if recent.is_empty() {
                println!("  (none)");
            }
            for turn in &recent {
                print_turn(turn);
            }
            println!();

            println!("Likes:");
            print_list(state.likes().iter().map(|p| p.statement.as_str()));
            println!("Dislikes:");
            print_list(state.dislikes().iter().map(|p| p.statement.as_str()));
            println!();

            println!("Long-term summaries: {}", state.summaries().len());
            for (i, summary) in state.summaries().iter().enumerate() {
                println!("  [{}]", i + 1);
                for line in summary.lines() {
                    println!("    {}", line);
                }
            }
        }
        OutputFormat::Json => {
            let output = json!({
                "path": store.path(),
                "last_updated": state.last_updated(),
                "history_len": state.history().len(),
                "capacity": state.history().capacity(),
                "recent": recent,
                "likes": state.likes(),
                "dislikes": state.dislikes(),
                "summaries": state.summaries(),
            });
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
    }

    Ok(())
}

fn print_turn(turn: &Turn) {
    println!(
        "  [{}] ({}, {})",
        turn.timestamp, turn.emotion.emotion, turn.emotion.intensity
    );
    println!("    You:  {}", turn.user);
    println!("    Bot:  {}", turn.bot);
}

fn print_list<'a>(items: impl Iterator<Item = &'a str>) {
    let mut empty = true;
    for item in items {
        println!("  - {}", item);
        empty = false;
    }
    if empty {
        println!("  (none)");
    }
}

/// Show configuration and provider availability
pub async fn handle_status(
    config: &Config,
    config_path: Option<PathBuf>,
    format: OutputFormat,
) -> Result<()> {
    let config_path = match config_path {
        Some(path) => path,
        None => Config::default_config_path()?,
    };
    let state_file = config.state_file_path();

    let (provider_name, model, healthy, problem) = match build_provider(config) {
        Ok(provider) => {
            let healthy = provider.check_health().await;
            (
                provider.name().to_string(),
                provider.model().to_string(),
                healthy,
                None,
            )
        }
        Err(e) => (
            config.llm.default_provider.clone(),
            String::new(),
            false,
            Some(format!("{:#}", e)),
        ),
    };

    match format {
        OutputFormat::Text => {
            println!("Config:     {}", config_path.display());
            println!(
                "State file: {}{}",
                state_file.display(),
                if state_file.exists() { "" } else { " (not created yet)" }
            );
            println!("Provider:   {}", provider_name);
            if !model.is_empty() {
                println!("Model:      {}", model);
            }
            println!(
                "Health:     {}",
                if healthy { "available" } else { "unavailable" }
            );
            if let Some(problem) = &problem {
                println!("  {}", problem);
            }
        }
        OutputFormat::Json => {
            let output = json!({
                "config_path": config_path,
                "state_file": state_file,
                "state_exists": state_file.exists(),
                "provider": provider_name,
                "model": model,
                "healthy": healthy,
                "error": problem,
            });
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
    }

    Ok(())
}

/// Delete the persisted session
pub fn handle_reset(yes: bool, config: &Config, format: OutputFormat) -> Result<()> {
    let store = SessionStore::new(config.state_file_path(), config.memory.history_capacity);

    if !yes {
        anyhow::bail!(
            "Refusing to delete {} without --yes",
            store.path().display()
        );
    }

    let removed = store.reset()?;
    match format {
        OutputFormat::Text => {
            if removed {
                println!("✓ Memory cleared ({})", store.path().display());
            } else {
                println!("Nothing to clear; no session file at {}", store.path().display());
            }
        }
        OutputFormat::Json => {
            let output = json!({
                "removed": removed,
                "path": store.path(),
            });
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
    }

    Ok(())
}

/// Manage the Gemini API key in the keychain
pub fn handle_key(action: KeyAction, format: OutputFormat) -> Result<()> {
    let secrets = SecretManager::new(SECRET_SERVICE);
    let stdin = std::io::stdin();
    run_key_action(action, &secrets, &mut stdin.lock(), format)
}

fn run_key_action(
    action: KeyAction,
    secrets: &SecretManager,
    input: &mut impl BufRead,
    format: OutputFormat,
) -> Result<()> {
    let key_name = gemini::API_KEY_NAME;
    let env_name = SecretManager::env_var_name(key_name);

    let output = match action {
        KeyAction::Set => {
            if let OutputFormat::Text = format {
                print!("Gemini API key: ");
                std::io::stdout().flush()?;
            }
            let mut line = String::new();
            input.read_line(&mut line)?;
            let value = line.trim();
            if value.is_empty() {
                anyhow::bail!("No key given; nothing stored");
            }
            secrets.set_secret(key_name, value)?;
            json!({ "key": key_name, "stored": true })
        }
        KeyAction::Remove => {
            secrets.delete_secret(key_name)?;
            json!({ "key": key_name, "removed": true })
        }
        KeyAction::Status => {
            let from_env = std::env::var(&env_name)
                .map(|v| !v.trim().is_empty())
                .unwrap_or(false);
            let source = if from_env {
                Some("environment")
            } else if secrets.has_secret(key_name) {
                Some("keychain")
            } else {
                None
            };
            json!({ "key": key_name, "env_var": env_name, "source": source })
        }
    };

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&output)?),
        OutputFormat::Text => match action {
            KeyAction::Set => println!("✓ Stored in keychain."),
            KeyAction::Remove => println!("✓ Removed from keychain."),
            KeyAction::Status => match output["source"].as_str() {
                Some(source) => println!("Gemini API key: available ({})", source),
                None => println!(
                    "Gemini API key: not set (export {} or run `doccy key set`)",
                    env_name
                ),
            },
        },
    }

    Ok(())
}
