// Doccy
// Main entry point for the doccy binary

use clap::Parser;
use doccy_engine::cli::{Cli, Command};
use doccy_engine::config::{Config, ConfigSource};
use doccy_engine::handlers::{
    handle_chat, handle_key, handle_memory, handle_reset, handle_say, handle_status,
    OutputFormat,
};
use doccy_engine::telemetry::init_telemetry_with_level;
use sdk::errors::{DoccyErrorExt, EngineError};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Parse CLI arguments
    let cli = Cli::parse();

    // Determine output format
    let format = if cli.json {
        OutputFormat::Json
    } else {
        OutputFormat::Text
    };

    // Load configuration (or use custom path if provided)
    let (mut config, source) = if let Some(config_path) = &cli.config {
        (
            Config::load_from_path(config_path)?,
            ConfigSource::Existing(config_path.clone()),
        )
    } else {
        Config::load_or_create()?
    };

    if let Some(state_file) = &cli.state_file {
        config.session.state_file = doccy_engine::config::expand_path(state_file)?;
    }

    // RUST_LOG still wins over both
    let level = cli.log.as_deref().unwrap_or(&config.core.log_level);
    init_telemetry_with_level(level);

    let version = env!("CARGO_PKG_VERSION");
    let commit = env!("GIT_COMMIT_HASH");
    let timestamp = env!("BUILD_TIMESTAMP");

    tracing::info!("Doccy v{} ({} - {})", version, commit, timestamp);
    match &source {
        ConfigSource::Created(path) => {
            tracing::info!(path = %path.display(), "wrote default configuration")
        }
        ConfigSource::Existing(path) => {
            tracing::debug!(path = %path.display(), "loaded configuration")
        }
    }

    // Handle commands
    let result = match cli.command() {
        Command::Chat => {
            tracing::info!("Starting interactive chat");
            handle_chat(&config, format).await
        }

        Command::Say { message } => {
            tracing::info!("Processing single message");
            handle_say(message, &config, format).await
        }

        Command::Memory { limit } => handle_memory(limit, &config, format),

        Command::Status => handle_status(&config, cli.config.clone(), format).await,

        Command::Reset { yes } => {
            tracing::info!("Resetting session memory");
            handle_reset(yes, &config, format)
        }

        Command::Key { action } => handle_key(action, format),
    };

    if let Err(err) = &result {
        if let Some(engine_err) = err.downcast_ref::<EngineError>() {
            tracing::error!(recoverable = engine_err.is_recoverable(), "{}", engine_err);
            eprintln!("Hint: {}", engine_err.user_hint());
        }
    }

    result
}
