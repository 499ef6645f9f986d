//! Configuration
//!
//! Doccy reads `~/.doccy/config.toml` (written with defaults on first run).
//! Every section and every key is optional:
//!
//! ```toml
//! [core]
//! log_level = "info"
//! data_dir = "~/.doccy"
//!
//! [llm]
//! default_provider = "gemini"   # or "ollama"
//! timeout_secs = 60
//!
//! [llm.gemini]
//! model = "gemini-3-flash-preview"
//!
//! [llm.ollama]
//! base_url = "http://localhost:11434"
//! model = "llama3.1:8b"
//!
//! [memory]
//! history_capacity = 50
//! compaction_trigger = 20
//! min_summarize = 10
//! compaction_slice = 5
//! recent_turns = 5
//! preference_window = 3
//! long_term_window = 1
//!
//! [session]
//! assistant_name = "Doccy"
//! state_file = "chat_data.json"   # relative to data_dir
//! ```
//!
//! Loading validates the values, expands `~` and creates `data_dir`.

use sdk::errors::EngineError;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

const LOG_LEVELS: [&str; 5] = ["error", "warn", "info", "debug", "trace"];
const PROVIDERS: [&str; 2] = ["gemini", "ollama"];

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub core: CoreConfig,
    pub llm: LLMConfig,
    pub memory: MemoryConfig,
    pub session: SessionConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CoreConfig {
    /// error, warn, info, debug or trace; `RUST_LOG` overrides it
    pub log_level: String,

    /// Home of the session file; `~` is expanded
    pub data_dir: PathBuf,
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            data_dir: PathBuf::from("~/.doccy"),
        }
    }
}

/// Completion provider selection
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LLMConfig {
    /// `gemini` or `ollama`
    pub default_provider: String,

    /// Upper bound on one completion call, in seconds
    pub timeout_secs: u64,

    pub gemini: GeminiConfig,
    pub ollama: OllamaConfig,
}

impl LLMConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Default for LLMConfig {
    fn default() -> Self {
        Self {
            default_provider: "gemini".to_string(),
            timeout_secs: 60,
            gemini: GeminiConfig::default(),
            ollama: OllamaConfig::default(),
        }
    }
}

/// The API key is not configured here; it comes from `GEMINI_API_KEY` or the keychain.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeminiConfig {
    pub base_url: String,
    pub model: String,
}

impl Default for GeminiConfig {
    fn default() -> Self {
        Self {
            base_url: "https://generativelanguage.googleapis.com/v1beta".to_string(),
            model: "gemini-3-flash-preview".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OllamaConfig {
    pub base_url: String,
    pub model: String,
}

impl Default for OllamaConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:11434".to_string(),
            model: "llama3.1:8b".to_string(),
        }
    }
}

/// Memory bounds and compaction thresholds
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct MemoryConfig {
    /// Maximum number of turns kept in the recent-history buffer
    pub history_capacity: usize,

    /// History length at which compaction is attempted
    pub compaction_trigger: usize,

    /// Floor below which compaction never runs, even when forced
    pub min_summarize: usize,

    /// Number of oldest turns folded into one summary
    pub compaction_slice: usize,

    /// Raw turns rendered into the prompt
    pub recent_turns: usize,

    /// Likes/dislikes rendered into the prompt
    pub preference_window: usize,

    /// Long-term summaries rendered into the prompt
    pub long_term_window: usize,
}

impl Default for MemoryConfig {
    fn default() -> Self {
        Self {
            history_capacity: 50,
            compaction_trigger: 20,
            min_summarize: 10,
            compaction_slice: 5,
            recent_turns: 5,
            preference_window: 3,
            long_term_window: 1,
        }
    }
}

impl MemoryConfig {
    /// Check that the thresholds describe a workable compaction policy
    pub fn validate(&self) -> Result<(), EngineError> {
        let rules = [
            (
                self.compaction_slice >= 1,
                "memory.compaction_slice must be at least 1".to_string(),
            ),
            (
                self.compaction_slice <= self.min_summarize,
                format!(
                    "memory.compaction_slice ({}) must not exceed memory.min_summarize ({})",
                    self.compaction_slice, self.min_summarize
                ),
            ),
            (
                self.compaction_trigger >= self.min_summarize,
                format!(
                    "memory.compaction_trigger ({}) must be at least memory.min_summarize ({})",
                    self.compaction_trigger, self.min_summarize
                ),
            ),
            (
                self.history_capacity >= self.compaction_trigger,
                format!(
                    "memory.history_capacity ({}) must be at least memory.compaction_trigger ({})",
                    self.history_capacity, self.compaction_trigger
                ),
            ),
        ];
        if let Some((_, message)) = rules.into_iter().find(|(ok, _)| !ok) {
            return Err(EngineError::Config(message));
        }

        for (name, value) in [
            ("recent_turns", self.recent_turns),
            ("preference_window", self.preference_window),
            ("long_term_window", self.long_term_window),
        ] {
            if value == 0 {
                return Err(EngineError::Config(format!(
                    "memory.{} must be at least 1",
                    name
                )));
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Name the assistant uses in prompts and on the terminal
    pub assistant_name: String,

    /// Session file; relative paths live under `core.data_dir`
    pub state_file: PathBuf,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            assistant_name: "Doccy".to_string(),
            state_file: PathBuf::from("chat_data.json"),
        }
    }
}

/// Where the active configuration came from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigSource {
    Existing(PathBuf),
    /// Defaults were written here on this run
    Created(PathBuf),
}

impl ConfigSource {
    pub fn path(&self) -> &Path {
        match self {
            ConfigSource::Existing(path) | ConfigSource::Created(path) => path,
        }
    }
}

impl Config {
    /// Load `~/.doccy/config.toml`, writing the defaults there first if it is missing.
    ///
    /// # Errors
    /// Unreadable or unparsable file, invalid values, or an unusable data directory.
    pub fn load_or_create() -> Result<(Self, ConfigSource), EngineError> {
        Self::load_or_create_at(&Self::default_config_path()?)
    }

    pub fn load_or_create_at(path: &Path) -> Result<(Self, ConfigSource), EngineError> {
        if path.exists() {
            let config = Self::load_from_path(path)?;
            Ok((config, ConfigSource::Existing(path.to_path_buf())))
        } else {
            let mut config = Self::write_default(path)?;
            config.validate_and_process()?;
            Ok((config, ConfigSource::Created(path.to_path_buf())))
        }
    }

    pub fn load_from_path(path: &Path) -> Result<Self, EngineError> {
        let contents = fs::read_to_string(path).map_err(|e| {
            EngineError::Config(format!("Failed to read {}: {}", path.display(), e))
        })?;
        Self::from_toml_str(&contents)
    }

    /// Parse, validate and expand configuration from TOML text
    pub fn from_toml_str(contents: &str) -> Result<Self, EngineError> {
        let mut config: Config = toml::from_str(contents)
            .map_err(|e| EngineError::Config(format!("Failed to parse config: {}", e)))?;
        config.validate_and_process()?;
        Ok(config)
    }

    /// Written before expansion so the file keeps `~`
    fn write_default(path: &Path) -> Result<Self, EngineError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| {
                EngineError::Config(format!("Failed to create {}: {}", parent.display(), e))
            })?;
        }

        let config = Self::default_config();
        let text = toml::to_string_pretty(&config)
            .map_err(|e| EngineError::Config(format!("Failed to serialize config: {}", e)))?;
        fs::write(path, text).map_err(|e| {
            EngineError::Config(format!("Failed to write {}: {}", path.display(), e))
        })?;
        Ok(config)
    }

    /// `~/.doccy/config.toml`
    pub fn default_config_path() -> Result<PathBuf, EngineError> {
        Ok(home_dir()?.join(".doccy").join("config.toml"))
    }

    /// Defaults, with paths not yet expanded
    pub fn default_config() -> Self {
        Self::default()
    }

    /// Absolute location of the session state file
    pub fn state_file_path(&self) -> PathBuf {
        if self.session.state_file.is_absolute() {
            self.session.state_file.clone()
        } else {
            self.core.data_dir.join(&self.session.state_file)
        }
    }

    fn validate_and_process(&mut self) -> Result<(), EngineError> {
        if !LOG_LEVELS.contains(&self.core.log_level.as_str()) {
            return Err(EngineError::Config(format!(
                "Invalid log level '{}'. Must be one of: {}",
                self.core.log_level,
                LOG_LEVELS.join(", ")
            )));
        }
        if !PROVIDERS.contains(&self.llm.default_provider.as_str()) {
            return Err(EngineError::Config(format!(
                "Invalid default provider '{}'. Must be one of: {}",
                self.llm.default_provider,
                PROVIDERS.join(", ")
            )));
        }
        if self.llm.timeout_secs == 0 {
            return Err(EngineError::Config(
                "llm.timeout_secs must be greater than 0".to_string(),
            ));
        }
        self.memory.validate()?;

        self.core.data_dir = expand_path(&self.core.data_dir)?;
        self.session.state_file = expand_path(&self.session.state_file)?;
        fs::create_dir_all(&self.core.data_dir).map_err(|e| {
            EngineError::Config(format!(
                "Failed to create data directory {}: {}",
                self.core.data_dir.display(),
                e
            ))
        })?;

        Ok(())
    }
}

fn home_dir() -> Result<PathBuf, EngineError> {
    dirs::home_dir()
        .ok_or_else(|| EngineError::Config("Could not determine home directory".to_string()))
}

/// Expand a leading `~` to the user's home directory
pub fn expand_path(path: &Path) -> Result<PathBuf, EngineError> {
    match path.strip_prefix("~") {
        Ok(rest) => Ok(home_dir()?.join(rest)),
        Err(_) => Ok(path.to_path_buf()),
    }
}
