use anyhow::{Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub relay: RelayConfig,
    #[serde(default)]
    pub capture: CaptureConfig,
    #[serde(default)]
    pub telegram: TelegramConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RelayConfig {
    pub signals_folder: PathBuf,
    pub journal_folder: PathBuf,
    #[serde(default = "default_poll_interval")]
    pub poll_interval_secs: u64,
    #[serde(default = "default_duplicate_minutes")]
    pub duplicate_minutes: f64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CaptureConfig {
    #[serde(default = "default_window_title")]
    pub window_title: String,
    #[serde(default = "default_capture_delay")]
    pub delay_secs: u64,
    /// Program and arguments; see `capture::command` for placeholders
    #[serde(default)]
    pub command: Vec<String>,
    #[serde(default)]
    pub region: RegionConfig,
}

/// Zero width or height means "whole window"
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
pub struct RegionConfig {
    #[serde(default)]
    pub x: i32,
    #[serde(default)]
    pub y: i32,
    #[serde(default)]
    pub width: i32,
    #[serde(default)]
    pub height: i32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TelegramConfig {
    #[serde(default)]
    pub bot_token: String,
    #[serde(default)]
    pub chat_id: String,
    #[serde(default = "default_telegram_timeout")]
    pub timeout_secs: u64,
}

fn default_poll_interval() -> u64 { 3 }
fn default_duplicate_minutes() -> f64 { 5.0 }
fn default_window_title() -> String { "MetaTrader 5".to_string() }
fn default_capture_delay() -> u64 { 2 }
fn default_telegram_timeout() -> u64 { 10 }

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            window_title: default_window_title(),
            delay_secs: default_capture_delay(),
            command: Vec::new(),
            region: RegionConfig::default(),
        }
    }
}

impl Default for TelegramConfig {
    fn default() -> Self {
        Self {
            bot_token: String::new(),
            chat_id: String::new(),
            timeout_secs: default_telegram_timeout(),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("signals_folder must be set in config")]
    SignalsFolderUnset,

    #[error("signals_folder does not exist: {0}")]
    SignalsFolderMissing(PathBuf),

    #[error("journal_folder must be set in config")]
    JournalFolderUnset,

    #[error("Failed to create journal_folder {path}: {source}")]
    JournalFolderCreate {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("poll_interval_secs must be >= 1 (got {0})")]
    PollInterval(u64),

    #[error("duplicate_minutes must be a non-negative number (got {0})")]
    DuplicateMinutes(f64),

    #[error("capture region must not be negative: {0:?}")]
    Region(RegionConfig),
}

/// Secrets that may live in the environment or a `.env` file
#[derive(Debug, Clone, Default)]
pub struct EnvConfig {
    pub telegram_bot_token: Option<String>,
    pub telegram_chat_id: Option<String>,
}

impl Config {
    pub fn load(path: &str) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path))?;

        let config: Config = toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path))?;

        Ok(config)
    }

    /// Environment values win over the file when set
    pub fn apply_env(&mut self, env: EnvConfig) {
        if let Some(token) = env.telegram_bot_token {
            self.telegram.bot_token = token;
        }
        if let Some(chat_id) = env.telegram_chat_id {
            self.telegram.chat_id = chat_id;
        }
    }

    /// Check settings and normalise folders to absolute paths.
    ///
    /// Creates the journal folder when it does not exist yet.
    pub fn validate(&mut self) -> Result<(), ConfigError> {
        let relay = &mut self.relay;

        if relay.signals_folder.as_os_str().is_empty() {
            return Err(ConfigError::SignalsFolderUnset);
        }
        relay.signals_folder = absolute(&relay.signals_folder);
        if !relay.signals_folder.is_dir() {
            return Err(ConfigError::SignalsFolderMissing(relay.signals_folder.clone()));
        }

        if relay.journal_folder.as_os_str().is_empty() {
            return Err(ConfigError::JournalFolderUnset);
        }
        relay.journal_folder = absolute(&relay.journal_folder);
        fs::create_dir_all(&relay.journal_folder).map_err(|e| ConfigError::JournalFolderCreate {
            path: relay.journal_folder.clone(),
            source: e,
        })?;

        if relay.poll_interval_secs < 1 {
            return Err(ConfigError::PollInterval(relay.poll_interval_secs));
        }

        if !relay.duplicate_minutes.is_finite() || relay.duplicate_minutes < 0.0 {
            return Err(ConfigError::DuplicateMinutes(relay.duplicate_minutes));
        }

        let region = self.capture.region;
        if region.x < 0 || region.y < 0 || region.width < 0 || region.height < 0 {
            return Err(ConfigError::Region(region));
        }

        Ok(())
    }

    pub fn telegram_credentials_present(&self) -> bool {
        !self.telegram.bot_token.trim().is_empty() && !self.telegram.chat_id.trim().is_empty()
    }
}

impl EnvConfig {
    pub fn load() -> Self {
        dotenv::dotenv().ok();

        Self {
            telegram_bot_token: non_empty_var("TELEGRAM_BOT_TOKEN"),
            telegram_chat_id: non_empty_var("TELEGRAM_CHAT_ID"),
        }
    }
}

fn non_empty_var(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}

fn absolute(path: &Path) -> PathBuf {
    if path.is_absolute() {
        return path.to_path_buf();
    }
    std::env::current_dir()
        .map(|cwd| cwd.join(path))
        .unwrap_or_else(|_| path.to_path_buf())
}
