use anyhow::{Context, Result};
use chrono::{FixedOffset, Offset, Utc};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::info;

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct MurmurConfig {
    pub server: ServerConfig,
    pub storage: StorageConfig,
    pub ai: AiConfig,
    pub diary: DiaryConfig,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub log_level: String,
    /// Upper bound for uploaded audio, in bytes.
    pub max_upload_bytes: usize,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct StorageConfig {
    pub db_path: String,
    /// User the MCP tools and CLI act on when none is given.
    pub default_user: String,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct AiConfig {
    /// OpenAI-compatible chat completions endpoint.
    pub gateway_url: String,
    /// Empty disables every AI-backed route.
    pub api_key: String,
    pub transcribe_model: String,
    pub analysis_model: String,
    pub assistant_model: String,
    pub timeout_secs: u64,
    /// Language the transcriber and assistant are told to use.
    pub language: String,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct DiaryConfig {
    /// Offset applied to UTC timestamps when deciding which day an entry
    /// belongs to (streaks, calendar, daily summary).
    pub utc_offset_minutes: i32,
    pub upcoming_events_limit: usize,
    pub default_reminder_minutes: i64,
}

impl Default for MurmurConfig {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            storage: StorageConfig::default(),
            ai: AiConfig::default(),
            diary: DiaryConfig::default(),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".into(),
            port: 8787,
            log_level: "info".into(),
            max_upload_bytes: 25 * 1024 * 1024,
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        let db_path = default_murmur_dir()
            .join("diary.db")
            .to_string_lossy()
            .into_owned();
        Self {
            db_path,
            default_user: "me".into(),
        }
    }
}

impl Default for AiConfig {
    fn default() -> Self {
        Self {
            gateway_url: "https://ai.gateway.lovable.dev/v1/chat/completions".into(),
            api_key: String::new(),
            transcribe_model: "google/gemini-2.5-flash".into(),
            analysis_model: "google/gemini-3-flash-preview".into(),
            assistant_model: "google/gemini-3-flash-preview".into(),
            timeout_secs: 60,
            language: "Spanish".into(),
        }
    }
}

impl Default for DiaryConfig {
    fn default() -> Self {
        Self {
            utc_offset_minutes: 0,
            upcoming_events_limit: 5,
            default_reminder_minutes: 60,
        }
    }
}

impl DiaryConfig {
    /// The configured local offset. Out-of-range values fall back to UTC.
    pub fn offset(&self) -> FixedOffset {
        FixedOffset::east_opt(self.utc_offset_minutes * 60)
            .unwrap_or_else(|| Utc.fix())
    }
}

impl AiConfig {
    pub fn is_enabled(&self) -> bool {
        !self.api_key.is_empty() && !self.gateway_url.is_empty()
    }
}

/// Returns `~/.murmur/`
pub fn default_murmur_dir() -> PathBuf {
    dirs::home_dir()
        .expect("home directory must exist")
        .join(".murmur")
}

/// Returns the default config file path: `~/.murmur/config.toml`
pub fn default_config_path() -> PathBuf {
    default_murmur_dir().join("config.toml")
}

impl MurmurConfig {
    /// Load config from TOML file (if it exists) then apply env var overrides.
    pub fn load() -> Result<Self> {
        Self::load_from(default_config_path())
    }

    /// Load from a specific path, then apply env var overrides.
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let mut config = if path.exists() {
            let contents =
                std::fs::read_to_string(path).context("failed to read config file")?;
            toml::from_str(&contents).context("failed to parse config TOML")?
        } else {
            info!("no config file at {}, using defaults", path.display());
            MurmurConfig::default()
        };

        config.apply_env_overrides();
        Ok(config)
    }

    /// Apply environment variable overrides (MURMUR_DB, MURMUR_LOG_LEVEL,
    /// MURMUR_PORT, MURMUR_USER, MURMUR_AI_URL, MURMUR_AI_KEY).
    fn apply_env_overrides(&mut self) {
        if let Ok(val) = std::env::var("MURMUR_DB") {
            self.storage.db_path = val;
        }
        if let Ok(val) = std::env::var("MURMUR_LOG_LEVEL") {
            self.server.log_level = val;
        }
        if let Ok(val) = std::env::var("MURMUR_PORT") {
            match val.parse() {
                Ok(port) => self.server.port = port,
                Err(_) => tracing::warn!(value = %val, "ignoring invalid MURMUR_PORT"),
            }
        }
        if let Ok(val) = std::env::var("MURMUR_USER") {
            self.storage.default_user = val;
        }
        if let Ok(val) = std::env::var("MURMUR_AI_URL") {
            self.ai.gateway_url = val;
        }
        if let Ok(val) = std::env::var("MURMUR_AI_KEY") {
            self.ai.api_key = val;
        }
    }

    /// Resolve the database path, expanding `~` if needed.
    pub fn resolved_db_path(&self) -> PathBuf {
        expand_tilde(&self.storage.db_path)
    }
}

pub fn expand_tilde(path: &str) -> PathBuf {
    if let Some(rest) = path.strip_prefix("~/") {
        dirs::home_dir()
            .expect("home directory must exist")
            .join(rest)
    } else {
        PathBuf::from(path)
    }
}
