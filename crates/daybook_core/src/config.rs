//! User-facing configuration, persisted as `daybook.toml`.
//!
//! # Invariants
//! - A missing file yields defaults; a malformed file is an error.
//! - Zero durations and blank keys are repaired by
//!   [`DaybookConfig::with_defaults_for_invalid`].

use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Environment variable overriding the cache database location.
pub const DB_PATH_ENV: &str = "DAYBOOK_DB_PATH";

const CONFIG_FILE_NAME: &str = "daybook.toml";
const CACHE_DB_FILE_NAME: &str = "daybook_cache.sqlite3";

#[derive(Debug)]
pub enum ConfigError {
    Io(std::io::Error),
    Parse(toml::de::Error),
    Serialize(toml::ser::Error),
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io(err) => write!(f, "config io failed: {err}"),
            Self::Parse(err) => write!(f, "config is not valid TOML: {err}"),
            Self::Serialize(err) => write!(f, "config could not be serialized: {err}"),
        }
    }
}

impl Error for ConfigError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Io(err) => Some(err),
            Self::Parse(err) => Some(err),
            Self::Serialize(err) => Some(err),
        }
    }
}

impl From<std::io::Error> for ConfigError {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value)
    }
}

impl From<toml::de::Error> for ConfigError {
    fn from(value: toml::de::Error) -> Self {
        Self::Parse(value)
    }
}

impl From<toml::ser::Error> for ConfigError {
    fn from(value: toml::ser::Error) -> Self {
        Self::Serialize(value)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DaybookConfig {
    pub search: SearchConfig,
    pub sync: SyncConfig,
    pub cache: CacheConfig,
    pub logging: LoggingConfig,
}

impl DaybookConfig {
    /// Returns the config file path within `data_dir`.
    pub fn path(data_dir: &Path) -> PathBuf {
        data_dir.join(CONFIG_FILE_NAME)
    }

    /// Loads config from a TOML file, or defaults when the file is absent.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)?;
        Ok(toml::from_str(&content)?)
    }

    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        std::fs::write(path, toml::to_string_pretty(self)?)?;
        Ok(())
    }

    /// Lists every invalid value; empty when the config is usable as is.
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();
        if self.sync.debounce_ms == 0 {
            errors.push("sync.debounce_ms must be at least 1".to_string());
        }
        if self.sync.timeout_ms == 0 {
            errors.push("sync.timeout_ms must be at least 1".to_string());
        }
        if self.sync.entries_key.trim().is_empty() {
            errors.push("sync.entries_key cannot be blank".to_string());
        }
        if self.sync.settings_key.trim().is_empty() {
            errors.push("sync.settings_key cannot be blank".to_string());
        }
        if self.sync.entries_key.trim() == self.sync.settings_key.trim() {
            errors.push("sync.entries_key and sync.settings_key must differ".to_string());
        }
        errors
    }

    /// Returns a copy with invalid sync values replaced by defaults.
    pub fn with_defaults_for_invalid(&self) -> Self {
        let defaults = SyncConfig::default();
        let mut repaired = self.clone();
        if repaired.sync.debounce_ms == 0 {
            repaired.sync.debounce_ms = defaults.debounce_ms;
        }
        if repaired.sync.timeout_ms == 0 {
            repaired.sync.timeout_ms = defaults.timeout_ms;
        }
        if repaired.sync.entries_key.trim().is_empty()
            || repaired.sync.settings_key.trim().is_empty()
            || repaired.sync.entries_key.trim() == repaired.sync.settings_key.trim()
        {
            repaired.sync.entries_key = defaults.entries_key;
            repaired.sync.settings_key = defaults.settings_key;
        }
        repaired
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    /// Initial state of the fuzzy toggle.
    pub fuzzy: bool,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self { fuzzy: true }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncConfig {
    /// Quiet period after the last edit before a push goes out.
    pub debounce_ms: u64,
    /// Upper bound for every remote call.
    pub timeout_ms: u64,
    pub entries_key: String,
    pub settings_key: String,
}

impl SyncConfig {
    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            debounce_ms: 1_000,
            timeout_ms: 10_000,
            entries_key: "daybook_entries.json".to_string(),
            settings_key: "daybook_settings.json".to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Cache database file; defaults to the system temp dir.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub db_path: Option<PathBuf>,
}

impl CacheConfig {
    /// Resolves the cache path: `DAYBOOK_DB_PATH`, then config, then
    /// `data_dir`, then the system temp dir.
    pub fn resolve_db_path(&self, data_dir: Option<&Path>) -> PathBuf {
        if let Ok(raw) = std::env::var(DB_PATH_ENV) {
            let trimmed = raw.trim();
            if !trimmed.is_empty() {
                return PathBuf::from(trimmed);
            }
        }
        if let Some(path) = &self.db_path {
            return path.clone();
        }
        data_dir
            .map(Path::to_path_buf)
            .unwrap_or_else(std::env::temp_dir)
            .join(CACHE_DB_FILE_NAME)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// `trace|debug|info|warn|error`.
    pub level: String,
    /// Absolute directory for rolling log files; logging stays off when unset.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dir: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: crate::logging::default_log_level().to_string(),
            dir: None,
        }
    }
}
