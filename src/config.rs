//! Configuration file parser for ~/.config/nuvion/config.toml.
//!
//! The config file is optional; a missing file yields `Config::default()`.
//! Unknown keys are silently ignored by serde (with `deny_unknown_fields` off),
//! though we log a warning when the file contains potential typos.
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

/// Environment variable that overrides `api_base_url`.
pub const API_BASE_URL_ENV: &str = "NUVION_API_BASE_URL";

/// Backend used when neither the environment nor the config file names one.
pub const DEFAULT_API_BASE_URL: &str = "http://localhost:3000";

// ============================================================================
// Error Types
// ============================================================================

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid TOML in config file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Config file too large: {0}")]
    TooLarge(String),
}

// ============================================================================
// Configuration Structs
// ============================================================================

/// Top-level launcher configuration.
///
/// All fields use `#[serde(default)]` so any subset of keys can be specified.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Base URL of the launcher backend (news, stats, health).
    pub api_base_url: String,

    /// Per-request timeout in seconds. 0 disables the timeout.
    pub request_timeout_secs: u64,

    /// Theme used until the user picks one (stored preference wins).
    pub theme: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            request_timeout_secs: 30,
            theme: "cyan".to_string(),
        }
    }
}

impl Config {
    /// Maximum config file size (1 MB).
    const MAX_FILE_SIZE: u64 = 1_048_576;

    /// Load configuration from a TOML file.
    ///
    /// - Missing file → `Ok(Config::default())`
    /// - Empty file → `Ok(Config::default())`
    /// - Invalid TOML → `Err(ConfigError::Parse)` with line number info
    /// - Unknown keys → silently accepted (serde default behavior), logged as warning
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        match std::fs::metadata(path) {
            Ok(meta) if meta.len() > Self::MAX_FILE_SIZE => {
                return Err(ConfigError::TooLarge(format!(
                    "Config file is {} bytes (max {} bytes)",
                    meta.len(),
                    Self::MAX_FILE_SIZE
                )));
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = %path.display(), "No config file found, using defaults");
                return Ok(Self::default());
            }
            Err(e) => return Err(ConfigError::Io(e)),
            Ok(_) => {}
        }

        let content = match std::fs::read_to_string(path) {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                // Race condition: file deleted between metadata and read
                tracing::debug!(path = %path.display(), "Config file disappeared, using defaults");
                return Ok(Self::default());
            }
            Err(e) => return Err(ConfigError::Io(e)),
        };

        if content.trim().is_empty() {
            tracing::debug!(path = %path.display(), "Config file is empty, using defaults");
            return Ok(Self::default());
        }

        if let Ok(raw) = content.parse::<toml::Table>() {
            for key in unknown_keys(&raw) {
                tracing::warn!(key = %key, "Unknown key in config file, ignoring");
            }
        }

        let config: Config = toml::from_str(&content)?;
        tracing::info!(path = %path.display(), api = %config.api_base_url, "Loaded configuration");
        Ok(config)
    }

    /// Effective backend URL: `NUVION_API_BASE_URL` if set, else the config value.
    pub fn api_base_url(&self) -> String {
        let env = std::env::var(API_BASE_URL_ENV).ok();
        resolve_base_url(env.as_deref(), &self.api_base_url)
    }

    /// `None` when the timeout is disabled.
    pub fn request_timeout(&self) -> Option<Duration> {
        (self.request_timeout_secs > 0).then(|| Duration::from_secs(self.request_timeout_secs))
    }
}

/// Top-level keys of `raw` that are not fields of [`Config`]. The field names
/// come from serializing the defaults, so they track the struct.
fn unknown_keys(raw: &toml::Table) -> Vec<&str> {
    let known = match toml::Value::try_from(Config::default()) {
        Ok(toml::Value::Table(table)) => table,
        _ => return Vec::new(),
    };
    raw.keys()
        .map(String::as_str)
        .filter(|key| !known.contains_key(*key))
        .collect()
}

/// Pick the base URL: a non-blank override wins, then the configured value,
/// then [`DEFAULT_API_BASE_URL`]. Trailing slashes are stripped.
pub fn resolve_base_url(env_override: Option<&str>, configured: &str) -> String {
    let chosen = [env_override.unwrap_or(""), configured]
        .into_iter()
        .map(str::trim)
        .find(|s| !s.is_empty())
        .unwrap_or(DEFAULT_API_BASE_URL);
    chosen.trim_end_matches('/').to_string()
}

// ============================================================================
// Tests
// ============================================================================
