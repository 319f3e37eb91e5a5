//! Configuration loading and config-file resolution
//!
//! Config file location priority:
//! 1. Command-line argument (highest priority)
//! 2. `TAXFILL_CONFIG` environment variable
//! 3. `<user config dir>/taxfill/config.toml`
//!
//! A missing or unreadable file is not fatal: a warning is logged and the
//! compiled defaults are used.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Environment variable naming an explicit config file
pub const CONFIG_PATH_ENV: &str = "TAXFILL_CONFIG";

/// Default generation model identifier
pub const DEFAULT_GENERATION_MODEL: &str = "gemini-1.5-flash";

/// Default generation endpoint base URL
pub const DEFAULT_GENERATION_ENDPOINT: &str =
    "https://generativelanguage.googleapis.com/v1beta";

/// Default per-request timeout for the generation capability
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 60;

/// Default number of documents extracted concurrently
pub const DEFAULT_MAX_CONCURRENT_EXTRACTIONS: usize = 4;

/// Upper bound on generation attempts per document
pub const MAX_ATTEMPTS_CEILING: u32 = 3;

/// Logging section of the TOML file
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LoggingConfig {
    /// tracing filter directive (e.g. "info", "taxfill_ai=debug")
    #[serde(default = "default_log_level")]
    pub level: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

/// On-disk configuration
///
/// Every field is optional in the file; accessors apply compiled defaults.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct TomlConfig {
    /// API key for the generation capability
    #[serde(default)]
    pub generation_api_key: Option<String>,

    /// Model identifier passed to the generation endpoint
    #[serde(default)]
    pub generation_model: Option<String>,

    /// Base URL of the generation endpoint
    #[serde(default)]
    pub generation_endpoint: Option<String>,

    /// Per-request timeout in seconds
    #[serde(default)]
    pub request_timeout_secs: Option<u64>,

    /// Total generation attempts per document (1 = no retry)
    #[serde(default)]
    pub max_attempts: Option<u32>,

    /// Documents extracted concurrently within one batch
    #[serde(default)]
    pub max_concurrent_extractions: Option<usize>,

    /// Root folder for the filesystem object store
    #[serde(default)]
    pub storage_root: Option<PathBuf>,

    #[serde(default)]
    pub logging: LoggingConfig,
}

impl TomlConfig {
    pub fn generation_model(&self) -> &str {
        self.generation_model
            .as_deref()
            .filter(|m| !m.trim().is_empty())
            .unwrap_or(DEFAULT_GENERATION_MODEL)
    }

    pub fn generation_endpoint(&self) -> &str {
        self.generation_endpoint
            .as_deref()
            .filter(|e| !e.trim().is_empty())
            .unwrap_or(DEFAULT_GENERATION_ENDPOINT)
    }

    pub fn request_timeout_secs(&self) -> u64 {
        match self.request_timeout_secs {
            Some(0) | None => DEFAULT_REQUEST_TIMEOUT_SECS,
            Some(secs) => secs,
        }
    }

    /// Attempts clamped to `1..=MAX_ATTEMPTS_CEILING`
    pub fn max_attempts(&self) -> u32 {
        self.max_attempts.unwrap_or(1).clamp(1, MAX_ATTEMPTS_CEILING)
    }

    pub fn max_concurrent_extractions(&self) -> usize {
        match self.max_concurrent_extractions {
            Some(0) | None => DEFAULT_MAX_CONCURRENT_EXTRACTIONS,
            Some(n) => n,
        }
    }
}

/// Resolve which config file to read
///
/// Returns `None` when no candidate exists; callers fall back to defaults.
pub fn resolve_config_path(cli_arg: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = cli_arg {
        return Some(path.to_path_buf());
    }

    if let Ok(path) = std::env::var(CONFIG_PATH_ENV) {
        if !path.trim().is_empty() {
            return Some(PathBuf::from(path));
        }
    }

    dirs::config_dir()
        .map(|d| d.join("taxfill").join("config.toml"))
        .filter(|p| p.exists())
}

/// Parse a TOML config file
///
/// Errors on unreadable or malformed files.
pub fn read_toml_config(path: &Path) -> Result<TomlConfig> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| Error::Config(format!("Read {} failed: {}", path.display(), e)))?;
    toml::from_str(&content)
        .map_err(|e| Error::Config(format!("Parse {} failed: {}", path.display(), e)))
}

/// Load configuration with graceful degradation
///
/// Missing or malformed files log a warning and yield defaults.
pub fn load_toml_config(cli_arg: Option<&Path>) -> TomlConfig {
    let Some(path) = resolve_config_path(cli_arg) else {
        info!("No config file found, using compiled defaults");
        return TomlConfig::default();
    };

    if !path.exists() {
        warn!(path = %path.display(), "Config file does not exist, using compiled defaults");
        return TomlConfig::default();
    }

    match read_toml_config(&path) {
        Ok(config) => {
            info!(path = %path.display(), "Loaded configuration");
            config
        }
        Err(e) => {
            warn!(error = %e, "Config file unusable, using compiled defaults");
            TomlConfig::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_apply_when_unset() {
        let config = TomlConfig::default();
        assert_eq!(config.generation_model(), DEFAULT_GENERATION_MODEL);
        assert_eq!(config.generation_endpoint(), DEFAULT_GENERATION_ENDPOINT);
        assert_eq!(config.request_timeout_secs(), DEFAULT_REQUEST_TIMEOUT_SECS);
        assert_eq!(config.max_attempts(), 1);
        assert_eq!(config.max_concurrent_extractions(), 4);
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn test_max_attempts_is_clamped() {
        let mut config = TomlConfig::default();
        config.max_attempts = Some(0);
        assert_eq!(config.max_attempts(), 1);
        config.max_attempts = Some(10);
        assert_eq!(config.max_attempts(), MAX_ATTEMPTS_CEILING);
    }

    #[test]
    fn test_partial_toml_parses() {
        let config: TomlConfig = toml::from_str(
            r#"
            generation_model = "gemini-1.5-pro"
            max_attempts = 2

            [logging]
            level = "debug"
            "#,
        )
        .unwrap();

        assert_eq!(config.generation_model(), "gemini-1.5-pro");
        assert_eq!(config.max_attempts(), 2);
        assert_eq!(config.logging.level, "debug");
        assert!(config.generation_api_key.is_none());
    }
}
