//! Configuration resolution for taxfill-ai
//!
//! Provides ENV → TOML resolution for the generation API key and assembles
//! the runtime settings the extractor and pipeline need. Everything fatal is
//! reported here, before any document is touched.

use crate::extractors::GeminiClient;
use crate::utils::retry::RetryPolicy;
use std::path::{Path, PathBuf};
use std::time::Duration;
use taxfill_common::config::TomlConfig;
use taxfill_common::{Error, Result};
use tracing::{info, warn};

/// Environment variable holding the generation API key
pub const API_KEY_ENV: &str = "TAXFILL_GENERATION_API_KEY";

/// Resolve the generation API key
///
/// **Priority:** ENV → TOML
pub fn resolve_generation_api_key(toml_config: &TomlConfig) -> Result<String> {
    let mut sources = Vec::new();

    let env_key = std::env::var(API_KEY_ENV).ok();
    if let Some(key) = &env_key {
        if is_valid_key(key) {
            sources.push("environment");
        }
    }

    let toml_key = toml_config.generation_api_key.as_ref();
    if let Some(key) = toml_key {
        if is_valid_key(key) {
            sources.push("TOML");
        }
    }

    if sources.len() > 1 {
        warn!(
            "Generation API key found in multiple sources: {}. Using environment (highest priority).",
            sources.join(", ")
        );
    }

    if let Some(key) = env_key {
        if is_valid_key(&key) {
            info!("Generation API key loaded from environment variable");
            return Ok(key.trim().to_string());
        }
    }

    if let Some(key) = toml_key {
        if is_valid_key(key) {
            info!("Generation API key loaded from TOML config");
            return Ok(key.trim().to_string());
        }
    }

    Err(Error::Config(format!(
        "Generation API key not configured. Please configure using one of:\n\
         1. Environment: {}=your-key-here\n\
         2. TOML config: ~/.config/taxfill/config.toml (generation_api_key = \"your-key\")",
        API_KEY_ENV
    )))
}

/// Validate API key (non-empty, non-whitespace)
pub fn is_valid_key(key: &str) -> bool {
    !key.trim().is_empty()
}

/// Resolve the object store root folder
///
/// **Priority:** CLI argument → TOML. The folder must exist.
pub fn resolve_storage_root(cli_arg: Option<&Path>, toml_config: &TomlConfig) -> Result<PathBuf> {
    let root = cli_arg
        .map(Path::to_path_buf)
        .or_else(|| toml_config.storage_root.clone())
        .ok_or_else(|| {
            Error::Config(
                "Storage root not configured. Pass --root <dir> or set storage_root in the TOML config"
                    .to_string(),
            )
        })?;

    if !root.is_dir() {
        return Err(Error::Config(format!(
            "Storage root is not a directory: {}",
            root.display()
        )));
    }

    Ok(root)
}

/// Resolved generation and concurrency settings
#[derive(Debug, Clone)]
pub struct GenerationSettings {
    pub api_key: String,
    pub endpoint: String,
    pub model: String,
    pub request_timeout: Duration,
    pub retry: RetryPolicy,
    pub max_concurrent_extractions: usize,
}

impl GenerationSettings {
    /// Resolve settings; fails if no API key is configured
    pub fn from_config(toml_config: &TomlConfig) -> Result<Self> {
        Ok(Self {
            api_key: resolve_generation_api_key(toml_config)?,
            endpoint: toml_config.generation_endpoint().to_string(),
            model: toml_config.generation_model().to_string(),
            request_timeout: Duration::from_secs(toml_config.request_timeout_secs()),
            retry: RetryPolicy::new(toml_config.max_attempts()),
            max_concurrent_extractions: toml_config.max_concurrent_extractions(),
        })
    }

    pub fn build_client(&self) -> Result<GeminiClient> {
        GeminiClient::new(
            self.endpoint.clone(),
            self.model.clone(),
            self.api_key.clone(),
            self.request_timeout,
        )
    }
}
