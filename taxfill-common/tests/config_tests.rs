//! Configuration resolution and graceful degradation tests
//!
//! Note: Uses serial_test crate to prevent ENV variable race conditions.
//! Tests that manipulate TAXFILL_CONFIG are marked with #[serial].

use serial_test::serial;
use std::env;
use std::fs;
use taxfill_common::config::{
    load_toml_config, read_toml_config, resolve_config_path, TomlConfig, CONFIG_PATH_ENV,
};
use tempfile::TempDir;

fn write_config(dir: &TempDir, body: &str) -> std::path::PathBuf {
    let path = dir.path().join("config.toml");
    fs::write(&path, body).unwrap();
    path
}

#[test]
#[serial]
fn test_cli_path_beats_environment() {
    let dir = TempDir::new().unwrap();
    let cli_path = write_config(&dir, "generation_model = \"cli-model\"\n");
    env::set_var(CONFIG_PATH_ENV, "/tmp/taxfill-should-not-be-used.toml");

    let resolved = resolve_config_path(Some(&cli_path)).unwrap();
    assert_eq!(resolved, cli_path);

    env::remove_var(CONFIG_PATH_ENV);
}

#[test]
#[serial]
fn test_environment_path_used_without_cli() {
    let dir = TempDir::new().unwrap();
    let env_path = write_config(&dir, "generation_model = \"env-model\"\n");
    env::set_var(CONFIG_PATH_ENV, &env_path);

    let config = load_toml_config(None);
    assert_eq!(config.generation_model(), "env-model");

    env::remove_var(CONFIG_PATH_ENV);
}

#[test]
#[serial]
fn test_missing_file_falls_back_to_defaults() {
    env::remove_var(CONFIG_PATH_ENV);
    let dir = TempDir::new().unwrap();
    let missing = dir.path().join("nope.toml");

    let config = load_toml_config(Some(&missing));
    assert_eq!(config, TomlConfig::default());
}

#[test]
#[serial]
fn test_malformed_file_falls_back_to_defaults() {
    env::remove_var(CONFIG_PATH_ENV);
    let dir = TempDir::new().unwrap();
    let path = write_config(&dir, "max_attempts = \"not a number\"\n");

    assert!(read_toml_config(&path).is_err());
    let config = load_toml_config(Some(&path));
    assert_eq!(config, TomlConfig::default());
}

#[test]
fn test_full_config_round_trips_through_toml() {
    let dir = TempDir::new().unwrap();
    let path = write_config(
        &dir,
        r#"
generation_api_key = "key-123"
generation_endpoint = "http://localhost:9999/v1beta"
request_timeout_secs = 5
max_concurrent_extractions = 2
storage_root = "/srv/taxfill/uploads"

[logging]
level = "taxfill_ai=debug"
"#,
    );

    let config = read_toml_config(&path).unwrap();
    assert_eq!(config.generation_api_key.as_deref(), Some("key-123"));
    assert_eq!(config.generation_endpoint(), "http://localhost:9999/v1beta");
    assert_eq!(config.request_timeout_secs(), 5);
    assert_eq!(config.max_concurrent_extractions(), 2);
    assert_eq!(
        config.storage_root.as_deref(),
        Some(std::path::Path::new("/srv/taxfill/uploads"))
    );
    assert_eq!(config.logging.level, "taxfill_ai=debug");
}
