// SPDX-FileCopyrightText: 2026 TRAPD Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Integration tests for the TRAPD configuration system.

use std::fs;
use std::sync::Mutex;

use trapd_config::model::LogLevel;
use trapd_config::{load_config, AgentConfig};

/// Serializes tests that touch process environment variables.
static ENV_LOCK: Mutex<()> = Mutex::new(());

/// Runs `f` with the given environment variables set, restoring afterwards.
fn with_env_vars<T>(vars: &[(&str, &str)], f: impl FnOnce() -> T) -> T {
    let _guard = ENV_LOCK.lock().unwrap();
    for (name, value) in vars {
        std::env::set_var(name, value);
    }
    let result = f();
    for (name, _) in vars {
        std::env::remove_var(name);
    }
    result
}

/// Loads config while holding the env lock, so tests asserting defaults do
/// not race the override tests.
fn load_config_locked(path: &std::path::Path) -> AgentConfig {
    let _guard = ENV_LOCK.lock().unwrap();
    load_config(path)
}

#[test]
fn full_config_file_deserializes() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.json");
    fs::write(
        &path,
        r#"{
            "api_url": "https://intake.example.com",
            "project_id": "proj-42",
            "interval_s": 120,
            "batch_size": 250,
            "log_level": "Debug"
        }"#,
    )
    .unwrap();

    let config = load_config_locked(&path).validated().unwrap();
    assert_eq!(config.api_url, "https://intake.example.com");
    assert_eq!(config.project_id(), "proj-42");
    assert_eq!(config.interval_s, 120);
    assert_eq!(config.batch_size, 250);
    assert_eq!(config.log_level, LogLevel::Debug);
}

#[test]
fn missing_file_yields_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let config = load_config_locked(&dir.path().join("config.json"));
    assert_eq!(config.api_url, "https://api.trapd.io");
    assert_eq!(config.interval_s, 60);
    assert_eq!(config.batch_size, 100);
    assert!(config.project_id.is_none());
}

#[test]
fn malformed_file_yields_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.json");
    fs::write(&path, "{ this is not json").unwrap();

    let config = load_config_locked(&path);
    assert_eq!(config.api_url, "https://api.trapd.io");
    assert_eq!(config.interval_s, 60);
}

#[test]
fn partial_file_keeps_defaults_for_missing_keys() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.json");
    fs::write(&path, r#"{"project_id": "proj-9"}"#).unwrap();

    let config = load_config_locked(&path);
    assert_eq!(config.project_id(), "proj-9");
    assert_eq!(config.api_url, "https://api.trapd.io");
    assert_eq!(config.batch_size, 100);
}

#[test]
fn unknown_keys_fall_back_to_defaults() {
    // deny_unknown_fields makes the whole file unusable; loading degrades
    // to defaults instead of failing startup.
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.json");
    fs::write(&path, r#"{"project_id": "proj-9", "projcet_id": "typo"}"#).unwrap();

    let config = load_config_locked(&path);
    assert!(config.project_id.is_none());
}

#[test]
fn env_overrides_take_precedence_over_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.json");
    fs::write(
        &path,
        r#"{"api_url": "https://file.example.com", "project_id": "from-file"}"#,
    )
    .unwrap();

    let config = with_env_vars(
        &[
            ("API_URL_OVERRIDE", "https://env.example.com"),
            ("PROJECT_ID_OVERRIDE", "from-env"),
        ],
        || load_config(&path),
    );

    assert_eq!(config.api_url, "https://env.example.com");
    assert_eq!(config.project_id(), "from-env");
}

#[test]
fn empty_env_overrides_are_ignored() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.json");
    fs::write(&path, r#"{"project_id": "from-file"}"#).unwrap();

    let config = with_env_vars(
        &[("API_URL_OVERRIDE", ""), ("PROJECT_ID_OVERRIDE", "  ")],
        || load_config(&path),
    );

    assert_eq!(config.api_url, "https://api.trapd.io");
    assert_eq!(config.project_id(), "from-file");
}

#[test]
fn project_id_from_env_alone_validates() {
    let dir = tempfile::tempdir().unwrap();
    let config = with_env_vars(&[("PROJECT_ID_OVERRIDE", "env-only")], || {
        load_config(&dir.path().join("config.json"))
    });
    let config = config.validated().unwrap();
    assert_eq!(config.project_id(), "env-only");
}

#[test]
fn clamping_applies_after_file_load() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.json");
    fs::write(
        &path,
        r#"{"project_id": "p", "interval_s": 999999, "batch_size": 0}"#,
    )
    .unwrap();

    let config = load_config_locked(&path).validated().unwrap();
    assert_eq!(config.interval_s, 60);
    assert_eq!(config.batch_size, 100);
}

#[test]
fn default_config_without_project_id_fails_validation() {
    let _guard = ENV_LOCK.lock().unwrap();
    assert!(AgentConfig::default().validated().is_err());
}
