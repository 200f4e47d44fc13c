//! Configuration resolution tests (environment-dependent, run serially)

use pacct_common::config::{resolve_database_path, TomlConfig, CONFIG_ENV_VAR, DATABASE_ENV_VAR};
use serial_test::serial;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

#[test]
#[serial]
fn test_env_database_path_beats_toml() {
    std::env::set_var(DATABASE_ENV_VAR, "/from/env.db");
    let toml = TomlConfig {
        database_path: Some(PathBuf::from("/from/toml.db")),
        ..Default::default()
    };

    let path = resolve_database_path(None, &toml);
    std::env::remove_var(DATABASE_ENV_VAR);

    assert_eq!(path, PathBuf::from("/from/env.db"));
}

#[test]
#[serial]
fn test_toml_database_path_used_without_env() {
    std::env::remove_var(DATABASE_ENV_VAR);
    let toml = TomlConfig {
        database_path: Some(PathBuf::from("/from/toml.db")),
        ..Default::default()
    };

    assert_eq!(resolve_database_path(None, &toml), PathBuf::from("/from/toml.db"));
}

#[test]
#[serial]
fn test_config_file_from_env() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("pacct.toml");
    std::fs::write(&path, "[logging]\nlevel = \"warn\"\n").unwrap();

    std::env::set_var(CONFIG_ENV_VAR, &path);
    let config = TomlConfig::resolve(None);
    std::env::remove_var(CONFIG_ENV_VAR);

    assert_eq!(config.unwrap().logging.level, "warn");
}

#[test]
#[serial]
fn test_explicit_missing_config_is_an_error() {
    let result = TomlConfig::resolve(Some(Path::new("/definitely/not/here.toml")));
    assert!(result.is_err());
}
