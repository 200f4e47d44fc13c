//! Configuration loading and database path resolution
//!
//! Bootstrap settings come from a small TOML file. Resolution order for every
//! setting is:
//! 1. Command-line argument (highest priority)
//! 2. Environment variable
//! 3. TOML config file
//! 4. OS-dependent compiled default (fallback)

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Environment variable naming the TOML config file
pub const CONFIG_ENV_VAR: &str = "PACCT_CONFIG";

/// Environment variable naming the SQLite database file
pub const DATABASE_ENV_VAR: &str = "PACCT_DATABASE";

/// Bootstrap configuration loaded from TOML
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TomlConfig {
    /// Path to SQLite database file
    #[serde(default)]
    pub database_path: Option<PathBuf>,

    #[serde(default)]
    pub logging: LoggingConfig,

    /// Scoring run defaults; every field is optional and falls back to the
    /// engine's built-in value
    #[serde(default)]
    pub scoring: ScoringToml,

    /// Gate thresholds keyed by coverage metric name
    #[serde(default)]
    pub gate: BTreeMap<String, f64>,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level or filter directive (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

/// `[scoring]` section
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ScoringToml {
    pub confidence_min: Option<f64>,
    pub max_causal_distance: Option<i64>,
    pub top_n: Option<usize>,
    pub unresolved_sample_size: Option<usize>,
}

impl TomlConfig {
    /// Parse a TOML config file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("Read {} failed: {}", path.display(), e)))?;
        Self::parse(&content)
            .map_err(|e| Error::Config(format!("Parse {} failed: {}", path.display(), e)))
    }

    /// Parse TOML text
    pub fn parse(content: &str) -> std::result::Result<Self, toml::de::Error> {
        toml::from_str(content)
    }

    /// Locate and load the config file, or fall back to defaults when none exists
    ///
    /// An explicitly requested file (CLI or environment) must exist; the
    /// platform default location is optional.
    pub fn resolve(cli_arg: Option<&Path>) -> Result<Self> {
        if let Some(path) = cli_arg {
            return Self::load(path);
        }

        if let Ok(path) = std::env::var(CONFIG_ENV_VAR) {
            if !path.trim().is_empty() {
                return Self::load(Path::new(&path));
            }
        }

        match default_config_path() {
            Some(path) if path.exists() => Self::load(&path),
            _ => {
                debug!("No config file found, using built-in defaults");
                Ok(Self::default())
            }
        }
    }
}

/// Resolve the SQLite database path
///
/// Priority: CLI → `PACCT_DATABASE` → TOML `database_path` → platform default
pub fn resolve_database_path(cli_arg: Option<&Path>, toml: &TomlConfig) -> PathBuf {
    // Priority 1: Command-line argument
    if let Some(path) = cli_arg {
        return path.to_path_buf();
    }

    // Priority 2: Environment variable
    if let Ok(path) = std::env::var(DATABASE_ENV_VAR) {
        if !path.trim().is_empty() {
            return PathBuf::from(path);
        }
    }

    // Priority 3: TOML config file
    if let Some(path) = &toml.database_path {
        return path.clone();
    }

    // Priority 4: OS-dependent compiled default
    default_database_path()
}

/// Platform config file location (`~/.config/pacct/config.toml` on Linux)
fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("pacct").join("config.toml"))
}

/// OS-dependent default database path
fn default_database_path() -> PathBuf {
    dirs::data_local_dir()
        .map(|d| d.join("pacct").join("pacct.db"))
        .unwrap_or_else(|| PathBuf::from("./pacct_data/pacct.db"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_full_config() {
        let config = TomlConfig::parse(
            r#"
            database_path = "/var/lib/pacct/pacct.db"

            [logging]
            level = "debug"

            [scoring]
            confidence_min = 0.6
            max_causal_distance = 2
            top_n = 25

            [gate]
            primary_evidence_pct = 0.5
            indirect_identity_resolved_pct = 0.8
            "#,
        )
        .unwrap();

        assert_eq!(
            config.database_path,
            Some(PathBuf::from("/var/lib/pacct/pacct.db"))
        );
        assert_eq!(config.logging.level, "debug");
        assert_eq!(config.scoring.confidence_min, Some(0.6));
        assert_eq!(config.scoring.max_causal_distance, Some(2));
        assert_eq!(config.scoring.top_n, Some(25));
        assert_eq!(config.scoring.unresolved_sample_size, None);
        assert_eq!(config.gate.get("primary_evidence_pct"), Some(&0.5));
    }

    #[test]
    fn test_empty_config_uses_defaults() {
        let config = TomlConfig::parse("").unwrap();
        assert!(config.database_path.is_none());
        assert_eq!(config.logging.level, "info");
        assert!(config.gate.is_empty());
    }

    #[test]
    fn test_cli_database_path_wins() {
        let toml = TomlConfig {
            database_path: Some(PathBuf::from("/from/toml.db")),
            ..Default::default()
        };
        let path = resolve_database_path(Some(Path::new("/from/cli.db")), &toml);
        assert_eq!(path, PathBuf::from("/from/cli.db"));
    }
}
