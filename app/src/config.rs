//! Application configuration
//!
//! Stored as `config.json` in the app data directory. Every field has a
//! default, so a missing file or a partial file is fine.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const CONFIG_FILE: &str = "config.json";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to access config file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Invalid config file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// File name of the SQLite database inside the data directory
    pub database_file: String,
    pub geocoding: GeocodingConfig,
    pub crash: CrashConfig,
    pub logging: LoggingConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            database_file: "family_tree.db".to_string(),
            geocoding: GeocodingConfig::default(),
            crash: CrashConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeocodingConfig {
    pub photon_base_url: String,
    pub nominatim_base_url: String,
    pub user_agent: String,
    pub connect_timeout_secs: u64,
    pub read_timeout_secs: u64,
    pub search_limit: usize,
    /// Preferred result language, e.g. "en"
    pub language: Option<String>,
}

impl Default for GeocodingConfig {
    fn default() -> Self {
        Self {
            photon_base_url: "https://photon.komoot.io".to_string(),
            nominatim_base_url: "https://nominatim.openstreetmap.org".to_string(),
            user_agent: format!("FamilyTree/{}", env!("CARGO_PKG_VERSION")),
            connect_timeout_secs: 10,
            read_timeout_secs: 15,
            search_limit: 10,
            language: None,
        }
    }
}

/// Where a crash report goes
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CrashHandoffKind {
    /// Pending-report file read on the next launch
    #[default]
    File,
    /// Relaunch this executable with the report in its environment
    Relaunch,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CrashConfig {
    /// Time given to the recovery surface before the process exits
    pub grace_period_ms: u64,
    pub exit_code: i32,
    pub handoff: CrashHandoffKind,
}

impl Default for CrashConfig {
    fn default() -> Self {
        Self {
            grace_period_ms: 1000,
            exit_code: 10,
            handoff: CrashHandoffKind::File,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub max_file_bytes: u64,
    pub max_files: usize,
    pub recent_lines: usize,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        let rolling = rolling_logger::RollingConfig::default();
        Self {
            max_file_bytes: rolling.max_file_bytes,
            max_files: rolling.max_files,
            recent_lines: rolling.recent_lines,
        }
    }
}

impl From<&LoggingConfig> for rolling_logger::RollingConfig {
    fn from(config: &LoggingConfig) -> Self {
        Self {
            max_file_bytes: config.max_file_bytes,
            max_files: config.max_files,
            recent_lines: config.recent_lines,
        }
    }
}

impl AppConfig {
    /// Read `config.json` from `data_dir`, falling back to defaults when absent
    pub fn load(data_dir: &Path) -> Result<Self, ConfigError> {
        let path = data_dir.join(CONFIG_FILE);
        let raw = match fs::read_to_string(&path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Self::default()),
            Err(source) => return Err(ConfigError::Io { path, source }),
        };
        serde_json::from_str(&raw).map_err(|source| ConfigError::Parse { path, source })
    }

    pub fn save(&self, data_dir: &Path) -> Result<(), ConfigError> {
        let path = data_dir.join(CONFIG_FILE);
        fs::create_dir_all(data_dir).map_err(|source| ConfigError::Io { path: path.clone(), source })?;

        let json = serde_json::to_string_pretty(self)
            .map_err(|source| ConfigError::Parse { path: path.clone(), source })?;
        fs::write(&path, json).map_err(|source| ConfigError::Io { path, source })
    }

    pub fn database_path(&self, data_dir: &Path) -> PathBuf {
        data_dir.join(&self.database_file)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = AppConfig::load(dir.path()).unwrap();

        assert_eq!(config, AppConfig::default());
        assert_eq!(config.geocoding.connect_timeout_secs, 10);
        assert_eq!(config.geocoding.read_timeout_secs, 15);
        assert_eq!(config.crash.grace_period_ms, 1000);
        assert_eq!(config.crash.exit_code, 10);
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join(CONFIG_FILE),
            r#"{ "geocoding": { "search_limit": 3, "language": "de" } }"#,
        )
        .unwrap();

        let config = AppConfig::load(dir.path()).unwrap();
        assert_eq!(config.geocoding.search_limit, 3);
        assert_eq!(config.geocoding.language.as_deref(), Some("de"));
        assert_eq!(config.geocoding.photon_base_url, "https://photon.komoot.io");
        assert_eq!(config.database_file, "family_tree.db");
    }

    #[test]
    fn test_save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = AppConfig::default();
        config.crash.grace_period_ms = 250;
        config.logging.max_files = 2;
        config.crash.handoff = CrashHandoffKind::Relaunch;

        config.save(dir.path()).unwrap();
        assert_eq!(AppConfig::load(dir.path()).unwrap(), config);
    }

    #[test]
    fn test_invalid_json_is_parse_error() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join(CONFIG_FILE), "{ not json").unwrap();

        let err = AppConfig::load(dir.path()).unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
    }
}
