//! Configuration management for logkeeper.
//!
//! This module provides configuration loading and validation using figment,
//! supporting TOML config files, environment variables, and defaults.

use std::path::PathBuf;

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use glob::Pattern;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Default configuration file name.
const CONFIG_FILE_NAME: &str = "config.toml";

/// Default data directory name.
const DATA_DIR_NAME: &str = "logkeeper";

/// Default database file name.
const DATABASE_FILE_NAME: &str = "logkeeper.db";

/// Default master log file name, placed in the log sheets directory.
const MASTER_LOG_FILE_NAME: &str = "Master Log.xlsx";

/// Collection names must be plain identifiers.
const COLLECTION_NAME_PATTERN: &str = r"^[A-Za-z][A-Za-z0-9_]*$";

/// Application configuration.
///
/// Configuration is loaded from (in order of precedence, highest first):
/// 1. Environment variables (prefixed with `LOGKEEPER_`, sections split on `__`)
/// 2. TOML config file at `~/.config/logkeeper/config.toml`
/// 3. Default values
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Log sheet ingest configuration.
    pub ingest: IngestConfig,
    /// Storage configuration.
    pub storage: StorageConfig,
    /// Master log output configuration.
    pub output: OutputConfig,
}

/// Log sheet ingest configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IngestConfig {
    /// Directory holding the log sheets.
    pub log_sheets_dir: Option<PathBuf>,
    /// Glob matched against file names in the log sheets directory.
    pub file_pattern: String,
    /// Name of the blank template sheet, skipped without a warning.
    pub template_file_name: String,
    /// Worksheet holding the launches.
    pub launches_sheet: String,
    /// Worksheet holding the aircraft counters.
    pub aircraft_sheet: String,
    /// Flight times above this (in minutes) reject the sheet.
    pub max_flight_time_minutes: u16,
}

/// Storage-related configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Path to the database file.
    /// Defaults to `~/.local/share/logkeeper/logkeeper.db`
    pub database_path: Option<PathBuf>,
    /// Collection holding the master log of launches.
    pub launches_collection: String,
    /// Collection holding aircraft launch and hour counters.
    pub aircraft_info_collection: String,
    /// Back up collections before merging into them.
    pub backup: bool,
}

/// Master log workbook configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Path of the master log workbook.
    /// Defaults to `Master Log.xlsx` inside the log sheets directory.
    pub master_log_path: Option<PathBuf>,
    /// Worksheet the master log table is written to.
    pub sheet_name: String,
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            log_sheets_dir: None,
            file_pattern: "2965D_*.xlsx".to_string(),
            template_file_name: "2965D_YYMMDD_ZEXXX.xlsx".to_string(),
            launches_sheet: "FORMATTED".to_string(),
            aircraft_sheet: "_AIRCRAFT".to_string(),
            max_flight_time_minutes: 240,
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            database_path: None, // Will be resolved to default at runtime
            launches_collection: "launches".to_string(),
            aircraft_info_collection: "aircraft_info".to_string(),
            backup: true,
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            master_log_path: None,
            sheet_name: "MASTER LOG".to_string(),
        }
    }
}

impl IngestConfig {
    /// Compile `file_pattern` as a shell glob (`*`, `?`, `[...]`).
    ///
    /// # Errors
    ///
    /// Returns an error if the pattern is malformed.
    pub fn file_glob(&self) -> Result<Pattern> {
        Pattern::new(&self.file_pattern).map_err(|e| Error::ConfigValidation {
            message: format!("invalid file pattern {}: {e}", self.file_pattern),
        })
    }
}

impl Config {
    /// Load configuration from all sources.
    ///
    /// Configuration is loaded in this order (later sources override earlier):
    /// 1. Default values
    /// 2. TOML config file (if exists)
    /// 3. Environment variables (prefixed with `LOGKEEPER_`)
    ///
    /// # Errors
    ///
    /// Returns an error if configuration loading or parsing fails.
    pub fn load() -> Result<Self> {
        Self::load_from(None)
    }

    /// Load configuration with an optional custom config path.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration loading or parsing fails.
    pub fn load_from(config_path: Option<PathBuf>) -> Result<Self> {
        let config_file = config_path.unwrap_or_else(Self::default_config_path);

        let figment = Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Toml::file(&config_file))
            .merge(Env::prefixed("LOGKEEPER_").split("__"));

        let config: Config = figment.extract()?;
        config.validate()?;
        Ok(config)
    }

    /// Get the default configuration file path.
    #[must_use]
    pub fn default_config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from(".config"))
            .join(DATA_DIR_NAME)
            .join(CONFIG_FILE_NAME)
    }

    /// Get the default data directory path.
    #[must_use]
    pub fn default_data_dir() -> PathBuf {
        dirs::data_local_dir()
            .unwrap_or_else(|| PathBuf::from(".local/share"))
            .join(DATA_DIR_NAME)
    }

    /// Validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if any configuration values are invalid.
    pub fn validate(&self) -> Result<()> {
        if self.ingest.file_pattern.trim().is_empty() {
            return Err(Error::ConfigValidation {
                message: "file_pattern must not be empty".to_string(),
            });
        }
        self.ingest.file_glob()?;

        for (key, sheet) in [
            ("launches_sheet", &self.ingest.launches_sheet),
            ("aircraft_sheet", &self.ingest.aircraft_sheet),
            ("sheet_name", &self.output.sheet_name),
        ] {
            if sheet.trim().is_empty() {
                return Err(Error::ConfigValidation {
                    message: format!("{key} must not be empty"),
                });
            }
        }

        if self.ingest.max_flight_time_minutes == 0 {
            return Err(Error::ConfigValidation {
                message: "max_flight_time_minutes must be greater than 0".to_string(),
            });
        }

        let collection_name = Regex::new(COLLECTION_NAME_PATTERN).map_err(|e| {
            Error::ConfigValidation {
                message: e.to_string(),
            }
        })?;
        for name in [
            &self.storage.launches_collection,
            &self.storage.aircraft_info_collection,
        ] {
            if !collection_name.is_match(name) {
                return Err(Error::ConfigValidation {
                    message: format!("invalid collection name: {name}"),
                });
            }
        }
        if self.storage.launches_collection == self.storage.aircraft_info_collection {
            return Err(Error::ConfigValidation {
                message: "launches and aircraft info collections must differ".to_string(),
            });
        }

        Ok(())
    }

    /// Get the database path, resolving defaults if not set.
    #[must_use]
    pub fn database_path(&self) -> PathBuf {
        self.storage
            .database_path
            .clone()
            .unwrap_or_else(|| Self::default_data_dir().join(DATABASE_FILE_NAME))
    }

    /// Get the master log path, resolving it against a log sheets
    /// directory if not set.
    #[must_use]
    pub fn master_log_path(&self, log_sheets_dir: &std::path::Path) -> PathBuf {
        self.output
            .master_log_path
            .clone()
            .unwrap_or_else(|| log_sheets_dir.join(MASTER_LOG_FILE_NAME))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_ingest_config() {
        let ingest = IngestConfig::default();

        assert!(ingest.log_sheets_dir.is_none());
        assert_eq!(ingest.file_pattern, "2965D_*.xlsx");
        assert_eq!(ingest.template_file_name, "2965D_YYMMDD_ZEXXX.xlsx");
        assert_eq!(ingest.launches_sheet, "FORMATTED");
        assert_eq!(ingest.aircraft_sheet, "_AIRCRAFT");
        assert_eq!(ingest.max_flight_time_minutes, 240);
    }

    #[test]
    fn test_default_storage_config() {
        let storage = StorageConfig::default();

        assert!(storage.database_path.is_none());
        assert_eq!(storage.launches_collection, "launches");
        assert_eq!(storage.aircraft_info_collection, "aircraft_info");
        assert!(storage.backup);
    }

    #[test]
    fn test_default_output_config() {
        let output = OutputConfig::default();
        assert!(output.master_log_path.is_none());
        assert_eq!(output.sheet_name, "MASTER LOG");
    }

    #[test]
    fn test_validate_valid_config() {
        assert!(Config::default().validate().is_ok());
    }

    #[test]
    fn test_validate_empty_pattern() {
        let mut config = Config::default();
        config.ingest.file_pattern = "  ".to_string();

        let err = config.validate().unwrap_err().to_string();
        assert!(err.contains("file_pattern"));
    }

    #[test]
    fn test_validate_empty_sheet_name() {
        let mut config = Config::default();
        config.ingest.launches_sheet = String::new();

        let err = config.validate().unwrap_err().to_string();
        assert!(err.contains("launches_sheet"));
    }

    #[test]
    fn test_validate_zero_flight_time() {
        let mut config = Config::default();
        config.ingest.max_flight_time_minutes = 0;

        let err = config.validate().unwrap_err().to_string();
        assert!(err.contains("max_flight_time_minutes"));
    }

    #[test]
    fn test_validate_bad_collection_name() {
        let mut config = Config::default();
        config.storage.launches_collection = "launches; drop".to_string();

        let err = config.validate().unwrap_err().to_string();
        assert!(err.contains("invalid collection name"));
    }

    #[test]
    fn test_validate_same_collections() {
        let mut config = Config::default();
        config.storage.aircraft_info_collection = "launches".to_string();

        assert!(config.validate().is_err());
    }

    #[test]
    fn test_file_glob_matches_log_sheets() {
        let glob = IngestConfig::default().file_glob().unwrap();

        assert!(glob.matches("2965D_250123_ZE123.xlsx"));
        assert!(glob.matches("2965D_.xlsx"));
        assert!(!glob.matches("2965D_250123_ZE123.xls"));
        assert!(!glob.matches("Master Log.xlsx"));
        assert!(!glob.matches("x2965D_250123.xlsx"));
    }

    #[test]
    fn test_file_glob_character_class() {
        let ingest = IngestConfig {
            file_pattern: "2965D_[0-9]*.xlsx".to_string(),
            ..IngestConfig::default()
        };
        let glob = ingest.file_glob().unwrap();

        assert!(glob.matches("2965D_250123_ZE123.xlsx"));
        assert!(!glob.matches("2965D_YYMMDD_ZEXXX.xlsx"));
    }

    #[test]
    fn test_validate_malformed_glob() {
        let mut config = Config::default();
        config.ingest.file_pattern = "2965D_[0-9.xlsx".to_string();

        let err = config.validate().unwrap_err().to_string();
        assert!(err.contains("invalid file pattern"));
    }

    #[test]
    fn test_database_path_default() {
        let path = Config::default().database_path();
        assert!(path.to_string_lossy().contains("logkeeper.db"));
    }

    #[test]
    fn test_database_path_custom() {
        let mut config = Config::default();
        config.storage.database_path = Some(PathBuf::from("/custom/path/db.sqlite"));

        assert_eq!(
            config.database_path(),
            PathBuf::from("/custom/path/db.sqlite")
        );
    }

    #[test]
    fn test_master_log_path_default() {
        let config = Config::default();
        let path = config.master_log_path(std::path::Path::new("/logs"));
        assert_eq!(path, PathBuf::from("/logs/Master Log.xlsx"));
    }

    #[test]
    fn test_master_log_path_custom() {
        let mut config = Config::default();
        config.output.master_log_path = Some(PathBuf::from("/out/master.xlsx"));

        let path = config.master_log_path(std::path::Path::new("/logs"));
        assert_eq!(path, PathBuf::from("/out/master.xlsx"));
    }

    #[test]
    fn test_default_config_path() {
        let path = Config::default_config_path();
        assert!(path.to_string_lossy().contains("logkeeper"));
        assert!(path.to_string_lossy().contains("config.toml"));
    }

    // Loading reads LOGKEEPER_ variables, so these tests run inside a
    // figment jail to keep them from seeing each other's environment.

    #[test]
    fn test_load_nonexistent_config() {
        figment::Jail::expect_with(|jail| {
            let config = Config::load_from(Some(jail.directory().join("missing.toml")))
                .map_err(|e| e.to_string())?;
            assert_eq!(config, Config::default());
            Ok(())
        });
    }

    #[test]
    fn test_load_from_toml_file() {
        figment::Jail::expect_with(|jail| {
            jail.create_file(
                "config.toml",
                "[ingest]\nmax_flight_time_minutes = 300\n\n[storage]\nlaunches_collection = \"log_sheets\"\n",
            )?;

            let config = Config::load_from(Some(jail.directory().join("config.toml")))
                .map_err(|e| e.to_string())?;
            assert_eq!(config.ingest.max_flight_time_minutes, 300);
            assert_eq!(config.storage.launches_collection, "log_sheets");
            assert_eq!(config.ingest.launches_sheet, "FORMATTED");
            Ok(())
        });
    }

    #[test]
    fn test_env_overrides_toml() {
        figment::Jail::expect_with(|jail| {
            jail.create_file(
                "config.toml",
                "[ingest]\nmax_flight_time_minutes = 300\n\n[storage]\nbackup = true\n",
            )?;
            jail.set_env("LOGKEEPER_INGEST__MAX_FLIGHT_TIME_MINUTES", "180");
            jail.set_env("LOGKEEPER_STORAGE__BACKUP", "false");

            let config = Config::load_from(Some(jail.directory().join("config.toml")))
                .map_err(|e| e.to_string())?;
            assert_eq!(config.ingest.max_flight_time_minutes, 180);
            assert!(!config.storage.backup);
            assert_eq!(config.ingest.launches_sheet, "FORMATTED");
            Ok(())
        });
    }

    #[test]
    fn test_load_rejects_invalid_toml_values() {
        figment::Jail::expect_with(|jail| {
            jail.create_file("config.toml", "[storage]\nlaunches_collection = \"bad name\"\n")?;

            let result = Config::load_from(Some(jail.directory().join("config.toml")));
            assert!(matches!(result, Err(Error::ConfigValidation { .. })));
            Ok(())
        });
    }

    #[test]
    fn test_config_roundtrips_through_json() {
        let json = serde_json::to_string(&Config::default()).unwrap();
        assert!(json.contains("launches_collection"));
        let parsed: Config = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, Config::default());
    }
}
