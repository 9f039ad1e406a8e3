//! Clinic configuration loaded from TOML.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::export::Letterhead;

pub const APP_DIR_NAME: &str = "opd-intake";
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Folder under the user's Documents where workbooks are kept.
pub const DATA_FOLDER_NAME: &str = "OPD Data";

/// Configuration errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Cannot read config file {}: {source}", path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Invalid config file {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
}

pub type ConfigResult<T> = Result<T, ConfigError>;

/// Where the database and generated files live. Unset paths fall back to
/// per-user defaults.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct StorageConfig {
    pub database_path: Option<PathBuf>,
    pub data_dir: Option<PathBuf>,
    pub reports_dir: Option<PathBuf>,
}

impl StorageConfig {
    pub fn database_path(&self) -> PathBuf {
        self.database_path
            .clone()
            .unwrap_or_else(|| app_data_dir().join("clinic.db"))
    }

    pub fn data_dir(&self) -> PathBuf {
        self.data_dir
            .clone()
            .unwrap_or_else(|| documents_dir().join(DATA_FOLDER_NAME))
    }

    pub fn reports_dir(&self) -> PathBuf {
        self.reports_dir
            .clone()
            .unwrap_or_else(|| self.data_dir().join("Reports"))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ClinicConfig {
    /// `tracing` filter used when `RUST_LOG` is not set
    pub log_filter: String,
    pub clinic: Letterhead,
    pub storage: StorageConfig,
}

impl Default for ClinicConfig {
    fn default() -> Self {
        Self {
            log_filter: default_log_filter().to_string(),
            clinic: Letterhead::default(),
            storage: StorageConfig::default(),
        }
    }
}

impl ClinicConfig {
    /// Load an explicit config file.
    pub fn load(path: &Path) -> ConfigResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Load the per-user config file if there is one, otherwise defaults.
    pub fn load_default() -> ConfigResult<Self> {
        match default_config_path() {
            Some(path) if path.exists() => Self::load(&path),
            _ => Ok(Self::default()),
        }
    }

    pub fn from_toml(content: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(content)
    }
}

pub fn default_log_filter() -> &'static str {
    "info"
}

/// `<config_dir>/opd-intake/config.toml`
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join(APP_DIR_NAME).join("config.toml"))
}

/// Per-user application data folder holding the database.
pub fn app_data_dir() -> PathBuf {
    dirs::data_local_dir()
        .or_else(dirs::home_dir)
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_DIR_NAME)
}

/// The user's Documents folder, falling back to `~/Documents`.
pub fn documents_dir() -> PathBuf {
    dirs::document_dir()
        .or_else(|| dirs::home_dir().map(|home| home.join("Documents")))
        .unwrap_or_else(|| PathBuf::from("Documents"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_file_is_all_defaults() {
        let config = ClinicConfig::from_toml("").unwrap();
        assert_eq!(config, ClinicConfig::default());
        assert_eq!(config.log_filter, "info");
        assert!(config.clinic.doctors.is_empty());
    }

    #[test]
    fn test_parse_full_config() {
        let config = ClinicConfig::from_toml(
            r#"
            log_filter = "debug"

            [clinic]
            name = "Welfare Clinic"
            subtitle = "Main Road"
            footer_credit = "Front desk"

            [[clinic.doctors]]
            name = "Dr. A"
            qualifications = "M.B.B.S"

            [[clinic.doctors]]
            name = "Dr. B"
            qualifications = "M.B.B.S, R.M.P"

            [storage]
            database_path = "/srv/clinic/clinic.db"
            data_dir = "/srv/clinic/data"
            "#,
        )
        .unwrap();

        assert_eq!(config.log_filter, "debug");
        assert_eq!(config.clinic.name, "Welfare Clinic");
        assert_eq!(config.clinic.doctors.len(), 2);
        assert_eq!(config.clinic.footer_days, "Monday to Saturday");
        assert_eq!(
            config.storage.database_path(),
            PathBuf::from("/srv/clinic/clinic.db")
        );
        assert_eq!(
            config.storage.reports_dir(),
            PathBuf::from("/srv/clinic/data").join("Reports")
        );
    }

    #[test]
    fn test_default_dirs() {
        let storage = StorageConfig::default();
        assert!(storage.data_dir().ends_with(DATA_FOLDER_NAME));
        assert!(storage.database_path().ends_with("clinic.db"));
        assert!(storage.reports_dir().starts_with(storage.data_dir()));
    }

    #[test]
    fn test_load_reports_parse_errors() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "log_filter = [").unwrap();
        assert!(matches!(ClinicConfig::load(&path), Err(ConfigError::Parse { .. })));
        assert!(matches!(
            ClinicConfig::load(&dir.path().join("missing.toml")),
            Err(ConfigError::Read { .. })
        ));
    }
}
