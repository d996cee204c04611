//! Persistent configuration store.
//!
//! The configuration lives in a pretty-printed JSON file
//! (`<config dir>/restcycle/config.json` by default). Reading never fails:
//! a missing file yields the defaults, and an unreadable or malformed file is
//! logged and replaced by the defaults as well. Writing reports errors so the
//! caller can decide whether to carry on with the in-memory value.

use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::{debug, warn};

use crate::types::CycleConfig;

/// Application directory name under the platform config directory.
pub const APP_DIR_NAME: &str = "restcycle";

/// Configuration file name.
pub const CONFIG_FILE_NAME: &str = "config.json";

/// Errors that can occur while persisting the configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// No platform configuration directory could be determined.
    #[error("could not determine the configuration directory")]
    NoConfigDir,

    /// Failed to create the directory holding the configuration file.
    #[error("failed to create configuration directory {path}: {source}")]
    CreateDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Failed to serialize the configuration.
    #[error("failed to serialize configuration: {0}")]
    Serialize(#[from] serde_json::Error),

    /// Failed to write the configuration file.
    #[error("failed to write configuration file {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Reads and writes [`CycleConfig`] as JSON.
#[derive(Debug, Clone)]
pub struct ConfigStore {
    path: PathBuf,
}

impl ConfigStore {
    /// Creates a store backed by the given file.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Creates a store at the platform default location.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::NoConfigDir` if the platform has no config directory.
    pub fn at_default_location() -> Result<Self, ConfigError> {
        Ok(Self::new(Self::default_path()?))
    }

    /// Returns the platform default configuration file path.
    pub fn default_path() -> Result<PathBuf, ConfigError> {
        let dir = dirs::config_dir().ok_or(ConfigError::NoConfigDir)?;
        Ok(dir.join(APP_DIR_NAME).join(CONFIG_FILE_NAME))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Loads the configuration, falling back to defaults.
    ///
    /// Durations below the minimum are clamped.
    pub fn load(&self) -> CycleConfig {
        if !self.path.exists() {
            debug!(path = %self.path.display(), "No configuration file, using defaults");
            return CycleConfig::default();
        }

        let contents = match fs::read_to_string(&self.path) {
            Ok(contents) => contents,
            Err(e) => {
                warn!(path = %self.path.display(), "Failed to read configuration: {}", e);
                return CycleConfig::default();
            }
        };

        match serde_json::from_str::<CycleConfig>(&contents) {
            Ok(config) => {
                debug!(path = %self.path.display(), "Configuration loaded");
                config.clamped()
            }
            Err(e) => {
                warn!(path = %self.path.display(), "Failed to parse configuration: {}", e);
                CycleConfig::default()
            }
        }
    }

    /// Saves the configuration, creating the parent directory if needed.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory cannot be created or the file cannot be written.
    pub fn save(&self, config: &CycleConfig) -> Result<(), ConfigError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(|source| ConfigError::CreateDir {
                path: parent.to_path_buf(),
                source,
            })?;
        }

        let json = serde_json::to_string_pretty(config)?;
        fs::write(&self.path, json).map_err(|source| ConfigError::Write {
            path: self.path.clone(),
            source,
        })?;

        debug!(path = %self.path.display(), "Configuration saved");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_store() -> (tempfile::TempDir, ConfigStore) {
        let dir = tempfile::tempdir().unwrap();
        let store = ConfigStore::new(dir.path().join("nested").join(CONFIG_FILE_NAME));
        (dir, store)
    }

    #[test]
    fn test_load_missing_file_returns_defaults() {
        let (_dir, store) = temp_store();
        assert_eq!(store.load(), CycleConfig::default());
    }

    #[test]
    fn test_save_then_load() {
        let (_dir, store) = temp_store();
        let config = CycleConfig {
            rest_message: "Mírate las manos".to_string(),
            ..CycleConfig::default().with_work_minutes(45)
        };

        store.save(&config).unwrap();
        assert!(store.path().exists());
        assert_eq!(store.load(), config);
    }

    #[test]
    fn test_load_corrupt_file_returns_defaults() {
        let (_dir, store) = temp_store();
        fs::create_dir_all(store.path().parent().unwrap()).unwrap();
        fs::write(store.path(), "{ not json").unwrap();

        assert_eq!(store.load(), CycleConfig::default());
    }

    #[test]
    fn test_load_clamps_zero_durations() {
        let (_dir, store) = temp_store();
        fs::create_dir_all(store.path().parent().unwrap()).unwrap();
        fs::write(store.path(), r#"{"work_minutes": 0, "rest_minutes": 2}"#).unwrap();

        let config = store.load();
        assert_eq!(config.work_minutes, 1);
        assert_eq!(config.rest_minutes, 2);
        assert_eq!(config.auto_rest_minutes, 5);
    }

    #[test]
    fn test_save_into_unwritable_location_fails() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("file");
        fs::write(&blocker, "x").unwrap();

        // Parent "directory" is a regular file
        let store = ConfigStore::new(blocker.join(CONFIG_FILE_NAME));
        let result = store.save(&CycleConfig::default());
        assert!(matches!(result, Err(ConfigError::CreateDir { .. })));
    }

    #[test]
    fn test_default_path_ends_with_app_dir() {
        if let Ok(path) = ConfigStore::default_path() {
            assert!(path.ends_with(Path::new(APP_DIR_NAME).join(CONFIG_FILE_NAME)));
        }
    }
}
