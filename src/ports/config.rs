use std::path::PathBuf;

use crate::domain::{AppConfig, DomainError};

/// Configuration store port for persisting and loading app configuration.
pub trait ConfigStore: Send + Sync {
    /// Load configuration from persistent storage.
    /// Writes and returns the defaults if no file exists yet.
    fn load(&self) -> Result<AppConfig, DomainError>;

    /// Save configuration to persistent storage.
    fn save(&self, config: &AppConfig) -> Result<(), DomainError>;

    /// Path of the configuration file.
    fn config_path(&self) -> PathBuf;

    /// Application data directory (models live under it).
    fn data_dir(&self) -> PathBuf;

    /// Logs directory.
    fn logs_dir(&self) -> PathBuf;
}
