use std::path::PathBuf;

use crate::domain::{AppConfig, DomainError};

/// Port for the persisted settings document (credentials, models, mappings).
pub trait ConfigStore: Send + Sync {
    /// Read the settings document, writing defaults first if it is absent.
    fn load(&self) -> Result<AppConfig, DomainError>;

    /// Validate and persist a settings document.
    fn save(&self, config: &AppConfig) -> Result<(), DomainError>;

    fn config_path(&self) -> PathBuf;

    /// Directory holding rotated log files.
    fn logs_dir(&self) -> PathBuf;

    /// Default directory for generated audio when the host has no media folder.
    fn media_dir(&self) -> PathBuf;
}
