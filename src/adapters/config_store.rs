use std::fs;
use std::path::PathBuf;

use tracing::{debug, info};

use crate::domain::{AppConfig, DomainError};
use crate::ports::ConfigStore;

const APP_DIR: &str = "GeminiTtsBatch";

/// TOML settings document stored under the OS application data directory.
pub struct TomlConfigStore {
    data_dir: PathBuf,
}

impl TomlConfigStore {
    /// Create a store in the OS-specific application data directory.
    pub fn new() -> Result<Self, DomainError> {
        let data_dir = dirs::config_dir()
            .map(|p| p.join(APP_DIR))
            .ok_or_else(|| {
                DomainError::Config("Could not find application data directory".to_string())
            })?;
        Self::with_data_dir(data_dir)
    }

    /// Create a store rooted at an explicit directory (e.g. the host's addon folder).
    pub fn with_data_dir(data_dir: impl Into<PathBuf>) -> Result<Self, DomainError> {
        let data_dir = data_dir.into();
        fs::create_dir_all(&data_dir)?;

        info!(data_dir = ?data_dir, "ConfigStore initialized");

        Ok(Self { data_dir })
    }

    pub fn data_dir(&self) -> PathBuf {
        self.data_dir.clone()
    }
}

impl ConfigStore for TomlConfigStore {
    fn load(&self) -> Result<AppConfig, DomainError> {
        let config_path = self.config_path();

        if config_path.exists() {
            debug!(path = ?config_path, "Loading configuration");
            let content = fs::read_to_string(&config_path)?;
            let config: AppConfig = toml::from_str(&content)?;
            config.validate()?;
            info!(
                path = ?config_path,
                note_types = config.note_types.len(),
                "Configuration loaded"
            );
            Ok(config)
        } else {
            info!(path = ?config_path, "Configuration file not found, creating default");
            let config = AppConfig::new();
            self.save(&config)?;
            Ok(config)
        }
    }

    fn save(&self, config: &AppConfig) -> Result<(), DomainError> {
        config.validate()?;

        let config_path = self.config_path();
        if let Some(parent) = config_path.parent() {
            fs::create_dir_all(parent)?;
        }

        // Readers only ever see a complete document.
        let staging = config_path.with_extension("toml.tmp");
        fs::write(&staging, toml::to_string_pretty(config)?)?;
        fs::rename(&staging, &config_path)?;

        info!(path = ?config_path, "Configuration saved");
        Ok(())
    }

    fn config_path(&self) -> PathBuf {
        self.data_dir.join("config.toml")
    }

    /// Logs stay next to the config on macOS; elsewhere they go to the
    /// local data directory.
    fn logs_dir(&self) -> PathBuf {
        #[cfg(target_os = "macos")]
        {
            self.data_dir.join("logs")
        }

        #[cfg(not(target_os = "macos"))]
        {
            dirs::data_local_dir()
                .map(|p| p.join(APP_DIR).join("logs"))
                .unwrap_or_else(|| self.data_dir.join("logs"))
        }
    }

    fn media_dir(&self) -> PathBuf {
        self.data_dir.join("media")
    }
}
