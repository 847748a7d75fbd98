use std::collections::{HashMap, HashSet};
use std::fmt;

use serde::{Deserialize, Serialize};
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::domain::DomainError;

/// Gemini API key. Zeroed on drop and never printed by `Debug`.
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize, Zeroize, ZeroizeOnDrop)]
#[serde(transparent)]
pub struct ApiKey(String);

impl ApiKey {
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    pub fn expose(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.trim().is_empty()
    }
}

impl fmt::Debug for ApiKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ApiKey(***)")
    }
}

/// Source and target field for one note type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NoteTypeMapping {
    /// Note type name as reported by the host.
    pub note_type: String,
    /// Field whose text is spoken.
    pub source_field: String,
    /// Field that receives the `[sound:...]` reference.
    pub target_field: String,
}

/// Settings that drive a batch run.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProcessingConfig {
    pub api_key: ApiKey,
    pub primary_model: String,
    /// Used when the primary model is rate limited.
    pub fallback_model: Option<String>,
    pub fallback_enabled: bool,
    /// Prebuilt voice name (e.g., "Zephyr", "Puck").
    pub voice_name: String,
    /// Sampling temperature (0.0-2.0).
    pub temperature: f32,
    /// Leave notes alone when the target field already has content.
    pub skip_existing_audio: bool,
    /// Retries after the first attempt for recoverable failures.
    pub retry_attempts: u32,
    /// Base backoff delay; doubled on every retry.
    pub retry_delay_seconds: u64,
    /// Keep using the fallback model for the rest of the run once switched.
    pub sticky_fallback: bool,
}

impl Default for ProcessingConfig {
    fn default() -> Self {
        Self {
            api_key: ApiKey::default(),
            primary_model: "gemini-2.5-pro-preview-tts".to_string(),
            fallback_model: Some("gemini-2.5-flash-preview-tts".to_string()),
            fallback_enabled: true,
            voice_name: "Zephyr".to_string(),
            temperature: 1.0,
            skip_existing_audio: true,
            retry_attempts: 3,
            retry_delay_seconds: 2,
            sticky_fallback: false,
        }
    }
}

impl ProcessingConfig {
    /// The fallback model, if fallback is enabled and one is configured.
    pub fn fallback_model(&self) -> Option<&str> {
        if !self.fallback_enabled {
            return None;
        }
        self.fallback_model
            .as_deref()
            .map(str::trim)
            .filter(|m| !m.is_empty())
    }
}

/// Gemini endpoint settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    pub base_url: String,
    /// Per-request timeout in seconds.
    pub timeout_secs: u64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: "https://generativelanguage.googleapis.com".to_string(),
            timeout_secs: 120,
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level: "trace", "debug", "info", "warn", "error".
    pub level: String,
    /// Enable file logging with rotation.
    pub file_logging: bool,
    /// Maximum number of log files to keep.
    pub max_files: usize,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            file_logging: true,
            max_files: 7,
        }
    }
}

/// Main application configuration, persisted as one document.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct AppConfig {
    pub note_types: Vec<NoteTypeMapping>,
    pub processing: ProcessingConfig,
    pub api: ApiConfig,
    pub logging: LoggingConfig,
}

impl AppConfig {
    /// Create a new AppConfig with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Check values that the processing loop relies on.
    pub fn validate(&self) -> Result<(), DomainError> {
        let p = &self.processing;

        if !(0.0..=2.0).contains(&p.temperature) {
            return Err(DomainError::Validation(format!(
                "temperature must be between 0.0 and 2.0, got {}",
                p.temperature
            )));
        }
        if p.primary_model.trim().is_empty() {
            return Err(DomainError::Validation("primary_model is empty".to_string()));
        }
        if p.voice_name.trim().is_empty() {
            return Err(DomainError::Validation("voice_name is empty".to_string()));
        }

        let mut seen = HashSet::new();
        for mapping in &self.note_types {
            if mapping.source_field.trim().is_empty() || mapping.target_field.trim().is_empty() {
                return Err(DomainError::Validation(format!(
                    "note type '{}' needs both a source and a target field",
                    mapping.note_type
                )));
            }
            if mapping.source_field == mapping.target_field {
                return Err(DomainError::Validation(format!(
                    "note type '{}' uses '{}' as both source and target",
                    mapping.note_type, mapping.source_field
                )));
            }
            if !seen.insert(mapping.note_type.as_str()) {
                return Err(DomainError::Validation(format!(
                    "note type '{}' is mapped more than once",
                    mapping.note_type
                )));
            }
        }

        Ok(())
    }

    /// Note type name to mapping lookup.
    pub fn mapping_table(&self) -> HashMap<String, NoteTypeMapping> {
        self.note_types
            .iter()
            .map(|m| (m.note_type.clone(), m.clone()))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mapping(note_type: &str, src: &str, tgt: &str) -> NoteTypeMapping {
        NoteTypeMapping {
            note_type: note_type.to_string(),
            source_field: src.to_string(),
            target_field: tgt.to_string(),
        }
    }

    #[test]
    fn test_defaults_are_valid() {
        let config = AppConfig::new();
        assert!(config.validate().is_ok());
        assert_eq!(config.processing.voice_name, "Zephyr");
        assert_eq!(config.processing.retry_attempts, 3);
        assert!(!config.processing.sticky_fallback);
    }

    #[test]
    fn test_temperature_out_of_range() {
        let mut config = AppConfig::new();
        config.processing.temperature = 2.5;
        assert!(matches!(config.validate(), Err(DomainError::Validation(_))));

        config.processing.temperature = 2.0;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_duplicate_note_type_rejected() {
        let mut config = AppConfig::new();
        config.note_types = vec![
            mapping("Basic", "Front", "Audio"),
            mapping("Basic", "Back", "Audio"),
        ];
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_same_source_and_target_rejected() {
        let mut config = AppConfig::new();
        config.note_types = vec![mapping("Basic", "Front", "Front")];
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_fallback_model_requires_enabled_and_non_empty() {
        let mut p = ProcessingConfig::default();
        assert_eq!(p.fallback_model(), Some("gemini-2.5-flash-preview-tts"));

        p.fallback_enabled = false;
        assert_eq!(p.fallback_model(), None);

        p.fallback_enabled = true;
        p.fallback_model = Some("  ".to_string());
        assert_eq!(p.fallback_model(), None);
    }

    #[test]
    fn test_api_key_debug_is_redacted() {
        let key = ApiKey::new("secret-value");
        assert_eq!(format!("{:?}", key), "ApiKey(***)");
        assert_eq!(key.expose(), "secret-value");
    }

    #[test]
    fn test_mapping_table() {
        let mut config = AppConfig::new();
        config.note_types = vec![mapping("Basic", "Front", "Audio")];
        let table = config.mapping_table();
        assert_eq!(table["Basic"].target_field, "Audio");
    }

    #[test]
    fn test_toml_document_shape() {
        let doc = r#"
            [processing]
            api_key = "abc"
            voice_name = "Puck"
            retry_attempts = 5

            [[note_types]]
            note_type = "Basic"
            source_field = "Front"
            target_field = "Audio"
        "#;
        let config: AppConfig = toml::from_str(doc).unwrap();
        assert_eq!(config.processing.api_key.expose(), "abc");
        assert_eq!(config.processing.voice_name, "Puck");
        assert_eq!(config.processing.retry_attempts, 5);
        // Unset keys keep their defaults
        assert_eq!(config.processing.retry_delay_seconds, 2);
        assert_eq!(config.note_types.len(), 1);
    }
}
