use std::sync::Arc;

use parking_lot::RwLock;
use tracing::info;
use tracing_appender::non_blocking::WorkerGuard;

use crate::adapters::{GeminiSynthesizer, TomlConfigStore};
use crate::app::BatchRunner;
use crate::domain::{AppConfig, DomainError, NoteId};
use crate::infrastructure::init_logging;
use crate::ports::{ConfigStore, MediaStore, NoteStore, SpeechSynthesizer};

/// Entry point for a host: owns settings and starts batch runs.
pub struct AppController {
    config: RwLock<AppConfig>,
    config_store: Arc<dyn ConfigStore>,
    _log_guard: Option<WorkerGuard>,
}

impl AppController {
    /// Load settings from the default location and set up logging.
    pub fn new() -> Result<Self, DomainError> {
        let config_store = Arc::new(TomlConfigStore::new()?);
        let config = config_store.load()?;

        let log_guard = init_logging(
            &config_store.logs_dir(),
            &config.logging.level,
            config.logging.file_logging,
            config.logging.max_files,
        )?;

        info!(
            note_types = config.note_types.len(),
            primary_model = %config.processing.primary_model,
            "AppController initialized"
        );

        Ok(Self {
            config: RwLock::new(config),
            config_store,
            _log_guard: log_guard,
        })
    }

    /// Use an explicit settings store. Logging is left to the host.
    pub fn with_store(config_store: Arc<dyn ConfigStore>) -> Result<Self, DomainError> {
        let config = config_store.load()?;
        Ok(Self {
            config: RwLock::new(config),
            config_store,
            _log_guard: None,
        })
    }

    /// Get the current configuration.
    pub fn config(&self) -> AppConfig {
        self.config.read().clone()
    }

    /// Validate, persist and apply new settings. Runs already started keep
    /// the settings they were started with.
    pub fn update_config(&self, config: AppConfig) -> Result<(), DomainError> {
        self.config_store.save(&config)?;
        *self.config.write() = config;

        info!("Configuration updated");
        Ok(())
    }

    pub fn config_path(&self) -> String {
        self.config_store.config_path().to_string_lossy().to_string()
    }

    pub fn logs_dir(&self) -> String {
        self.config_store.logs_dir().to_string_lossy().to_string()
    }

    pub fn media_dir(&self) -> String {
        self.config_store.media_dir().to_string_lossy().to_string()
    }

    /// Start a batch against the Gemini API for the selected notes.
    pub fn start_batch(
        &self,
        note_ids: Vec<NoteId>,
        notes: Arc<dyn NoteStore>,
        media: Arc<dyn MediaStore>,
    ) -> Result<BatchRunner, DomainError> {
        let config = self.config();
        if config.processing.api_key.is_empty() {
            return Err(DomainError::Config(
                "Gemini API key is not configured".to_string(),
            ));
        }

        let synthesizer = GeminiSynthesizer::new(config.processing.api_key.clone(), &config.api)?;
        self.start_batch_with(Arc::new(synthesizer), note_ids, notes, media)
    }

    /// Start a batch with a caller-provided speech backend.
    pub fn start_batch_with(
        &self,
        synthesizer: Arc<dyn SpeechSynthesizer>,
        note_ids: Vec<NoteId>,
        notes: Arc<dyn NoteStore>,
        media: Arc<dyn MediaStore>,
    ) -> Result<BatchRunner, DomainError> {
        let config = self.config();
        if note_ids.is_empty() {
            return Err(DomainError::Config("No notes selected".to_string()));
        }
        if config.note_types.is_empty() {
            return Err(DomainError::Config(
                "No note types are mapped to source and target fields".to_string(),
            ));
        }

        info!(
            notes = note_ids.len(),
            backend = synthesizer.name(),
            voice = %config.processing.voice_name,
            "Starting batch"
        );

        Ok(BatchRunner::new(
            Arc::new(config.processing.clone()),
            config.mapping_table(),
            note_ids,
            notes,
            media,
            synthesizer,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::{MemoryMediaStore, MemoryNoteStore};
    use crate::app::test_support::ScriptedSynthesizer;
    use crate::domain::{ApiKey, NoteTypeMapping};
    use std::env;
    use std::fs;
    use std::path::PathBuf;

    fn controller(name: &str) -> (AppController, PathBuf) {
        let dir = env::temp_dir().join(name);
        let _ = fs::remove_dir_all(&dir);
        let store = Arc::new(TomlConfigStore::with_data_dir(&dir).unwrap());
        (AppController::with_store(store).unwrap(), dir)
    }

    fn mapped_config() -> AppConfig {
        let mut config = AppConfig::new();
        config.note_types.push(NoteTypeMapping {
            note_type: "Basic".to_string(),
            source_field: "Front".to_string(),
            target_field: "Audio".to_string(),
        });
        config
    }

    #[test]
    fn test_update_config_persists() {
        let (ctl, dir) = controller("gemini_tts_batch_ctl_update_test");

        let mut config = mapped_config();
        config.processing.voice_name = "Kore".to_string();
        ctl.update_config(config).unwrap();
        assert_eq!(ctl.config().processing.voice_name, "Kore");

        let store = Arc::new(TomlConfigStore::with_data_dir(&dir).unwrap());
        let reloaded = AppController::with_store(store).unwrap();
        assert_eq!(reloaded.config().processing.voice_name, "Kore");
        assert_eq!(reloaded.config().note_types.len(), 1);

        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_update_config_rejects_invalid() {
        let (ctl, dir) = controller("gemini_tts_batch_ctl_invalid_test");

        let mut config = AppConfig::new();
        config.processing.temperature = 3.0;
        assert!(ctl.update_config(config).is_err());
        assert_eq!(ctl.config().processing.temperature, 1.0);

        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_start_batch_requires_api_key() {
        let (ctl, dir) = controller("gemini_tts_batch_ctl_key_test");
        ctl.update_config(mapped_config()).unwrap();

        let result = ctl.start_batch(
            vec![NoteId(1)],
            Arc::new(MemoryNoteStore::new()),
            Arc::new(MemoryMediaStore::new()),
        );
        assert!(matches!(result, Err(DomainError::Config(_))));

        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_start_batch_builds_gemini_runner() {
        let (ctl, dir) = controller("gemini_tts_batch_ctl_gemini_test");
        let mut config = mapped_config();
        config.processing.api_key = ApiKey::new("test-key");
        ctl.update_config(config).unwrap();

        let runner = ctl
            .start_batch(
                vec![NoteId(1), NoteId(2)],
                Arc::new(MemoryNoteStore::new()),
                Arc::new(MemoryMediaStore::new()),
            )
            .unwrap();
        assert_eq!(runner.total(), 2);

        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_start_batch_requires_mappings_and_selection() {
        let (ctl, dir) = controller("gemini_tts_batch_ctl_mapping_test");
        let synth: Arc<dyn SpeechSynthesizer> = Arc::new(ScriptedSynthesizer::new());

        let no_mappings = ctl.start_batch_with(
            synth.clone(),
            vec![NoteId(1)],
            Arc::new(MemoryNoteStore::new()),
            Arc::new(MemoryMediaStore::new()),
        );
        assert!(no_mappings.is_err());

        ctl.update_config(mapped_config()).unwrap();
        let no_notes = ctl.start_batch_with(
            synth,
            Vec::new(),
            Arc::new(MemoryNoteStore::new()),
            Arc::new(MemoryMediaStore::new()),
        );
        assert!(no_notes.is_err());

        let _ = fs::remove_dir_all(&dir);
    }

    #[tokio::test(start_paused = true)]
    async fn test_batch_uses_config_snapshot() {
        let (ctl, dir) = controller("gemini_tts_batch_ctl_run_test");
        ctl.update_config(mapped_config()).unwrap();

        let notes = Arc::new(MemoryNoteStore::new());
        notes.insert(NoteId(7), "Basic", [("Front", "hola"), ("Audio", "")]);
        let synth = Arc::new(ScriptedSynthesizer::new());

        let runner = ctl
            .start_batch_with(
                synth.clone(),
                vec![NoteId(7)],
                notes.clone(),
                Arc::new(MemoryMediaStore::new()),
            )
            .unwrap();

        // Changing settings mid-run does not affect the started batch
        let mut changed = mapped_config();
        changed.processing.voice_name = "Puck".to_string();
        ctl.update_config(changed).unwrap();

        let report = runner.run(|_| {}).await;
        assert_eq!(report.succeeded(), 1);
        assert_eq!(synth.voices(), vec!["Zephyr"]);
        assert!(notes.fields(NoteId(7)).unwrap()["Audio"].starts_with("[sound:gemini_tts_7_"));

        let _ = fs::remove_dir_all(&dir);
    }
}
