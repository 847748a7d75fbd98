//! Batch text-to-speech for flashcard notes.
//!
//! A host hands over a selection of note ids together with access to its
//! note collection ([`ports::NoteStore`]) and media folder
//! ([`ports::MediaStore`]). Each note's source field is spoken by the Gemini
//! TTS API and the resulting `[sound:...]` reference is written to its
//! target field.
//!
//! ```no_run
//! use std::sync::Arc;
//! use gemini_tts_batch::adapters::{DirMediaStore, MemoryNoteStore};
//! use gemini_tts_batch::app::AppController;
//! use gemini_tts_batch::domain::NoteId;
//!
//! # async fn demo() -> Result<(), gemini_tts_batch::domain::DomainError> {
//! let controller = AppController::new()?;
//! let notes = Arc::new(MemoryNoteStore::new());
//! notes.insert(NoteId(1), "Basic", [("Front", "Buenos días"), ("Audio", "")]);
//! let media = Arc::new(DirMediaStore::new(controller.media_dir())?);
//!
//! let runner = controller.start_batch(vec![NoteId(1)], notes, media)?;
//! let report = runner
//!     .run(|p| println!("{}/{} note {}", p.current, p.total, p.note_id))
//!     .await;
//! println!("{}", report.summary());
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]

pub mod adapters;
pub mod app;
pub mod domain;
pub mod infrastructure;
pub mod ports;

pub use app::{AppController, BatchRunner, CancelHandle, TtsClient};
pub use domain::{
    AppConfig, BatchOutcome, BatchProgress, BatchReport, BatchResult, DomainError, NoteId,
    ProcessingConfig, SynthesisError,
};
