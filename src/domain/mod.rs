pub mod audio;
pub mod batch;
pub mod config;
pub mod error;
pub mod media;

pub use audio::{AudioClip, PcmFormat};
pub use batch::{
    BatchItem, BatchOutcome, BatchProgress, BatchReport, BatchResult, FailureReason, NoteId,
    SkipReason,
};
pub use config::{ApiConfig, ApiKey, AppConfig, LoggingConfig, NoteTypeMapping, ProcessingConfig};
pub use error::{DomainError, SynthesisError};
