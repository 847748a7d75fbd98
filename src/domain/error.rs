use thiserror::Error;

use crate::domain::batch::NoteId;

/// Domain-level errors for gemini-tts-batch.
#[derive(Error, Debug)]
pub enum DomainError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid configuration: {0}")]
    Validation(String),

    #[error("HTTP request failed: {0}")]
    HttpRequest(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("IO error: {0}")]
    Io(String),

    #[error("Note not found: {0}")]
    NoteNotFound(NoteId),

    #[error("Note {note_id} has no field '{field}'")]
    FieldMissing { note_id: NoteId, field: String },

    #[error("Storage error: {0}")]
    Storage(String),
}

impl From<std::io::Error> for DomainError {
    fn from(err: std::io::Error) -> Self {
        DomainError::Io(err.to_string())
    }
}

impl From<toml::de::Error> for DomainError {
    fn from(err: toml::de::Error) -> Self {
        DomainError::Config(err.to_string())
    }
}

impl From<toml::ser::Error> for DomainError {
    fn from(err: toml::ser::Error) -> Self {
        DomainError::Serialization(err.to_string())
    }
}

impl From<serde_json::Error> for DomainError {
    fn from(err: serde_json::Error) -> Self {
        DomainError::Serialization(err.to_string())
    }
}

/// Classification of a single speech synthesis call.
///
/// Rate-limit, server and network failures are recoverable through the
/// fallback switch or backoff retry. Everything else ends processing of
/// the current note.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SynthesisError {
    #[error("Rate limited: {0}")]
    RateLimited(String),

    #[error("Server error (HTTP {status}): {message}")]
    Server { status: u16, message: String },

    #[error("Network error: {0}")]
    Network(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Authentication failed: {0}")]
    Auth(String),

    #[error("No audio in response")]
    NoAudio,

    #[error("Cancelled while waiting to retry")]
    Cancelled,
}

impl SynthesisError {
    /// Whether the standard backoff policy applies to this error.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            SynthesisError::RateLimited(_)
                | SynthesisError::Server { .. }
                | SynthesisError::Network(_)
        )
    }

    pub fn is_rate_limited(&self) -> bool {
        matches!(self, SynthesisError::RateLimited(_))
    }

    /// Short stable label used in logs and run summaries.
    pub fn class(&self) -> &'static str {
        match self {
            SynthesisError::RateLimited(_) => "rate-limited",
            SynthesisError::Server { .. } => "server-error",
            SynthesisError::Network(_) => "network-error",
            SynthesisError::InvalidInput(_) => "invalid-input",
            SynthesisError::Auth(_) => "auth-error",
            SynthesisError::NoAudio => "no-audio",
            SynthesisError::Cancelled => "cancelled",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retryable_classes() {
        assert!(SynthesisError::RateLimited("quota".into()).is_retryable());
        assert!(SynthesisError::Server {
            status: 503,
            message: "unavailable".into()
        }
        .is_retryable());
        assert!(SynthesisError::Network("timeout".into()).is_retryable());

        assert!(!SynthesisError::InvalidInput("bad".into()).is_retryable());
        assert!(!SynthesisError::Auth("key".into()).is_retryable());
        assert!(!SynthesisError::NoAudio.is_retryable());
        assert!(!SynthesisError::Cancelled.is_retryable());
    }

    #[test]
    fn test_class_labels() {
        assert_eq!(SynthesisError::RateLimited(String::new()).class(), "rate-limited");
        assert_eq!(SynthesisError::Auth(String::new()).class(), "auth-error");
        assert_eq!(
            SynthesisError::Server {
                status: 500,
                message: String::new()
            }
            .class(),
            "server-error"
        );
    }
}
