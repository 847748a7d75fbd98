use std::fmt;

use serde::{Deserialize, Serialize};

use crate::domain::SynthesisError;

/// Host note identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NoteId(pub i64);

impl fmt::Display for NoteId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<i64> for NoteId {
    fn from(id: i64) -> Self {
        NoteId(id)
    }
}

/// A note resolved for synthesis. Only lives for the duration of one step.
#[derive(Debug, Clone)]
pub struct BatchItem {
    pub note_id: NoteId,
    /// Source text with markup removed.
    pub source_text: String,
    pub current_target: String,
}

/// Why a note was left untouched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    /// Target field is non-blank and `skip_existing_audio` is on.
    ExistingAudio,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::ExistingAudio => f.write_str("target field already has content"),
        }
    }
}

/// Why a note could not be processed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureReason {
    /// The note's type has no configured field mapping.
    NoMapping,
    /// Source field is blank once markup is removed.
    EmptySource,
    /// The note disappeared from the host before it was processed.
    NoteNotFound,
    /// The note type lacks the named mapped field.
    FieldMissing(String),
    /// Terminal error from the TTS client after retries and fallback.
    Synthesis(SynthesisError),
    /// Writing the audio file or the target field failed.
    Storage(String),
}

impl fmt::Display for FailureReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureReason::NoMapping => f.write_str("no mapping"),
            FailureReason::EmptySource => f.write_str("empty source"),
            FailureReason::NoteNotFound => f.write_str("note not found"),
            FailureReason::FieldMissing(field) => write!(f, "field '{}' missing", field),
            FailureReason::Synthesis(err) => write!(f, "{}: {}", err.class(), err),
            FailureReason::Storage(msg) => write!(f, "storage error: {}", msg),
        }
    }
}

/// Result of processing one note.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BatchOutcome {
    /// Audio was stored and the target field now references it.
    Success {
        /// The `[sound:...]` token written to the target field.
        audio_reference: String,
        /// Model that produced the audio.
        model: String,
    },
    /// Nothing was written and no API call was made.
    Skipped { reason: SkipReason },
    /// The note was left unchanged.
    Failed { reason: FailureReason },
}

impl BatchOutcome {
    #[must_use]
    pub fn is_success(&self) -> bool {
        matches!(self, BatchOutcome::Success { .. })
    }

    #[must_use]
    pub fn is_skipped(&self) -> bool {
        matches!(self, BatchOutcome::Skipped { .. })
    }

    #[must_use]
    pub fn is_failed(&self) -> bool {
        matches!(self, BatchOutcome::Failed { .. })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchResult {
    pub note_id: NoteId,
    pub outcome: BatchOutcome,
}

/// Progress after one processed note.
#[derive(Debug, Clone)]
pub struct BatchProgress {
    /// 1-based position of the note just processed.
    pub current: usize,
    pub total: usize,
    pub note_id: NoteId,
    pub outcome: BatchOutcome,
}

/// Everything a run produced, in input order.
#[derive(Debug, Clone)]
pub struct BatchReport {
    pub results: Vec<BatchResult>,
    /// Number of notes selected for the run.
    pub total: usize,
    /// The run was stopped by the user, either between notes or while a
    /// note was waiting to retry.
    pub cancelled: bool,
}

impl BatchReport {
    pub fn succeeded(&self) -> usize {
        self.results.iter().filter(|r| r.outcome.is_success()).count()
    }

    pub fn skipped(&self) -> usize {
        self.results.iter().filter(|r| r.outcome.is_skipped()).count()
    }

    pub fn failed(&self) -> usize {
        self.results.iter().filter(|r| r.outcome.is_failed()).count()
    }

    /// Human-readable run log listing skipped and failed notes, then totals.
    pub fn summary(&self) -> String {
        let mut lines = Vec::new();

        for result in &self.results {
            match &result.outcome {
                BatchOutcome::Skipped { reason } => {
                    lines.push(format!("Note {}: Skipped ({})", result.note_id, reason));
                }
                BatchOutcome::Failed { reason } => {
                    lines.push(format!("Note {}: Failed ({})", result.note_id, reason));
                }
                BatchOutcome::Success { .. } => {}
            }
        }

        if self.cancelled {
            lines.push(format!(
                "Cancelled after {} of {} notes",
                self.results.len(),
                self.total
            ));
        } else {
            lines.push("Processing complete".to_string());
        }
        lines.push(format!(
            "Total: {} | Success: {} | Skipped: {} | Failed: {}",
            self.total,
            self.succeeded(),
            self.skipped(),
            self.failed()
        ));

        lines.join("\n")
    }
}
