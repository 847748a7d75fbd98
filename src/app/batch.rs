use std::collections::HashMap;
use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::app::tts_client::TtsClient;
use crate::domain::media::{audio_filename, clean_source_text, sound_tag};
use crate::domain::{
    BatchItem, BatchOutcome, BatchProgress, BatchReport, BatchResult, DomainError,
    FailureReason, NoteId, NoteTypeMapping, ProcessingConfig, SkipReason, SynthesisError,
};
use crate::ports::{MediaStore, NoteStore, SpeechSynthesizer};

/// Cloneable handle that asks a running batch to stop.
///
/// The batch stops before the next note; a note already in progress
/// finishes its current request.
#[derive(Debug, Clone)]
pub struct CancelHandle(CancellationToken);

impl CancelHandle {
    pub fn cancel(&self) {
        self.0.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.is_cancelled()
    }
}

/// Outcome of resolving a note before any network call.
enum Prepared {
    Ready { item: BatchItem, target_field: String },
    Done(BatchOutcome),
}

/// Sequential batch controller.
///
/// Hosts either pull one note at a time with [`BatchRunner::step`] or hand
/// control over with [`BatchRunner::run`]. Results keep input order and
/// every processed note produces exactly one [`BatchResult`].
pub struct BatchRunner {
    config: Arc<ProcessingConfig>,
    mappings: HashMap<String, NoteTypeMapping>,
    note_ids: Vec<NoteId>,
    position: usize,
    notes: Arc<dyn NoteStore>,
    media: Arc<dyn MediaStore>,
    client: TtsClient,
    results: Vec<BatchResult>,
    cancel: CancellationToken,
}

impl BatchRunner {
    pub fn new(
        config: Arc<ProcessingConfig>,
        mappings: HashMap<String, NoteTypeMapping>,
        note_ids: Vec<NoteId>,
        notes: Arc<dyn NoteStore>,
        media: Arc<dyn MediaStore>,
        synthesizer: Arc<dyn SpeechSynthesizer>,
    ) -> Self {
        let client = TtsClient::new(synthesizer, &config);
        Self {
            results: Vec::with_capacity(note_ids.len()),
            config,
            mappings,
            note_ids,
            position: 0,
            notes,
            media,
            client,
            cancel: CancellationToken::new(),
        }
    }

    pub fn cancel_handle(&self) -> CancelHandle {
        CancelHandle(self.cancel.clone())
    }

    pub fn total(&self) -> usize {
        self.note_ids.len()
    }

    pub fn processed(&self) -> usize {
        self.results.len()
    }

    pub fn results(&self) -> &[BatchResult] {
        &self.results
    }

    pub fn is_finished(&self) -> bool {
        self.position >= self.note_ids.len() || self.cancel.is_cancelled()
    }

    /// Process the next note.
    ///
    /// Returns `None` once every note is done or the batch was cancelled.
    pub async fn step(&mut self) -> Option<BatchProgress> {
        if self.is_finished() {
            return None;
        }

        let note_id = self.note_ids[self.position];
        self.position += 1;

        let outcome = self.process(note_id).await;
        log_outcome(note_id, &outcome);

        self.results.push(BatchResult {
            note_id,
            outcome: outcome.clone(),
        });

        Some(BatchProgress {
            current: self.position,
            total: self.note_ids.len(),
            note_id,
            outcome,
        })
    }

    /// Drive the batch to completion, reporting progress after every note.
    pub async fn run<F>(mut self, mut on_progress: F) -> BatchReport
    where
        F: FnMut(&BatchProgress),
    {
        info!(total = self.total(), "Batch started");
        while let Some(progress) = self.step().await {
            on_progress(&progress);
        }
        self.finish()
    }

    /// Consume the runner and return what it produced so far.
    pub fn finish(self) -> BatchReport {
        let interrupted = self.results.iter().any(|r| {
            matches!(
                r.outcome,
                BatchOutcome::Failed {
                    reason: FailureReason::Synthesis(SynthesisError::Cancelled)
                }
            )
        });
        let cancelled = self.cancel.is_cancelled()
            && (interrupted || self.results.len() < self.note_ids.len());
        let report = BatchReport {
            total: self.note_ids.len(),
            results: self.results,
            cancelled,
        };
        info!(
            total = report.total,
            succeeded = report.succeeded(),
            skipped = report.skipped(),
            failed = report.failed(),
            cancelled = report.cancelled,
            "Batch finished"
        );
        report
    }

    async fn process(&mut self, note_id: NoteId) -> BatchOutcome {
        let (item, target_field) = match self.prepare(note_id) {
            Ok(Prepared::Ready { item, target_field }) => (item, target_field),
            Ok(Prepared::Done(outcome)) => return outcome,
            Err(err) => return failed(storage_reason(err)),
        };

        self.client.begin_note();
        let synthesized = match self.client.synthesize(&item.source_text, &self.cancel).await {
            Ok(s) => s,
            Err(err) => return failed(FailureReason::Synthesis(err)),
        };

        let filename = audio_filename(note_id, chrono::Utc::now().timestamp_millis());
        let wav = synthesized.audio.into_wav();
        if let Err(err) = self.media.write_media(&filename, &wav) {
            return failed(storage_reason(err));
        }

        let audio_reference = sound_tag(&filename);
        if let Err(err) = self.notes.set_field(note_id, &target_field, &audio_reference) {
            // Nothing references the file now.
            if let Err(cleanup) = self.media.remove_media(&filename) {
                warn!(
                    note_id = %note_id,
                    file = %filename,
                    error = %cleanup,
                    "Could not remove orphaned audio"
                );
            }
            return failed(storage_reason(err));
        }

        BatchOutcome::Success {
            audio_reference,
            model: synthesized.model,
        }
    }

    /// Resolve mapping and field contents and apply the skip rules.
    fn prepare(&self, note_id: NoteId) -> Result<Prepared, DomainError> {
        let note_type = self.notes.note_type(note_id)?;
        let Some(mapping) = self.mappings.get(&note_type) else {
            return Ok(Prepared::Done(failed(FailureReason::NoMapping)));
        };

        let Some(raw_source) = self.notes.field(note_id, &mapping.source_field)? else {
            return Ok(Prepared::Done(failed(FailureReason::FieldMissing(
                mapping.source_field.clone(),
            ))));
        };
        let source_text = clean_source_text(&raw_source);
        if source_text.is_empty() {
            return Ok(Prepared::Done(failed(FailureReason::EmptySource)));
        }

        let Some(current_target) = self.notes.field(note_id, &mapping.target_field)? else {
            return Ok(Prepared::Done(failed(FailureReason::FieldMissing(
                mapping.target_field.clone(),
            ))));
        };
        if self.config.skip_existing_audio && !current_target.trim().is_empty() {
            return Ok(Prepared::Done(BatchOutcome::Skipped {
                reason: SkipReason::ExistingAudio,
            }));
        }

        Ok(Prepared::Ready {
            item: BatchItem {
                note_id,
                source_text,
                current_target,
            },
            target_field: mapping.target_field.clone(),
        })
    }
}

fn failed(reason: FailureReason) -> BatchOutcome {
    BatchOutcome::Failed { reason }
}

fn storage_reason(err: DomainError) -> FailureReason {
    match err {
        DomainError::NoteNotFound(_) => FailureReason::NoteNotFound,
        DomainError::FieldMissing { field, .. } => FailureReason::FieldMissing(field),
        other => FailureReason::Storage(other.to_string()),
    }
}

fn log_outcome(note_id: NoteId, outcome: &BatchOutcome) {
    match outcome {
        BatchOutcome::Success {
            audio_reference,
            model,
        } => info!(note_id = %note_id, model = %model, audio = %audio_reference, "Note processed"),
        BatchOutcome::Skipped { reason } => {
            info!(note_id = %note_id, reason = %reason, "Note skipped")
        }
        BatchOutcome::Failed { reason } => {
            warn!(note_id = %note_id, reason = %reason, "Note failed")
        }
    }
}
