use crate::domain::{DomainError, NoteId};

/// Port onto the host's note collection.
///
/// Calls are synchronous; the batch controller uses the store from a single
/// task and never concurrently.
pub trait NoteStore: Send + Sync {
    /// Name of the note's type.
    ///
    /// Returns `DomainError::NoteNotFound` when the note no longer exists.
    fn note_type(&self, note_id: NoteId) -> Result<String, DomainError>;

    /// Content of a field, or `None` if the note type has no such field.
    fn field(&self, note_id: NoteId, field: &str) -> Result<Option<String>, DomainError>;

    /// Overwrite a field's content.
    fn set_field(&self, note_id: NoteId, field: &str, value: &str) -> Result<(), DomainError>;
}

/// Port for persisting generated audio files where the host can play them.
pub trait MediaStore: Send + Sync {
    /// Store `data` under `filename`, replacing any previous file.
    fn write_media(&self, filename: &str, data: &[u8]) -> Result<(), DomainError>;

    /// Delete a file written by this run. Removing a missing file succeeds.
    fn remove_media(&self, filename: &str) -> Result<(), DomainError>;
}
