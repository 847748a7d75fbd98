use std::collections::{BTreeMap, HashMap};

use parking_lot::RwLock;

use crate::domain::{DomainError, NoteId};
use crate::ports::{MediaStore, NoteStore};

#[derive(Debug, Clone)]
struct StoredNote {
    note_type: String,
    fields: BTreeMap<String, String>,
}

/// In-process note collection.
///
/// Hosts that hand notes over as plain data stage them here, run a batch,
/// then read back the updated fields.
#[derive(Debug, Default)]
pub struct MemoryNoteStore {
    notes: RwLock<HashMap<NoteId, StoredNote>>,
}

impl MemoryNoteStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace a note.
    pub fn insert<I, K, V>(&self, note_id: NoteId, note_type: &str, fields: I)
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let note = StoredNote {
            note_type: note_type.to_string(),
            fields: fields
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        };
        self.notes.write().insert(note_id, note);
    }

    pub fn remove(&self, note_id: NoteId) -> bool {
        self.notes.write().remove(&note_id).is_some()
    }

    /// Snapshot of a note's fields.
    pub fn fields(&self, note_id: NoteId) -> Option<BTreeMap<String, String>> {
        self.notes.read().get(&note_id).map(|n| n.fields.clone())
    }

    pub fn len(&self) -> usize {
        self.notes.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.notes.read().is_empty()
    }
}

impl NoteStore for MemoryNoteStore {
    fn note_type(&self, note_id: NoteId) -> Result<String, DomainError> {
        self.notes
            .read()
            .get(&note_id)
            .map(|n| n.note_type.clone())
            .ok_or(DomainError::NoteNotFound(note_id))
    }

    fn field(&self, note_id: NoteId, field: &str) -> Result<Option<String>, DomainError> {
        let notes = self.notes.read();
        let note = notes.get(&note_id).ok_or(DomainError::NoteNotFound(note_id))?;
        Ok(note.fields.get(field).cloned())
    }

    fn set_field(&self, note_id: NoteId, field: &str, value: &str) -> Result<(), DomainError> {
        let mut notes = self.notes.write();
        let note = notes
            .get_mut(&note_id)
            .ok_or(DomainError::NoteNotFound(note_id))?;
        let slot = note
            .fields
            .get_mut(field)
            .ok_or_else(|| DomainError::FieldMissing {
                note_id,
                field: field.to_string(),
            })?;
        *slot = value.to_string();
        Ok(())
    }
}

/// Media sink that keeps written files in memory.
#[derive(Debug, Default)]
pub struct MemoryMediaStore {
    files: RwLock<BTreeMap<String, Vec<u8>>>,
}

impl MemoryMediaStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, filename: &str) -> Option<Vec<u8>> {
        self.files.read().get(filename).cloned()
    }

    pub fn filenames(&self) -> Vec<String> {
        self.files.read().keys().cloned().collect()
    }
}

impl MediaStore for MemoryMediaStore {
    fn write_media(&self, filename: &str, data: &[u8]) -> Result<(), DomainError> {
        self.files.write().insert(filename.to_string(), data.to_vec());
        Ok(())
    }

    fn remove_media(&self, filename: &str) -> Result<(), DomainError> {
        self.files.write().remove(filename);
        Ok(())
    }
}
