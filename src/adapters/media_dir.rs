use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::domain::DomainError;
use crate::ports::MediaStore;

/// Writes generated audio into a media directory on disk.
pub struct DirMediaStore {
    dir: PathBuf,
}

impl DirMediaStore {
    pub fn new(dir: impl Into<PathBuf>) -> Result<Self, DomainError> {
        let dir = dir.into();
        fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Resolve a bare file name inside the media directory.
    fn media_path(&self, filename: &str) -> Result<PathBuf, DomainError> {
        if filename.is_empty()
            || filename.contains(|c: char| c == '/' || c == '\\')
            || filename == "."
            || filename == ".."
        {
            return Err(DomainError::Storage(format!(
                "Invalid media file name '{}'",
                filename
            )));
        }
        Ok(self.dir.join(filename))
    }
}

impl MediaStore for DirMediaStore {
    fn write_media(&self, filename: &str, data: &[u8]) -> Result<(), DomainError> {
        let path = self.media_path(filename)?;

        // Write to temp file first, then rename atomically
        let temp_path = path.with_extension("part");
        fs::write(&temp_path, data)?;
        if let Err(e) = fs::rename(&temp_path, &path) {
            let _ = fs::remove_file(&temp_path);
            return Err(e.into());
        }

        debug!(path = ?path, size = data.len(), "Media file written");
        Ok(())
    }

    fn remove_media(&self, filename: &str) -> Result<(), DomainError> {
        let path = self.media_path(filename)?;
        match fs::remove_file(&path) {
            Ok(()) => {
                debug!(path = ?path, "Media file removed");
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;

    #[test]
    fn test_writes_file() {
        let dir = env::temp_dir().join("gemini_tts_batch_media_test");
        let _ = fs::remove_dir_all(&dir);

        let store = DirMediaStore::new(&dir).unwrap();
        store.write_media("gemini_tts_1_2.wav", b"RIFF").unwrap();

        assert_eq!(fs::read(dir.join("gemini_tts_1_2.wav")).unwrap(), b"RIFF");
        assert!(!dir.join("gemini_tts_1_2.part").exists());

        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_remove_media() {
        let dir = env::temp_dir().join("gemini_tts_batch_media_remove_test");
        let _ = fs::remove_dir_all(&dir);

        let store = DirMediaStore::new(&dir).unwrap();
        store.write_media("gemini_tts_1_2.wav", b"RIFF").unwrap();
        store.remove_media("gemini_tts_1_2.wav").unwrap();
        assert!(!dir.join("gemini_tts_1_2.wav").exists());

        // Already gone
        store.remove_media("gemini_tts_1_2.wav").unwrap();
        assert!(store.remove_media("../config.toml").is_err());

        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_rejects_path_traversal() {
        let dir = env::temp_dir().join("gemini_tts_batch_media_reject_test");
        let store = DirMediaStore::new(&dir).unwrap();

        assert!(matches!(
            store.write_media("../evil.wav", b"x"),
            Err(DomainError::Storage(_))
        ));
        assert!(store.write_media("", b"x").is_err());

        let _ = fs::remove_dir_all(&dir);
    }
}
