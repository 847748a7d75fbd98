pub mod config_store;
pub mod gemini;
pub mod media_dir;
pub mod memory_store;

pub use config_store::TomlConfigStore;
pub use gemini::GeminiSynthesizer;
pub use media_dir::DirMediaStore;
pub use memory_store::{MemoryMediaStore, MemoryNoteStore};
