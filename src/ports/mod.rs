pub mod config;
pub mod notes;
pub mod synthesizer;

pub use config::ConfigStore;
pub use notes::{MediaStore, NoteStore};
pub use synthesizer::{SpeechSynthesizer, SynthesisRequest};
