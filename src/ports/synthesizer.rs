use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::domain::{AudioClip, SynthesisError};

/// Parameters of a single synthesis call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SynthesisRequest {
    pub text: String,
    pub model: String,
    pub voice_name: String,
    pub temperature: f32,
}

/// Port for the cloud text-to-speech service.
///
/// One call is one request/response exchange. Implementations classify
/// failures but never retry; retry and fallback live in the TTS client.
#[async_trait]
pub trait SpeechSynthesizer: Send + Sync {
    async fn synthesize(&self, request: &SynthesisRequest) -> Result<AudioClip, SynthesisError>;

    /// Backend name for logs.
    fn name(&self) -> &str;
}
