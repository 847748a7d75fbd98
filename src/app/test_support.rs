use std::collections::VecDeque;

use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::time::Instant;

use crate::domain::{AudioClip, SynthesisError};
use crate::ports::{SpeechSynthesizer, SynthesisRequest};

/// Synthesizer that replays scripted responses and records every call.
/// Once the script runs out, every call succeeds.
#[derive(Default)]
pub(crate) struct ScriptedSynthesizer {
    script: Mutex<VecDeque<Result<AudioClip, SynthesisError>>>,
    calls: Mutex<Vec<(SynthesisRequest, Instant)>>,
}

impl ScriptedSynthesizer {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn with_script<I>(responses: I) -> Self
    where
        I: IntoIterator<Item = Result<AudioClip, SynthesisError>>,
    {
        Self {
            script: Mutex::new(responses.into_iter().collect()),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub(crate) fn push(&self, response: Result<AudioClip, SynthesisError>) {
        self.script.lock().push_back(response);
    }

    pub(crate) fn call_count(&self) -> usize {
        self.calls.lock().len()
    }

    pub(crate) fn models(&self) -> Vec<String> {
        self.calls.lock().iter().map(|(r, _)| r.model.clone()).collect()
    }

    pub(crate) fn voices(&self) -> Vec<String> {
        self.calls.lock().iter().map(|(r, _)| r.voice_name.clone()).collect()
    }

    pub(crate) fn texts(&self) -> Vec<String> {
        self.calls.lock().iter().map(|(r, _)| r.text.clone()).collect()
    }

    /// Time between consecutive calls.
    pub(crate) fn gaps(&self) -> Vec<std::time::Duration> {
        let calls = self.calls.lock();
        calls.windows(2).map(|w| w[1].1 - w[0].1).collect()
    }
}

pub(crate) fn pcm_clip() -> AudioClip {
    AudioClip::new(vec![0, 0, 1, 0], "audio/L16;codec=pcm;rate=24000")
}

pub(crate) fn server_error(status: u16) -> SynthesisError {
    SynthesisError::Server {
        status,
        message: "unavailable".to_string(),
    }
}

pub(crate) fn rate_limited() -> SynthesisError {
    SynthesisError::RateLimited("HTTP 429: quota".to_string())
}

#[async_trait]
impl SpeechSynthesizer for ScriptedSynthesizer {
    async fn synthesize(&self, request: &SynthesisRequest) -> Result<AudioClip, SynthesisError> {
        self.calls.lock().push((request.clone(), Instant::now()));
        self.script.lock().pop_front().unwrap_or_else(|| Ok(pcm_clip()))
    }

    fn name(&self) -> &str {
        "scripted"
    }
}
