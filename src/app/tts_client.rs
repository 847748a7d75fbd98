//! Retry and model-fallback policy around a [`SpeechSynthesizer`].
//!
//! A call starts on the primary model. The first rate-limit response while
//! on the primary switches to the fallback model (when one is enabled) and
//! retries immediately without using up a retry. After that, rate-limit,
//! server and network errors back off exponentially:
//! `retry_delay_seconds * 2^n` before retry `n` (0-based), for at most
//! `retry_attempts` retries. Other errors end the call at once.

use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::domain::{AudioClip, ProcessingConfig, SynthesisError};
use crate::ports::{SpeechSynthesizer, SynthesisRequest};

/// Which model the client is currently calling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModelState {
    Primary,
    Fallback,
}

/// Primary/fallback state machine. Switches at most once until reset.
#[derive(Debug, Clone)]
pub struct ModelSelector {
    primary: String,
    fallback: Option<String>,
    state: ModelState,
}

impl ModelSelector {
    pub fn new(primary: impl Into<String>, fallback: Option<String>) -> Self {
        Self {
            primary: primary.into(),
            fallback,
            state: ModelState::Primary,
        }
    }

    pub fn state(&self) -> ModelState {
        self.state
    }

    pub fn current(&self) -> &str {
        match (self.state, &self.fallback) {
            (ModelState::Fallback, Some(fallback)) => fallback,
            _ => &self.primary,
        }
    }

    /// Move to the fallback model. Returns false when already there or
    /// when no fallback is available.
    pub fn switch_to_fallback(&mut self) -> bool {
        if self.state == ModelState::Fallback || self.fallback.is_none() {
            return false;
        }
        self.state = ModelState::Fallback;
        true
    }

    pub fn reset(&mut self) {
        self.state = ModelState::Primary;
    }
}

/// Exponential backoff schedule.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub base_delay: Duration,
}

impl RetryPolicy {
    pub fn new(max_retries: u32, base_delay: Duration) -> Self {
        Self {
            max_retries,
            base_delay,
        }
    }

    /// Wait before the retry with 0-based index `retry`.
    pub fn backoff(&self, retry: u32) -> Duration {
        let factor = 1u32.checked_shl(retry).unwrap_or(u32::MAX);
        self.base_delay.saturating_mul(factor)
    }
}

/// Audio plus the details of how it was obtained.
#[derive(Debug, Clone)]
pub struct Synthesized {
    pub audio: AudioClip,
    pub model: String,
    /// Total requests sent, including the successful one.
    pub attempts: u32,
}

/// Client that applies fallback and retry policy to a synthesizer.
pub struct TtsClient {
    synthesizer: Arc<dyn SpeechSynthesizer>,
    selector: ModelSelector,
    retry: RetryPolicy,
    voice_name: String,
    temperature: f32,
    sticky_fallback: bool,
}

impl TtsClient {
    pub fn new(synthesizer: Arc<dyn SpeechSynthesizer>, config: &ProcessingConfig) -> Self {
        Self {
            synthesizer,
            selector: ModelSelector::new(
                config.primary_model.clone(),
                config.fallback_model().map(str::to_string),
            ),
            retry: RetryPolicy::new(
                config.retry_attempts,
                Duration::from_secs(config.retry_delay_seconds),
            ),
            voice_name: config.voice_name.clone(),
            temperature: config.temperature,
            sticky_fallback: config.sticky_fallback,
        }
    }

    /// Prepare for a new note. The model choice goes back to primary unless
    /// fallback is sticky for the run.
    pub fn begin_note(&mut self) {
        if !self.sticky_fallback {
            self.selector.reset();
        }
    }

    pub fn model_state(&self) -> ModelState {
        self.selector.state()
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        self.retry
    }

    /// Synthesize `text`, applying fallback and backoff.
    ///
    /// A backoff wait ends early with [`SynthesisError::Cancelled`] when
    /// `cancel` fires; an in-flight request is always allowed to finish.
    pub async fn synthesize(
        &mut self,
        text: &str,
        cancel: &CancellationToken,
    ) -> Result<Synthesized, SynthesisError> {
        let mut retries_used = 0u32;
        let mut attempts = 0u32;

        loop {
            let request = SynthesisRequest {
                text: text.to_string(),
                model: self.selector.current().to_string(),
                voice_name: self.voice_name.clone(),
                temperature: self.temperature,
            };

            attempts += 1;
            debug!(model = %request.model, attempt = attempts, "Requesting speech");

            let err = match self.synthesizer.synthesize(&request).await {
                Ok(audio) => {
                    return Ok(Synthesized {
                        audio,
                        model: request.model,
                        attempts,
                    })
                }
                Err(err) => err,
            };

            if err.is_rate_limited() && self.selector.switch_to_fallback() {
                warn!(
                    from = %request.model,
                    to = %self.selector.current(),
                    "Rate limited, switching to fallback model"
                );
                continue;
            }

            if !err.is_retryable() || retries_used >= self.retry.max_retries {
                return Err(err);
            }

            let delay = self.retry.backoff(retries_used);
            retries_used += 1;
            warn!(
                error = %err,
                retry = retries_used,
                max_retries = self.retry.max_retries,
                delay_ms = delay.as_millis() as u64,
                "Retrying speech request"
            );

            tokio::select! {
                _ = cancel.cancelled() => return Err(SynthesisError::Cancelled),
                _ = tokio::time::sleep(delay) => {}
            }
        }
    }
}
