use std::time::Duration;

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use url::Url;

use crate::domain::{ApiConfig, ApiKey, AudioClip, DomainError, SynthesisError};
use crate::ports::{SpeechSynthesizer, SynthesisRequest};

/// Gemini `generateContent` client producing speech through the AUDIO modality.
///
/// Each call is a single HTTP exchange. Failures are classified by status
/// code; retries are the caller's concern.
pub struct GeminiSynthesizer {
    client: Client,
    base_url: Url,
    api_key: ApiKey,
}

impl GeminiSynthesizer {
    pub fn new(api_key: ApiKey, api: &ApiConfig) -> Result<Self, DomainError> {
        if api_key.is_empty() {
            return Err(DomainError::Config("Gemini API key is not set".to_string()));
        }

        // A trailing slash keeps any path prefix when joining endpoint paths
        let mut base = api.base_url.trim().to_string();
        if !base.ends_with('/') {
            base.push('/');
        }
        let base_url = Url::parse(&base)
            .map_err(|e| DomainError::Config(format!("Invalid API base URL '{}': {}", base, e)))?;

        let client = Client::builder()
            .use_rustls_tls()
            .user_agent(format!("gemini-tts-batch/{}", env!("CARGO_PKG_VERSION")))
            .timeout(Duration::from_secs(api.timeout_secs))
            .build()
            .map_err(|e| DomainError::HttpRequest(format!("Failed to create HTTP client: {}", e)))?;

        info!(base_url = %base_url, timeout_secs = api.timeout_secs, "GeminiSynthesizer initialized");

        Ok(Self {
            client,
            base_url,
            api_key,
        })
    }

    fn endpoint(&self, model: &str) -> Result<Url, SynthesisError> {
        self.base_url
            .join(&format!("v1beta/models/{}:generateContent", model))
            .map_err(|e| SynthesisError::InvalidInput(format!("Invalid model name '{}': {}", model, e)))
    }
}

#[async_trait]
impl SpeechSynthesizer for GeminiSynthesizer {
    async fn synthesize(&self, request: &SynthesisRequest) -> Result<AudioClip, SynthesisError> {
        if request.text.trim().is_empty() {
            return Err(SynthesisError::InvalidInput("text is empty".to_string()));
        }

        let url = self.endpoint(&request.model)?;
        let body = GenerateContentRequest::speech(request);

        debug!(
            model = %request.model,
            voice = %request.voice_name,
            chars = request.text.chars().count(),
            "Sending Gemini TTS request"
        );

        let response = self
            .client
            .post(url)
            .header("x-goog-api-key", self.api_key.expose())
            .json(&body)
            .send()
            .await
            .map_err(|e| SynthesisError::Network(e.to_string()))?;

        let status = response.status();
        let bytes = response
            .bytes()
            .await
            .map_err(|e| SynthesisError::Network(e.to_string()))?;

        if !status.is_success() {
            return Err(classify_status(status, &error_message(&bytes)));
        }

        let parsed: GenerateContentResponse =
            serde_json::from_slice(&bytes).map_err(|e| SynthesisError::Server {
                status: status.as_u16(),
                message: format!("Malformed response: {}", e),
            })?;

        parsed.into_audio()
    }

    fn name(&self) -> &str {
        "gemini"
    }
}

/// Map a non-success HTTP status onto the synthesis error taxonomy.
pub(crate) fn classify_status(status: StatusCode, message: &str) -> SynthesisError {
    let message = format!("HTTP {}: {}", status.as_u16(), message);
    match status {
        StatusCode::TOO_MANY_REQUESTS => SynthesisError::RateLimited(message),
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => SynthesisError::Auth(message),
        s if s.is_server_error() => SynthesisError::Server {
            status: s.as_u16(),
            message,
        },
        _ => SynthesisError::InvalidInput(message),
    }
}

/// Pull `error.message` out of a Gemini error body, falling back to the raw text.
fn error_message(body: &[u8]) -> String {
    serde_json::from_slice::<ErrorEnvelope>(body)
        .map(|e| e.error.message)
        .unwrap_or_else(|_| String::from_utf8_lossy(body).trim().to_string())
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest {
    contents: Vec<RequestContent>,
    generation_config: GenerationConfig,
}

impl GenerateContentRequest {
    fn speech(request: &SynthesisRequest) -> Self {
        Self {
            contents: vec![RequestContent {
                role: "user",
                parts: vec![TextPart {
                    text: request.text.clone(),
                }],
            }],
            generation_config: GenerationConfig {
                temperature: request.temperature,
                response_modalities: vec!["AUDIO"],
                speech_config: SpeechConfig {
                    voice_config: VoiceConfig {
                        prebuilt_voice_config: PrebuiltVoiceConfig {
                            voice_name: request.voice_name.clone(),
                        },
                    },
                },
            },
        }
    }
}

#[derive(Debug, Serialize)]
struct RequestContent {
    role: &'static str,
    parts: Vec<TextPart>,
}

#[derive(Debug, Serialize)]
struct TextPart {
    text: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    temperature: f32,
    response_modalities: Vec<&'static str>,
    speech_config: SpeechConfig,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SpeechConfig {
    voice_config: VoiceConfig,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct VoiceConfig {
    prebuilt_voice_config: PrebuiltVoiceConfig,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct PrebuiltVoiceConfig {
    voice_name: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<ResponseContent>,
}

#[derive(Debug, Deserialize)]
struct ResponseContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ResponsePart {
    inline_data: Option<InlineData>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct InlineData {
    #[serde(default)]
    mime_type: String,
    data: String,
}

impl GenerateContentResponse {
    /// Concatenate every inline audio part of the first candidate.
    fn into_audio(self) -> Result<AudioClip, SynthesisError> {
        let parts = self
            .candidates
            .into_iter()
            .next()
            .and_then(|c| c.content)
            .map(|c| c.parts)
            .unwrap_or_default();

        let mut data = Vec::new();
        let mut mime_type = None;
        for inline in parts.into_iter().filter_map(|p| p.inline_data) {
            let chunk = STANDARD.decode(inline.data.as_bytes()).map_err(|e| {
                SynthesisError::Server {
                    status: 200,
                    message: format!("Invalid audio payload: {}", e),
                }
            })?;
            data.extend_from_slice(&chunk);
            if mime_type.is_none() && !inline.mime_type.is_empty() {
                mime_type = Some(inline.mime_type);
            }
        }

        if data.is_empty() {
            return Err(SynthesisError::NoAudio);
        }

        Ok(AudioClip::new(
            data,
            mime_type.unwrap_or_else(|| "audio/L16;codec=pcm;rate=24000".to_string()),
        ))
    }
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: String,
}
