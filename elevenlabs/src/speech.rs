//! Text-to-speech service.

use std::sync::Arc;

use base64::{Engine as _, engine::general_purpose::STANDARD};
use reqwest::Method;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{
    error::{Error, Result},
    http::HttpClient,
    types::{OutputFormat, VoiceSettings},
    voice::validate_voice_id,
};

/// Default text-to-speech model.
pub const DEFAULT_MODEL: &str = "eleven_multilingual_v2";

/// Text-to-speech service.
pub struct SpeechService {
    http: Arc<HttpClient>,
}

impl SpeechService {
    pub(crate) fn new(http: Arc<HttpClient>) -> Self {
        Self { http }
    }

    /// Synthesizes speech and returns the audio with character alignment.
    ///
    /// The alignment gives the exact playback length of the generated clip,
    /// see [`SpeechResponse::duration`].
    ///
    /// # Example
    ///
    /// ```rust,ignore
    /// let request = SpeechRequest {
    ///     text: "Alice".to_string(),
    ///     voice_settings: Some(VoiceSettings::default()),
    ///     ..Default::default()
    /// };
    ///
    /// let response = client
    ///     .speech()
    ///     .synthesize_with_timestamps("voice-id", &request, OutputFormat::Mp3_44100_128)
    ///     .await?;
    /// ```
    pub async fn synthesize_with_timestamps(
        &self,
        voice_id: &str,
        request: &SpeechRequest,
        format: OutputFormat,
    ) -> Result<SpeechResponse> {
        validate_voice_id(voice_id)?;
        if request.text.trim().is_empty() {
            return Err(Error::Config("text must be non-empty".to_string()));
        }

        let mut body = request.clone();
        if body.model_id.is_empty() {
            body.model_id = DEFAULT_MODEL.to_string();
        }

        let path = format!("/v1/text-to-speech/{}/with-timestamps", voice_id);
        let api_resp: SpeechApiResponse = self
            .http
            .request(
                Method::POST,
                &path,
                &[("output_format", format.as_str())],
                Some(&body),
            )
            .await?;

        let audio = STANDARD.decode(api_resp.audio_base64.as_bytes())?;
        debug!(
            voice_id = %voice_id,
            bytes = audio.len(),
            "elevenlabs: synthesized speech"
        );

        Ok(SpeechResponse {
            audio,
            format,
            alignment: api_resp.alignment,
            normalized_alignment: api_resp.normalized_alignment,
        })
    }
}

// ==================== Request/Response Types ====================

/// Request for speech synthesis.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SpeechRequest {
    /// Text to synthesize.
    pub text: String,

    /// Model identifier, [`DEFAULT_MODEL`] when empty.
    #[serde(default)]
    pub model_id: String,

    /// Voice tuning for this request.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub voice_settings: Option<VoiceSettings>,

    /// ISO-639-1 language code to enforce.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub language_code: Option<String>,

    /// Deterministic sampling seed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seed: Option<u32>,
}

/// Character-level timing of generated audio.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Alignment {
    #[serde(default)]
    pub characters: Vec<String>,
    #[serde(default)]
    pub character_start_times_seconds: Vec<f64>,
    #[serde(default)]
    pub character_end_times_seconds: Vec<f64>,
}

impl Alignment {
    /// End time of the last character.
    pub fn end_time(&self) -> Option<f64> {
        self.character_end_times_seconds
            .iter()
            .copied()
            .filter(|t| t.is_finite())
            .reduce(f64::max)
    }
}

/// Response from speech synthesis.
#[derive(Debug, Clone)]
pub struct SpeechResponse {
    /// Decoded audio data.
    pub audio: Vec<u8>,

    /// Encoding of `audio`.
    pub format: OutputFormat,

    /// Alignment against the input text.
    pub alignment: Option<Alignment>,

    /// Alignment against the normalized text actually spoken.
    pub normalized_alignment: Option<Alignment>,
}

impl SpeechResponse {
    /// Playback duration in seconds.
    ///
    /// Uses the alignment when present and falls back to the encoded size.
    /// The aligned end time can precede trailing silence, so the larger of
    /// the two readings wins.
    pub fn duration(&self) -> f64 {
        let estimated = self.format.estimate_duration(self.audio.len());
        let aligned = self
            .normalized_alignment
            .as_ref()
            .or(self.alignment.as_ref())
            .and_then(Alignment::end_time);
        match aligned {
            Some(aligned) => aligned.max(estimated),
            None => estimated,
        }
    }
}

// ==================== Internal Types ====================

#[derive(Deserialize)]
struct SpeechApiResponse {
    audio_base64: String,
    #[serde(default)]
    alignment: Option<Alignment>,
    #[serde(default)]
    normalized_alignment: Option<Alignment>,
}
