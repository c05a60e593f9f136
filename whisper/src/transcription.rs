//! Speech-to-text transcription service.

use std::sync::Arc;

use reqwest::multipart;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{
    error::{Error, Result},
    http::HttpClient,
};

/// Default transcription model.
pub const DEFAULT_MODEL: &str = "whisper-1";

const TRANSCRIPTIONS_PATH: &str = "/v1/audio/transcriptions";

/// Speech-to-text service.
pub struct TranscriptionService {
    http: Arc<HttpClient>,
}

impl TranscriptionService {
    pub(crate) fn new(http: Arc<HttpClient>) -> Self {
        Self { http }
    }

    /// Transcribes an audio or video file with word-level timestamps.
    ///
    /// The request always asks for `verbose_json` output with word
    /// granularity, so the returned [`Transcription`] carries per-word timing
    /// whenever the service provides it.
    ///
    /// # Example
    ///
    /// ```rust,ignore
    /// let request = TranscriptionRequest::new(bytes, "intro.mp4", "video/mp4");
    /// let transcription = client.transcription().transcribe(&request).await?;
    ///
    /// for word in &transcription.words {
    ///     println!("{:?}..{:?} {}", word.start, word.end, word.word);
    /// }
    /// ```
    pub async fn transcribe(&self, request: &TranscriptionRequest) -> Result<Transcription> {
        if request.file.is_empty() {
            return Err(Error::Other("transcription file is empty".to_string()));
        }

        let part = multipart::Part::bytes(request.file.clone())
            .file_name(request.file_name.clone())
            .mime_str(&request.mime_type)?;

        let model = if request.model.is_empty() {
            DEFAULT_MODEL.to_string()
        } else {
            request.model.clone()
        };

        let mut form = multipart::Form::new()
            .part("file", part)
            .text("model", model)
            .text("response_format", "verbose_json")
            .text("timestamp_granularities[]", "word");

        if let Some(language) = &request.language {
            form = form.text("language", language.clone());
        }
        if let Some(prompt) = &request.prompt {
            form = form.text("prompt", prompt.clone());
        }
        if let Some(temperature) = request.temperature {
            form = form.text("temperature", temperature.to_string());
        }

        let transcription: Transcription =
            self.http.post_multipart(TRANSCRIPTIONS_PATH, form).await?;

        debug!(
            words = transcription.words.len(),
            duration = ?transcription.duration,
            "whisper: transcription received"
        );

        Ok(transcription)
    }
}

// ==================== Request/Response Types ====================

/// Request for a transcription.
#[derive(Debug, Clone, Default)]
pub struct TranscriptionRequest {
    /// Raw file contents.
    pub file: Vec<u8>,

    /// File name sent with the upload; the service uses its extension.
    pub file_name: String,

    /// MIME type of the file.
    pub mime_type: String,

    /// Model name, [`DEFAULT_MODEL`] when empty.
    pub model: String,

    /// ISO-639-1 language hint.
    pub language: Option<String>,

    /// Optional text to guide the model's style or vocabulary.
    pub prompt: Option<String>,

    /// Sampling temperature (0-1).
    pub temperature: Option<f32>,
}

impl TranscriptionRequest {
    pub fn new(file: Vec<u8>, file_name: impl Into<String>, mime_type: impl Into<String>) -> Self {
        Self {
            file,
            file_name: file_name.into(),
            mime_type: mime_type.into(),
            ..Default::default()
        }
    }
}

/// A verbose transcription with timing information.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Transcription {
    /// Full transcript text.
    #[serde(default)]
    pub text: String,

    /// Detected language.
    #[serde(default)]
    pub language: Option<String>,

    /// Input duration in seconds.
    #[serde(default)]
    pub duration: Option<f64>,

    /// Word-level timing, in spoken order.
    #[serde(default)]
    pub words: Vec<WordTimestamp>,

    /// Segment-level timing.
    #[serde(default)]
    pub segments: Vec<Segment>,
}

/// A single transcribed word.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WordTimestamp {
    pub word: String,

    /// Start time in seconds.
    #[serde(default)]
    pub start: Option<f64>,

    /// End time in seconds.
    #[serde(default)]
    pub end: Option<f64>,
}

/// A transcript segment.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Segment {
    #[serde(default)]
    pub id: i64,
    #[serde(default)]
    pub start: f64,
    #[serde(default)]
    pub end: f64,
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub avg_logprob: Option<f64>,
    #[serde(default)]
    pub no_speech_prob: Option<f64>,
}
