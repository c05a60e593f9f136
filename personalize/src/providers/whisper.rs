use std::sync::Arc;

use async_trait::async_trait;
use namecast_whisper as whisper;

use crate::detect::Transcriber;
use crate::error::{ProviderError, ProviderErrorKind};
use crate::types::{Recording, Transcript, Word};

/// [`Transcriber`] backed by an OpenAI-compatible transcription endpoint.
pub struct WhisperTranscriber {
    client: Arc<whisper::Client>,
    model: String,
    language: Option<String>,
    prompt: Option<String>,
}

impl WhisperTranscriber {
    pub fn new(client: Arc<whisper::Client>) -> Self {
        Self {
            client,
            model: whisper::DEFAULT_MODEL.to_string(),
            language: None,
            prompt: None,
        }
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// ISO-639-1 hint for the spoken language.
    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        self.language = Some(language.into());
        self
    }

    /// Text that biases recognition, e.g. the placeholder word itself.
    pub fn with_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.prompt = Some(prompt.into());
        self
    }
}

#[async_trait]
impl Transcriber for WhisperTranscriber {
    async fn transcribe(&self, recording: &Recording) -> Result<Transcript, ProviderError> {
        let mut req = whisper::TranscriptionRequest::new(
            recording.data.clone(),
            recording.upload_name(),
            recording.essence(),
        );
        req.model = self.model.clone();
        req.language = self.language.clone();
        req.prompt = self.prompt.clone();

        let resp = self
            .client
            .transcription()
            .transcribe(&req)
            .await
            .map_err(provider_error)?;
        Ok(to_transcript(resp))
    }
}

fn to_transcript(resp: whisper::Transcription) -> Transcript {
    Transcript {
        words: resp
            .words
            .iter()
            .map(|w| Word::new(&w.word, w.start, w.end))
            .collect(),
        text: resp.text,
        duration: resp.duration,
    }
}

fn provider_error(e: whisper::Error) -> ProviderError {
    let kind = if e.is_retryable() {
        ProviderErrorKind::Transient
    } else {
        ProviderErrorKind::Rejected
    };
    ProviderError::new(kind, e.to_string()).with_status(e.http_status())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_to_transcript() {
        let resp: whisper::Transcription = serde_json::from_value(serde_json::json!({
            "text": "Hey Prospect, there",
            "duration": 2.5,
            "words": [
                {"word": "Hey", "start": 0.4, "end": 0.8},
                {"word": " Prospect,", "start": 1.2, "end": 1.9},
                {"word": "there"}
            ]
        }))
        .unwrap();
        let t = to_transcript(resp);
        assert_eq!(t.text, "Hey Prospect, there");
        assert_eq!(t.duration, Some(2.5));
        assert_eq!(t.words[1], Word::timed("prospect,", 1.2, 1.9));
        assert_eq!(t.words[2].timing(), None);
    }

    #[test]
    fn test_provider_error_mapping() {
        let e = provider_error(whisper::Error::api(503, "overloaded"));
        assert_eq!(e.kind, ProviderErrorKind::Transient);
        assert_eq!(e.status, Some(503));

        let e = provider_error(whisper::Error::api(400, "bad file"));
        assert_eq!(e.kind, ProviderErrorKind::Rejected);
    }
}
