use std::sync::Arc;

use async_trait::async_trait;
use namecast_elevenlabs as elevenlabs;

use crate::error::{ProviderError, ProviderErrorKind};
use crate::synth::{VoiceCloner, VoiceSynthesizer};
use crate::types::{Recording, StyleParams, SynthesizedClip, VoiceProfile};

/// [`VoiceSynthesizer`] and [`VoiceCloner`] backed by ElevenLabs.
pub struct ElevenLabsVoice {
    client: Arc<elevenlabs::Client>,
    model: String,
    format: elevenlabs::OutputFormat,
    remove_background_noise: bool,
}

impl ElevenLabsVoice {
    pub fn new(client: Arc<elevenlabs::Client>) -> Self {
        Self {
            client,
            model: elevenlabs::DEFAULT_MODEL.to_string(),
            format: elevenlabs::OutputFormat::default(),
            remove_background_noise: true,
        }
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn with_format(mut self, format: elevenlabs::OutputFormat) -> Self {
        self.format = format;
        self
    }

    pub fn with_remove_background_noise(mut self, remove: bool) -> Self {
        self.remove_background_noise = remove;
        self
    }
}

fn voice_settings(style: &StyleParams) -> elevenlabs::VoiceSettings {
    elevenlabs::VoiceSettings {
        stability: style.stability,
        similarity_boost: style.similarity_boost,
        style: Some(style.style),
        use_speaker_boost: Some(style.use_speaker_boost),
        speed: None,
    }
}

#[async_trait]
impl VoiceSynthesizer for ElevenLabsVoice {
    async fn synthesize(
        &self,
        text: &str,
        voice: &VoiceProfile,
        style: &StyleParams,
    ) -> Result<SynthesizedClip, ProviderError> {
        let req = elevenlabs::SpeechRequest {
            text: text.to_string(),
            model_id: self.model.clone(),
            voice_settings: Some(voice_settings(style)),
            ..Default::default()
        };
        let resp = self
            .client
            .speech()
            .synthesize_with_timestamps(&voice.voice_id, &req, self.format)
            .await
            .map_err(provider_error)?;

        let duration = resp.duration();
        Ok(SynthesizedClip {
            text: text.to_string(),
            voice_id: voice.voice_id.clone(),
            mime_type: resp.format.mime_type().to_string(),
            audio: resp.audio,
            audio_url: None,
            duration,
        })
    }
}

#[async_trait]
impl VoiceCloner for ElevenLabsVoice {
    async fn clone_voice(
        &self,
        name: &str,
        sample: &Recording,
    ) -> Result<VoiceProfile, ProviderError> {
        let req = elevenlabs::VoiceAddRequest {
            name: name.to_string(),
            files: vec![elevenlabs::VoiceSample::new(
                sample.data.clone(),
                sample.upload_name(),
                sample.essence(),
            )],
            description: None,
            remove_background_noise: self.remove_background_noise,
        };
        let resp = self.client.voice().add(req).await.map_err(provider_error)?;
        Ok(VoiceProfile {
            voice_id: resp.voice_id,
            name: name.to_string(),
        })
    }

    async fn lookup_voice(&self, voice_id: &str) -> Result<VoiceProfile, ProviderError> {
        let info = self.client.voice().get(voice_id).await.map_err(provider_error)?;
        Ok(VoiceProfile {
            voice_id: info.voice_id,
            name: info.name,
        })
    }
}

fn provider_error(e: elevenlabs::Error) -> ProviderError {
    let kind = if e.is_not_found() {
        ProviderErrorKind::NotFound
    } else if e.is_retryable() {
        ProviderErrorKind::Transient
    } else {
        ProviderErrorKind::Rejected
    };
    ProviderError::new(kind, e.to_string()).with_status(e.http_status())
}
