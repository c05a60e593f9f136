//! Voice synthesis and cloning.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, info};

use crate::config::PersonalizeConfig;
use crate::error::{ProviderError, SynthError};
use crate::types::{Recording, StyleParams, SynthesizedClip, VoiceProfile};

/// Text-to-speech backend speaking in a cloned voice.
#[async_trait]
pub trait VoiceSynthesizer: Send + Sync {
    /// Speaks `text`. Implementations must report the clip's real playback
    /// length in [`SynthesizedClip::duration`].
    async fn synthesize(
        &self,
        text: &str,
        voice: &VoiceProfile,
        style: &StyleParams,
    ) -> Result<SynthesizedClip, ProviderError>;
}

/// Voice cloning backend.
#[async_trait]
pub trait VoiceCloner: Send + Sync {
    /// Creates a cloned voice from a speech sample.
    async fn clone_voice(&self, name: &str, sample: &Recording)
    -> Result<VoiceProfile, ProviderError>;

    /// Resolves an existing voice. Unknown ids fail with
    /// [`crate::ProviderErrorKind::NotFound`].
    async fn lookup_voice(&self, voice_id: &str) -> Result<VoiceProfile, ProviderError>;
}

/// Trims `text` and checks it is a speakable name.
pub fn validate_text(text: &str, max_chars: usize) -> Result<&str, SynthError> {
    let text = text.trim();
    if text.is_empty() {
        return Err(SynthError::Validation("text must be non-empty".to_string()));
    }
    let chars = text.chars().count();
    if chars > max_chars {
        return Err(SynthError::Validation(format!(
            "text is {} characters; at most {} are allowed",
            chars, max_chars
        )));
    }
    Ok(text)
}

/// Validated access to a [`VoiceSynthesizer`].
pub struct SynthesisEngine {
    synthesizer: Arc<dyn VoiceSynthesizer>,
    max_chars: usize,
}

impl SynthesisEngine {
    pub fn new(synthesizer: Arc<dyn VoiceSynthesizer>) -> Self {
        Self::from_config(synthesizer, &PersonalizeConfig::default())
    }

    pub fn from_config(synthesizer: Arc<dyn VoiceSynthesizer>, config: &PersonalizeConfig) -> Self {
        Self {
            synthesizer,
            max_chars: config.max_name_chars,
        }
    }

    /// Synthesizes `text` in `voice`. A single backend attempt.
    pub async fn synthesize(
        &self,
        text: &str,
        voice: &VoiceProfile,
        style: &StyleParams,
    ) -> Result<SynthesizedClip, SynthError> {
        let text = validate_text(text, self.max_chars)?;
        if voice.voice_id.trim().is_empty() {
            return Err(SynthError::Validation("voice id must be non-empty".to_string()));
        }
        style.validate().map_err(SynthError::Validation)?;

        let clip = self
            .synthesizer
            .synthesize(text, voice, style)
            .await
            .map_err(|e| SynthError::from_provider(e, &voice.voice_id))?;

        if !clip.duration.is_finite() || clip.duration <= 0.0 {
            return Err(SynthError::Upstream {
                message: format!("backend returned a clip with duration {}", clip.duration),
                status: None,
            });
        }

        debug!(
            voice_id = %voice.voice_id,
            bytes = clip.audio.len(),
            duration = clip.duration,
            "synthesized clip"
        );
        Ok(clip)
    }
}

/// Validated access to a [`VoiceCloner`].
pub struct VoiceLibrary {
    cloner: Arc<dyn VoiceCloner>,
    max_sample_bytes: u64,
    enforce_upload_limits: bool,
}

impl VoiceLibrary {
    pub fn new(cloner: Arc<dyn VoiceCloner>) -> Self {
        Self::from_config(cloner, &PersonalizeConfig::default())
    }

    pub fn from_config(cloner: Arc<dyn VoiceCloner>, config: &PersonalizeConfig) -> Self {
        Self {
            cloner,
            max_sample_bytes: config.max_voice_sample_bytes,
            enforce_upload_limits: config.enforce_upload_limits,
        }
    }

    /// Clones a voice from `sample`.
    pub async fn clone_voice(&self, name: &str, sample: &Recording) -> Result<VoiceProfile, SynthError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(SynthError::Validation("voice name must be non-empty".to_string()));
        }
        sample
            .check_upload(self.max_sample_bytes, self.enforce_upload_limits)
            .map_err(|reason| SynthError::Validation(format!("voice sample rejected: {}", reason)))?;

        let profile = self
            .cloner
            .clone_voice(name, sample)
            .await
            .map_err(|e| SynthError::from_provider(e, ""))?;
        info!(voice_id = %profile.voice_id, name = %profile.name, "cloned voice");
        Ok(profile)
    }

    /// Looks up an existing voice.
    pub async fn lookup(&self, voice_id: &str) -> Result<VoiceProfile, SynthError> {
        if voice_id.trim().is_empty() {
            return Err(SynthError::Validation("voice id must be non-empty".to_string()));
        }
        self.cloner
            .lookup_voice(voice_id)
            .await
            .map_err(|e| SynthError::from_provider(e, voice_id))
    }
}
