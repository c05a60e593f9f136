//! Common types for the ElevenLabs API.

use serde::{Deserialize, Serialize};

// ==================== Voice Settings ====================

/// Per-request voice tuning.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct VoiceSettings {
    /// Voice consistency (0-1). Higher is steadier, lower is more expressive.
    pub stability: f32,

    /// How closely output should match the source voice (0-1).
    pub similarity_boost: f32,

    /// Style exaggeration (0-1).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub style: Option<f32>,

    /// Boosts similarity to the original speaker at some latency cost.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub use_speaker_boost: Option<bool>,

    /// Speaking rate multiplier.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub speed: Option<f32>,
}

impl Default for VoiceSettings {
    fn default() -> Self {
        Self {
            stability: 0.5,
            similarity_boost: 0.75,
            style: Some(0.0),
            use_speaker_boost: Some(true),
            speed: None,
        }
    }
}

// ==================== Output Format ====================

/// Encoded audio format requested from text-to-speech endpoints.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[allow(non_camel_case_types)]
pub enum OutputFormat {
    Mp3_22050_32,
    Mp3_44100_64,
    #[default]
    Mp3_44100_128,
    Mp3_44100_192,
    Pcm_16000,
    Pcm_22050,
    Pcm_44100,
}

impl OutputFormat {
    /// Query-string value.
    pub fn as_str(&self) -> &'static str {
        match self {
            OutputFormat::Mp3_22050_32 => "mp3_22050_32",
            OutputFormat::Mp3_44100_64 => "mp3_44100_64",
            OutputFormat::Mp3_44100_128 => "mp3_44100_128",
            OutputFormat::Mp3_44100_192 => "mp3_44100_192",
            OutputFormat::Pcm_16000 => "pcm_16000",
            OutputFormat::Pcm_22050 => "pcm_22050",
            OutputFormat::Pcm_44100 => "pcm_44100",
        }
    }

    pub fn mime_type(&self) -> &'static str {
        if self.is_pcm() { "audio/pcm" } else { "audio/mpeg" }
    }

    pub fn is_pcm(&self) -> bool {
        matches!(
            self,
            OutputFormat::Pcm_16000 | OutputFormat::Pcm_22050 | OutputFormat::Pcm_44100
        )
    }

    /// Encoded bytes per second of audio: the constant bitrate for MP3,
    /// 16-bit mono samples for PCM.
    pub fn bytes_per_second(&self) -> u32 {
        match self {
            OutputFormat::Mp3_22050_32 => 32_000 / 8,
            OutputFormat::Mp3_44100_64 => 64_000 / 8,
            OutputFormat::Mp3_44100_128 => 128_000 / 8,
            OutputFormat::Mp3_44100_192 => 192_000 / 8,
            OutputFormat::Pcm_16000 => 16_000 * 2,
            OutputFormat::Pcm_22050 => 22_050 * 2,
            OutputFormat::Pcm_44100 => 44_100 * 2,
        }
    }

    /// Approximate duration of an encoded payload in seconds.
    pub fn estimate_duration(&self, payload_len: usize) -> f64 {
        payload_len as f64 / self.bytes_per_second() as f64
    }
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_voice_settings_serialization() {
        let settings = VoiceSettings {
            speed: None,
            ..Default::default()
        };
        let json = serde_json::to_value(settings).unwrap();
        assert_eq!(json["stability"], 0.5);
        assert_eq!(json["use_speaker_boost"], true);
        assert!(json.get("speed").is_none());
    }

    #[test]
    fn test_output_format() {
        assert_eq!(OutputFormat::default().as_str(), "mp3_44100_128");
        assert_eq!(OutputFormat::Pcm_16000.mime_type(), "audio/pcm");
        // 16 KB of 128 kbps MP3 is one second.
        assert!((OutputFormat::Mp3_44100_128.estimate_duration(16_000) - 1.0).abs() < 1e-9);
    }
}
