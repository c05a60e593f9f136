//! Core data types of the personalization pipeline.

use serde::{Deserialize, Serialize};

use crate::error::SpliceError;

// ==================== Recording ====================

/// Media types the transcription backend accepts.
pub const ALLOWED_MEDIA_TYPES: &[&str] = &[
    "audio/mpeg",
    "audio/mp3",
    "audio/mp4",
    "audio/m4a",
    "audio/x-m4a",
    "audio/wav",
    "audio/x-wav",
    "audio/wave",
    "audio/webm",
    "audio/ogg",
    "audio/flac",
    "video/mp4",
    "video/mpeg",
    "video/webm",
    "video/quicktime",
];

/// An audio or audio-bearing video file supplied by the user.
#[derive(Debug, Clone, Default)]
pub struct Recording {
    /// Raw file contents.
    pub data: Vec<u8>,
    /// Declared media type, e.g. `video/mp4`.
    pub media_type: String,
    /// Original file name, if known.
    pub file_name: Option<String>,
}

impl Recording {
    pub fn new(data: Vec<u8>, media_type: impl Into<String>) -> Self {
        Self {
            data,
            media_type: media_type.into(),
            file_name: None,
        }
    }

    pub fn with_file_name(mut self, name: impl Into<String>) -> Self {
        self.file_name = Some(name.into());
        self
    }

    /// Lowercased media type without parameters (`audio/webm;codecs=opus`
    /// becomes `audio/webm`).
    pub fn essence(&self) -> String {
        self.media_type
            .split(';')
            .next()
            .unwrap_or_default()
            .trim()
            .to_ascii_lowercase()
    }

    /// File name to present to upstream services, derived from the media
    /// type when none was supplied.
    pub fn upload_name(&self) -> String {
        match &self.file_name {
            Some(name) if !name.is_empty() => name.clone(),
            _ => format!("recording.{}", extension_for(&self.essence())),
        }
    }

    /// Checks the payload against the media allow-list and, when
    /// `enforce_size` is set, the upload ceiling.
    pub fn check_upload(&self, max_bytes: u64, enforce_size: bool) -> Result<(), String> {
        if self.data.is_empty() {
            return Err("file is empty".to_string());
        }
        let essence = self.essence();
        if !ALLOWED_MEDIA_TYPES.contains(&essence.as_str()) {
            return Err(format!("unsupported media type {:?}", self.media_type));
        }
        if enforce_size && self.data.len() as u64 > max_bytes {
            return Err(format!(
                "file is {} bytes; the limit is {} bytes",
                self.data.len(),
                max_bytes
            ));
        }
        Ok(())
    }
}

/// File extension for an allowed media type.
pub fn extension_for(media_type: &str) -> &'static str {
    match media_type {
        "audio/mpeg" | "audio/mp3" => "mp3",
        "audio/mp4" | "audio/m4a" | "audio/x-m4a" => "m4a",
        "audio/wav" | "audio/x-wav" | "audio/wave" => "wav",
        "audio/webm" | "video/webm" => "webm",
        "audio/ogg" => "ogg",
        "audio/flac" => "flac",
        "video/mp4" => "mp4",
        "video/mpeg" => "mpeg",
        "video/quicktime" => "mov",
        _ => "bin",
    }
}

/// Guesses a media type from a file extension.
pub fn media_type_for_extension(ext: &str) -> Option<&'static str> {
    let media_type = match ext.to_ascii_lowercase().as_str() {
        "mp3" | "mpga" => "audio/mpeg",
        "m4a" => "audio/mp4",
        "wav" => "audio/wav",
        "ogg" | "oga" => "audio/ogg",
        "flac" => "audio/flac",
        "webm" => "video/webm",
        "mp4" => "video/mp4",
        "mpeg" | "mpg" => "video/mpeg",
        "mov" => "video/quicktime",
        _ => return None,
    };
    Some(media_type)
}

// ==================== Transcript ====================

/// A transcribed word.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Word {
    /// Lowercased, trimmed form used for matching.
    pub token: String,
    /// Start time in seconds.
    pub start: Option<f64>,
    /// End time in seconds.
    pub end: Option<f64>,
}

impl Word {
    pub fn new(text: &str, start: Option<f64>, end: Option<f64>) -> Self {
        Self {
            token: text.trim().to_lowercase(),
            start,
            end,
        }
    }

    pub fn timed(text: &str, start: f64, end: f64) -> Self {
        Self::new(text, Some(start), Some(end))
    }

    pub fn untimed(text: &str) -> Self {
        Self::new(text, None, None)
    }

    /// Both endpoints, if the provider reported them.
    pub fn timing(&self) -> Option<(f64, f64)> {
        self.start.zip(self.end)
    }
}

/// Word-aligned transcript of a recording.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Transcript {
    /// Full text as returned by the provider.
    pub text: String,
    /// Words in spoken order.
    pub words: Vec<Word>,
    /// Recording duration in seconds, when the provider reports it.
    pub duration: Option<f64>,
}

// ==================== Placeholder Span ====================

/// Where the placeholder word sits in the source recording.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PlaceholderSpan {
    pub start: f64,
    pub end: f64,
    pub confidence: f64,
}

impl PlaceholderSpan {
    pub fn new(start: f64, end: f64, confidence: f64) -> Self {
        Self {
            start,
            end,
            confidence,
        }
    }

    pub fn duration(&self) -> f64 {
        self.end - self.start
    }

    /// Checks `0 <= start < end` with finite endpoints.
    pub fn validate(&self) -> Result<(), SpliceError> {
        let ok = self.start.is_finite()
            && self.end.is_finite()
            && self.start >= 0.0
            && self.end > self.start;
        if ok {
            Ok(())
        } else {
            Err(SpliceError::InvalidSpan {
                start: self.start,
                end: self.end,
            })
        }
    }
}

// ==================== Voice ====================

/// Reference to a cloned voice.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VoiceProfile {
    pub voice_id: String,
    #[serde(default)]
    pub name: String,
}

impl VoiceProfile {
    pub fn new(voice_id: impl Into<String>) -> Self {
        Self {
            voice_id: voice_id.into(),
            name: String::new(),
        }
    }
}

/// Synthesis dials.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StyleParams {
    /// Consistency versus expressiveness (0-1).
    pub stability: f32,
    /// Closeness to the source voice (0-1).
    pub similarity_boost: f32,
    /// Style exaggeration (0-1).
    pub style: f32,
    /// Extra speaker fidelity.
    pub use_speaker_boost: bool,
}

impl StyleParams {
    /// Settings for ordinary sentences.
    pub fn general() -> Self {
        Self {
            stability: 0.5,
            similarity_boost: 0.75,
            style: 0.25,
            use_speaker_boost: true,
        }
    }

    /// Settings for a single spoken name: steadier and flatter, so the clip
    /// blends into the surrounding sentence.
    pub fn names() -> Self {
        Self {
            stability: 0.75,
            similarity_boost: 0.9,
            style: 0.0,
            use_speaker_boost: true,
        }
    }

    pub fn validate(&self) -> Result<(), String> {
        for (name, value) in [
            ("stability", self.stability),
            ("similarityBoost", self.similarity_boost),
            ("style", self.style),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(format!("{} must be within 0..=1, got {}", name, value));
            }
        }
        Ok(())
    }
}

impl Default for StyleParams {
    fn default() -> Self {
        Self::names()
    }
}

/// Output of one synthesis call.
#[derive(Debug, Clone, PartialEq)]
pub struct SynthesizedClip {
    /// The text that was spoken.
    pub text: String,
    /// Voice used.
    pub voice_id: String,
    /// Encoded audio.
    pub audio: Vec<u8>,
    pub mime_type: String,
    /// Direct link, when the backend hosts the audio.
    pub audio_url: Option<String>,
    /// Actual playback length in seconds.
    pub duration: f64,
}

/// A prospect to personalize for.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Prospect {
    pub id: String,
    pub first_name: String,
}

impl Prospect {
    pub fn new(id: impl Into<String>, first_name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            first_name: first_name.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_check_upload() {
        let rec = Recording::new(vec![0; 10], "Video/MP4; codecs=avc1");
        assert!(rec.check_upload(100, true).is_ok());

        let err = rec.check_upload(5, true).unwrap_err();
        assert!(err.contains("limit"));

        let gif = Recording::new(vec![0; 10], "image/gif");
        assert!(gif.check_upload(100, true).unwrap_err().contains("image/gif"));

        // Lifting the size ceiling keeps the allow-list.
        assert!(rec.check_upload(5, false).is_ok());
        let text = Recording::new(vec![0; 10], "text/plain");
        assert!(text.check_upload(100, false).unwrap_err().contains("text/plain"));

        let empty = Recording::new(Vec::new(), "audio/wav");
        assert!(empty.check_upload(100, false).is_err());
    }

    #[test]
    fn test_upload_name() {
        let rec = Recording::new(vec![1], "audio/x-m4a");
        assert_eq!(rec.upload_name(), "recording.m4a");
        let rec = rec.with_file_name("intro.m4a");
        assert_eq!(rec.upload_name(), "intro.m4a");
        assert_eq!(media_type_for_extension("MOV"), Some("video/quicktime"));
        assert_eq!(media_type_for_extension("txt"), None);
    }

    #[test]
    fn test_word_normalization() {
        let w = Word::timed("  Prospect, ", 1.0, 1.5);
        assert_eq!(w.token, "prospect,");
        assert_eq!(w.timing(), Some((1.0, 1.5)));
        assert_eq!(Word::untimed("hi").timing(), None);
        assert_eq!(Word::new("hi", Some(1.0), None).timing(), None);
    }

    #[test]
    fn test_span_validate() {
        assert!(PlaceholderSpan::new(1.2, 1.9, 0.95).validate().is_ok());
        assert!(PlaceholderSpan::new(1.9, 1.9, 0.95).validate().is_err());
        assert!(PlaceholderSpan::new(-0.1, 1.0, 0.95).validate().is_err());
        assert!(PlaceholderSpan::new(0.0, f64::NAN, 0.95).validate().is_err());
    }

    #[test]
    fn test_style_presets() {
        let names = StyleParams::names();
        let general = StyleParams::general();
        assert!(names.stability > general.stability);
        assert!(names.style < general.style);
        assert_eq!(StyleParams::default(), names);

        let bad = StyleParams {
            stability: 1.5,
            ..names
        };
        assert!(bad.validate().unwrap_err().contains("stability"));
    }
}
