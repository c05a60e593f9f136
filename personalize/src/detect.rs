//! Placeholder detection.
//!
//! A recording is transcribed with word-level timing and the placeholder word
//! is located in the result. Locating is pure ([`locate_placeholder`]); the
//! [`Detector`] adds upload checks and the transcription call.

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::config::{DuplicatePolicy, PersonalizeConfig};
use crate::error::{DetectError, ProviderError};
use crate::types::{PlaceholderSpan, Recording, Transcript};

/// Confidence reported for every match. Word timestamps carry no per-word
/// score, so this is fixed.
pub const DETECTION_CONFIDENCE: f64 = 0.95;

/// How far (seconds) a word may run past the reported recording duration
/// before its timing is considered bogus. Overhang within this is clamped.
const DURATION_TOLERANCE: f64 = 0.05;

/// Speech-to-text backend with word-level timestamps.
#[async_trait]
pub trait Transcriber: Send + Sync {
    async fn transcribe(&self, recording: &Recording) -> Result<Transcript, ProviderError>;
}

/// Outcome of a successful detection run.
#[derive(Debug, Clone, PartialEq)]
pub enum Detection {
    Found(PlaceholderSpan),
    /// The placeholder was not heard. Carries the raw transcript so the user
    /// can see what was recognized.
    NotFound { transcript: String },
}

impl Detection {
    pub fn span(&self) -> Option<&PlaceholderSpan> {
        match self {
            Detection::Found(span) => Some(span),
            Detection::NotFound { .. } => None,
        }
    }

    /// Short explanation suitable for end users.
    pub fn user_message(&self, placeholder: &str) -> String {
        match self {
            Detection::Found(span) => format!(
                "found {:?} at {:.2}s to {:.2}s",
                placeholder, span.start, span.end
            ),
            Detection::NotFound { transcript } if transcript.trim().is_empty() => format!(
                "no speech was recognized; say {:?} clearly where the name should go",
                placeholder
            ),
            Detection::NotFound { transcript } => format!(
                "the word {:?} was not found in the recording. We heard: {:?}",
                placeholder, transcript
            ),
        }
    }
}

/// JSON shape of a detection result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DetectionReport {
    pub detected: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_time: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_time: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transcript: Option<String>,
}

impl From<&Detection> for DetectionReport {
    fn from(detection: &Detection) -> Self {
        match detection {
            Detection::Found(span) => Self {
                detected: true,
                start_time: Some(span.start),
                end_time: Some(span.end),
                confidence: Some(span.confidence),
                transcript: None,
            },
            Detection::NotFound { transcript } => Self {
                detected: false,
                start_time: None,
                end_time: None,
                confidence: None,
                transcript: Some(transcript.clone()),
            },
        }
    }
}

/// Finds the placeholder in a transcript.
///
/// Words are scanned in spoken order; a word matches when its token contains
/// `placeholder` (case-insensitive). Only timed matches are candidates and the
/// earliest one wins under [`DuplicatePolicy::FirstMatch`].
pub fn locate_placeholder(
    transcript: &Transcript,
    placeholder: &str,
    policy: DuplicatePolicy,
) -> Result<Detection, DetectError> {
    let needle = placeholder.trim().to_lowercase();
    if needle.is_empty() {
        return Err(DetectError::Validation(
            "placeholder must be non-empty".to_string(),
        ));
    }

    if transcript.words.is_empty() {
        if transcript.text.trim().is_empty() {
            return Ok(Detection::NotFound {
                transcript: transcript.text.clone(),
            });
        }
        return Err(DetectError::Degraded {
            reason: "transcript text came back without word timestamps".to_string(),
            transcript: transcript.text.clone(),
        });
    }

    if transcript.words.iter().all(|w| w.timing().is_none()) {
        return Err(DetectError::Degraded {
            reason: format!("{} words, none with timestamps", transcript.words.len()),
            transcript: transcript.text.clone(),
        });
    }

    let mut timed = Vec::new();
    let mut untimed = 0usize;
    for (index, word) in transcript.words.iter().enumerate() {
        if !word.token.contains(&needle) {
            continue;
        }
        match word.timing() {
            Some(timing) => timed.push(timing),
            None => {
                untimed += 1;
                warn!(index, token = %word.token, "placeholder match without timestamps, skipped");
            }
        }
    }

    let Some(&(start, end)) = timed.first() else {
        if untimed > 0 {
            return Err(DetectError::Degraded {
                reason: format!("{:?} was heard but without timestamps", needle),
                transcript: transcript.text.clone(),
            });
        }
        return Ok(Detection::NotFound {
            transcript: transcript.text.clone(),
        });
    };

    if timed.len() > 1 {
        match policy {
            DuplicatePolicy::FirstMatch => {
                debug!(occurrences = timed.len(), "placeholder heard more than once, using the first");
            }
            DuplicatePolicy::RejectAmbiguous => {
                return Err(DetectError::Ambiguous {
                    placeholder: needle,
                    occurrences: timed.len(),
                    transcript: transcript.text.clone(),
                });
            }
        }
    }

    let span = checked_span(start, end, transcript.duration).map_err(|reason| {
        DetectError::Degraded {
            reason,
            transcript: transcript.text.clone(),
        }
    })?;
    Ok(Detection::Found(span))
}

fn checked_span(start: f64, end: f64, duration: Option<f64>) -> Result<PlaceholderSpan, String> {
    let invalid = || format!("placeholder timing {}..{} is invalid", start, end);
    if !start.is_finite() || !end.is_finite() || start < 0.0 || end <= start {
        return Err(invalid());
    }

    let mut end = end;
    if let Some(duration) = duration.filter(|d| d.is_finite() && *d > 0.0) {
        if end > duration + DURATION_TOLERANCE {
            return Err(format!(
                "placeholder timing {}..{} exceeds the recording duration {}",
                start, end, duration
            ));
        }
        end = end.min(duration);
        if end <= start {
            return Err(invalid());
        }
    }

    Ok(PlaceholderSpan::new(start, end, DETECTION_CONFIDENCE))
}

/// Runs placeholder detection against a transcription backend.
pub struct Detector {
    transcriber: Arc<dyn Transcriber>,
    placeholder: String,
    policy: DuplicatePolicy,
    max_upload_bytes: u64,
    enforce_upload_limits: bool,
}

impl Detector {
    pub fn new(transcriber: Arc<dyn Transcriber>) -> Self {
        Self::from_config(transcriber, &PersonalizeConfig::default())
    }

    pub fn from_config(transcriber: Arc<dyn Transcriber>, config: &PersonalizeConfig) -> Self {
        Self {
            transcriber,
            placeholder: config.placeholder.clone(),
            policy: config.duplicate_policy,
            max_upload_bytes: config.max_upload_bytes,
            enforce_upload_limits: config.enforce_upload_limits,
        }
    }

    pub fn placeholder(&self) -> &str {
        &self.placeholder
    }

    /// Transcribes `recording` and locates the placeholder.
    ///
    /// Makes a single transcription attempt; wrap with [`crate::retry::retry`]
    /// for backoff on transient failures.
    pub async fn detect_placeholder(&self, recording: &Recording) -> Result<Detection, DetectError> {
        recording
            .check_upload(self.max_upload_bytes, self.enforce_upload_limits)
            .map_err(DetectError::Validation)?;

        debug!(
            bytes = recording.data.len(),
            media_type = %recording.media_type,
            "transcribing recording"
        );
        let transcript = self.transcriber.transcribe(recording).await?;
        debug!(words = transcript.words.len(), "transcription complete");

        locate_placeholder(&transcript, &self.placeholder, self.policy)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Word;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn transcript(words: Vec<Word>) -> Transcript {
        let text = words
            .iter()
            .map(|w| w.token.clone())
            .collect::<Vec<_>>()
            .join(" ");
        Transcript {
            text,
            words,
            duration: None,
        }
    }

    #[test]
    fn test_single_match() {
        let t = transcript(vec![
            Word::timed("Hey", 0.4, 0.8),
            Word::timed("PROSPECT", 1.2, 1.9),
            Word::timed("there", 2.0, 2.3),
        ]);
        let d = locate_placeholder(&t, "prospect", DuplicatePolicy::FirstMatch).unwrap();
        assert_eq!(d, Detection::Found(PlaceholderSpan::new(1.2, 1.9, 0.95)));
    }

    #[test]
    fn test_substring_match_with_punctuation() {
        let t = transcript(vec![Word::timed("hi", 0.0, 0.3), Word::timed("Prospect,", 0.4, 1.0)]);
        let d = locate_placeholder(&t, "prospect", DuplicatePolicy::FirstMatch).unwrap();
        assert_eq!(d.span().map(|s| s.start), Some(0.4));
    }

    #[test]
    fn test_earliest_of_duplicates_wins() {
        let t = transcript(vec![
            Word::timed("prospect", 3.0, 3.5),
            Word::timed("and", 3.6, 3.8),
            Word::timed("prospect", 5.0, 5.4),
        ]);
        let d = locate_placeholder(&t, "prospect", DuplicatePolicy::FirstMatch).unwrap();
        assert_eq!(d.span().unwrap().start, 3.0);
    }

    #[test]
    fn test_reject_ambiguous() {
        let t = transcript(vec![
            Word::timed("prospect", 3.0, 3.5),
            Word::timed("prospect", 5.0, 5.4),
        ]);
        let err = locate_placeholder(&t, "prospect", DuplicatePolicy::RejectAmbiguous).unwrap_err();
        assert!(matches!(err, DetectError::Ambiguous { occurrences: 2, .. }));
    }

    #[test]
    fn test_no_match_returns_transcript_verbatim() {
        let t = Transcript {
            text: "Hello there, friend!".to_string(),
            words: vec![
                Word::timed("Hello", 0.0, 0.4),
                Word::timed("there,", 0.5, 0.8),
                Word::timed("friend!", 0.9, 1.3),
            ],
            duration: Some(1.5),
        };
        let d = locate_placeholder(&t, "prospect", DuplicatePolicy::FirstMatch).unwrap();
        assert_eq!(
            d,
            Detection::NotFound {
                transcript: "Hello there, friend!".to_string()
            }
        );
    }

    #[test]
    fn test_empty_transcript_is_not_found() {
        let t = Transcript::default();
        let d = locate_placeholder(&t, "prospect", DuplicatePolicy::FirstMatch).unwrap();
        assert!(matches!(d, Detection::NotFound { ref transcript } if transcript.is_empty()));
    }

    #[test]
    fn test_text_without_words_is_degraded() {
        let t = Transcript {
            text: "Hey prospect, thanks for your time".to_string(),
            words: Vec::new(),
            duration: Some(3.0),
        };
        let err = locate_placeholder(&t, "prospect", DuplicatePolicy::FirstMatch).unwrap_err();
        assert!(matches!(err, DetectError::Degraded { .. }));
        assert_eq!(err.transcript(), Some("Hey prospect, thanks for your time"));

        let blank = Transcript {
            text: "  ".to_string(),
            ..t
        };
        let d = locate_placeholder(&blank, "prospect", DuplicatePolicy::FirstMatch).unwrap();
        assert!(matches!(d, Detection::NotFound { .. }));
    }

    #[test]
    fn test_untimed_words_are_degraded() {
        let t = transcript(vec![Word::untimed("hey"), Word::untimed("prospect")]);
        let err = locate_placeholder(&t, "prospect", DuplicatePolicy::FirstMatch).unwrap_err();
        assert!(matches!(err, DetectError::Degraded { .. }));
        assert_eq!(err.transcript(), Some("hey prospect"));
    }

    #[test]
    fn test_untimed_match_skipped_for_timed_one() {
        let t = transcript(vec![
            Word::untimed("prospect"),
            Word::timed("prospect", 2.0, 2.6),
        ]);
        let d = locate_placeholder(&t, "prospect", DuplicatePolicy::RejectAmbiguous).unwrap();
        assert_eq!(d.span().unwrap().start, 2.0);
    }

    #[test]
    fn test_invalid_timing_is_degraded() {
        let t = transcript(vec![Word::timed("prospect", 1.9, 1.2)]);
        let err = locate_placeholder(&t, "prospect", DuplicatePolicy::FirstMatch).unwrap_err();
        assert!(err.to_string().contains("1.9..1.2"));

        let mut t = transcript(vec![Word::timed("prospect", 4.0, 6.0)]);
        t.duration = Some(5.0);
        let err = locate_placeholder(&t, "prospect", DuplicatePolicy::FirstMatch).unwrap_err();
        assert!(matches!(err, DetectError::Degraded { .. }));
    }

    #[test]
    fn test_small_overhang_is_clamped() {
        let mut t = transcript(vec![Word::timed("prospect", 4.5, 5.02)]);
        t.duration = Some(5.0);
        let d = locate_placeholder(&t, "prospect", DuplicatePolicy::FirstMatch).unwrap();
        assert_eq!(d.span().unwrap().end, 5.0);
    }

    #[test]
    fn test_report_shape() {
        let found = Detection::Found(PlaceholderSpan::new(1.2, 1.9, 0.95));
        let json = serde_json::to_value(DetectionReport::from(&found)).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"detected": true, "startTime": 1.2, "endTime": 1.9, "confidence": 0.95})
        );

        let missing = Detection::NotFound {
            transcript: "hello".into(),
        };
        let json = serde_json::to_value(DetectionReport::from(&missing)).unwrap();
        assert_eq!(json, serde_json::json!({"detected": false, "transcript": "hello"}));
        assert!(missing.user_message("prospect").contains("not found"));
    }

    struct CountingTranscriber {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl Transcriber for CountingTranscriber {
        async fn transcribe(&self, _recording: &Recording) -> Result<Transcript, ProviderError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(Transcript::default())
        }
    }

    #[tokio::test]
    async fn test_validation_happens_before_transcription() {
        let transcriber = Arc::new(CountingTranscriber {
            calls: AtomicUsize::new(0),
        });
        let detector = Detector::new(transcriber.clone());

        let err = detector
            .detect_placeholder(&Recording::new(vec![0; 8], "text/plain"))
            .await
            .unwrap_err();
        assert!(matches!(err, DetectError::Validation(_)));
        assert_eq!(transcriber.calls.load(Ordering::SeqCst), 0);

        let d = detector
            .detect_placeholder(&Recording::new(vec![0; 8], "audio/wav"))
            .await
            .unwrap();
        assert!(matches!(d, Detection::NotFound { .. }));
        assert_eq!(transcriber.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_lifted_size_limit_still_checks_media_type() {
        let transcriber = Arc::new(CountingTranscriber {
            calls: AtomicUsize::new(0),
        });
        let config = PersonalizeConfig {
            enforce_upload_limits: false,
            ..PersonalizeConfig::default()
        };
        let detector = Detector::from_config(transcriber.clone(), &config);

        let err = detector
            .detect_placeholder(&Recording::new(vec![0; 8], "text/plain"))
            .await
            .unwrap_err();
        assert!(matches!(err, DetectError::Validation(_)));
        assert_eq!(transcriber.calls.load(Ordering::SeqCst), 0);
    }
}
