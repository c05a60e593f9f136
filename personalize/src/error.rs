//! Error types for the personalization pipeline.
//!
//! Provider adapters report failures as [`ProviderError`]; each engine maps
//! them into its own error with the retry classification the caller needs.

use namecast_kv::KVError;
use thiserror::Error;

use crate::retry::Retryable;

/// How an upstream provider failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderErrorKind {
    /// Network failure, rate limit or server error. Safe to retry.
    Transient,
    /// The provider refused the request as given.
    Rejected,
    /// A referenced resource (e.g. a voice) does not exist.
    NotFound,
}

/// Failure reported by a transcription or synthesis backend.
#[derive(Debug, Clone, Error)]
#[error("{message}")]
pub struct ProviderError {
    pub kind: ProviderErrorKind,
    pub message: String,
    /// Upstream HTTP status, when there was one.
    pub status: Option<u16>,
}

impl ProviderError {
    pub fn new(kind: ProviderErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            status: None,
        }
    }

    pub fn transient(message: impl Into<String>) -> Self {
        Self::new(ProviderErrorKind::Transient, message)
    }

    pub fn rejected(message: impl Into<String>) -> Self {
        Self::new(ProviderErrorKind::Rejected, message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(ProviderErrorKind::NotFound, message)
    }

    pub fn with_status(mut self, status: Option<u16>) -> Self {
        self.status = status;
        self
    }
}

/// Errors from placeholder detection.
///
/// A missing placeholder is not an error; see [`crate::Detection::NotFound`].
#[derive(Debug, Error)]
pub enum DetectError {
    /// The recording was rejected before any network call.
    #[error("recording rejected: {0}")]
    Validation(String),

    /// The transcription service could not be reached or failed; retry later.
    #[error("transcription service unavailable: {message}")]
    Transient {
        message: String,
        status: Option<u16>,
    },

    /// The transcription service refused the recording.
    #[error("transcription service rejected the recording: {message}")]
    Upstream {
        message: String,
        status: Option<u16>,
    },

    /// The transcript came back without usable word timing.
    #[error("transcription returned no usable word timing: {reason}")]
    Degraded { reason: String, transcript: String },

    /// More than one occurrence while exactly one was required.
    #[error(
        "the word {placeholder:?} was heard {occurrences} times; record it exactly once"
    )]
    Ambiguous {
        placeholder: String,
        occurrences: usize,
        transcript: String,
    },
}

impl DetectError {
    /// Raw transcript attached to the failure, if any.
    pub fn transcript(&self) -> Option<&str> {
        match self {
            DetectError::Degraded { transcript, .. } | DetectError::Ambiguous { transcript, .. } => {
                Some(transcript)
            }
            _ => None,
        }
    }
}

impl From<ProviderError> for DetectError {
    fn from(e: ProviderError) -> Self {
        match e.kind {
            ProviderErrorKind::Transient => DetectError::Transient {
                message: e.message,
                status: e.status,
            },
            ProviderErrorKind::Rejected | ProviderErrorKind::NotFound => DetectError::Upstream {
                message: e.message,
                status: e.status,
            },
        }
    }
}

impl Retryable for DetectError {
    fn is_retryable(&self) -> bool {
        matches!(self, DetectError::Transient { .. })
    }
}

/// Errors from voice synthesis and cloning.
#[derive(Debug, Error)]
pub enum SynthError {
    /// Bad text, style or sample.
    #[error("invalid synthesis input: {0}")]
    Validation(String),

    /// The voice profile does not reference an existing clone.
    #[error("unknown voice {voice_id:?}: {message}")]
    UnknownVoice { voice_id: String, message: String },

    /// The synthesis service could not be reached or failed; retry later.
    #[error("synthesis service unavailable: {message}")]
    Transient {
        message: String,
        status: Option<u16>,
    },

    /// The synthesis service refused the request.
    #[error("synthesis service rejected the request: {message}")]
    Upstream {
        message: String,
        status: Option<u16>,
    },
}

impl SynthError {
    pub(crate) fn from_provider(e: ProviderError, voice_id: &str) -> Self {
        match e.kind {
            ProviderErrorKind::NotFound => SynthError::UnknownVoice {
                voice_id: voice_id.to_string(),
                message: e.message,
            },
            ProviderErrorKind::Transient => SynthError::Transient {
                message: e.message,
                status: e.status,
            },
            ProviderErrorKind::Rejected => SynthError::Upstream {
                message: e.message,
                status: e.status,
            },
        }
    }
}

impl Retryable for SynthError {
    fn is_retryable(&self) -> bool {
        matches!(self, SynthError::Transient { .. })
    }
}

/// Errors from splice planning.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SpliceError {
    #[error("invalid placeholder span {start}..{end}")]
    InvalidSpan { start: f64, end: f64 },

    #[error("invalid clip duration {0}")]
    InvalidClipDuration(f64),
}

impl Retryable for SpliceError {
    fn is_retryable(&self) -> bool {
        false
    }
}

/// Errors from placeholder span persistence.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("span store: {0}")]
    Kv(#[from] KVError),

    #[error("span store: corrupt record for project {project_id}: {message}")]
    Corrupt { project_id: String, message: String },

    #[error("span store: refusing to store invalid span: {0}")]
    Invalid(#[from] SpliceError),

    /// A concurrent writer got there first.
    #[error(
        "span store: version conflict for project {project_id} (expected {expected:?}, found {actual:?})"
    )]
    Conflict {
        project_id: String,
        expected: Option<u64>,
        actual: Option<u64>,
    },
}

impl Retryable for StoreError {
    /// Backend failures and lost version races may succeed on a fresh read.
    fn is_retryable(&self) -> bool {
        matches!(self, StoreError::Kv(_) | StoreError::Conflict { .. })
    }
}

/// Errors from the end-to-end personalization pipeline.
#[derive(Debug, Error)]
pub enum PersonalizeError {
    #[error(transparent)]
    Detect(#[from] DetectError),

    #[error(transparent)]
    Synth(#[from] SynthError),

    #[error(transparent)]
    Splice(#[from] SpliceError),

    #[error(transparent)]
    Store(#[from] StoreError),

    /// Per-prospect work was requested before the project's recording was
    /// analysed.
    #[error("project {project_id} has no placeholder span; run detection first")]
    NoPlaceholder { project_id: String },

    #[error("{0}")]
    Unsupported(String),
}

impl Retryable for PersonalizeError {
    fn is_retryable(&self) -> bool {
        match self {
            PersonalizeError::Detect(e) => e.is_retryable(),
            PersonalizeError::Synth(e) => e.is_retryable(),
            PersonalizeError::Store(e) => e.is_retryable(),
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detect_error_from_provider() {
        let err: DetectError = ProviderError::transient("connection reset").into();
        assert!(err.is_retryable());
        assert!(err.to_string().contains("unavailable"));

        let err: DetectError = ProviderError::rejected("bad format").with_status(Some(400)).into();
        assert!(!err.is_retryable());
        assert!(matches!(err, DetectError::Upstream { status: Some(400), .. }));
    }

    #[test]
    fn test_synth_error_from_provider() {
        let err = SynthError::from_provider(ProviderError::not_found("no such voice"), "v1");
        assert!(matches!(err, SynthError::UnknownVoice { ref voice_id, .. } if voice_id == "v1"));
        assert!(!err.is_retryable());

        let err = SynthError::from_provider(ProviderError::transient("503"), "v1");
        assert!(err.is_retryable());
    }

    #[test]
    fn test_user_facing_messages_distinguish_causes() {
        let unavailable = DetectError::Transient {
            message: "timed out".into(),
            status: None,
        };
        let ambiguous = DetectError::Ambiguous {
            placeholder: "prospect".into(),
            occurrences: 2,
            transcript: "prospect prospect".into(),
        };
        assert!(unavailable.to_string().contains("unavailable"));
        assert!(ambiguous.to_string().contains("2 times"));
        assert_eq!(ambiguous.transcript(), Some("prospect prospect"));
    }

    #[test]
    fn test_pipeline_retry_classification() {
        let err = PersonalizeError::NoPlaceholder {
            project_id: "p1".into(),
        };
        assert!(!err.is_retryable());
        let err = PersonalizeError::Synth(SynthError::Transient {
            message: "x".into(),
            status: Some(502),
        });
        assert!(err.is_retryable());
    }
}
