//! Pipeline configuration.

use serde::{Deserialize, Serialize};

use crate::retry::RetryPolicy;
use crate::types::StyleParams;

/// Default placeholder token spoken in source recordings.
pub const DEFAULT_PLACEHOLDER: &str = "prospect";

/// Upload ceiling of the transcription backend.
pub const DEFAULT_MAX_UPLOAD_BYTES: u64 = 25 * 1024 * 1024;

/// Upload ceiling for voice clone samples.
pub const DEFAULT_MAX_VOICE_SAMPLE_BYTES: u64 = 10 * 1024 * 1024;

/// Longest accepted name, in characters.
pub const DEFAULT_MAX_NAME_CHARS: usize = 50;

/// What to do when the placeholder is heard more than once.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DuplicatePolicy {
    /// Use the earliest occurrence.
    #[default]
    FirstMatch,
    /// Fail with an ambiguity error so the user re-records.
    RejectAmbiguous,
}

/// Settings for detection, synthesis and batch personalization.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PersonalizeConfig {
    /// Substring identifying the placeholder word (case-insensitive).
    pub placeholder: String,
    pub max_upload_bytes: u64,
    pub max_voice_sample_bytes: u64,
    pub max_name_chars: usize,
    /// Size ceiling before upload. Turning this off is meant for local
    /// fixtures; it is never inferred from the environment. The media type
    /// allow-list applies either way.
    pub enforce_upload_limits: bool,
    pub duplicate_policy: DuplicatePolicy,
    /// Dials used for name synthesis.
    pub style: StyleParams,
    /// Retry policy for transcription and synthesis calls.
    pub retry: RetryPolicy,
    /// Prospects synthesized concurrently in a batch.
    pub batch_concurrency: usize,
}

impl Default for PersonalizeConfig {
    fn default() -> Self {
        Self {
            placeholder: DEFAULT_PLACEHOLDER.to_string(),
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
            max_voice_sample_bytes: DEFAULT_MAX_VOICE_SAMPLE_BYTES,
            max_name_chars: DEFAULT_MAX_NAME_CHARS,
            enforce_upload_limits: true,
            duplicate_policy: DuplicatePolicy::FirstMatch,
            style: StyleParams::names(),
            retry: RetryPolicy::default(),
            batch_concurrency: 4,
        }
    }
}
