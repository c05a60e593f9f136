//! Audio personalization pipeline.
//!
//! Locates a spoken placeholder word in a recording, synthesizes a
//! replacement name in a cloned voice, and plans how the clip is spliced
//! back into the source track.
//!
//! # Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use namecast_personalize::{Personalizer, PersonalizeConfig, Prospect, Recording, SpanStore};
//! use namecast_personalize::providers::{ElevenLabsVoice, WhisperTranscriber};
//!
//! let voice = Arc::new(ElevenLabsVoice::new(Arc::new(elevenlabs)));
//! let personalizer = Personalizer::new(
//!     Arc::new(WhisperTranscriber::new(Arc::new(whisper))),
//!     voice.clone(),
//!     SpanStore::new(kv),
//!     PersonalizeConfig::default(),
//! )
//! .with_voice_library(voice);
//!
//! personalizer.setup_project("proj-1", &Recording::new(bytes, "video/mp4")).await?;
//! let profile = personalizer.resolve_voice("voice-id").await?;
//! let out = personalizer
//!     .personalize("proj-1", &Prospect::new("p-1", "Alice"), &profile)
//!     .await?;
//! println!("{}", serde_json::to_string(&out.plan.instruction)?);
//! ```

mod config;
mod detect;
mod error;
mod pipeline;
pub mod providers;
pub mod retry;
mod splice;
mod store;
mod synth;
mod types;

pub use config::{
    DEFAULT_MAX_NAME_CHARS, DEFAULT_MAX_UPLOAD_BYTES, DEFAULT_MAX_VOICE_SAMPLE_BYTES,
    DEFAULT_PLACEHOLDER, DuplicatePolicy, PersonalizeConfig,
};
pub use detect::{
    DETECTION_CONFIDENCE, Detection, DetectionReport, Detector, Transcriber, locate_placeholder,
};
pub use error::{
    DetectError, PersonalizeError, ProviderError, ProviderErrorKind, SpliceError, StoreError,
    SynthError,
};
pub use pipeline::{BatchItem, BatchSummary, PersonalizedClip, Personalizer};
pub use retry::{RetryPolicy, Retryable};
pub use splice::{CompositeJob, CompositePolicy, SpliceInstruction, SplicePlan, plan_splice};
pub use store::{SpanStore, StoredSpan};
pub use synth::{SynthesisEngine, VoiceCloner, VoiceLibrary, VoiceSynthesizer, validate_text};
pub use types::{
    ALLOWED_MEDIA_TYPES, PlaceholderSpan, Prospect, Recording, StyleParams, SynthesizedClip,
    Transcript, VoiceProfile, Word, extension_for, media_type_for_extension,
};
