//! ElevenLabs API SDK for Rust.
//!
//! Covers the parts of the API used for voice personalization: instant voice
//! cloning, voice lookup and text-to-speech with character timestamps.

mod client;
mod error;
pub mod http;
mod speech;
mod types;
mod voice;

pub use client::{Client, ClientBuilder, DEFAULT_BASE_URL, DEFAULT_TIMEOUT};
pub use error::{Error, Result};
pub use speech::{Alignment, DEFAULT_MODEL, SpeechRequest, SpeechResponse, SpeechService};
pub use types::{OutputFormat, VoiceSettings};
pub use voice::{VoiceAddRequest, VoiceAddResponse, VoiceInfo, VoiceSample, VoiceService};
