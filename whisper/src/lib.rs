//! OpenAI-compatible speech-to-text SDK for Rust.
//!
//! This crate provides a client for transcription endpoints that return
//! word-level timestamps (`verbose_json` with `word` granularity).

mod client;
mod error;
pub mod http;
mod transcription;

pub use client::{Client, ClientBuilder, DEFAULT_BASE_URL, DEFAULT_TIMEOUT};
pub use error::{Error, Result};
pub use transcription::{
    DEFAULT_MODEL, Segment, Transcription, TranscriptionRequest, TranscriptionService,
    WordTimestamp,
};
