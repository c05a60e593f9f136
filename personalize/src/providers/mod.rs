//! Backend adapters for the pipeline's provider traits.

mod elevenlabs;
mod whisper;

pub use elevenlabs::ElevenLabsVoice;
pub use whisper::WhisperTranscriber;
