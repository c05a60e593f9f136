//! Name synthesis command.

use std::sync::Arc;

use clap::Args;
use namecast_cli::extension_for_mime;
use namecast_personalize::retry::retry;
use namecast_personalize::{SynthesisEngine, VoiceProfile};
use serde::Serialize;

use super::{
    create_voice, format_bytes, get_context, output_bytes, output_result, print_success,
    resolve_voice_id,
};
use crate::Cli;

/// Speak a name in a cloned voice
#[derive(Args)]
pub struct SynthesizeCommand {
    /// Name to speak
    text: String,

    /// Voice ID (default: the context's default voice)
    #[arg(long)]
    voice: Option<String>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct SynthesizeOutput {
    voice_id: String,
    duration: f64,
    mime_type: String,
    size: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    audio_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    output_file: Option<String>,
}

impl SynthesizeCommand {
    pub async fn run(&self, cli: &Cli) -> anyhow::Result<()> {
        let ctx = get_context(cli)?;
        let config = ctx.personalize_config();
        let voice_id = resolve_voice_id(self.voice.as_deref(), &ctx)?;
        let voice = VoiceProfile::new(voice_id);

        let engine = SynthesisEngine::from_config(Arc::new(create_voice(&ctx)?), &config);
        let clip = retry(&config.retry, || engine.synthesize(&self.text, &voice, &config.style)).await?;

        let output_file = match &cli.output {
            Some(path) => {
                output_bytes(&clip.audio, path)?;
                print_success(&format!(
                    "Audio saved to {} ({}, {:.2}s)",
                    path,
                    format_bytes(clip.audio.len()),
                    clip.duration
                ));
                Some(path.clone())
            }
            None => {
                eprintln!(
                    "No -o given; audio not saved (use -o name.{})",
                    extension_for_mime(&clip.mime_type)
                );
                None
            }
        };

        let output = SynthesizeOutput {
            voice_id: clip.voice_id.clone(),
            duration: clip.duration,
            mime_type: clip.mime_type.clone(),
            size: clip.audio.len(),
            audio_url: clip.audio_url.clone(),
            output_file,
        };
        output_result(&output, cli.json)
    }
}
