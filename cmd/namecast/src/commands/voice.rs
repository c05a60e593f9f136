//! Voice commands.

use std::sync::Arc;

use clap::{Args, Subcommand};
use namecast_cli::load_recording;
use namecast_personalize::VoiceLibrary;
use namecast_personalize::retry::retry;

use super::{create_voice, format_bytes, get_context, output_result, print_success};
use crate::Cli;

/// Clone and inspect voices
#[derive(Args)]
pub struct VoiceCommand {
    #[command(subcommand)]
    command: VoiceSubcommand,
}

#[derive(Subcommand)]
enum VoiceSubcommand {
    /// Clone a voice from a sample recording
    Clone {
        /// Name for the new voice
        name: String,

        /// Audio or video sample of the speaker
        sample: String,

        /// Media type of the sample (default: inferred from the extension)
        #[arg(long)]
        media_type: Option<String>,
    },

    /// Look up an existing voice
    Get {
        /// Voice ID
        voice_id: String,
    },
}

impl VoiceCommand {
    pub async fn run(&self, cli: &Cli) -> anyhow::Result<()> {
        let ctx = get_context(cli)?;
        let config = ctx.personalize_config();
        let library = VoiceLibrary::from_config(Arc::new(create_voice(&ctx)?), &config);

        match &self.command {
            VoiceSubcommand::Clone {
                name,
                sample,
                media_type,
            } => {
                let recording = load_recording(sample, media_type.as_deref())?;
                eprintln!("Uploading {} sample...", format_bytes(recording.data.len()));

                let profile = retry(&config.retry, || library.clone_voice(name, &recording)).await?;
                print_success(&format!("Voice '{}' created ({})", profile.name, profile.voice_id));
                output_result(&profile, cli.json)
            }

            VoiceSubcommand::Get { voice_id } => {
                let profile = retry(&config.retry, || library.lookup(voice_id)).await?;
                output_result(&profile, cli.json)
            }
        }
    }
}
