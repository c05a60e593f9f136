//! namecast CLI - personalize recorded videos with a prospect's name.

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod commands;

use commands::{
    ConfigCommand, DetectCommand, PersonalizeCommand, PlanCommand, QualityCommand,
    SynthesizeCommand, VariantCommand, VoiceCommand,
};

/// namecast CLI - personalize recorded videos with a prospect's name.
///
/// This tool covers the whole personalization pipeline:
///   - Placeholder detection in a source recording
///   - Voice cloning and name synthesis
///   - Splice planning for the compositor
///   - Bandwidth estimation and variant selection for playback
///
/// Configuration is stored in ~/.namecast/namecast/ and supports multiple
/// contexts, similar to kubectl's context management.
#[derive(Parser)]
#[command(name = "namecast")]
#[command(about = "Audio personalization and adaptive delivery")]
#[command(version)]
pub struct Cli {
    /// Config file (default is ~/.namecast/namecast/config.yaml)
    #[arg(long, global = true)]
    pub config: Option<String>,

    /// Context name to use
    #[arg(short = 'c', long, global = true)]
    pub context: Option<String>,

    /// Output file for audio (default: none)
    #[arg(short = 'o', long, global = true)]
    pub output: Option<String>,

    /// Output as JSON (for piping)
    #[arg(long, global = true)]
    pub json: bool,

    /// Verbose output (debug logging on stderr)
    #[arg(short = 'v', long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Manage CLI configuration
    Config(ConfigCommand),
    /// Locate the placeholder word in a recording
    Detect(DetectCommand),
    /// Clone and inspect voices
    Voice(VoiceCommand),
    /// Speak a name in a cloned voice
    Synthesize(SynthesizeCommand),
    /// Synthesize and plan splices for one or many prospects
    Personalize(PersonalizeCommand),
    /// Compute a splice instruction
    Plan(PlanCommand),
    /// Estimate bandwidth and pick a quality tier
    Quality(QualityCommand),
    /// Resolve the media variant to stream
    Variant(VariantCommand),
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    match &cli.command {
        Commands::Config(cmd) => cmd.run(&cli).await,
        Commands::Detect(cmd) => cmd.run(&cli).await,
        Commands::Voice(cmd) => cmd.run(&cli).await,
        Commands::Synthesize(cmd) => cmd.run(&cli).await,
        Commands::Personalize(cmd) => cmd.run(&cli).await,
        Commands::Plan(cmd) => cmd.run(&cli).await,
        Commands::Quality(cmd) => cmd.run(&cli).await,
        Commands::Variant(cmd) => cmd.run(&cli).await,
    }
}
