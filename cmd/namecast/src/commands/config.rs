//! Config commands.

use clap::{Args, Subcommand};
use namecast_cli::{Context, ProviderCredentials};

use super::{get_config, print_success};
use crate::Cli;

/// Manage CLI configuration
#[derive(Args)]
pub struct ConfigCommand {
    #[command(subcommand)]
    command: ConfigSubcommand,
}

#[derive(Subcommand)]
enum ConfigSubcommand {
    /// Add or replace a context
    #[command(name = "add-context")]
    AddContext {
        /// Context name
        name: String,

        /// API key for the transcription provider
        #[arg(long)]
        transcription_api_key: Option<String>,

        /// Base URL for the transcription provider
        #[arg(long)]
        transcription_base_url: Option<String>,

        /// API key for the synthesis provider
        #[arg(long)]
        synthesis_api_key: Option<String>,

        /// Base URL for the synthesis provider
        #[arg(long)]
        synthesis_base_url: Option<String>,

        /// Request timeout in seconds
        #[arg(long)]
        timeout: Option<u64>,

        /// Maximum attempts for provider calls
        #[arg(long)]
        max_retries: Option<u32>,

        /// Voice used when a command does not name one
        #[arg(long)]
        default_voice: Option<String>,
    },

    /// Delete a context
    #[command(name = "delete-context")]
    DeleteContext {
        /// Context name
        name: String,
    },

    /// Set the current context
    #[command(name = "use-context")]
    UseContext {
        /// Context name
        name: String,
    },

    /// Show the current context name
    #[command(name = "get-context")]
    GetContext,

    /// List all contexts
    #[command(name = "list-contexts")]
    ListContexts,

    /// Show a context's configuration (API keys masked)
    View {
        /// Context name (default: current)
        name: Option<String>,
    },
}

fn credentials(api_key: &Option<String>, base_url: &Option<String>) -> Option<ProviderCredentials> {
    api_key.as_ref().map(|key| ProviderCredentials {
        api_key: key.clone(),
        base_url: base_url.clone().unwrap_or_default(),
        model: String::new(),
    })
}

impl ConfigCommand {
    pub async fn run(&self, cli: &Cli) -> anyhow::Result<()> {
        let mut cfg = get_config(cli)?;

        match &self.command {
            ConfigSubcommand::AddContext {
                name,
                transcription_api_key,
                transcription_base_url,
                synthesis_api_key,
                synthesis_base_url,
                timeout,
                max_retries,
                default_voice,
            } => {
                let ctx = Context {
                    transcription: credentials(transcription_api_key, transcription_base_url),
                    synthesis: credentials(synthesis_api_key, synthesis_base_url),
                    timeout: timeout.unwrap_or(0),
                    max_retries: max_retries.unwrap_or(0),
                    default_voice: default_voice.clone().unwrap_or_default(),
                    ..Default::default()
                };
                cfg.add_context(name, ctx)?;
                print_success(&format!("Context '{}' added", name));

                if cfg.current_context.is_empty() {
                    cfg.use_context(name)?;
                    print_success(&format!("Switched to context '{}'", name));
                }
            }

            ConfigSubcommand::DeleteContext { name } => {
                cfg.delete_context(name)?;
                print_success(&format!("Context '{}' deleted", name));
            }

            ConfigSubcommand::UseContext { name } => {
                cfg.use_context(name)?;
                print_success(&format!("Switched to context '{}'", name));
            }

            ConfigSubcommand::GetContext => {
                if cfg.current_context.is_empty() {
                    println!("No current context set");
                } else {
                    println!("{}", cfg.current_context);
                }
            }

            ConfigSubcommand::ListContexts => {
                let names = cfg.list_contexts();
                if names.is_empty() {
                    println!("No contexts configured");
                    return Ok(());
                }
                for name in names {
                    let marker = if name == cfg.current_context { "*" } else { " " };
                    println!("{} {}", marker, name);
                }
            }

            ConfigSubcommand::View { name } => {
                let ctx = match cfg.resolve_context(name.as_deref()) {
                    Some(ctx) => ctx,
                    None => anyhow::bail!("context not found"),
                };
                let rendered = if cli.json {
                    serde_json::to_string_pretty(&ctx.masked())?
                } else {
                    serde_yaml::to_string(&ctx.masked())?
                };
                println!("{}", rendered);
            }
        }

        Ok(())
    }
}
