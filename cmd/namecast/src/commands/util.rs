//! Utility functions for CLI commands.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use namecast_cli::paths::SPANS_DB_FILE;
use namecast_cli::{Config, Context, Output, OutputFormat, Paths, ProviderCredentials, load_config};
use namecast_elevenlabs as elevenlabs;
use namecast_kv::RedbStore;
use namecast_personalize::SpanStore;
use namecast_personalize::providers::{ElevenLabsVoice, WhisperTranscriber};
use namecast_whisper as whisper;

use crate::Cli;

pub const APP_NAME: &str = "namecast";

/// Gets the global configuration.
pub fn get_config(cli: &Cli) -> anyhow::Result<Config> {
    load_config(APP_NAME, cli.config.as_deref())
}

/// Gets the context configuration to use.
pub fn get_context(cli: &Cli) -> anyhow::Result<Context> {
    let cfg = get_config(cli)?;

    match cfg.resolve_context(cli.context.as_deref()) {
        Some(ctx) => Ok(ctx.clone()),
        None => match cli.context.as_deref() {
            Some(name) => anyhow::bail!("context '{}' not found", name),
            None => anyhow::bail!(
                "no context specified. Use -c flag or set a default context with 'namecast config use-context'"
            ),
        },
    }
}

/// Context if one resolves, otherwise defaults. For commands that work
/// without credentials.
pub fn get_context_or_default(cli: &Cli) -> anyhow::Result<Context> {
    let cfg = get_config(cli)?;
    Ok(cfg.resolve_context(cli.context.as_deref()).cloned().unwrap_or_default())
}

fn timeout(ctx: &Context) -> Option<Duration> {
    (ctx.timeout > 0).then(|| Duration::from_secs(ctx.timeout))
}

fn credentials<'a>(
    creds: &'a Option<ProviderCredentials>,
    section: &str,
    ctx: &Context,
) -> anyhow::Result<&'a ProviderCredentials> {
    creds
        .as_ref()
        .filter(|c| !c.api_key.is_empty())
        .ok_or_else(|| anyhow::anyhow!("context '{}' has no {} api key", ctx.name, section))
}

/// Transcription adapter from context configuration.
pub fn create_transcriber(ctx: &Context, placeholder: &str) -> anyhow::Result<WhisperTranscriber> {
    let creds = credentials(&ctx.transcription, "transcription", ctx)?;
    let mut builder = whisper::Client::builder(&creds.api_key);
    if !creds.base_url.is_empty() {
        builder = builder.base_url(&creds.base_url);
    }
    if let Some(t) = timeout(ctx) {
        builder = builder.timeout(t);
    }

    let mut transcriber = WhisperTranscriber::new(Arc::new(builder.build()?)).with_prompt(placeholder);
    if !creds.model.is_empty() {
        transcriber = transcriber.with_model(&creds.model);
    }
    Ok(transcriber)
}

/// Synthesis and cloning adapter from context configuration.
pub fn create_voice(ctx: &Context) -> anyhow::Result<ElevenLabsVoice> {
    let creds = credentials(&ctx.synthesis, "synthesis", ctx)?;
    let mut builder = elevenlabs::Client::builder(&creds.api_key);
    if !creds.base_url.is_empty() {
        builder = builder.base_url(&creds.base_url);
    }
    if let Some(t) = timeout(ctx) {
        builder = builder.timeout(t);
    }

    let mut voice = ElevenLabsVoice::new(Arc::new(builder.build()?));
    if !creds.model.is_empty() {
        voice = voice.with_model(&creds.model);
    }
    Ok(voice)
}

/// Voice id from the flag, falling back to the context default.
pub fn resolve_voice_id(flag: Option<&str>, ctx: &Context) -> anyhow::Result<String> {
    match flag {
        Some(v) if !v.is_empty() => Ok(v.to_string()),
        _ if !ctx.default_voice.is_empty() => Ok(ctx.default_voice.clone()),
        _ => anyhow::bail!("no voice given; pass --voice or set default_voice on the context"),
    }
}

/// Location of the span database. Sits next to a custom config file when
/// one is given.
pub fn spans_db_path(cli: &Cli) -> anyhow::Result<PathBuf> {
    match cli.config.as_deref() {
        Some(path) => Ok(Path::new(path)
            .parent()
            .unwrap_or_else(|| Path::new("."))
            .join("data")
            .join(SPANS_DB_FILE)),
        None => Ok(Paths::new(APP_NAME)?.spans_db()),
    }
}

/// Opens the persistent span store.
pub fn open_span_store(cli: &Cli) -> anyhow::Result<SpanStore> {
    let path = spans_db_path(cli)?;
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    Ok(SpanStore::new(Arc::new(RedbStore::open(&path)?)))
}

/// Outputs result as JSON or YAML on stdout.
pub fn output_result<T: serde::Serialize>(result: &T, as_json: bool) -> anyhow::Result<()> {
    let format = if as_json {
        OutputFormat::Json
    } else {
        OutputFormat::Yaml
    };
    Output::new(format, None).write(result)
}

/// Outputs binary data to a file.
pub fn output_bytes(data: &[u8], output_path: &str) -> anyhow::Result<()> {
    Output::new(OutputFormat::default(), None).write_binary(data, output_path)
}

/// Prints success message.
pub fn print_success(msg: &str) {
    eprintln!("\x1b[32m✓\x1b[0m {}", msg);
}

/// Formats bytes to human readable string.
pub fn format_bytes(bytes: usize) -> String {
    const KB: usize = 1024;
    const MB: usize = KB * 1024;

    if bytes >= MB {
        format!("{:.2} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.2} KB", bytes as f64 / KB as f64)
    } else {
        format!("{} B", bytes)
    }
}
