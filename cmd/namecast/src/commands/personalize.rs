//! Personalization command: one prospect or a batch file.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use clap::Args;
use namecast_cli::{extension_for_mime, load_document, load_recording};
use namecast_personalize::{
    CompositeJob, CompositePolicy, Detection, Personalizer, Prospect, ProviderError, Recording,
    SpliceInstruction, Transcriber, Transcript,
};
use serde::Serialize;

use super::{
    create_transcriber, create_voice, get_context, open_span_store, output_bytes, output_result,
    print_success, resolve_voice_id,
};
use crate::Cli;

/// Synthesize and plan splices for one or many prospects
#[derive(Args)]
pub struct PersonalizeCommand {
    /// Project whose stored span is used
    #[arg(long)]
    project: String,

    /// Prospect first name
    #[arg(long, conflicts_with = "prospects", required_unless_present = "prospects")]
    name: Option<String>,

    /// Prospect ID for --name
    #[arg(long, default_value = "prospect", requires = "name")]
    prospect_id: String,

    /// YAML or JSON file with a list of {id, firstName}
    #[arg(long)]
    prospects: Option<String>,

    /// Voice ID (default: the context's default voice)
    #[arg(long)]
    voice: Option<String>,

    /// Run detection on this recording first and store its span
    #[arg(long)]
    recording: Option<String>,

    /// Directory to write synthesized clips into
    #[arg(long)]
    out_dir: Option<String>,

    /// Base media reference; emits a compositor job per prospect
    #[arg(long)]
    base_media: Option<String>,

    /// How the compositor fits the clip into the window
    #[arg(long, default_value = "stretch", requires = "base_media")]
    policy: CompositePolicy,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ProspectOutput {
    prospect_id: String,
    ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    clip_duration: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    drift: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    instruction: Option<SpliceInstruction>,
    #[serde(skip_serializing_if = "Option::is_none")]
    clip_file: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    composite_job: Option<CompositeJob>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

/// Stands in when the context has no transcription provider; only
/// `--recording` needs one.
struct NoTranscriber;

#[async_trait]
impl Transcriber for NoTranscriber {
    async fn transcribe(&self, _recording: &Recording) -> Result<Transcript, ProviderError> {
        Err(ProviderError::rejected("context has no transcription provider configured"))
    }
}

impl PersonalizeCommand {
    pub async fn run(&self, cli: &Cli) -> anyhow::Result<()> {
        let ctx = get_context(cli)?;
        let config = ctx.personalize_config();

        let transcriber: Arc<dyn Transcriber> = if self.recording.is_some() {
            Arc::new(create_transcriber(&ctx, &config.placeholder)?)
        } else {
            Arc::new(NoTranscriber)
        };
        let voice = Arc::new(create_voice(&ctx)?);
        let personalizer = Personalizer::new(transcriber, voice.clone(), open_span_store(cli)?, config)
            .with_voice_library(voice);

        if let Some(path) = &self.recording {
            let recording = load_recording(path, None)?;
            let detection = personalizer.setup_project(&self.project, &recording).await?;
            if let Detection::NotFound { .. } = detection {
                anyhow::bail!(detection.user_message(&personalizer.config().placeholder));
            }
            print_success(&format!("Placeholder located for project '{}'", self.project));
        }

        let voice_id = resolve_voice_id(self.voice.as_deref(), &ctx)?;
        let profile = personalizer.resolve_voice(&voice_id).await?;

        let prospects: Vec<Prospect> = match (&self.prospects, &self.name) {
            (Some(path), _) => load_document(path)?,
            (None, Some(name)) => vec![Prospect::new(&self.prospect_id, name)],
            (None, None) => anyhow::bail!("either --name or --prospects is required"),
        };

        let items = personalizer
            .personalize_batch(&self.project, &prospects, &profile)
            .await?;

        if let Some(dir) = &self.out_dir {
            std::fs::create_dir_all(dir)?;
        }

        let mut outputs = Vec::with_capacity(items.len());
        for item in &items {
            let output = match &item.result {
                Ok(p) => {
                    let clip_file = match &self.out_dir {
                        Some(dir) => {
                            let path = clip_path(dir, &p.prospect_id, &p.clip.mime_type);
                            let path = path.to_string_lossy().into_owned();
                            output_bytes(&p.clip.audio, &path)?;
                            Some(path)
                        }
                        None => None,
                    };
                    let composite_job = self.base_media.as_deref().map(|base| {
                        let clip_ref = clip_file
                            .clone()
                            .or_else(|| p.clip.audio_url.clone())
                            .unwrap_or_else(|| p.prospect_id.clone());
                        Personalizer::composite_job(base, &clip_ref, &p.plan, self.policy)
                    });
                    ProspectOutput {
                        prospect_id: p.prospect_id.clone(),
                        ok: true,
                        clip_duration: Some(p.clip.duration),
                        drift: Some(p.plan.drift()),
                        instruction: Some(p.plan.instruction),
                        clip_file,
                        composite_job,
                        error: None,
                    }
                }
                Err(e) => ProspectOutput {
                    prospect_id: item.prospect_id.clone(),
                    ok: false,
                    clip_duration: None,
                    drift: None,
                    instruction: None,
                    clip_file: None,
                    composite_job: None,
                    error: Some(e.to_string()),
                },
            };
            outputs.push(output);
        }

        let failed = outputs.iter().filter(|o| !o.ok).count();
        if failed == 0 {
            print_success(&format!("Personalized {} prospect(s)", outputs.len()));
        } else {
            eprintln!("{} of {} prospect(s) failed", failed, outputs.len());
        }

        output_result(&outputs, cli.json)
    }
}

/// File path for a prospect's clip. Ids that need sanitizing get a hash of
/// the raw id appended, so distinct ids never share a file.
fn clip_path(dir: &str, prospect_id: &str, mime_type: &str) -> PathBuf {
    let safe: String = prospect_id
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
        .collect();
    let stem = if safe == prospect_id {
        safe
    } else {
        format!("{}-{:08x}", safe, fnv1a(prospect_id.as_bytes()))
    };
    Path::new(dir).join(format!("{}.{}", stem, extension_for_mime(mime_type)))
}

/// 32-bit FNV-1a; stable across runs and platforms.
fn fnv1a(data: &[u8]) -> u32 {
    data.iter().fold(0x811c_9dc5, |hash, &b| (hash ^ u32::from(b)).wrapping_mul(0x0100_0193))
}
