//! Placeholder detection command.

use std::sync::Arc;

use clap::Args;
use namecast_cli::load_recording;
use namecast_personalize::retry::retry;
use namecast_personalize::{Detection, DetectionReport, Detector};
use serde::Serialize;

use super::{create_transcriber, get_context, open_span_store, output_result, print_success};
use crate::Cli;

/// Locate the placeholder word in a recording
#[derive(Args)]
pub struct DetectCommand {
    /// Video or audio file
    file: String,

    /// Media type (default: inferred from the extension)
    #[arg(long)]
    media_type: Option<String>,

    /// Store the span for this project
    #[arg(long)]
    project: Option<String>,

    /// Only store if the project's span is still at this version (0 = none stored)
    #[arg(long, requires = "project")]
    if_version: Option<u64>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct DetectOutput {
    #[serde(flatten)]
    report: DetectionReport,
    #[serde(skip_serializing_if = "Option::is_none")]
    project_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    version: Option<u64>,
}

impl DetectCommand {
    pub async fn run(&self, cli: &Cli) -> anyhow::Result<()> {
        let ctx = get_context(cli)?;
        let config = ctx.personalize_config();
        let recording = load_recording(&self.file, self.media_type.as_deref())?;

        let transcriber = create_transcriber(&ctx, &config.placeholder)?;
        let detector = Detector::from_config(Arc::new(transcriber), &config);
        let detection = retry(&config.retry, || detector.detect_placeholder(&recording)).await?;

        let mut version = None;
        match (&detection, &self.project) {
            (Detection::Found(span), Some(project)) => {
                let spans = open_span_store(cli)?;
                let stored = match self.if_version {
                    Some(0) => spans.put_if_version(project, None, *span)?,
                    Some(v) => spans.put_if_version(project, Some(v), *span)?,
                    None => spans.put(project, *span)?,
                };
                print_success(&format!(
                    "Span stored for project '{}' (version {})",
                    project, stored.version
                ));
                version = Some(stored.version);
            }
            (Detection::NotFound { .. }, project) => {
                if let (Some(project), None) = (project, self.if_version) {
                    open_span_store(cli)?.clear(project)?;
                    eprintln!("Cleared stored span for project '{}'", project);
                }
                eprintln!("{}", detection.user_message(detector.placeholder()));
            }
            (Detection::Found(_), None) => {}
        }

        let output = DetectOutput {
            report: DetectionReport::from(&detection),
            project_id: self.project.clone(),
            version,
        };
        output_result(&output, cli.json)
    }
}
