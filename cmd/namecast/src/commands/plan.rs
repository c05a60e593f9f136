//! Splice planning command.

use clap::Args;
use namecast_personalize::{CompositeJob, CompositePolicy, PlaceholderSpan, SpliceInstruction, SplicePlan};
use serde::Serialize;

use super::{open_span_store, output_result};
use crate::Cli;

/// Compute a splice instruction
#[derive(Args)]
pub struct PlanCommand {
    /// Placeholder start in seconds
    #[arg(long, requires = "end", conflicts_with = "project")]
    start: Option<f64>,

    /// Placeholder end in seconds
    #[arg(long, requires = "start")]
    end: Option<f64>,

    /// Use the span stored for this project
    #[arg(long, required_unless_present = "start")]
    project: Option<String>,

    /// Duration of the synthesized clip in seconds
    #[arg(long)]
    clip_duration: f64,

    /// Base media reference; emits a compositor job
    #[arg(long, requires = "clip_ref")]
    base_media: Option<String>,

    /// Clip reference for the compositor job
    #[arg(long)]
    clip_ref: Option<String>,

    /// How the compositor fits the clip into the window
    #[arg(long, default_value = "stretch")]
    policy: CompositePolicy,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct PlanOutput {
    instruction: SpliceInstruction,
    clip_duration: f64,
    drift: f64,
    stretch_ratio: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    composite_job: Option<CompositeJob>,
}

impl PlanCommand {
    pub async fn run(&self, cli: &Cli) -> anyhow::Result<()> {
        let span = match (&self.project, self.start, self.end) {
            (Some(project), _, _) => match open_span_store(cli)?.get(project)? {
                Some(stored) => stored.span,
                None => anyhow::bail!("project '{}' has no stored span; run 'namecast detect --project' first", project),
            },
            (None, Some(start), Some(end)) => PlaceholderSpan::new(start, end, 1.0),
            _ => anyhow::bail!("either --project or --start/--end is required"),
        };

        let plan = SplicePlan::new(&span, self.clip_duration)?;
        let composite_job = match (&self.base_media, &self.clip_ref) {
            (Some(base), Some(clip)) => Some(CompositeJob::new(base, clip, &plan, self.policy)),
            _ => None,
        };

        let output = PlanOutput {
            instruction: plan.instruction,
            clip_duration: plan.clip_duration,
            drift: plan.drift(),
            stretch_ratio: plan.stretch_ratio(),
            composite_job,
        };
        output_result(&output, cli.json)
    }
}
