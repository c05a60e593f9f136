//! Variant selection command.

use std::sync::Arc;

use clap::Args;
use namecast_delivery::{Delivery, DeliverySelector, HttpVariantProber, QualityTier, SampleSource};
use serde::Serialize;

use super::quality::{EstimateArgs, estimate};
use super::{get_context_or_default, output_result};
use crate::Cli;

/// Resolve the media variant to stream
#[derive(Args)]
pub struct VariantCommand {
    /// Base media reference (URL or path)
    base: String,

    /// Quality tier (360p, 480p, 720p, 1080p); estimated when omitted
    #[arg(long)]
    tier: Option<QualityTier>,

    /// HEAD-check the variant and fall back to the base if missing
    #[arg(long)]
    verify: bool,

    #[command(flatten)]
    estimate: EstimateArgs,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct VariantOutput {
    #[serde(flatten)]
    delivery: Delivery,
    #[serde(skip_serializing_if = "Option::is_none")]
    speed_mbps: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    source: Option<SampleSource>,
}

impl VariantCommand {
    pub async fn run(&self, cli: &Cli) -> anyhow::Result<()> {
        let config = get_context_or_default(cli)?.delivery_config();

        let (tier, speed_mbps, source) = match self.tier {
            Some(tier) => (tier, None, None),
            None => {
                let sample = estimate(&self.estimate, &config).await?;
                (sample.tier, Some(sample.speed_mbps), Some(sample.source))
            }
        };

        let selector = if self.verify || config.verify_variants {
            DeliverySelector::verified(Arc::new(HttpVariantProber::new(config.probe_timeout())?))
        } else {
            DeliverySelector::new()
        };
        let delivery = selector.select(&self.base, tier).await;

        let output = VariantOutput {
            delivery,
            speed_mbps,
            source,
        };
        output_result(&output, cli.json)
    }
}
