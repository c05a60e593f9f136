//! Bandwidth estimation command.

use std::sync::Arc;

use async_trait::async_trait;
use clap::Args;
use namecast_delivery::{
    BandwidthEstimator, BandwidthProbe, BandwidthSample, ConnectionClass, DeliveryConfig,
    DeliveryError, HttpProbe, NetworkHint, ProbeMeasurement,
};
use namecast_kv::{ExpiringStore, MemoryStore, SystemClock};

use super::{get_context_or_default, output_result};
use crate::Cli;

/// Network inputs shared by `quality` and `variant`.
#[derive(Args)]
pub struct EstimateArgs {
    /// Client session key
    #[arg(long, default_value = "cli")]
    session: String,

    /// Platform connection class (slow-2g, 2g, 3g, 4g)
    #[arg(long)]
    effective_type: Option<ConnectionClass>,

    /// Platform downlink estimate in Mbps
    #[arg(long)]
    downlink: Option<f64>,

    /// Reference payload to time (overrides the context's probe_url)
    #[arg(long)]
    probe_url: Option<String>,
}

impl EstimateArgs {
    fn hint(&self) -> Option<NetworkHint> {
        if self.effective_type.is_none() && self.downlink.is_none() {
            return None;
        }
        Some(NetworkHint::new(self.effective_type, self.downlink))
    }
}

/// Probe used when no reference URL is configured; the estimator then falls
/// back to its default sample.
struct NoProbe;

#[async_trait]
impl BandwidthProbe for NoProbe {
    async fn measure(&self) -> namecast_delivery::Result<ProbeMeasurement> {
        Err(DeliveryError::Probe("no probe url configured".to_string()))
    }
}

/// Runs one estimate for the given arguments.
pub(crate) async fn estimate(
    args: &EstimateArgs,
    config: &DeliveryConfig,
) -> anyhow::Result<BandwidthSample> {
    let probe: Arc<dyn BandwidthProbe> = match args.probe_url.as_ref().or(config.probe_url.as_ref()) {
        Some(url) => Arc::new(HttpProbe::new(url, config.probe_timeout())?),
        None => Arc::new(NoProbe),
    };
    let cache = ExpiringStore::new(Arc::new(MemoryStore::new()), Arc::new(SystemClock));
    let estimator = BandwidthEstimator::new(probe, cache, config);

    let hint = args.hint();
    Ok(estimator.estimate(&args.session, hint.as_ref()).await)
}

/// Estimate bandwidth and pick a quality tier
#[derive(Args)]
pub struct QualityCommand {
    #[command(flatten)]
    estimate: EstimateArgs,
}

impl QualityCommand {
    pub async fn run(&self, cli: &Cli) -> anyhow::Result<()> {
        let config = get_context_or_default(cli)?.delivery_config();
        let sample = estimate(&self.estimate, &config).await?;
        output_result(&sample, cli.json)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use namecast_delivery::{QualityTier, SampleSource};

    fn args(effective_type: Option<ConnectionClass>, downlink: Option<f64>) -> EstimateArgs {
        EstimateArgs {
            session: "test".to_string(),
            effective_type,
            downlink,
            probe_url: None,
        }
    }

    #[tokio::test]
    async fn test_hint_drives_estimate() {
        let sample = estimate(&args(Some(ConnectionClass::G4), Some(10.0)), &DeliveryConfig::default())
            .await
            .unwrap();
        assert_eq!(sample.source, SampleSource::Hint);
        assert_eq!(sample.tier, QualityTier::P1080);
    }

    #[tokio::test]
    async fn test_no_probe_falls_back() {
        let sample = estimate(&args(None, None), &DeliveryConfig::default())
            .await
            .unwrap();
        assert_eq!(sample.source, SampleSource::Default);
        assert_eq!(sample.tier, QualityTier::P480);
    }
}
