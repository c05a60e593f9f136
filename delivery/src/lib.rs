//! Adaptive delivery: bandwidth estimation, quality tiers and variant
//! selection.
//!
//! # Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use namecast_delivery::{BandwidthEstimator, DeliveryConfig, DeliverySelector, HttpProbe};
//! use namecast_kv::{ExpiringStore, MemoryStore, SystemClock};
//!
//! let config = DeliveryConfig::default();
//! let probe = HttpProbe::new("https://cdn.example.com/probe-100k.bin", config.probe_timeout())?;
//! let cache = ExpiringStore::new(Arc::new(MemoryStore::new()), Arc::new(SystemClock));
//! let estimator = BandwidthEstimator::new(Arc::new(probe), cache, &config);
//!
//! let sample = estimator.estimate("session-1", None).await;
//! let delivery = DeliverySelector::new().select("videos/base-video.mp4", sample.tier).await;
//! ```

mod config;
mod error;
mod estimator;
mod hint;
mod probe;
mod tier;
mod variant;

pub use config::{DEFAULT_CACHE_TTL, DEFAULT_PROBE_TIMEOUT, DeliveryConfig};
pub use error::{DeliveryError, Result};
pub use estimator::{
    BandwidthEstimator, BandwidthSample, DEFAULT_SPEED_MBPS, DEFAULT_TIER, EstimateState,
    SampleSource,
};
pub use hint::{ConnectionClass, NetworkHint};
pub use probe::{
    BandwidthProbe, HttpProbe, MIN_PROBE_MBPS, ProbeMeasurement, REFERENCE_PAYLOAD_BYTES,
};
pub use tier::{QualityTier, SAFETY_MARGIN, select_tier};
pub use variant::{
    Delivery, DeliverySelector, HttpVariantProber, VariantProber, resolve_variant,
};
