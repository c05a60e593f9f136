//! Quality tiers and bandwidth-to-tier mapping.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::DeliveryError;

/// Fraction of the measured bandwidth a tier may consume.
pub const SAFETY_MARGIN: f64 = 0.7;

/// Encoded renditions of a video, lowest first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum QualityTier {
    #[serde(rename = "360p")]
    P360,
    #[serde(rename = "480p")]
    P480,
    #[serde(rename = "720p")]
    P720,
    #[serde(rename = "1080p")]
    P1080,
}

impl QualityTier {
    /// Every tier, ascending.
    pub const ALL: [QualityTier; 4] = [
        QualityTier::P360,
        QualityTier::P480,
        QualityTier::P720,
        QualityTier::P1080,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            QualityTier::P360 => "360p",
            QualityTier::P480 => "480p",
            QualityTier::P720 => "720p",
            QualityTier::P1080 => "1080p",
        }
    }

    /// Minimum usable bandwidth in Mbps.
    pub fn min_mbps(&self) -> f64 {
        match self {
            QualityTier::P360 => 0.5,
            QualityTier::P480 => 1.5,
            QualityTier::P720 => 3.0,
            QualityTier::P1080 => 6.0,
        }
    }

    /// Measured bandwidth needed before this tier is chosen.
    pub fn required_mbps(&self) -> f64 {
        self.min_mbps() / SAFETY_MARGIN
    }

    /// Width and height in pixels.
    pub fn resolution(&self) -> (u32, u32) {
        match self {
            QualityTier::P360 => (640, 360),
            QualityTier::P480 => (854, 480),
            QualityTier::P720 => (1280, 720),
            QualityTier::P1080 => (1920, 1080),
        }
    }

    pub fn bitrate_kbps(&self) -> u32 {
        match self {
            QualityTier::P360 => 800,
            QualityTier::P480 => 1400,
            QualityTier::P720 => 2800,
            QualityTier::P1080 => 5000,
        }
    }

    pub fn lowest() -> Self {
        QualityTier::P360
    }
}

impl fmt::Display for QualityTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for QualityTier {
    type Err = DeliveryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        QualityTier::ALL
            .into_iter()
            .find(|t| t.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| DeliveryError::InvalidTier(s.to_string()))
    }
}

/// Highest tier whose minimum fits within [`SAFETY_MARGIN`] of `speed_mbps`,
/// or the lowest tier when none does.
pub fn select_tier(speed_mbps: f64) -> QualityTier {
    if !speed_mbps.is_finite() {
        return QualityTier::lowest();
    }
    QualityTier::ALL
        .into_iter()
        .rev()
        .find(|t| speed_mbps >= t.required_mbps())
        .unwrap_or_else(QualityTier::lowest)
}
