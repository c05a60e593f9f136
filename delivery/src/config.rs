use std::time::Duration;

use serde::{Deserialize, Serialize};

/// How long a resolved bandwidth sample stays valid.
pub const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(30 * 60);

/// Upper bound for one probe download.
pub const DEFAULT_PROBE_TIMEOUT: Duration = Duration::from_secs(10);

/// Bandwidth estimation and variant selection settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DeliveryConfig {
    /// Reference payload for timed downloads (~100 KB).
    pub probe_url: Option<String>,
    pub probe_timeout_ms: u64,
    pub cache_ttl_secs: u64,
    /// HEAD-check variants before handing them out.
    pub verify_variants: bool,
}

impl Default for DeliveryConfig {
    fn default() -> Self {
        Self {
            probe_url: None,
            probe_timeout_ms: DEFAULT_PROBE_TIMEOUT.as_millis() as u64,
            cache_ttl_secs: DEFAULT_CACHE_TTL.as_secs(),
            verify_variants: false,
        }
    }
}

impl DeliveryConfig {
    pub fn probe_timeout(&self) -> Duration {
        Duration::from_millis(self.probe_timeout_ms)
    }

    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_secs)
    }
}
