//! Variant URL resolution and selection.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::Serialize;
use tracing::{debug, warn};
use url::Url;

use crate::error::Result;
use crate::tier::QualityTier;

/// Rewrites `base` to name the rendition for `tier`:
/// `{path without extension}_{tier}.{ext}`.
///
/// Query strings and fragments are kept after the rewritten path. A path
/// without an extension gets the suffix appended.
pub fn resolve_variant(base: &str, tier: QualityTier) -> String {
    if let Ok(mut url) = Url::parse(base) {
        if url.has_host() {
            let path = suffix_path(url.path(), tier);
            url.set_path(&path);
            return url.to_string();
        }
    }

    let split = base.find(['?', '#']).unwrap_or(base.len());
    let (path, rest) = base.split_at(split);
    format!("{}{}", suffix_path(path, tier), rest)
}

fn suffix_path(path: &str, tier: QualityTier) -> String {
    let name_start = path.rfind('/').map(|i| i + 1).unwrap_or(0);
    let ext_dot = path[name_start..]
        .rfind('.')
        .filter(|&i| i > 0)
        .map(|i| name_start + i);
    match ext_dot {
        Some(dot) => format!("{}_{}{}", &path[..dot], tier, &path[dot..]),
        None => format!("{}_{}", path, tier),
    }
}

/// Checks whether a variant actually exists.
#[async_trait]
pub trait VariantProber: Send + Sync {
    async fn exists(&self, url: &str) -> Result<bool>;
}

/// [`VariantProber`] issuing HTTP `HEAD` requests.
pub struct HttpVariantProber {
    client: reqwest::Client,
}

impl HttpVariantProber {
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self { client })
    }
}

#[async_trait]
impl VariantProber for HttpVariantProber {
    async fn exists(&self, url: &str) -> Result<bool> {
        let resp = self.client.head(url).send().await?;
        debug!(url, status = resp.status().as_u16(), "variant probe");
        Ok(resp.status().is_success())
    }
}

/// The media reference a client should stream.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Delivery {
    pub url: String,
    /// Tier of `url`; `None` when falling back to the base reference.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tier: Option<QualityTier>,
    pub fell_back: bool,
}

/// Picks the variant for a tier, optionally verifying it exists.
pub struct DeliverySelector {
    prober: Option<Arc<dyn VariantProber>>,
}

impl DeliverySelector {
    /// A selector that trusts the naming convention.
    pub fn new() -> Self {
        Self { prober: None }
    }

    /// A selector that checks each variant and falls back to the base
    /// reference when the check fails.
    pub fn verified(prober: Arc<dyn VariantProber>) -> Self {
        Self {
            prober: Some(prober),
        }
    }

    pub async fn select(&self, base: &str, tier: QualityTier) -> Delivery {
        let url = resolve_variant(base, tier);
        let Some(prober) = &self.prober else {
            return Delivery {
                url,
                tier: Some(tier),
                fell_back: false,
            };
        };

        match prober.exists(&url).await {
            Ok(true) => Delivery {
                url,
                tier: Some(tier),
                fell_back: false,
            },
            Ok(false) => {
                warn!(variant = %url, "variant missing, serving base reference");
                self.fallback(base)
            }
            Err(e) => {
                warn!(variant = %url, error = %e, "variant check failed, serving base reference");
                self.fallback(base)
            }
        }
    }

    fn fallback(&self, base: &str) -> Delivery {
        Delivery {
            url: base.to_string(),
            tier: None,
            fell_back: true,
        }
    }
}

impl Default for DeliverySelector {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::DeliveryError;
    use crate::probe::tests::serve;

    #[test]
    fn test_resolve_variant() {
        assert_eq!(
            resolve_variant("videos/base-video.mp4", QualityTier::P480),
            "videos/base-video_480p.mp4"
        );
        assert_eq!(
            resolve_variant("videos/v1.2/intro.webm?sig=abc#t=5", QualityTier::P1080),
            "videos/v1.2/intro_1080p.webm?sig=abc#t=5"
        );
        assert_eq!(resolve_variant("videos/master", QualityTier::P360), "videos/master_360p");
        assert_eq!(resolve_variant(".hidden", QualityTier::P360), ".hidden_360p");
        assert_eq!(
            resolve_variant("https://cdn.example.com/v/base.mp4?token=x", QualityTier::P720),
            "https://cdn.example.com/v/base_720p.mp4?token=x"
        );
    }

    #[test]
    fn test_resolve_variant_every_tier() {
        for tier in QualityTier::ALL {
            let url = resolve_variant("a/b.mp4", tier);
            assert_eq!(url, format!("a/b_{}.mp4", tier.as_str()));
        }
    }

    struct FixedProber(Option<bool>);

    #[async_trait]
    impl VariantProber for FixedProber {
        async fn exists(&self, _url: &str) -> Result<bool> {
            self.0.ok_or_else(|| DeliveryError::Probe("unreachable".into()))
        }
    }

    #[tokio::test]
    async fn test_selector_fallback() {
        let base = "videos/base-video.mp4";

        let plain = DeliverySelector::new().select(base, QualityTier::P720).await;
        assert_eq!(plain.url, "videos/base-video_720p.mp4");
        assert!(!plain.fell_back);

        let ok = DeliverySelector::verified(Arc::new(FixedProber(Some(true))))
            .select(base, QualityTier::P720)
            .await;
        assert_eq!(ok.tier, Some(QualityTier::P720));

        for prober in [FixedProber(Some(false)), FixedProber(None)] {
            let d = DeliverySelector::verified(Arc::new(prober))
                .select(base, QualityTier::P720)
                .await;
            assert_eq!(
                d,
                Delivery {
                    url: base.to_string(),
                    tier: None,
                    fell_back: true
                }
            );
        }
    }

    #[tokio::test]
    async fn test_http_variant_prober() {
        let found = serve("200 OK", b"ignored".to_vec()).await;
        let missing = serve("404 Not Found", Vec::new()).await;
        let prober = HttpVariantProber::new(Duration::from_secs(5)).unwrap();
        assert!(prober.exists(&format!("{}/a_480p.mp4", found)).await.unwrap());
        assert!(!prober.exists(&format!("{}/a_480p.mp4", missing)).await.unwrap());
    }
}
