//! Session bandwidth estimation.
//!
//! Per session key the estimator moves through
//! `Uncached -> Probing -> {Resolved, Failed}`. A resolved sample is cached
//! with an explicit expiry; a failed one yields the default sample and is not
//! cached, so the session probes again next time. The failure itself is only
//! remembered for the cache TTL. Concurrent estimates for the same session
//! share a single in-flight probe, which is abandoned once every waiter has
//! gone away.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use futures::FutureExt;
use futures::future::{BoxFuture, Shared, WeakShared};
use namecast_kv::ExpiringStore;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::config::DeliveryConfig;
use crate::error::DeliveryError;
use crate::hint::{ConnectionClass, NetworkHint};
use crate::probe::BandwidthProbe;
use crate::tier::{QualityTier, select_tier};

/// Speed assumed when nothing could be measured.
pub const DEFAULT_SPEED_MBPS: f64 = 2.0;

/// Tier served when nothing could be measured.
pub const DEFAULT_TIER: QualityTier = QualityTier::P480;

const CACHE_PREFIX: &str = "bandwidth:";
const FAILED_PREFIX: &str = "bandwidth-failed:";

/// Where a sample came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SampleSource {
    Hint,
    Probe,
    Default,
}

/// A session's bandwidth reading and the tier chosen for it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BandwidthSample {
    pub speed_mbps: f64,
    #[serde(rename = "tierChosen")]
    pub tier: QualityTier,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub connection_type_hint: Option<ConnectionClass>,
    pub source: SampleSource,
}

impl BandwidthSample {
    /// Sample for a measured or hinted speed.
    pub fn measured(speed_mbps: f64, source: SampleSource, hint: Option<ConnectionClass>) -> Self {
        Self {
            speed_mbps,
            tier: select_tier(speed_mbps),
            connection_type_hint: hint,
            source,
        }
    }

    /// The fixed fallback sample.
    pub fn fallback() -> Self {
        Self {
            speed_mbps: DEFAULT_SPEED_MBPS,
            tier: DEFAULT_TIER,
            connection_type_hint: None,
            source: SampleSource::Default,
        }
    }
}

/// Where a session stands.
#[derive(Debug, Clone, PartialEq)]
pub enum EstimateState {
    Uncached,
    Probing,
    Resolved(BandwidthSample),
    /// The last probe failed and the default sample was handed out.
    Failed,
}

type InFlight = Shared<BoxFuture<'static, BandwidthSample>>;

struct InFlightEntry {
    id: u64,
    probe: WeakShared<BoxFuture<'static, BandwidthSample>>,
}

#[derive(Default)]
struct Sessions {
    next_id: u64,
    in_flight: HashMap<String, InFlightEntry>,
}

/// Removes its session's in-flight entry when the probe future finishes or
/// is dropped.
struct InFlightGuard {
    sessions: Arc<Mutex<Sessions>>,
    key: String,
    id: u64,
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        let mut sessions = self.sessions.lock().unwrap_or_else(PoisonError::into_inner);
        if sessions.in_flight.get(&self.key).is_some_and(|e| e.id == self.id) {
            sessions.in_flight.remove(&self.key);
        }
    }
}

/// Resolves bandwidth samples for client sessions.
#[derive(Clone)]
pub struct BandwidthEstimator {
    probe: Arc<dyn BandwidthProbe>,
    cache: ExpiringStore,
    ttl: Duration,
    probe_timeout: Duration,
    sessions: Arc<Mutex<Sessions>>,
}

impl BandwidthEstimator {
    pub fn new(probe: Arc<dyn BandwidthProbe>, cache: ExpiringStore, config: &DeliveryConfig) -> Self {
        Self {
            probe,
            cache,
            ttl: config.cache_ttl(),
            probe_timeout: config.probe_timeout(),
            sessions: Arc::new(Mutex::new(Sessions::default())),
        }
    }

    fn cache_key(session_key: &str) -> String {
        format!("{}{}", CACHE_PREFIX, session_key)
    }

    fn failed_key(session_key: &str) -> String {
        format!("{}{}", FAILED_PREFIX, session_key)
    }

    fn sessions(&self) -> MutexGuard<'_, Sessions> {
        self.sessions.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn cached(&self, session_key: &str) -> Option<BandwidthSample> {
        match self.cache.get_json(&Self::cache_key(session_key)) {
            Ok(sample) => sample,
            Err(e) => {
                warn!(session = session_key, error = %e, "bandwidth cache read failed");
                None
            }
        }
    }

    /// Current state of a session.
    pub fn state(&self, session_key: &str) -> EstimateState {
        if let Some(sample) = self.cached(session_key) {
            return EstimateState::Resolved(sample);
        }
        // Released only after the sessions lock, since the last handle runs the guard.
        let pending = {
            let sessions = self.sessions();
            sessions.in_flight.get(session_key).and_then(|e| e.probe.upgrade())
        };
        if pending.is_some() {
            return EstimateState::Probing;
        }
        match self.cache.get(&Self::failed_key(session_key)) {
            Ok(Some(_)) => EstimateState::Failed,
            Ok(None) => EstimateState::Uncached,
            Err(e) => {
                warn!(session = session_key, error = %e, "bandwidth failure marker read failed");
                EstimateState::Uncached
            }
        }
    }

    /// Drops a session's cached sample.
    pub fn invalidate(&self, session_key: &str) {
        if let Err(e) = self.cache.expire(&Self::cache_key(session_key)) {
            warn!(session = session_key, error = %e, "bandwidth cache expire failed");
        }
    }

    /// Returns the session's sample, measuring it if needed. Never fails.
    pub async fn estimate(&self, session_key: &str, hint: Option<&NetworkHint>) -> BandwidthSample {
        if let Some(sample) = self.cached(session_key) {
            debug!(session = session_key, tier = %sample.tier, "bandwidth cache hit");
            return sample;
        }

        if let Some(speed) = hint.and_then(NetworkHint::speed_mbps) {
            let class = hint.and_then(|h| h.effective_type);
            let sample = BandwidthSample::measured(speed, SampleSource::Hint, class);
            self.store(session_key, &sample);
            info!(session = session_key, speed, tier = %sample.tier, "bandwidth from platform hint");
            return sample;
        }

        self.probe_once(session_key).await
    }

    fn probe_once(&self, session_key: &str) -> InFlight {
        let mut sessions = self.sessions();
        if let Some(existing) = sessions
            .in_flight
            .get(session_key)
            .and_then(|e| e.probe.upgrade())
        {
            debug!(session = session_key, "joining in-flight bandwidth probe");
            return existing;
        }

        sessions.next_id += 1;
        let guard = InFlightGuard {
            sessions: self.sessions.clone(),
            key: session_key.to_string(),
            id: sessions.next_id,
        };
        let this = self.clone();
        let fut = async move {
            let sample = this.run_probe(&guard.key).await;
            drop(guard);
            sample
        }
        .boxed()
        .shared();

        if let Some(probe) = fut.downgrade() {
            let id = sessions.next_id;
            sessions.in_flight.insert(
                session_key.to_string(),
                InFlightEntry {
                    id,
                    probe,
                },
            );
        }
        fut
    }

    async fn run_probe(&self, session_key: &str) -> BandwidthSample {
        let outcome = tokio::time::timeout(self.probe_timeout, self.probe.measure())
            .await
            .unwrap_or(Err(DeliveryError::Timeout));
        match outcome {
            Ok(measurement) => {
                let sample = BandwidthSample::measured(measurement.mbps(), SampleSource::Probe, None);
                self.store(session_key, &sample);
                if let Err(e) = self.cache.expire(&Self::failed_key(session_key)) {
                    warn!(session = session_key, error = %e, "bandwidth failure marker clear failed");
                }
                info!(
                    session = session_key,
                    speed = sample.speed_mbps,
                    tier = %sample.tier,
                    "bandwidth measured"
                );
                sample
            }
            Err(e) => {
                warn!(
                    session = session_key,
                    error = %e,
                    timeout_ms = self.probe_timeout.as_millis() as u64,
                    "bandwidth probe failed, using default"
                );
                if let Err(e) = self.cache.set(&Self::failed_key(session_key), &[], self.ttl) {
                    warn!(session = session_key, error = %e, "bandwidth failure marker write failed");
                }
                BandwidthSample::fallback()
            }
        }
    }

    fn store(&self, session_key: &str, sample: &BandwidthSample) {
        if let Err(e) = self.cache.set_json(&Self::cache_key(session_key), sample, self.ttl) {
            warn!(session = session_key, error = %e, "bandwidth cache write failed");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Result;
    use crate::probe::ProbeMeasurement;
    use async_trait::async_trait;
    use namecast_kv::{KVStore, ManualClock, MemoryStore};
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct FakeProbe {
        calls: AtomicUsize,
        bytes: u64,
        elapsed: Duration,
        fail: bool,
        delay: Duration,
    }

    impl FakeProbe {
        fn ok(bytes: u64, elapsed: Duration) -> Self {
            Self {
                calls: AtomicUsize::new(0),
                bytes,
                elapsed,
                fail: false,
                delay: Duration::ZERO,
            }
        }

        fn failing() -> Self {
            Self {
                fail: true,
                ..Self::ok(0, Duration::ZERO)
            }
        }
    }

    #[async_trait]
    impl BandwidthProbe for FakeProbe {
        async fn measure(&self) -> Result<ProbeMeasurement> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if !self.delay.is_zero() {
                tokio::time::sleep(self.delay).await;
            }
            if self.fail {
                return Err(DeliveryError::Probe("connection refused".into()));
            }
            Ok(ProbeMeasurement::new(self.bytes, self.elapsed))
        }
    }

    fn estimator(probe: Arc<FakeProbe>) -> (BandwidthEstimator, Arc<ManualClock>) {
        let (est, clock, _) = estimator_with_backing(probe);
        (est, clock)
    }

    fn estimator_with_backing(
        probe: Arc<FakeProbe>,
    ) -> (BandwidthEstimator, Arc<ManualClock>, MemoryStore) {
        let clock = Arc::new(ManualClock::new(1_000));
        let backing = MemoryStore::new();
        let cache = ExpiringStore::new(Arc::new(backing.clone()), clock.clone());
        (
            BandwidthEstimator::new(probe, cache, &DeliveryConfig::default()),
            clock,
            backing,
        )
    }

    #[tokio::test]
    async fn test_failed_probe_yields_default() {
        let probe = Arc::new(FakeProbe::failing());
        let (est, _) = estimator(probe.clone());

        let sample = est.estimate("s1", None).await;
        assert_eq!(sample.speed_mbps, 2.0);
        assert_eq!(sample.tier, QualityTier::P480);
        assert_eq!(sample.source, SampleSource::Default);
        assert_eq!(est.state("s1"), EstimateState::Failed);

        // Not cached: the next request probes again.
        est.estimate("s1", None).await;
        assert_eq!(probe.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_probe_result_cached_until_expiry() {
        // 100 KB in 0.2s = 4.096 Mbps.
        let probe = Arc::new(FakeProbe::ok(102_400, Duration::from_millis(200)));
        let (est, clock) = estimator(probe.clone());
        assert_eq!(est.state("s1"), EstimateState::Uncached);

        let sample = est.estimate("s1", None).await;
        assert_eq!(sample.source, SampleSource::Probe);
        assert_eq!(sample.tier, QualityTier::P480);
        assert!(matches!(est.state("s1"), EstimateState::Resolved(_)));

        clock.advance(Duration::from_secs(29 * 60));
        assert_eq!(est.estimate("s1", None).await, sample);
        assert_eq!(probe.calls.load(Ordering::SeqCst), 1);

        clock.advance(Duration::from_secs(60));
        assert_eq!(est.state("s1"), EstimateState::Uncached);
        est.estimate("s1", None).await;
        assert_eq!(probe.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_hint_skips_probe() {
        let probe = Arc::new(FakeProbe::failing());
        let (est, _) = estimator(probe.clone());

        let hint = NetworkHint::new(Some(ConnectionClass::G4), Some(1.0));
        let sample = est.estimate("s1", Some(&hint)).await;
        assert_eq!(sample.speed_mbps, 5.0);
        assert_eq!(sample.tier, QualityTier::P480);
        assert_eq!(sample.connection_type_hint, Some(ConnectionClass::G4));
        assert_eq!(probe.calls.load(Ordering::SeqCst), 0);

        let json = serde_json::to_value(&sample).unwrap();
        assert_eq!(json["tierChosen"], "480p");
        assert_eq!(json["connectionTypeHint"], "4g");
        assert_eq!(json["source"], "hint");
    }

    #[tokio::test]
    async fn test_empty_hint_falls_back_to_probe() {
        let probe = Arc::new(FakeProbe::ok(1_000_000, Duration::from_secs(1)));
        let (est, _) = estimator(probe.clone());
        let sample = est.estimate("s1", Some(&NetworkHint::default())).await;
        assert_eq!(sample.source, SampleSource::Probe);
        assert_eq!(probe.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_concurrent_estimates_share_one_probe() {
        let probe = Arc::new(FakeProbe {
            delay: Duration::from_millis(50),
            ..FakeProbe::ok(1_000_000, Duration::from_secs(1))
        });
        let (est, _) = estimator(probe.clone());

        let (a, b, c) = tokio::join!(
            est.estimate("s1", None),
            est.estimate("s1", None),
            est.estimate("s2", None),
        );
        assert_eq!(a, b);
        assert_eq!(c.source, SampleSource::Probe);
        assert_eq!(probe.calls.load(Ordering::SeqCst), 2);
        assert_eq!(est.state("s1"), EstimateState::Resolved(a));
    }

    #[tokio::test(start_paused = true)]
    async fn test_probe_timeout_yields_default() {
        let probe = Arc::new(FakeProbe {
            delay: Duration::from_secs(60),
            ..FakeProbe::ok(1_000_000, Duration::from_secs(1))
        });
        let (est, _) = estimator(probe);
        let sample = est.estimate("s1", None).await;
        assert_eq!(sample, BandwidthSample::fallback());
        assert_eq!(est.state("s1"), EstimateState::Failed);
    }

    #[tokio::test]
    async fn test_failures_expire_with_cache_ttl() {
        let probe = Arc::new(FakeProbe::failing());
        let (est, clock, backing) = estimator_with_backing(probe.clone());

        for i in 0..1_000 {
            est.estimate(&format!("visitor-{i}"), None).await;
        }
        assert!(est.sessions().in_flight.is_empty());
        assert_eq!(est.state("visitor-7"), EstimateState::Failed);

        clock.advance(Duration::from_secs(30 * 60));
        for i in 0..1_000 {
            assert_eq!(est.state(&format!("visitor-{i}")), EstimateState::Uncached);
        }
        assert!(backing.is_empty());
    }

    #[tokio::test]
    async fn test_success_clears_failure() {
        let probe = Arc::new(FakeProbe::failing());
        let (est, _, backing) = estimator_with_backing(probe);
        est.estimate("s1", None).await;
        assert_eq!(est.state("s1"), EstimateState::Failed);

        let recovered = Arc::new(FakeProbe::ok(1_000_000, Duration::from_secs(1)));
        let clock = Arc::new(ManualClock::new(1_000));
        let est = BandwidthEstimator::new(
            recovered,
            ExpiringStore::new(Arc::new(backing.clone()), clock),
            &DeliveryConfig::default(),
        );
        let sample = est.estimate("s1", None).await;
        assert_eq!(est.state("s1"), EstimateState::Resolved(sample));
        assert_eq!(backing.scan(FAILED_PREFIX).unwrap(), vec![]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_abandoned_estimate_is_cancelled() {
        let probe = Arc::new(FakeProbe {
            delay: Duration::from_secs(1),
            ..FakeProbe::ok(1_000_000, Duration::from_secs(1))
        });
        let (est, _) = estimator(probe.clone());

        let mut pending = Box::pin(est.estimate("s1", None));
        assert!(futures::poll!(&mut pending).is_pending());
        assert_eq!(est.state("s1"), EstimateState::Probing);

        drop(pending);
        assert_eq!(est.state("s1"), EstimateState::Uncached);
        assert!(est.sessions().in_flight.is_empty());

        let sample = est.estimate("s1", None).await;
        assert_eq!(sample.source, SampleSource::Probe);
        assert_eq!(probe.calls.load(Ordering::SeqCst), 2);
    }
}
