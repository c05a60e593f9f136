//! Timed reference downloads.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use tracing::debug;

use crate::error::{DeliveryError, Result};

/// Lowest speed a probe reports, in Mbps.
pub const MIN_PROBE_MBPS: f64 = 0.1;

/// Suggested size of the reference payload.
pub const REFERENCE_PAYLOAD_BYTES: usize = 100 * 1024;

/// Bytes transferred over some wall-clock time.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProbeMeasurement {
    pub bytes: u64,
    pub elapsed: Duration,
}

impl ProbeMeasurement {
    pub fn new(bytes: u64, elapsed: Duration) -> Self {
        Self { bytes, elapsed }
    }

    /// Throughput in Mbps, floored at [`MIN_PROBE_MBPS`].
    pub fn mbps(&self) -> f64 {
        // Sub-millisecond transfers are treated as one millisecond.
        let secs = self.elapsed.as_secs_f64().max(0.001);
        let mbps = self.bytes as f64 * 8.0 / secs / 1_000_000.0;
        mbps.max(MIN_PROBE_MBPS)
    }
}

/// Measures client bandwidth.
#[async_trait]
pub trait BandwidthProbe: Send + Sync {
    async fn measure(&self) -> Result<ProbeMeasurement>;
}

/// Downloads a reference file over HTTP and times it.
pub struct HttpProbe {
    client: reqwest::Client,
    url: String,
}

impl HttpProbe {
    pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            url: url.into(),
        })
    }
}

#[async_trait]
impl BandwidthProbe for HttpProbe {
    async fn measure(&self) -> Result<ProbeMeasurement> {
        let started = Instant::now();
        // Always bypass intermediary caches.
        let resp = self
            .client
            .get(&self.url)
            .header(reqwest::header::CACHE_CONTROL, "no-store")
            .send()
            .await?;
        let status = resp.status();
        if !status.is_success() {
            return Err(DeliveryError::Probe(format!(
                "reference download returned {}",
                status
            )));
        }
        let body = resp.bytes().await?;
        let elapsed = started.elapsed();
        if body.is_empty() {
            return Err(DeliveryError::Probe("reference payload is empty".to_string()));
        }

        let measurement = ProbeMeasurement::new(body.len() as u64, elapsed);
        debug!(
            bytes = body.len(),
            elapsed_ms = elapsed.as_millis() as u64,
            mbps = measurement.mbps(),
            "bandwidth probe finished"
        );
        Ok(measurement)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    /// Serves one canned HTTP response per connection and returns the base URL.
    pub(crate) async fn serve(status: &'static str, body: Vec<u8>) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            loop {
                let Ok((mut sock, _)) = listener.accept().await else {
                    return;
                };
                let body = body.clone();
                tokio::spawn(async move {
                    let mut buf = [0u8; 4096];
                    let n = sock.read(&mut buf).await.unwrap_or(0);
                    let head_only = buf[..n].starts_with(b"HEAD");
                    let header = format!(
                        "HTTP/1.1 {}\r\ncontent-length: {}\r\nconnection: close\r\n\r\n",
                        status,
                        body.len()
                    );
                    let _ = sock.write_all(header.as_bytes()).await;
                    if !head_only {
                        let _ = sock.write_all(&body).await;
                    }
                    let _ = sock.shutdown().await;
                });
            }
        });
        format!("http://{}", addr)
    }

    #[test]
    fn test_mbps() {
        let m = ProbeMeasurement::new(100_000, Duration::from_millis(400));
        assert!((m.mbps() - 2.0).abs() < 1e-9);

        let slow = ProbeMeasurement::new(100, Duration::from_secs(10));
        assert_eq!(slow.mbps(), MIN_PROBE_MBPS);

        let instant = ProbeMeasurement::new(1_000, Duration::ZERO);
        assert!(instant.mbps().is_finite());
    }

    #[tokio::test]
    async fn test_http_probe() {
        let base = serve("200 OK", vec![7u8; REFERENCE_PAYLOAD_BYTES]).await;
        let probe = HttpProbe::new(format!("{}/probe.bin", base), Duration::from_secs(5)).unwrap();
        let m = probe.measure().await.unwrap();
        assert_eq!(m.bytes, REFERENCE_PAYLOAD_BYTES as u64);
        assert!(m.mbps() >= MIN_PROBE_MBPS);
    }

    #[tokio::test]
    async fn test_http_probe_error_status() {
        let base = serve("404 Not Found", Vec::new()).await;
        let probe = HttpProbe::new(format!("{}/probe.bin", base), Duration::from_secs(5)).unwrap();
        let err = probe.measure().await.unwrap_err();
        assert!(matches!(err, DeliveryError::Probe(_)));
    }
}
