//! Downstream throughput measurement.

use std::net::{IpAddr, SocketAddr};
use std::time::Instant;

use futures::StreamExt;
use reqwest::Client;

use crate::config::{
    BANDWIDTH_BYTE_CAP, BANDWIDTH_EARLY_EXIT_MBPS, BANDWIDTH_REQUEST_TIMEOUT, BANDWIDTH_TIME_CAP,
    USER_AGENT,
};
use crate::error_handling::ProbeError;
use crate::models::BandwidthResult;
use crate::probe::tcp::{parse_candidate, ProbeEngine, TcpConnector, TokioConnector};

/// Test-download endpoints: hostname plus a URL requesting `size_bytes`.
fn test_endpoints(size_bytes: u64) -> Vec<(String, String)> {
    vec![
        (
            "speed.cloudflare.com".to_string(),
            format!("https://speed.cloudflare.com/__down?bytes={size_bytes}"),
        ),
        (
            "httpbin.org".to_string(),
            format!("https://httpbin.org/bytes/{size_bytes}"),
        ),
    ]
}

/// Measures approximate downstream throughput via timed partial downloads.
///
/// Each sample resolves the endpoint hostname to the candidate address, so
/// the bytes actually flow through the candidate. This is a sampling
/// heuristic: best throughput and best latency across rounds are kept, a
/// round above [`BANDWIDTH_EARLY_EXIT_MBPS`] ends the test early, and when
/// every transfer fails the reachability probe supplies a
/// bandwidth-unknown-but-reachable fallback signal.
pub struct BandwidthTester<C: TcpConnector = TokioConnector> {
    probe: ProbeEngine<C>,
    attempts: u32,
    size_bytes: u64,
}

impl<C: TcpConnector> BandwidthTester<C> {
    pub fn new(probe: ProbeEngine<C>, attempts: u32, size_mb: u64) -> Self {
        BandwidthTester {
            probe,
            attempts,
            size_bytes: size_mb * 1024 * 1024,
        }
    }

    /// Measures `address`, never failing on network trouble: a failed round
    /// is skipped, and a fully failed test degrades through the probe
    /// fallback to `success = false`.
    pub async fn measure(&self, address: &str) -> Result<BandwidthResult, ProbeError> {
        parse_candidate(address)?;

        let endpoints = test_endpoints(self.size_bytes);
        let mut best_mbps = 0.0f64;
        let mut best_latency_ms = 0.0f64;

        for round in 0..self.attempts {
            for (host, url) in &endpoints {
                match self.sample(address, host, url).await {
                    Ok((mbps, latency_ms)) => {
                        if mbps > best_mbps {
                            best_mbps = mbps;
                        }
                        if best_latency_ms == 0.0 || latency_ms < best_latency_ms {
                            best_latency_ms = latency_ms;
                        }
                        if mbps > BANDWIDTH_EARLY_EXIT_MBPS {
                            log::debug!(
                                "{}: {:.2} Mbps via {}, ending bandwidth test early",
                                address,
                                mbps,
                                host
                            );
                            return Ok(BandwidthResult {
                                address: address.to_string(),
                                success: true,
                                bandwidth_mbps: best_mbps,
                                latency_ms: best_latency_ms,
                            });
                        }
                    }
                    Err(e) => {
                        log::debug!(
                            "Bandwidth round {}/{} via {} failed for {}: {}",
                            round + 1,
                            self.attempts,
                            host,
                            address,
                            e
                        );
                    }
                }
            }
        }

        if best_mbps > 0.0 {
            return Ok(BandwidthResult {
                address: address.to_string(),
                success: true,
                bandwidth_mbps: best_mbps,
                latency_ms: best_latency_ms,
            });
        }

        // No transfer produced data; a reachability probe decides between
        // "reachable with unknown bandwidth" and plain failure.
        let probe = self.probe.precise_check(address).await?;
        if probe.reachable {
            log::debug!(
                "{}: bandwidth test produced no data, keeping probe delay {} ms",
                address,
                probe.min_delay_ms
            );
            Ok(BandwidthResult {
                address: address.to_string(),
                success: true,
                bandwidth_mbps: 0.0,
                latency_ms: probe.min_delay_ms as f64,
            })
        } else {
            Ok(BandwidthResult {
                address: address.to_string(),
                success: false,
                bandwidth_mbps: 0.0,
                latency_ms: 0.0,
            })
        }
    }

    /// One streamed download round: time-to-first-byte plus bytes received
    /// under the wall-clock and size caps.
    async fn sample(&self, address: &str, host: &str, url: &str) -> Result<(f64, f64), ProbeError> {
        let ip: IpAddr = address
            .parse()
            .map_err(|_| ProbeError::MalformedAddress(address.to_string()))?;
        let client = Client::builder()
            .resolve(host, SocketAddr::new(ip, 443))
            .timeout(BANDWIDTH_REQUEST_TIMEOUT)
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| ProbeError::Provider(e.to_string()))?;

        let started = Instant::now();
        let response = client
            .get(url)
            .send()
            .await
            .map_err(|e| ProbeError::Provider(e.to_string()))?;
        if !response.status().is_success() {
            return Err(ProbeError::Provider(format!(
                "HTTP {}",
                response.status().as_u16()
            )));
        }
        let latency_ms = started.elapsed().as_secs_f64() * 1000.0;

        let download_started = Instant::now();
        let mut received: u64 = 0;
        let mut stream = response.bytes_stream();
        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(|e| ProbeError::Provider(e.to_string()))?;
            received += chunk.len() as u64;
            if download_started.elapsed() >= BANDWIDTH_TIME_CAP || received >= BANDWIDTH_BYTE_CAP {
                break;
            }
        }

        let elapsed = download_started.elapsed().as_secs_f64();
        if received == 0 || elapsed <= 0.0 {
            return Err(ProbeError::Provider("no data received".to_string()));
        }
        let mbps = (received * 8) as f64 / elapsed / 1e6;
        Ok((mbps, latency_ms))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::probe::tcp::test_support::StubConnector;
    use std::sync::Arc;

    fn tester_with(connector: Arc<StubConnector>, attempts: u32) -> BandwidthTester<StubConnector> {
        // attempts = 0 skips the download rounds entirely, exercising the
        // probe-fallback path without network traffic.
        let probe = ProbeEngine::with_connector(vec![443], connector);
        BandwidthTester::new(probe, attempts, 10)
    }

    #[test]
    fn test_endpoints_encode_requested_size() {
        let endpoints = test_endpoints(1024);
        assert_eq!(endpoints.len(), 2);
        for (host, url) in &endpoints {
            assert!(url.contains("1024"), "{url} should request 1024 bytes");
            assert!(url.contains(host.as_str()), "{url} should target {host}");
        }
    }

    #[tokio::test]
    async fn test_malformed_address_fails_fast() {
        let connector = Arc::new(StubConnector::accepting());
        let tester = tester_with(Arc::clone(&connector), 0);

        let result = tester.measure("1.2.3.999").await;

        assert!(matches!(result, Err(ProbeError::MalformedAddress(_))));
        assert_eq!(connector.calls(), 0);
    }

    #[tokio::test]
    async fn test_failed_transfers_fall_back_to_reachability_probe() {
        let connector = Arc::new(StubConnector::accepting());
        let tester = tester_with(Arc::clone(&connector), 0);

        let result = tester.measure("1.1.1.1").await.expect("measure succeeds");

        assert!(result.success);
        assert_eq!(result.bandwidth_mbps, 0.0);
        assert_eq!(connector.calls(), 1);
    }

    #[tokio::test]
    async fn test_unreachable_address_reports_failure() {
        let connector = Arc::new(StubConnector::refusing());
        let tester = tester_with(Arc::clone(&connector), 0);

        let result = tester.measure("1.1.1.1").await.expect("measure succeeds");

        assert!(!result.success);
        assert_eq!(result.bandwidth_mbps, 0.0);
        assert_eq!(result.latency_ms, 0.0);
    }
}
