//! TCP reachability probing.

use std::future::Future;
use std::net::{Ipv4Addr, SocketAddr};
use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::net::TcpStream;

use crate::config::{CONNECT_TIMEOUT, FAST_CONNECT_THRESHOLD_MS};
use crate::error_handling::ProbeError;
use crate::models::ProbeResult;

/// Validates a candidate as four dot-separated octets in [0, 255].
///
/// Malformed input is rejected here, before any socket is touched.
pub fn parse_candidate(address: &str) -> Result<Ipv4Addr, ProbeError> {
    address
        .parse::<Ipv4Addr>()
        .map_err(|_| ProbeError::MalformedAddress(address.to_string()))
}

/// The connect primitive behind the probe engine.
///
/// Production code uses [`TokioConnector`]; tests substitute a counting stub
/// to verify that malformed addresses never reach a socket.
pub trait TcpConnector: Send + Sync + 'static {
    /// Attempts a TCP connect to `target`, bounded by `timeout`.
    fn connect(
        &self,
        target: SocketAddr,
        timeout: Duration,
    ) -> impl Future<Output = Result<(), ProbeError>> + Send;
}

/// Real connector backed by `tokio::net::TcpStream`.
#[derive(Debug, Default)]
pub struct TokioConnector;

impl TcpConnector for TokioConnector {
    async fn connect(&self, target: SocketAddr, timeout: Duration) -> Result<(), ProbeError> {
        match tokio::time::timeout(timeout, TcpStream::connect(target)).await {
            Ok(Ok(_stream)) => Ok(()),
            Ok(Err(e)) => Err(ProbeError::ConnectRefused(e.to_string())),
            Err(_) => Err(ProbeError::ConnectTimeout),
        }
    }
}

/// Tiered TCP reachability checks over a configured port set.
///
/// [`quick_check`](Self::quick_check) and
/// [`precise_check`](Self::precise_check) share one scan algorithm; they exist
/// as separate operations because the pipeline applies them at different
/// stages: the quick pass over the full candidate set, the precise pass over
/// the latency-ranked shortlist, under the orchestrator.
pub struct ProbeEngine<C: TcpConnector = TokioConnector> {
    ports: Vec<u16>,
    connect_timeout: Duration,
    connector: Arc<C>,
}

impl ProbeEngine<TokioConnector> {
    pub fn new(ports: Vec<u16>) -> Self {
        Self::with_connector(ports, Arc::new(TokioConnector))
    }
}

impl<C: TcpConnector> ProbeEngine<C> {
    pub fn with_connector(ports: Vec<u16>, connector: Arc<C>) -> Self {
        ProbeEngine {
            ports,
            connect_timeout: CONNECT_TIMEOUT,
            connector,
        }
    }

    /// First-pass reachability check used to shrink the candidate set.
    pub async fn quick_check(&self, address: &str) -> Result<ProbeResult, ProbeError> {
        self.scan(address).await
    }

    /// Reachability check applied to the pre-filtered shortlist; produces the
    /// delay figure used for ranking.
    pub async fn precise_check(&self, address: &str) -> Result<ProbeResult, ProbeError> {
        self.scan(address).await
    }

    async fn scan(&self, address: &str) -> Result<ProbeResult, ProbeError> {
        let ip = parse_candidate(address)?;

        let mut min_delay_ms = u64::MAX;
        let mut best_port = 0u16;
        let mut successes = 0usize;

        for &port in &self.ports {
            if port == 0 {
                log::debug!("Skipping invalid test port 0");
                continue;
            }
            let target = SocketAddr::from((ip, port));
            let started = Instant::now();
            match self.connector.connect(target, self.connect_timeout).await {
                Ok(()) => {
                    let delay = started.elapsed().as_millis() as u64;
                    successes += 1;
                    if delay < min_delay_ms {
                        min_delay_ms = delay;
                        best_port = port;
                    }
                    if delay < FAST_CONNECT_THRESHOLD_MS {
                        return Ok(ProbeResult {
                            address: address.to_string(),
                            reachable: true,
                            min_delay_ms: delay,
                            port,
                        });
                    }
                }
                Err(e) => {
                    log::trace!("{}:{} connect failed: {}", address, port, e);
                }
            }
        }

        if successes > 0 {
            Ok(ProbeResult {
                address: address.to_string(),
                reachable: true,
                min_delay_ms,
                port: best_port,
            })
        } else {
            Ok(ProbeResult {
                address: address.to_string(),
                reachable: false,
                min_delay_ms: 0,
                port: 0,
            })
        }
    }
}

impl<C: TcpConnector> Clone for ProbeEngine<C> {
    fn clone(&self) -> Self {
        ProbeEngine {
            ports: self.ports.clone(),
            connect_timeout: self.connect_timeout,
            connector: Arc::clone(&self.connector),
        }
    }
}


#[cfg(test)]
mod tests {
    use super::test_support::StubConnector;
    use super::*;

    #[test]
    fn test_parse_candidate_accepts_valid_addresses() {
        assert!(parse_candidate("1.1.1.1").is_ok());
        assert!(parse_candidate("255.255.255.255").is_ok());
        assert!(parse_candidate("0.0.0.0").is_ok());
    }

    #[test]
    fn test_parse_candidate_rejects_malformed_addresses() {
        for bad in ["", "1.2.3", "1.2.3.4.5", "1.2.3.256", "a.b.c.d", "1.2.3.-1"] {
            match parse_candidate(bad) {
                Err(ProbeError::MalformedAddress(s)) => assert_eq!(s, bad),
                other => panic!("{:?} should be malformed, got {:?}", bad, other.is_ok()),
            }
        }
    }

    #[tokio::test]
    async fn test_malformed_address_makes_no_socket_call() {
        let connector = Arc::new(StubConnector::accepting());
        let engine = ProbeEngine::with_connector(vec![443], Arc::clone(&connector));

        let quick = engine.quick_check("300.1.1.1").await;
        let precise = engine.precise_check("not-an-ip").await;

        assert!(matches!(quick, Err(ProbeError::MalformedAddress(_))));
        assert!(matches!(precise, Err(ProbeError::MalformedAddress(_))));
        assert_eq!(connector.calls(), 0);
    }

    #[tokio::test]
    async fn test_fast_connect_short_circuits_remaining_ports() {
        let connector = Arc::new(StubConnector::accepting());
        let engine = ProbeEngine::with_connector(vec![443, 2053, 8443], Arc::clone(&connector));

        let result = engine.quick_check("1.1.1.1").await.expect("scan succeeds");

        // The stub answers instantly, far under the fast threshold, so only
        // the first port is ever attempted.
        assert!(result.reachable);
        assert_eq!(result.port, 443);
        assert_eq!(connector.calls(), 1);
    }

    #[tokio::test]
    async fn test_all_ports_failing_reports_unreachable() {
        let connector = Arc::new(StubConnector::refusing());
        let engine = ProbeEngine::with_connector(vec![443, 8443], Arc::clone(&connector));

        let result = engine.quick_check("1.1.1.1").await.expect("scan succeeds");

        assert!(!result.reachable);
        assert_eq!(result.min_delay_ms, 0);
        assert_eq!(result.port, 0);
        assert_eq!(connector.calls(), 2);
    }

    #[tokio::test]
    async fn test_port_zero_is_skipped_without_aborting_scan() {
        let connector = Arc::new(StubConnector::accepting());
        let engine = ProbeEngine::with_connector(vec![0, 443], Arc::clone(&connector));

        let result = engine.quick_check("1.1.1.1").await.expect("scan succeeds");

        assert!(result.reachable);
        assert_eq!(result.port, 443);
        assert_eq!(connector.calls(), 1);
    }

    #[tokio::test]
    async fn test_quick_and_precise_share_contract() {
        let connector = Arc::new(StubConnector::refusing());
        let engine = ProbeEngine::with_connector(vec![443], Arc::clone(&connector));

        let quick = engine.quick_check("1.1.1.1").await.expect("scan succeeds");
        let precise = engine.precise_check("1.1.1.1").await.expect("scan succeeds");

        assert_eq!(quick, precise);
    }
}
