//! Result types produced by the probing pipeline.
//!
//! Each stage hands a named struct to the next stage instead of a positional
//! tuple, so field meaning survives refactors across stage boundaries.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Outcome of a TCP reachability scan for one address.
///
/// Produced by the probe engine and consumed immediately by the next pipeline
/// stage; never persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeResult {
    /// The scanned IPv4 address.
    pub address: String,
    /// Whether at least one configured port accepted a connection.
    pub reachable: bool,
    /// Minimum observed connect delay in milliseconds (0 when unreachable).
    pub min_delay_ms: u64,
    /// The port that produced `min_delay_ms` (0 when unreachable).
    pub port: u16,
}

/// Outcome of a throughput measurement for one address.
#[derive(Debug, Clone, PartialEq)]
pub struct BandwidthResult {
    /// The measured IPv4 address.
    pub address: String,
    /// Whether any usable signal was obtained (throughput or, failing that,
    /// a successful reachability probe).
    pub success: bool,
    /// Best observed downstream throughput in Mbps; 0 when the transfers all
    /// failed but the address was still reachable.
    pub bandwidth_mbps: f64,
    /// Best observed time-to-first-byte in milliseconds.
    pub latency_ms: f64,
}

/// Final ranked artifact for one address.
///
/// Immutable once created; the ranking stage orders these by `score`
/// descending.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoredResult {
    /// The ranked IPv4 address.
    pub address: String,
    /// Minimum connect delay from the precise probe, in milliseconds.
    pub min_delay_ms: u64,
    /// Average connect delay, in milliseconds.
    pub avg_delay_ms: u64,
    /// Best observed throughput in Mbps.
    pub bandwidth_mbps: f64,
    /// Time-to-first-byte latency from the bandwidth test, in milliseconds.
    pub latency_ms: f64,
    /// Composite score in [0, 100].
    pub score: f64,
}

/// A cached region resolution for one address.
///
/// Owned exclusively by the region cache; replaced wholesale on write. The
/// persisted cache file is a JSON map from address to this entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegionCacheEntry {
    /// ISO country code (2-3 letters) or `"Unknown"`.
    pub region: String,
    /// When the resolution was recorded.
    pub resolved_at: DateTime<Utc>,
}
