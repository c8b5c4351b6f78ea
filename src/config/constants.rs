//! Configuration constants.
//!
//! Operational parameters used throughout the pipeline: timeouts, caps,
//! pacing intervals, and default endpoint lists.

use std::time::Duration;

/// Per-port TCP connect timeout during reachability scans.
pub const CONNECT_TIMEOUT: Duration = Duration::from_secs(3);

/// A connect faster than this short-circuits the port scan: the address is
/// already good enough, remaining ports add no information.
pub const FAST_CONNECT_THRESHOLD_MS: u64 = 200;

/// Wall-clock deadline for one orchestrator batch. Work still pending at the
/// deadline is excluded from the batch's results but not force-cancelled.
pub const BATCH_DEADLINE: Duration = Duration::from_secs(30);

/// Pause between observing consecutive item completions within a batch, so
/// interleaved per-item log lines stay readable.
pub const COMPLETION_PAUSE: Duration = Duration::from_millis(10);

/// Pause between batches (resource pacing, not correctness-bearing).
pub const BATCH_PAUSE: Duration = Duration::from_millis(200);

/// Pause between consecutive source fetches to avoid rate limits.
pub const SOURCE_FETCH_PAUSE: Duration = Duration::from_millis(200);

/// Maximum live entries in the region cache after a cleanup pass.
pub const CACHE_CAPACITY: usize = 1000;

/// Wall-clock cap on a single bandwidth sample.
pub const BANDWIDTH_TIME_CAP: Duration = Duration::from_secs(10);

/// Byte cap on a single bandwidth sample (10 MB).
pub const BANDWIDTH_BYTE_CAP: u64 = 10 * 1024 * 1024;

/// Per-request timeout for a bandwidth sample, covering connect plus headers.
pub const BANDWIDTH_REQUEST_TIMEOUT: Duration = Duration::from_secs(15);

/// A round exceeding this throughput ends the bandwidth test early.
pub const BANDWIDTH_EARLY_EXIT_MBPS: f64 = 5.0;

/// Fixed stability input to the composite score. The scoring formula reserves
/// 30 points for a stability signal; until one is measured, every candidate
/// gets the full allocation.
pub const DEFAULT_STABILITY: f64 = 100.0;

/// Primary geolocation provider. `{ip}` is replaced with the address.
/// Success requires `status == "success"` and a non-empty `countryCode`.
pub const PRIMARY_GEO_URL: &str = "http://ip-api.com/json/{ip}?fields=status,countryCode";

/// Fallback geolocation provider. `{ip}` is replaced with the address.
/// Success requires `success == true` and a non-empty `country_code`.
pub const FALLBACK_GEO_URL: &str = "https://ipwho.is/{ip}";

/// Region code recorded when both providers fail. Cached like any other code
/// so a dead address does not re-query every run.
pub const UNKNOWN_REGION: &str = "Unknown";

/// Default candidate sources: public lists of well-performing edge addresses.
pub const DEFAULT_SOURCES: &[&str] = &[
    "https://api.uouin.com/cloudflare.html",
    "https://api.urlce.com/cloudflare.html",
    "https://addressesapi.090227.xyz/CloudFlareYes",
    "https://cf.090227.xyz/CloudFlareYes",
    "https://vps789.com/openApi/cfIpTop20",
    "https://vps789.com/openApi/cfIpApi",
    "https://www.wetest.vip/page/cloudflare/total_v4.html",
    "https://cf.090227.xyz/cmcc",
    "https://cf.090227.xyz/ct",
];

/// User-Agent for source and provider requests. Some source sites refuse
/// non-browser agents.
pub const USER_AGENT: &str =
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/131.0.0.0 Safari/537.36";
