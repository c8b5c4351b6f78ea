//! Composite scoring and candidate ranking.
//!
//! Pure functions: identical inputs always produce identical outputs, so
//! re-scoring is free and rankings are reproducible.

use std::cmp::Ordering;

use crate::models::{ProbeResult, ScoredResult};

/// Combines delay, bandwidth, and stability into a single score in [0, 100].
///
/// Components: latency 0-40, bandwidth 0-30, stability 0-30, summed and
/// rounded to one decimal. Inputs must be non-negative; callers clamp before
/// calling. The average delay is accepted alongside the minimum for parity
/// with the result structs but does not enter the formula.
pub fn composite_score(
    min_delay_ms: f64,
    _avg_delay_ms: f64,
    bandwidth_mbps: f64,
    stability: f64,
) -> f64 {
    let delay_score = if min_delay_ms <= 50.0 {
        40.0
    } else if min_delay_ms <= 100.0 {
        35.0
    } else if min_delay_ms <= 200.0 {
        30.0
    } else if min_delay_ms <= 300.0 {
        25.0
    } else {
        (20.0 - (min_delay_ms - 300.0) / 10.0).max(0.0)
    };

    let bandwidth_score = if bandwidth_mbps >= 50.0 {
        30.0
    } else if bandwidth_mbps >= 20.0 {
        25.0
    } else if bandwidth_mbps >= 10.0 {
        20.0
    } else if bandwidth_mbps >= 5.0 {
        15.0
    } else {
        (bandwidth_mbps * 3.0).max(0.0)
    };

    let stability_score = (stability * 0.3).min(30.0);

    let total = delay_score + bandwidth_score + stability_score;
    (total * 10.0).round() / 10.0
}

/// Keeps the fastest `percentage` of `results` by minimum delay.
///
/// Sorts ascending by `min_delay_ms` and retains
/// `max(1, floor(count * percentage / 100))` entries; empty input yields
/// empty output. `percentage` is validated into (0, 100] by the
/// configuration layer.
pub fn latency_rank(results: Vec<ProbeResult>, percentage: f64) -> Vec<ProbeResult> {
    if results.is_empty() {
        return results;
    }
    let mut sorted = results;
    sorted.sort_by_key(|r| r.min_delay_ms);
    let keep = ((sorted.len() as f64 * percentage / 100.0).floor() as usize).max(1);
    sorted.truncate(keep);
    sorted
}

/// Orders scored results best-first.
///
/// The sort is stable, so ties keep their original encounter order.
pub fn rank_by_score(mut results: Vec<ScoredResult>) -> Vec<ScoredResult> {
    results.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(Ordering::Equal));
    results
}
