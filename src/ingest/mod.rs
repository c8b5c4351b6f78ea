//! Candidate ingestion from public source lists.
//!
//! Fetches raw text from the configured source URLs and extracts IPv4-looking
//! tokens. Source failures are logged and skipped; a run with zero usable
//! sources simply yields zero candidates.

use std::collections::BTreeSet;
use std::net::Ipv4Addr;
use std::time::Duration;

use anyhow::{Context, Result};
use regex::Regex;
use reqwest::Client;
use tokio::time::sleep;

use crate::config::{Config, SOURCE_FETCH_PAUSE};
use crate::error_handling::{ErrorType, ProcessingStats};

const IPV4_TOKEN_PATTERN: &str = r"\b(?:[0-9]{1,3}\.){3}[0-9]{1,3}\b";

/// Fetches every configured source and returns all valid IPv4 tokens found,
/// duplicates included. Dedup happens separately in
/// [`dedup_candidates`].
pub async fn collect_candidates(
    client: &Client,
    config: &Config,
    stats: &ProcessingStats,
) -> Result<Vec<String>> {
    let pattern = Regex::new(IPV4_TOKEN_PATTERN).context("Failed to compile IPv4 pattern")?;
    let timeout = Duration::from_secs(config.timeout_secs);

    let mut collected = Vec::new();
    let mut successful_sources = 0usize;
    let mut failed_sources = 0usize;

    for (index, url) in config.effective_sources().iter().enumerate() {
        if index > 0 {
            sleep(SOURCE_FETCH_PAUSE).await;
        }
        log::info!("Collecting candidates from {}", url);
        match fetch_source(client, url, timeout).await {
            Ok(body) => {
                let found = extract_addresses(&pattern, &body);
                log::info!("Found {} valid addresses at {}", found.len(), url);
                collected.extend(found);
                successful_sources += 1;
            }
            Err(e) => {
                stats.increment(ErrorType::SourceFetchError);
                log::warn!("Source {} failed: {:#}", url, e);
                failed_sources += 1;
            }
        }
    }

    log::info!(
        "Source collection finished: {} succeeded, {} failed, {} raw addresses",
        successful_sources,
        failed_sources,
        collected.len()
    );
    Ok(collected)
}

async fn fetch_source(client: &Client, url: &str, timeout: Duration) -> Result<String> {
    let response = client
        .get(url)
        .timeout(timeout)
        .send()
        .await
        .context("request failed")?;
    let status = response.status();
    if !status.is_success() {
        anyhow::bail!("HTTP {}", status.as_u16());
    }
    response.text().await.context("failed to read body")
}

/// Extracts validated IPv4 addresses from raw source text.
///
/// Primary extraction is the token regex; when that finds nothing (some
/// sources serve one bare address per line inside markup the regex chokes
/// on), each trimmed line is tried as a whole address.
fn extract_addresses(pattern: &Regex, body: &str) -> Vec<String> {
    let mut found: Vec<String> = pattern
        .find_iter(body)
        .filter_map(|token| token.as_str().parse::<Ipv4Addr>().ok())
        .map(|ip| ip.to_string())
        .collect();

    if found.is_empty() {
        found = body
            .lines()
            .filter_map(|line| line.trim().parse::<Ipv4Addr>().ok())
            .map(|ip| ip.to_string())
            .collect();
    }

    found
}

/// Deduplicates candidates into a numerically ordered set.
///
/// Parsing into `Ipv4Addr` makes the set independent of input order and of
/// textual variants of the same address.
pub fn dedup_candidates(raw: Vec<String>) -> Vec<String> {
    let unique: BTreeSet<Ipv4Addr> = raw
        .into_iter()
        .filter_map(|candidate| candidate.parse().ok())
        .collect();
    unique.into_iter().map(|ip| ip.to_string()).collect()
}
