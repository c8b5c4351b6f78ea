//! Output file writers.
//!
//! Produces the per-run artifacts: the reachable address list, the
//! region-grouped list, and in advanced mode the ranked list, the ranking
//! detail, and the region-grouped ranked list.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use crate::config::Config;
use crate::geo::country_name;
use crate::models::ScoredResult;

/// Locations of all output artifacts for one run.
pub struct OutputPaths {
    /// Reachable addresses, one per line.
    pub basic_list: PathBuf,
    /// Region-grouped formatted list of reachable addresses.
    pub regions: PathBuf,
    /// Ranked addresses, best first (advanced mode).
    pub ranked_list: PathBuf,
    /// Ranking detail lines (advanced mode).
    pub ranking: PathBuf,
    /// Region-grouped formatted ranked list (advanced mode).
    pub ranked_regions: PathBuf,
}

impl OutputPaths {
    pub fn new(config: &Config) -> Self {
        let dir = &config.output_dir;
        OutputPaths {
            basic_list: dir.join("iplist.txt"),
            regions: dir.join("regions.txt"),
            ranked_list: dir.join("iplist_ranked.txt"),
            ranking: dir.join("ranking.txt"),
            ranked_regions: dir.join("regions_ranked.txt"),
        }
    }

    /// Deletes leftover output files from a previous run so results never
    /// accumulate across runs. Advanced-mode artifacts are removed only when
    /// advanced mode is active this run.
    pub async fn remove_stale(&self, advanced_mode: bool) {
        remove_if_exists(&self.basic_list).await;
        remove_if_exists(&self.regions).await;
        if advanced_mode {
            remove_if_exists(&self.ranked_list).await;
            remove_if_exists(&self.ranking).await;
            remove_if_exists(&self.ranked_regions).await;
        }
    }
}

async fn remove_if_exists(path: &Path) {
    match tokio::fs::remove_file(path).await {
        Ok(()) => log::info!("Removed stale output file {}", path.display()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => log::warn!("Could not remove {}: {}", path.display(), e),
    }
}

/// Writes one address per line.
pub async fn write_address_list(path: &Path, addresses: &[String]) -> Result<()> {
    let mut content = addresses.join("\n");
    content.push('\n');
    tokio::fs::write(path, content)
        .await
        .with_context(|| format!("Failed to write {}", path.display()))?;
    log::info!("Saved {} addresses to {}", addresses.len(), path.display());
    Ok(())
}

/// Writes pre-formatted lines.
pub async fn write_lines(path: &Path, lines: &[String]) -> Result<()> {
    let mut content = lines.join("\n");
    content.push('\n');
    tokio::fs::write(path, content)
        .await
        .with_context(|| format!("Failed to write {}", path.display()))?;
    log::info!("Saved {} lines to {}", lines.len(), path.display());
    Ok(())
}

/// Formats `(address, region_code, min_delay_ms)` triples grouped by country.
///
/// Countries appear alphabetically; within a country, addresses are ordered
/// by delay and numbered from 01:
///
/// ```text
/// 104.16.1.1#US United States | 01
/// ```
pub fn format_region_groups(entries: &[(String, String, u64)]) -> Vec<String> {
    let mut groups: BTreeMap<String, Vec<(&String, &String, u64)>> = BTreeMap::new();
    for (address, code, delay) in entries {
        groups
            .entry(country_name(code).to_string())
            .or_default()
            .push((address, code, *delay));
    }

    let mut lines = Vec::with_capacity(entries.len());
    for (name, mut members) in groups {
        members.sort_by_key(|(_, _, delay)| *delay);
        for (index, (address, code, _)) in members.into_iter().enumerate() {
            lines.push(format!("{}#{} {} | {:02}", address, code, name, index + 1));
        }
    }
    lines
}

/// Formats the ranking detail lines, one per scored result in rank order.
pub fn format_ranking(results: &[ScoredResult]) -> Vec<String> {
    let total = results.len();
    results
        .iter()
        .enumerate()
        .map(|(index, r)| {
            format!(
                "[{}/{}] {} (delay {} ms, bandwidth {:.2} Mbps, score {:.1})",
                index + 1,
                total,
                r.address,
                r.min_delay_ms,
                r.bandwidth_mbps,
                r.score
            )
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_region_groups_orders_and_numbers() {
        let entries = vec![
            ("104.16.1.1".to_string(), "US".to_string(), 80),
            ("172.64.2.9".to_string(), "DE".to_string(), 30),
            ("104.16.9.9".to_string(), "US".to_string(), 20),
        ];
        let lines = format_region_groups(&entries);
        assert_eq!(
            lines,
            vec![
                "172.64.2.9#DE Germany | 01",
                "104.16.9.9#US United States | 01",
                "104.16.1.1#US United States | 02",
            ]
        );
    }

    #[test]
    fn test_format_region_groups_unknown_code_passes_through() {
        let entries = vec![("1.1.1.1".to_string(), "Unknown".to_string(), 5)];
        let lines = format_region_groups(&entries);
        assert_eq!(lines, vec!["1.1.1.1#Unknown Unknown | 01"]);
    }

    #[test]
    fn test_format_ranking_lines() {
        let results = vec![ScoredResult {
            address: "1.1.1.1".to_string(),
            min_delay_ms: 12,
            avg_delay_ms: 12,
            bandwidth_mbps: 25.5,
            latency_ms: 80.0,
            score: 95.0,
        }];
        let lines = format_ranking(&results);
        assert_eq!(
            lines,
            vec!["[1/1] 1.1.1.1 (delay 12 ms, bandwidth 25.50 Mbps, score 95.0)"]
        );
    }

    #[tokio::test]
    async fn test_write_and_cleanup_round_trip() {
        let dir = tempfile::tempdir().expect("tempdir");
        let config = Config {
            output_dir: dir.path().to_path_buf(),
            ..Default::default()
        };
        let paths = OutputPaths::new(&config);

        write_address_list(&paths.basic_list, &["1.1.1.1".to_string()])
            .await
            .expect("write succeeds");
        let written = std::fs::read_to_string(&paths.basic_list).expect("file exists");
        assert_eq!(written, "1.1.1.1\n");

        paths.remove_stale(true).await;
        assert!(!paths.basic_list.exists());
    }
}
