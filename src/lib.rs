//! ip_prospector library: IPv4 endpoint discovery, probing, and ranking
//!
//! This library collects candidate IPv4 addresses from public source lists,
//! filters them through tiered reachability probes, enriches them with cached
//! region lookups, measures downstream throughput for the fastest survivors,
//! and ranks everything by a composite score.
//!
//! # Example
//!
//! ```no_run
//! use ip_prospector::{Config, run_survey};
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let config = Config {
//!     test_ports: vec![443],
//!     max_workers: 15,
//!     ..Default::default()
//! };
//!
//! let report = run_survey(config).await?;
//! println!("{} reachable, {} ranked", report.reachable, report.ranked);
//! # Ok(())
//! # }
//! ```
//!
//! # Requirements
//!
//! This library requires a Tokio runtime. Use `#[tokio::main]` in your
//! application or ensure you're calling library functions within an async
//! context.

#![warn(missing_docs)]

mod app;
pub mod config;
mod error_handling;
mod geo;
mod ingest;
mod models;
mod orchestrator;
mod probe;
mod ranking;
mod report;
pub mod initialization;

// Re-export public API
pub use config::{Config, LogFormat, LogLevel};
pub use models::{BandwidthResult, ProbeResult, RegionCacheEntry, ScoredResult};
pub use run::{run_survey, SurveyReport};

// Internal run module (contains the pipeline driver)
mod run {
    use std::collections::{BTreeSet, HashMap};
    use std::sync::Arc;
    use std::time::{Duration, Instant};

    use anyhow::{Context, Result};
    use log::{info, warn};

    use crate::app::{log_progress, print_error_statistics};
    use crate::config::{Config, DEFAULT_STABILITY};
    use crate::error_handling::{ErrorType, ProbeError, ProcessingStats};
    use crate::geo::{self, RegionCache, RegionResolver};
    use crate::ingest;
    use crate::initialization::init_client;
    use crate::models::{ProbeResult, ScoredResult};
    use crate::orchestrator::Orchestrator;
    use crate::probe::{BandwidthTester, ProbeEngine};
    use crate::ranking;
    use crate::report::{self, OutputPaths};

    /// Results of one survey run.
    #[derive(Debug, Clone)]
    pub struct SurveyReport {
        /// Raw addresses collected across all sources, duplicates included.
        pub collected: usize,
        /// Unique candidates after deduplication.
        pub unique: usize,
        /// Addresses that passed the quick reachability filter.
        pub reachable: usize,
        /// Addresses that received a composite score (advanced mode only).
        pub ranked: usize,
        /// Distinct region codes seen among reachable addresses.
        pub regions: usize,
        /// Elapsed wall-clock time in seconds.
        pub elapsed_seconds: f64,
    }

    /// Runs a full survey with the provided configuration.
    ///
    /// This is the main entry point for the library: collect, dedup, quick
    /// filter, resolve regions, and in advanced mode probe precisely, measure
    /// bandwidth, and rank. Output files land in `config.output_dir`.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid, the HTTP client
    /// cannot be built, or an output file cannot be written. Network
    /// failures per candidate or per source never fail the run; they degrade
    /// to exclusions counted in the end-of-run statistics.
    pub async fn run_survey(config: Config) -> Result<SurveyReport> {
        config.validate().context("Invalid configuration")?;
        let start_time = Instant::now();

        let stats = Arc::new(ProcessingStats::new());
        let client = init_client(&config).context("Failed to initialize HTTP client")?;

        // Hydrate the region cache and expire stale entries before any
        // resolution traffic.
        let cache = Arc::new(RegionCache::new(config.cache_ttl_hours));
        match geo::load_cache(&config.cache_path) {
            Ok(Some(entries)) => {
                info!("Loaded region cache with {} entries", entries.len());
                cache.hydrate(entries);
            }
            Ok(None) => {
                info!(
                    "No region cache at {}, starting empty",
                    config.cache_path.display()
                );
            }
            Err(e) => {
                stats.increment(ErrorType::CacheLoadError);
                warn!("Region cache unusable, starting empty: {}", e);
            }
        }
        cache.cleanup();
        info!("Region cache ready with {} entries", cache.len());

        let paths = OutputPaths::new(&config);
        paths.remove_stale(config.advanced_mode).await;

        let collected = ingest::collect_candidates(&client, &config, &stats).await?;
        let collected_count = collected.len();
        let unique = ingest::dedup_candidates(collected);
        info!("{} unique candidates after dedup", unique.len());

        let finish = |reachable: usize, ranked: usize, regions: usize| SurveyReport {
            collected: collected_count,
            unique: unique.len(),
            reachable,
            ranked,
            regions,
            elapsed_seconds: start_time.elapsed().as_secs_f64(),
        };

        if unique.is_empty() {
            warn!("No candidates collected; nothing to probe");
            return Ok(finish(0, 0, 0));
        }

        // Quick filter: one cheap pass over the full candidate set.
        let probe_engine = ProbeEngine::new(config.test_ports.clone());
        let quick_start = Instant::now();
        let mut quick_survivors: Vec<ProbeResult> = Vec::new();
        for (index, address) in unique.iter().enumerate() {
            match probe_engine.quick_check(address).await {
                Ok(result) if result.reachable => {
                    info!(
                        "[{}/{}] {} reachable ({} ms on port {})",
                        index + 1,
                        unique.len(),
                        address,
                        result.min_delay_ms,
                        result.port
                    );
                    quick_survivors.push(result);
                }
                Ok(_) => {
                    info!("[{}/{}] {} filtered out", index + 1, unique.len(), address);
                }
                Err(e) => {
                    stats.increment(e.error_type());
                    warn!("{}: {}", address, e);
                }
            }
        }
        log_progress(
            "Quick filter",
            quick_survivors.len(),
            unique.len(),
            quick_start,
        );

        if quick_survivors.is_empty() {
            warn!("Quick filter left no reachable addresses");
            save_cache_best_effort(&config, &cache);
            print_error_statistics(&stats);
            return Ok(finish(0, 0, 0));
        }

        let reachable_addresses: Vec<String> = quick_survivors
            .iter()
            .map(|r| r.address.clone())
            .collect();
        report::write_address_list(&paths.basic_list, &reachable_addresses).await?;

        // Region resolution: pooled, cached-first, logged in input order.
        let orchestrator =
            Orchestrator::new(config.max_workers, config.batch_size, Arc::clone(&stats));
        let resolver = Arc::new(RegionResolver::new(
            Arc::clone(&client),
            Arc::clone(&cache),
            Duration::from_secs(config.api_timeout_secs),
            Arc::clone(&stats),
        ));
        let region_results = resolve_regions(&orchestrator, &resolver, reachable_addresses).await;
        for (index, (address, code)) in region_results.iter().enumerate() {
            info!(
                "[{}/{}] {} -> {}",
                index + 1,
                region_results.len(),
                address,
                code
            );
        }

        let delay_by_address: HashMap<&str, u64> = quick_survivors
            .iter()
            .map(|r| (r.address.as_str(), r.min_delay_ms))
            .collect();
        let region_entries: Vec<(String, String, u64)> = region_results
            .iter()
            .map(|(address, code)| {
                let delay = delay_by_address
                    .get(address.as_str())
                    .copied()
                    .unwrap_or(0);
                (address.clone(), code.clone(), delay)
            })
            .collect();
        report::write_lines(
            &paths.regions,
            &report::format_region_groups(&region_entries),
        )
        .await?;
        let distinct_regions = region_entries
            .iter()
            .map(|(_, code, _)| code.as_str())
            .collect::<BTreeSet<_>>()
            .len();

        let mut ranked_count = 0usize;
        if config.advanced_mode {
            ranked_count = run_advanced_stages(
                &config,
                &orchestrator,
                &resolver,
                &probe_engine,
                &paths,
                quick_survivors,
            )
            .await?;
        }

        save_cache_best_effort(&config, &cache);
        print_error_statistics(&stats);

        let report = finish(region_entries.len(), ranked_count, distinct_regions);
        info!(
            "Survey finished: {} reachable, {} ranked in {:.1}s",
            report.reachable, report.ranked, report.elapsed_seconds
        );
        Ok(report)
    }

    /// Deep stages behind `advanced_mode`: latency-rank filter, precise
    /// probe, bandwidth test, scoring, and the ranked output files. Returns
    /// the number of ranked addresses.
    async fn run_advanced_stages(
        config: &Config,
        orchestrator: &Orchestrator,
        resolver: &Arc<RegionResolver>,
        probe_engine: &ProbeEngine,
        paths: &OutputPaths,
        quick_survivors: Vec<ProbeResult>,
    ) -> Result<usize> {
        let survivor_count = quick_survivors.len();
        let shortlist = ranking::latency_rank(quick_survivors, config.latency_filter_percentage);
        info!(
            "Latency filter kept {} of {} addresses for deep testing",
            shortlist.len(),
            survivor_count
        );
        let shortlist_addresses: Vec<String> =
            shortlist.iter().map(|r| r.address.clone()).collect();

        let precise_results = {
            let probe = probe_engine.clone();
            orchestrator
                .run_batched(shortlist_addresses, move |address: String| {
                    let probe = probe.clone();
                    async move { probe.precise_check(&address).await }
                })
                .await
        };
        let confirmed: Vec<ProbeResult> = precise_results
            .into_iter()
            .filter(|(_, result)| result.reachable)
            .map(|(_, result)| result)
            .collect();
        info!("Precise probe confirmed {} addresses", confirmed.len());

        let tester = Arc::new(BandwidthTester::new(
            probe_engine.clone(),
            config.bandwidth_test_count,
            config.bandwidth_test_size_mb,
        ));
        let confirmed_addresses: Vec<String> =
            confirmed.iter().map(|r| r.address.clone()).collect();
        let bandwidth_results = {
            let tester = Arc::clone(&tester);
            orchestrator
                .run_batched(confirmed_addresses, move |address: String| {
                    let tester = Arc::clone(&tester);
                    async move { tester.measure(&address).await }
                })
                .await
        };

        let probe_delays: HashMap<String, u64> = confirmed
            .iter()
            .map(|r| (r.address.clone(), r.min_delay_ms))
            .collect();
        let mut scored = Vec::new();
        for (address, bandwidth) in bandwidth_results
            .into_iter()
            .filter(|(_, bandwidth)| bandwidth.success)
        {
            let min_delay_ms = probe_delays.get(&address).copied().unwrap_or(0);
            // One precise round per address, so the average equals the
            // minimum.
            let avg_delay_ms = min_delay_ms;
            let score = ranking::composite_score(
                min_delay_ms as f64,
                avg_delay_ms as f64,
                bandwidth.bandwidth_mbps.max(0.0),
                DEFAULT_STABILITY,
            );
            scored.push(ScoredResult {
                address,
                min_delay_ms,
                avg_delay_ms,
                bandwidth_mbps: bandwidth.bandwidth_mbps,
                latency_ms: bandwidth.latency_ms,
                score,
            });
        }
        let ranked = ranking::rank_by_score(scored);

        if ranked.is_empty() {
            warn!("Advanced stages produced no rankable addresses");
            return Ok(0);
        }

        let ranked_addresses: Vec<String> = ranked.iter().map(|r| r.address.clone()).collect();
        report::write_address_list(&paths.ranked_list, &ranked_addresses).await?;
        report::write_lines(&paths.ranking, &report::format_ranking(&ranked)).await?;

        // Region-grouped ranked list; these resolutions hit the cache warmed
        // by the basic stage.
        let ranked_regions = resolve_regions(orchestrator, resolver, ranked_addresses).await;
        let ranked_entries: Vec<(String, String, u64)> = ranked_regions
            .iter()
            .map(|(address, code)| {
                let delay = probe_delays.get(address).copied().unwrap_or(0);
                (address.clone(), code.clone(), delay)
            })
            .collect();
        report::write_lines(
            &paths.ranked_regions,
            &report::format_region_groups(&ranked_entries),
        )
        .await?;

        Ok(ranked.len())
    }

    async fn resolve_regions(
        orchestrator: &Orchestrator,
        resolver: &Arc<RegionResolver>,
        addresses: Vec<String>,
    ) -> Vec<(String, String)> {
        let resolver = Arc::clone(resolver);
        orchestrator
            .run_pooled(addresses, move |address: String| {
                let resolver = Arc::clone(&resolver);
                async move { Ok::<_, ProbeError>(resolver.resolve(&address).await) }
            })
            .await
    }

    fn save_cache_best_effort(config: &Config, cache: &RegionCache) {
        if let Err(e) = geo::save_cache(&config.cache_path, &cache.snapshot()) {
            warn!("Failed to save region cache: {:#}", e);
        }
    }
}
