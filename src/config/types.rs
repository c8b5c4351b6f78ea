//! Configuration types and CLI options.

use std::path::PathBuf;

use anyhow::{bail, Result};
use clap::{Parser, ValueEnum};

use crate::config::constants::DEFAULT_SOURCES;

/// Logging level for the application.
#[derive(Clone, Debug, ValueEnum)]
pub enum LogLevel {
    /// Only error messages
    Error,
    /// Error and warning messages
    Warn,
    /// Error, warning, and informational messages
    Info,
    /// All messages except trace
    Debug,
    /// All messages including trace
    Trace,
}

impl From<LogLevel> for log::LevelFilter {
    fn from(l: LogLevel) -> Self {
        match l {
            LogLevel::Error => log::LevelFilter::Error,
            LogLevel::Warn => log::LevelFilter::Warn,
            LogLevel::Info => log::LevelFilter::Info,
            LogLevel::Debug => log::LevelFilter::Debug,
            LogLevel::Trace => log::LevelFilter::Trace,
        }
    }
}

/// Log output format.
#[derive(Clone, Debug, ValueEnum)]
pub enum LogFormat {
    /// Human-readable format with colors (default)
    Plain,
    /// Structured JSON format for machine parsing
    Json,
}

/// Survey configuration.
///
/// Doubles as the CLI surface of the binary; library callers construct it
/// directly and rely on `Default` for everything they don't care about.
///
/// # Examples
///
/// ```no_run
/// use ip_prospector::Config;
///
/// let config = Config {
///     test_ports: vec![443, 8443],
///     max_workers: 20,
///     ..Default::default()
/// };
/// ```
#[derive(Debug, Clone, Parser)]
#[command(
    name = "ip_prospector",
    about = "Discovers, probes, and ranks IPv4 endpoints from public lists."
)]
pub struct Config {
    /// TCP ports probed during reachability scans
    #[arg(long, value_delimiter = ',', default_value = "443")]
    pub test_ports: Vec<u16>,

    /// Timeout for fetching a candidate source, in seconds
    #[arg(long, default_value_t = 15)]
    pub timeout_secs: u64,

    /// Timeout for a geolocation provider query, in seconds
    #[arg(long, default_value_t = 5)]
    pub api_timeout_secs: u64,

    /// Maximum concurrent worker tasks per stage
    #[arg(long, default_value_t = 15)]
    pub max_workers: usize,

    /// Number of addresses dispatched per orchestrator batch
    #[arg(long, default_value_t = 10)]
    pub batch_size: usize,

    /// Region cache entry time-to-live, in hours
    #[arg(long, default_value_t = 168)]
    pub cache_ttl_hours: u64,

    /// Run the deep stages (precise probe, bandwidth test, scoring)
    #[arg(long, default_value_t = true, action = clap::ArgAction::Set)]
    pub advanced_mode: bool,

    /// Rounds per bandwidth measurement
    #[arg(long, default_value_t = 3)]
    pub bandwidth_test_count: u32,

    /// Requested bandwidth test download size, in MB
    #[arg(long, default_value_t = 10)]
    pub bandwidth_test_size_mb: u64,

    /// Percentage of quick-filter survivors kept for deep testing, in (0, 100]
    #[arg(long, default_value_t = 30.0)]
    pub latency_filter_percentage: f64,

    /// Candidate source URL; repeatable. Defaults to the built-in source list.
    #[arg(long = "source")]
    pub sources: Vec<String>,

    /// Directory for the output files
    #[arg(long, default_value = ".")]
    pub output_dir: PathBuf,

    /// Path of the persisted region cache
    #[arg(long, default_value = "./region_cache.json")]
    pub cache_path: PathBuf,

    /// Log level
    #[arg(long, value_enum, default_value = "info")]
    pub log_level: LogLevel,

    /// Log format
    #[arg(long, value_enum, default_value = "plain")]
    pub log_format: LogFormat,
}

impl Config {
    /// The effective source list: configured sources, or the built-in list
    /// when none were given.
    pub fn effective_sources(&self) -> Vec<String> {
        if self.sources.is_empty() {
            DEFAULT_SOURCES.iter().map(|s| s.to_string()).collect()
        } else {
            self.sources.clone()
        }
    }

    /// Rejects configurations the pipeline cannot run with.
    pub fn validate(&self) -> Result<()> {
        if self.test_ports.is_empty() {
            bail!("at least one test port is required");
        }
        if self.max_workers == 0 {
            bail!("max_workers must be at least 1");
        }
        if self.batch_size == 0 {
            bail!("batch_size must be at least 1");
        }
        if self.bandwidth_test_count == 0 {
            bail!("bandwidth_test_count must be at least 1");
        }
        if !(self.latency_filter_percentage > 0.0 && self.latency_filter_percentage <= 100.0) {
            bail!(
                "latency_filter_percentage must be in (0, 100], got {}",
                self.latency_filter_percentage
            );
        }
        Ok(())
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            test_ports: vec![443],
            timeout_secs: 15,
            api_timeout_secs: 5,
            max_workers: 15,
            batch_size: 10,
            cache_ttl_hours: 168,
            advanced_mode: true,
            bandwidth_test_count: 3,
            bandwidth_test_size_mb: 10,
            latency_filter_percentage: 30.0,
            sources: Vec::new(),
            output_dir: PathBuf::from("."),
            cache_path: PathBuf::from("./region_cache.json"),
            log_level: LogLevel::Info,
            log_format: LogFormat::Plain,
        }
    }
}
