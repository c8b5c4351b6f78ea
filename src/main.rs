//! Main application entry point (CLI binary).
//!
//! This is a thin wrapper around the `ip_prospector` library that handles:
//! - Command-line argument parsing
//! - Logger initialization
//! - User-facing output formatting
//!
//! All core functionality is implemented in the library crate.

use anyhow::{Context, Result};
use clap::Parser;
use std::process;

use ip_prospector::initialization::init_logger_with;
use ip_prospector::{run_survey, Config};

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::parse();

    let log_level = config.log_level.clone();
    let log_format = config.log_format.clone();
    init_logger_with(log_level.into(), log_format).context("Failed to initialize logger")?;

    match run_survey(config).await {
        Ok(report) => {
            println!(
                "Surveyed {} unique address{} ({} reachable, {} ranked, {} region{}) in {:.1}s",
                report.unique,
                if report.unique == 1 { "" } else { "es" },
                report.reachable,
                report.ranked,
                report.regions,
                if report.regions == 1 { "" } else { "s" },
                report.elapsed_seconds
            );
            Ok(())
        }
        Err(e) => {
            eprintln!("ip_prospector error: {:#}", e);
            process::exit(1);
        }
    }
}
