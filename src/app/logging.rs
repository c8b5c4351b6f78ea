//! Progress logging utilities.

use log::info;

/// Logs progress through a pipeline stage.
pub fn log_progress(stage: &str, processed: usize, total: usize, start_time: std::time::Instant) {
    let elapsed = start_time.elapsed().as_secs_f64();
    let rate = if elapsed > 0.0 {
        processed as f64 / elapsed
    } else {
        0.0
    };
    info!(
        "{}: {}/{} addresses in {:.1}s (~{:.1}/sec)",
        stage, processed, total, elapsed, rate
    );
}
