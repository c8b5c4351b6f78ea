//! Statistics printing.

use log::info;
use strum::IntoEnumIterator;

use crate::error_handling::{ErrorType, ProcessingStats};

/// Prints per-category failure counts to the log.
///
/// Silent when nothing failed; otherwise one line per non-zero category, so
/// a run's degradations (unreachable vs. abandoned-at-deadline vs. provider
/// trouble) are distinguishable after the fact.
pub fn print_error_statistics(stats: &ProcessingStats) {
    let total = stats.total();
    if total == 0 {
        return;
    }

    info!("Failure counts ({} total):", total);
    for error_type in ErrorType::iter() {
        let count = stats.count(error_type);
        if count > 0 {
            info!("   {}: {}", error_type.as_str(), count);
        }
    }
}
