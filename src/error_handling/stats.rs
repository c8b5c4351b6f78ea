//! Processing statistics tracking.
//!
//! Thread-safe failure counters, shared across worker tasks via `Arc`.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use strum::IntoEnumIterator;

use super::types::ErrorType;

/// Thread-safe failure statistics tracker.
///
/// Every [`ErrorType`] gets an atomic counter at construction time, so
/// increments never allocate and can run from any worker task.
pub struct ProcessingStats {
    counters: HashMap<ErrorType, AtomicUsize>,
}

impl ProcessingStats {
    pub fn new() -> Self {
        let mut counters = HashMap::new();
        for error_type in ErrorType::iter() {
            counters.insert(error_type, AtomicUsize::new(0));
        }
        ProcessingStats { counters }
    }

    /// Increment the counter for a failure category.
    ///
    /// All categories are initialized in the constructor; a missing counter
    /// indicates a bug and is logged rather than panicking.
    pub fn increment(&self, error_type: ErrorType) {
        if let Some(counter) = self.counters.get(&error_type) {
            counter.fetch_add(1, Ordering::Relaxed);
        } else {
            log::error!(
                "No counter registered for {:?}; ProcessingStats was not fully initialized",
                error_type
            );
        }
    }

    /// Current count for a failure category.
    pub fn count(&self, error_type: ErrorType) -> usize {
        self.counters
            .get(&error_type)
            .map(|c| c.load(Ordering::SeqCst))
            .unwrap_or(0)
    }

    /// Total failures across all categories.
    pub fn total(&self) -> usize {
        ErrorType::iter().map(|e| self.count(e)).sum()
    }
}

impl Default for ProcessingStats {
    fn default() -> Self {
        Self::new()
    }
}
