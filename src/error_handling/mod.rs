//! Error taxonomy and failure statistics.
//!
//! Probe, resolve, and measure operations return typed [`ProbeError`]s;
//! failures are tallied per [`ErrorType`] in a shared [`ProcessingStats`]
//! and printed at the end of the run. No error in this module crosses a
//! component boundary as a panic.

mod stats;
mod types;

pub use stats::ProcessingStats;
pub use types::{ErrorType, ProbeError};
