//! Application initialization and resource setup.
//!
//! Shared resources created once per run: the HTTP client and the logger.

mod client;
mod logger;

// Re-export public API
pub use client::init_client;
pub use logger::init_logger_with;
