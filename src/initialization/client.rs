//! HTTP client initialization.

use std::sync::Arc;
use std::time::Duration;

use reqwest::ClientBuilder;

use crate::config::{Config, USER_AGENT};

/// Initializes the shared HTTP client.
///
/// One client serves source ingestion and geolocation queries for all
/// workers; its connection pool is the only cross-cutting shared network
/// resource. Per-request timeouts override the client default where a stage
/// needs a tighter bound.
///
/// # Errors
///
/// Returns a `reqwest::Error` if client creation fails.
pub fn init_client(config: &Config) -> Result<Arc<reqwest::Client>, reqwest::Error> {
    let client = ClientBuilder::new()
        .timeout(Duration::from_secs(config.timeout_secs))
        .user_agent(USER_AGENT)
        .build()?;
    Ok(Arc::new(client))
}
