//! Cache-assisted region resolution.

use std::sync::Arc;
use std::time::Duration;

use reqwest::Client;
use serde::Deserialize;

use crate::config::{FALLBACK_GEO_URL, PRIMARY_GEO_URL, UNKNOWN_REGION};
use crate::error_handling::{ErrorType, ProbeError, ProcessingStats};
use crate::geo::cache::RegionCache;

#[derive(Debug, Deserialize)]
struct PrimaryResponse {
    #[serde(default)]
    status: String,
    #[serde(rename = "countryCode", default)]
    country_code: String,
}

#[derive(Debug, Deserialize)]
struct FallbackResponse {
    #[serde(default)]
    success: bool,
    #[serde(default)]
    country_code: String,
}

/// Resolves an address to a region code via cache-or-query.
///
/// Resolution order: cache hit, primary provider, fallback provider,
/// [`UNKNOWN_REGION`]. Exactly one provider result is recorded per
/// resolution, and failures are written through too so a dead address does
/// not re-query on every run. `resolve` itself never fails; provider errors
/// are counted in the shared statistics and degrade to the next step.
pub struct RegionResolver {
    client: Arc<Client>,
    cache: Arc<RegionCache>,
    api_timeout: Duration,
    stats: Arc<ProcessingStats>,
    primary_url: String,
    fallback_url: String,
}

impl RegionResolver {
    pub fn new(
        client: Arc<Client>,
        cache: Arc<RegionCache>,
        api_timeout: Duration,
        stats: Arc<ProcessingStats>,
    ) -> Self {
        RegionResolver {
            client,
            cache,
            api_timeout,
            stats,
            primary_url: PRIMARY_GEO_URL.to_string(),
            fallback_url: FALLBACK_GEO_URL.to_string(),
        }
    }

    #[cfg(test)]
    fn with_providers(mut self, primary_url: &str, fallback_url: &str) -> Self {
        self.primary_url = primary_url.to_string();
        self.fallback_url = fallback_url.to_string();
        self
    }

    /// Resolves `address` to a region code, consulting the cache first.
    pub async fn resolve(&self, address: &str) -> String {
        if let Some(entry) = self.cache.get(address) {
            log::debug!("Region for {} served from cache: {}", address, entry.region);
            return entry.region;
        }

        match self.query_primary(address).await {
            Ok(code) => {
                self.cache.put(address, &code);
                log::debug!("Primary provider resolved {} -> {}", address, code);
                return code;
            }
            Err(e) => {
                self.stats.increment(ErrorType::PrimaryProviderError);
                log::warn!("Primary geolocation provider failed for {}: {}", address, e);
            }
        }

        match self.query_fallback(address).await {
            Ok(code) => {
                self.cache.put(address, &code);
                log::debug!("Fallback provider resolved {} -> {}", address, code);
                return code;
            }
            Err(e) => {
                self.stats.increment(ErrorType::FallbackProviderError);
                log::warn!(
                    "Fallback geolocation provider failed for {}: {}",
                    address,
                    e
                );
            }
        }

        self.cache.put(address, UNKNOWN_REGION);
        UNKNOWN_REGION.to_string()
    }

    async fn query_primary(&self, address: &str) -> Result<String, ProbeError> {
        let url = self.primary_url.replace("{ip}", address);
        let response: PrimaryResponse = self.fetch_json(&url).await?;
        if response.status == "success" && !response.country_code.is_empty() {
            Ok(response.country_code.to_uppercase())
        } else {
            Err(ProbeError::Provider(format!(
                "primary provider returned status '{}'",
                response.status
            )))
        }
    }

    async fn query_fallback(&self, address: &str) -> Result<String, ProbeError> {
        let url = self.fallback_url.replace("{ip}", address);
        let response: FallbackResponse = self.fetch_json(&url).await?;
        if response.success && !response.country_code.is_empty() {
            Ok(response.country_code.to_uppercase())
        } else {
            Err(ProbeError::Provider(
                "fallback provider returned no country code".to_string(),
            ))
        }
    }

    async fn fetch_json<T: for<'de> Deserialize<'de>>(&self, url: &str) -> Result<T, ProbeError> {
        let response = self
            .client
            .get(url)
            .timeout(self.api_timeout)
            .send()
            .await
            .map_err(|e| ProbeError::Provider(e.to_string()))?;
        if !response.status().is_success() {
            return Err(ProbeError::Provider(format!(
                "HTTP {}",
                response.status().as_u16()
            )));
        }
        response
            .json::<T>()
            .await
            .map_err(|e| ProbeError::Provider(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn resolver_with_dead_providers(
        cache: Arc<RegionCache>,
        stats: Arc<ProcessingStats>,
    ) -> RegionResolver {
        // Nothing listens on port 9 of localhost; connects fail immediately,
        // exercising the provider-error path without real network traffic.
        RegionResolver::new(
            Arc::new(Client::new()),
            cache,
            Duration::from_millis(500),
            stats,
        )
        .with_providers("http://127.0.0.1:9/{ip}", "http://127.0.0.1:9/fb/{ip}")
    }

    #[tokio::test]
    async fn test_cache_hit_skips_providers() {
        let cache = Arc::new(RegionCache::new(24));
        cache.put("1.1.1.1", "US");
        let stats = Arc::new(ProcessingStats::new());
        let resolver = resolver_with_dead_providers(Arc::clone(&cache), Arc::clone(&stats));

        let code = resolver.resolve("1.1.1.1").await;

        assert_eq!(code, "US");
        // Cache hit means neither provider was contacted.
        assert_eq!(stats.count(ErrorType::PrimaryProviderError), 0);
        assert_eq!(stats.count(ErrorType::FallbackProviderError), 0);
    }

    #[tokio::test]
    async fn test_both_providers_failing_caches_unknown() {
        let cache = Arc::new(RegionCache::new(24));
        let stats = Arc::new(ProcessingStats::new());
        let resolver = resolver_with_dead_providers(Arc::clone(&cache), Arc::clone(&stats));

        let code = resolver.resolve("203.0.113.7").await;

        assert_eq!(code, UNKNOWN_REGION);
        assert_eq!(stats.count(ErrorType::PrimaryProviderError), 1);
        assert_eq!(stats.count(ErrorType::FallbackProviderError), 1);
        // The failure was written through.
        assert_eq!(
            cache.get("203.0.113.7").map(|e| e.region),
            Some(UNKNOWN_REGION.to_string())
        );
    }

    #[tokio::test]
    async fn test_second_resolve_within_ttl_issues_no_network_calls() {
        let cache = Arc::new(RegionCache::new(24));
        let stats = Arc::new(ProcessingStats::new());
        let resolver = resolver_with_dead_providers(Arc::clone(&cache), Arc::clone(&stats));

        resolver.resolve("203.0.113.8").await;
        let after_first_primary = stats.count(ErrorType::PrimaryProviderError);
        let after_first_fallback = stats.count(ErrorType::FallbackProviderError);

        let code = resolver.resolve("203.0.113.8").await;

        // The second call is served from cache: the provider-attempt counters
        // did not move, so no further network calls were made.
        assert_eq!(code, UNKNOWN_REGION);
        assert_eq!(stats.count(ErrorType::PrimaryProviderError), after_first_primary);
        assert_eq!(
            stats.count(ErrorType::FallbackProviderError),
            after_first_fallback
        );
    }
}
