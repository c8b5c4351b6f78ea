//! TTL-bounded region cache.

use std::collections::HashMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use chrono::{DateTime, Duration, Utc};

use crate::config::CACHE_CAPACITY;
use crate::models::RegionCacheEntry;

/// In-memory map from address to its cached region resolution.
///
/// `get` applies lazy expiry: an entry at or past the TTL behaves as absent
/// but is only physically removed by [`cleanup`](Self::cleanup), which also
/// compacts the map down to [`CACHE_CAPACITY`] entries, oldest first. Entry
/// writes replace the whole entry, so concurrent readers see either the old
/// or the new value, never a partial one.
pub struct RegionCache {
    ttl: Duration,
    entries: RwLock<HashMap<String, RegionCacheEntry>>,
}

impl RegionCache {
    pub fn new(ttl_hours: u64) -> Self {
        RegionCache {
            ttl: Duration::hours(ttl_hours as i64),
            entries: RwLock::new(HashMap::new()),
        }
    }

    /// Returns the cached entry for `address` if one exists and is younger
    /// than the TTL. Expired entries are left in place for `cleanup`.
    pub fn get(&self, address: &str) -> Option<RegionCacheEntry> {
        let entries = self.read();
        let entry = entries.get(address)?;
        if Utc::now() - entry.resolved_at < self.ttl {
            Some(entry.clone())
        } else {
            None
        }
    }

    /// Inserts or overwrites the entry for `address`, stamped with the
    /// current time.
    pub fn put(&self, address: &str, region: &str) {
        self.put_at(address, region, Utc::now());
    }

    fn put_at(&self, address: &str, region: &str, resolved_at: DateTime<Utc>) {
        let entry = RegionCacheEntry {
            region: region.to_string(),
            resolved_at,
        };
        self.write().insert(address.to_string(), entry);
    }

    /// Removes expired entries, then removes oldest entries until the map is
    /// at most [`CACHE_CAPACITY`]. Idempotent; runs once at process start
    /// before any resolution traffic.
    pub fn cleanup(&self) {
        let now = Utc::now();
        let mut entries = self.write();

        let before = entries.len();
        entries.retain(|_, entry| now - entry.resolved_at < self.ttl);
        let expired = before - entries.len();
        if expired > 0 {
            log::info!("Removed {} expired region cache entries", expired);
        }

        if entries.len() > CACHE_CAPACITY {
            let excess = entries.len() - CACHE_CAPACITY;
            let mut by_age: Vec<(String, DateTime<Utc>)> = entries
                .iter()
                .map(|(address, entry)| (address.clone(), entry.resolved_at))
                .collect();
            by_age.sort_by_key(|(_, resolved_at)| *resolved_at);
            for (address, _) in by_age.into_iter().take(excess) {
                entries.remove(&address);
            }
            log::info!(
                "Region cache over capacity, removed {} oldest entries",
                excess
            );
        }
    }

    /// Replaces the cache contents with entries loaded from persistence.
    pub fn hydrate(&self, loaded: HashMap<String, RegionCacheEntry>) {
        *self.write() = loaded;
    }

    /// A copy of the current contents, for persistence at end of run.
    pub fn snapshot(&self) -> HashMap<String, RegionCacheEntry> {
        self.read().clone()
    }

    /// Number of physically present entries, expired ones included.
    pub fn len(&self) -> usize {
        self.read().len()
    }

    /// Whether the cache holds no entries at all.
    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }

    // A poisoned lock only means another thread panicked mid-access; the map
    // itself is still whole-entry consistent, so keep serving it.
    fn read(&self) -> RwLockReadGuard<'_, HashMap<String, RegionCacheEntry>> {
        self.entries.read().unwrap_or_else(|e| e.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, HashMap<String, RegionCacheEntry>> {
        self.entries.write().unwrap_or_else(|e| e.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stale(hours: i64) -> DateTime<Utc> {
        Utc::now() - Duration::hours(hours)
    }

    #[test]
    fn test_get_returns_fresh_entry() {
        let cache = RegionCache::new(24);
        assert!(cache.is_empty());
        cache.put("1.1.1.1", "US");
        let entry = cache.get("1.1.1.1").expect("fresh entry should be present");
        assert_eq!(entry.region, "US");
    }

    #[test]
    fn test_get_treats_expired_entry_as_absent() {
        let cache = RegionCache::new(24);
        cache.put_at("1.1.1.1", "US", stale(25));
        assert!(cache.get("1.1.1.1").is_none());
        // Lazy expiry: the entry is still physically present until cleanup.
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_put_overwrites_existing_entry() {
        let cache = RegionCache::new(24);
        cache.put("1.1.1.1", "US");
        cache.put("1.1.1.1", "DE");
        let entry = cache.get("1.1.1.1").expect("entry should be present");
        assert_eq!(entry.region, "DE");
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_cleanup_removes_expired_entries() {
        let cache = RegionCache::new(24);
        cache.put_at("1.1.1.1", "US", stale(30));
        cache.put("2.2.2.2", "DE");
        cache.cleanup();
        assert_eq!(cache.len(), 1);
        assert!(cache.get("2.2.2.2").is_some());
    }

    #[test]
    fn test_cleanup_caps_at_capacity_oldest_first() {
        let cache = RegionCache::new(24 * 365);
        for i in 0..(CACHE_CAPACITY + 50) {
            let address = format!("10.0.{}.{}", i / 256, i % 256);
            // Older timestamps for lower indices, all within TTL.
            cache.put_at(&address, "US", stale((CACHE_CAPACITY + 50 - i) as i64));
        }
        cache.cleanup();
        assert_eq!(cache.len(), CACHE_CAPACITY);
        // The 50 oldest entries (lowest indices) are gone, the newest remain.
        assert!(cache.get("10.0.0.0").is_none());
        assert!(cache
            .get(&format!(
                "10.0.{}.{}",
                (CACHE_CAPACITY + 49) / 256,
                (CACHE_CAPACITY + 49) % 256
            ))
            .is_some());
    }

    #[test]
    fn test_cleanup_is_idempotent() {
        let cache = RegionCache::new(24);
        cache.put("1.1.1.1", "US");
        cache.put_at("2.2.2.2", "DE", stale(48));
        cache.cleanup();
        let after_first = cache.snapshot();
        cache.cleanup();
        assert_eq!(cache.snapshot(), after_first);
    }

    #[test]
    fn test_hydrate_and_snapshot_round_trip() {
        let cache = RegionCache::new(24);
        cache.put("1.1.1.1", "US");
        let snapshot = cache.snapshot();

        let restored = RegionCache::new(24);
        restored.hydrate(snapshot);
        assert_eq!(
            restored.get("1.1.1.1").map(|e| e.region),
            Some("US".to_string())
        );
    }
}
