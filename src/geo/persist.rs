//! Region cache persistence.
//!
//! The cache survives runs as a JSON map from address to entry. Loading
//! happens once before any resolution traffic, saving once after the run.

use std::collections::HashMap;
use std::path::Path;

use anyhow::{Context, Result};

use crate::error_handling::ProbeError;
use crate::models::RegionCacheEntry;

/// Loads persisted cache entries.
///
/// Returns `Ok(None)` when no cache file exists yet. An unreadable or
/// unparseable file is reported as [`ProbeError::CacheCorruption`]; the
/// caller recovers by starting from an empty cache.
pub fn load_cache(path: &Path) -> Result<Option<HashMap<String, RegionCacheEntry>>, ProbeError> {
    if !path.exists() {
        return Ok(None);
    }

    let content = std::fs::read_to_string(path)
        .map_err(|e| ProbeError::CacheCorruption(format!("{}: {}", path.display(), e)))?;
    let entries: HashMap<String, RegionCacheEntry> = serde_json::from_str(&content)
        .map_err(|e| ProbeError::CacheCorruption(format!("{}: {}", path.display(), e)))?;

    Ok(Some(entries))
}

/// Saves the cache contents, replacing any previous file.
pub fn save_cache(path: &Path, entries: &HashMap<String, RegionCacheEntry>) -> Result<()> {
    let content = serde_json::to_string(entries).context("Failed to serialize region cache")?;
    std::fs::write(path, content)
        .with_context(|| format!("Failed to write region cache to {}", path.display()))?;
    log::info!(
        "Saved region cache with {} entries to {}",
        entries.len(),
        path.display()
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    #[test]
    fn test_load_missing_file_is_none() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("region_cache.json");
        assert!(load_cache(&path).expect("missing file is not an error").is_none());
    }

    #[test]
    fn test_save_and_load_round_trip() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("region_cache.json");

        let mut entries = HashMap::new();
        entries.insert(
            "1.1.1.1".to_string(),
            RegionCacheEntry {
                region: "US".to_string(),
                resolved_at: Utc::now(),
            },
        );
        save_cache(&path, &entries).expect("save should succeed");

        let loaded = load_cache(&path)
            .expect("load should succeed")
            .expect("file should exist");
        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded["1.1.1.1"].region, "US");
    }

    #[test]
    fn test_corrupt_file_reports_cache_corruption() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("region_cache.json");
        std::fs::write(&path, "{not json").expect("write");

        match load_cache(&path) {
            Err(ProbeError::CacheCorruption(_)) => {}
            other => panic!("expected CacheCorruption, got {:?}", other.map(|_| ())),
        }
    }
}
