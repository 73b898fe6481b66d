//! Persistent cache of journal impact metrics.
//!
//! The cache maps a canonical journal key to either a metric or `null`.
//! The two absent states are kept apart:
//!
//! ```text
//! "advanced materials": { "display_name": "Advanced Materials", "impact": 27.4 }
//! "lab notes":          null      <- looked up, nothing found, never re-queried
//! (key missing)                   <- never looked up, will be queried
//! ```
//!
//! The whole mapping is stored as one JSON blob and written once per
//! resolution batch.

use std::collections::BTreeMap;
use std::io;
use std::sync::Arc;

use crate::models::JournalMetric;
use crate::utils::store::BlobStore;

/// Default blob key of the metrics cache
pub const DEFAULT_CACHE_KEY: &str = "journal_metrics.json";

/// Result of a cache lookup
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CacheResult<'a> {
    /// Key was resolved to a metric
    Hit(&'a JournalMetric),

    /// Key was looked up before and nothing was found
    NotFound,

    /// Key was never looked up
    Miss,
}

/// Journal metrics cache backed by a [`BlobStore`]
#[derive(Debug, Clone)]
pub struct MetricsCache {
    entries: BTreeMap<String, Option<JournalMetric>>,
    store: Arc<dyn BlobStore>,
    key: String,
}

impl MetricsCache {
    /// Load the cache from the store
    ///
    /// A missing or unreadable blob yields an empty cache; this never fails.
    pub fn load(store: Arc<dyn BlobStore>, key: impl Into<String>) -> Self {
        let key = key.into();
        let entries = match store.read_text(&key) {
            Ok(Some(text)) => match serde_json::from_str(&text) {
                Ok(entries) => entries,
                Err(e) => {
                    tracing::warn!(key = %key, error = %e, "metrics cache is corrupt, starting empty");
                    BTreeMap::new()
                }
            },
            Ok(None) => {
                tracing::debug!(key = %key, "no metrics cache yet");
                BTreeMap::new()
            }
            Err(e) => {
                tracing::warn!(key = %key, error = %e, "failed to read metrics cache, starting empty");
                BTreeMap::new()
            }
        };

        tracing::info!(entries = entries.len(), "loaded journal metrics cache");
        Self { entries, store, key }
    }

    /// Whether the key was ever looked up (resolved or not)
    pub fn has(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    /// Look up a key
    pub fn get(&self, key: &str) -> CacheResult<'_> {
        match self.entries.get(key) {
            Some(Some(metric)) => CacheResult::Hit(metric),
            Some(None) => CacheResult::NotFound,
            None => CacheResult::Miss,
        }
    }

    /// Record the outcome of a lookup; `None` means "looked up, not found"
    pub fn put(&mut self, key: impl Into<String>, value: Option<JournalMetric>) {
        self.entries.insert(key.into(), value);
    }

    /// Persist the full mapping
    pub fn save(&self) -> io::Result<()> {
        let text = serde_json::to_string_pretty(&self.entries)?;
        self.store.write_text(&self.key, &text)?;
        tracing::info!(entries = self.entries.len(), key = %self.key, "saved journal metrics cache");
        Ok(())
    }

    /// Blob key the cache is persisted under
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Number of keys, including `null` entries
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::store::{FileStore, MemoryStore};
    use tempfile::TempDir;

    #[test]
    fn test_load_missing_is_empty() {
        let cache = MetricsCache::load(Arc::new(MemoryStore::new()), DEFAULT_CACHE_KEY);
        assert!(cache.is_empty());
        assert_eq!(cache.get("nature"), CacheResult::Miss);
    }

    #[test]
    fn test_load_corrupt_is_empty() {
        let store = Arc::new(MemoryStore::new());
        store.write_text(DEFAULT_CACHE_KEY, "{ not json").unwrap();

        let cache = MetricsCache::load(store, DEFAULT_CACHE_KEY);
        assert!(cache.is_empty());
    }

    #[test]
    fn test_null_and_absent_are_distinct() {
        let mut cache = MetricsCache::load(Arc::new(MemoryStore::new()), DEFAULT_CACHE_KEY);
        cache.put("lab notes", None);
        cache.put("nature", Some(JournalMetric::new("Nature", Some(18.5))));

        assert!(cache.has("lab notes"));
        assert_eq!(cache.get("lab notes"), CacheResult::NotFound);
        assert!(!cache.has("science"));
        assert_eq!(cache.get("science"), CacheResult::Miss);
        match cache.get("nature") {
            CacheResult::Hit(metric) => assert_eq!(metric.impact, Some(18.5)),
            other => panic!("expected hit, got {:?}", other),
        }
    }

    #[test]
    fn test_save_load_round_trip() {
        let dir = TempDir::new().unwrap();
        let store: Arc<dyn BlobStore> = Arc::new(FileStore::new(dir.path()));

        let mut cache = MetricsCache::load(store.clone(), DEFAULT_CACHE_KEY);
        cache.put("advanced materials", Some(JournalMetric::new("Advanced Materials", Some(27.4))));
        cache.put("lab notes", None);
        cache.put("obscure letters", Some(JournalMetric::new("Obscure Letters", None)));
        cache.save().unwrap();

        let reloaded = MetricsCache::load(store, DEFAULT_CACHE_KEY);
        assert_eq!(reloaded.entries, cache.entries);
        assert_eq!(reloaded.get("lab notes"), CacheResult::NotFound);
    }

    #[test]
    fn test_saved_format() {
        let store = Arc::new(MemoryStore::new());
        let mut cache = MetricsCache::load(store.clone(), DEFAULT_CACHE_KEY);
        cache.put("lab notes", None);
        cache.save().unwrap();

        let text = store.read_text(DEFAULT_CACHE_KEY).unwrap().unwrap();
        let value: serde_json::Value = serde_json::from_str(&text).unwrap();
        assert!(value["lab notes"].is_null());
    }
}
