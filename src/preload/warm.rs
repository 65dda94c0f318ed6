//! Memory-bounded store for preloaded source bytes.
//!
//! Bytes live in an LRU keyed by item path, capped by a byte budget. Inserting
//! past the budget evicts least recently used entries; the evicted keys are
//! returned so the preloader can forget them and warm them again on demand.

use std::sync::Arc;

use lru::LruCache;
use parking_lot::RwLock;
use tracing::{debug, trace};

/// Default warm-memory budget in megabytes.
pub const DEFAULT_PRELOAD_MB: usize = 256;

struct WarmInner {
    max_bytes: usize,
    current_bytes: usize,
    entries: LruCache<String, Arc<[u8]>>,
}

/// Shared byte store. Cloning yields another handle to the same store.
#[derive(Clone)]
pub struct WarmStore {
    inner: Arc<RwLock<WarmInner>>,
}

impl Default for WarmStore {
    fn default() -> Self {
        Self::new(DEFAULT_PRELOAD_MB * 1024 * 1024)
    }
}

impl WarmStore {
    pub fn new(max_bytes: usize) -> Self {
        debug!(max_bytes, "Initialized warm store");
        Self {
            inner: Arc::new(RwLock::new(WarmInner {
                max_bytes,
                current_bytes: 0,
                entries: LruCache::unbounded(),
            })),
        }
    }

    pub fn max_bytes(&self) -> usize {
        self.inner.read().max_bytes
    }

    /// Bytes currently held.
    pub fn current_bytes(&self) -> usize {
        self.inner.read().current_bytes
    }

    pub fn len(&self) -> usize {
        self.inner.read().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.read().entries.is_empty()
    }

    pub fn contains(&self, key: &str) -> bool {
        self.inner.read().entries.contains(key)
    }

    /// Fetch warm bytes, marking the entry as recently used.
    pub fn get(&self, key: &str) -> Option<Arc<[u8]>> {
        self.inner.write().entries.get(key).cloned()
    }

    /// Store bytes for `key`, evicting older entries to stay within budget.
    ///
    /// Returns every key that is no longer warm as a result. An entry larger
    /// than the whole budget is not stored and its own key is returned.
    pub fn insert(&self, key: &str, data: Arc<[u8]>) -> Vec<String> {
        let mut inner = self.inner.write();
        let size = data.len();
        if size > inner.max_bytes {
            trace!(key, size, "Source exceeds warm budget");
            return vec![key.to_string()];
        }

        if let Some(old) = inner.entries.pop(key) {
            inner.current_bytes = inner.current_bytes.saturating_sub(old.len());
        }

        let mut evicted = Vec::new();
        while inner.current_bytes + size > inner.max_bytes {
            let Some((old_key, old)) = inner.entries.pop_lru() else {
                break;
            };
            inner.current_bytes = inner.current_bytes.saturating_sub(old.len());
            trace!(
                key = %old_key,
                evicted_bytes = old.len(),
                current_bytes = inner.current_bytes,
                "Evicted warm source"
            );
            evicted.push(old_key);
        }

        inner.entries.put(key.to_string(), data);
        inner.current_bytes += size;
        evicted
    }

    /// Drop one entry. Returns true if it was warm.
    pub fn remove(&self, key: &str) -> bool {
        let mut inner = self.inner.write();
        let popped = inner.entries.pop(key);
        match popped {
            Some(old) => {
                inner.current_bytes = inner.current_bytes.saturating_sub(old.len());
                true
            }
            None => false,
        }
    }

    /// Keys currently warm, most recently used first.
    pub fn keys(&self) -> Vec<String> {
        self.inner
            .read()
            .entries
            .iter()
            .map(|(k, _)| k.clone())
            .collect()
    }

    pub fn clear(&self) {
        let mut inner = self.inner.write();
        let dropped = inner.entries.len();
        inner.entries.clear();
        inner.current_bytes = 0;
        debug!(dropped, "Cleared warm store");
    }
}

impl std::fmt::Debug for WarmStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let inner = self.inner.read();
        f.debug_struct("WarmStore")
            .field("entries", &inner.entries.len())
            .field("current_bytes", &inner.current_bytes)
            .field("max_bytes", &inner.max_bytes)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bytes(n: usize) -> Arc<[u8]> {
        Arc::from(vec![0u8; n])
    }

    #[test]
    fn test_insert_within_budget() {
        let store = WarmStore::new(100);
        assert!(store.insert("/a.jpg", bytes(40)).is_empty());
        assert!(store.insert("/b.jpg", bytes(40)).is_empty());
        assert_eq!(store.current_bytes(), 80);
        assert_eq!(store.get("/a.jpg").map(|d| d.len()), Some(40));
    }

    #[test]
    fn test_evicts_least_recently_used() {
        let store = WarmStore::new(100);
        store.insert("/a.jpg", bytes(40));
        store.insert("/b.jpg", bytes(40));
        // Touch a so b becomes the eviction candidate.
        store.get("/a.jpg");

        let evicted = store.insert("/c.jpg", bytes(40));
        assert_eq!(evicted, vec!["/b.jpg".to_string()]);
        assert!(store.contains("/a.jpg"));
        assert!(!store.contains("/b.jpg"));
        assert_eq!(store.current_bytes(), 80);
    }

    #[test]
    fn test_oversized_entry_is_rejected() {
        let store = WarmStore::new(10);
        store.insert("/small.jpg", bytes(5));
        assert_eq!(store.insert("/huge.jpg", bytes(11)), vec!["/huge.jpg".to_string()]);
        assert!(store.contains("/small.jpg"));
        assert_eq!(store.current_bytes(), 5);
    }

    #[test]
    fn test_reinsert_replaces_size() {
        let store = WarmStore::new(100);
        store.insert("/a.jpg", bytes(60));
        store.insert("/a.jpg", bytes(20));
        assert_eq!(store.current_bytes(), 20);
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_remove_and_clear() {
        let store = WarmStore::new(100);
        let shared = store.clone();
        store.insert("/a.jpg", bytes(10));
        store.insert("/b.jpg", bytes(10));

        assert!(shared.remove("/a.jpg"));
        assert!(!shared.remove("/a.jpg"));
        assert_eq!(store.current_bytes(), 10);

        store.clear();
        assert!(shared.is_empty());
        assert_eq!(shared.current_bytes(), 0);
    }
}
