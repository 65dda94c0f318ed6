//! Session-scoped image source cache.
//!
//! Maps an item key (its path) to the resolved handle the host renders from.
//! Entries are inserted if absent and never overwritten or evicted while a
//! directory is open; the whole cache is cleared when the session loads a new
//! directory. Handles are small (path and URI); prefetched bytes live in the
//! budgeted `WarmStore` instead.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use parking_lot::RwLock;
use tracing::debug;

/// URI scheme used for host-resolvable file sources.
const SOURCE_SCHEME: &str = "file://";

/// A resolved image source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceHandle {
    /// Path of the source image.
    pub path: PathBuf,
    /// URI the host image loader can open directly.
    pub uri: String,
}

impl SourceHandle {
    /// Resolve a path without fetching anything.
    pub fn from_path(path: &Path) -> Self {
        Self {
            path: path.to_path_buf(),
            uri: source_uri(path),
        }
    }
}

fn source_uri(path: &Path) -> String {
    let raw = path.to_string_lossy().replace('\\', "/");
    if raw.starts_with('/') {
        format!("{}{}", SOURCE_SCHEME, raw)
    } else {
        format!("{}/{}", SOURCE_SCHEME, raw)
    }
}

/// Shared path -> source map. Cloning yields another handle to the same cache.
#[derive(Clone, Default)]
pub struct SourceCache {
    entries: Arc<RwLock<HashMap<String, SourceHandle>>>,
}

impl SourceCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Option<SourceHandle> {
        self.entries.read().get(key).cloned()
    }

    pub fn contains(&self, key: &str) -> bool {
        self.entries.read().contains_key(key)
    }

    /// Insert `handle` unless the key already has an entry.
    ///
    /// Returns true if the handle was stored.
    pub fn insert_if_absent(&self, key: &str, handle: SourceHandle) -> bool {
        let mut entries = self.entries.write();
        if entries.contains_key(key) {
            return false;
        }
        entries.insert(key.to_string(), handle);
        true
    }

    /// Look up a source, resolving and storing it on first use.
    pub fn get_or_resolve(&self, path: &Path) -> SourceHandle {
        let key = path.to_string_lossy();
        if let Some(existing) = self.entries.read().get(key.as_ref()) {
            return existing.clone();
        }

        self.entries
            .write()
            .entry(key.into_owned())
            .or_insert_with(|| SourceHandle::from_path(path))
            .clone()
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }

    /// Drop every entry. Called when a new directory is loaded.
    pub fn clear(&self) {
        let mut entries = self.entries.write();
        let dropped = entries.len();
        entries.clear();
        debug!(dropped, "Cleared source cache");
    }
}

impl std::fmt::Debug for SourceCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SourceCache")
            .field("entries", &self.len())
            .finish()
    }
}
