//! In-memory cache for resolved lookup choices.
//!
//! Uses moka's concurrent cache implementation.

use moka::sync::Cache;

/// Thread-safe in-memory cache with configurable capacity.
///
/// Used by the client to keep dynamic-choice lookups (`MemCache<String, Vec<Choice>>`)
/// so a form host can re-render without re-issuing the list call.
#[derive(Clone)]
pub struct MemCache<K, V> {
    entries: Cache<K, V>,
}

impl<K, V> MemCache<K, V>
where
    K: std::hash::Hash + Eq + Send + Sync + 'static,
    V: Clone + Send + Sync + 'static,
{
    /// Allocate a new [`MemCache`].
    pub fn new(capacity: u64) -> Self {
        Self {
            entries: Cache::new(capacity),
        }
    }

    pub fn set(
        &self,
        key: K,
        value: V,
    ) {
        self.entries.insert(key, value);
    }

    pub fn get(
        &self,
        key: &K,
    ) -> Option<V> {
        self.entries.get(key)
    }

    pub fn remove(
        &self,
        key: &K,
    ) {
        self.entries.invalidate(key);
    }
}
