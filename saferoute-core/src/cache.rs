//! Injectable key-value cache used for geocoding and risk memoization.

use std::collections::HashMap;
use std::hash::Hash;
use std::sync::{PoisonError, RwLock};

/// A thread-safe cache with `get`/`put` semantics.
///
/// The cache is a first-class component so scoring and geocoding logic can
/// be unit-tested against it and an alternative backend swapped in without
/// touching the callers. Entries are treated as immutable once published:
/// `put` keeps the first value written for a key, which makes concurrent
/// writers computing the same entry redundantly harmless.
pub trait Cache<K, V>: Send + Sync {
    /// Look up a value by key.
    fn get(&self, key: &K) -> Option<V>;

    /// Insert a value; the first write for a key wins.
    fn put(&self, key: K, value: V);

    /// Drop every entry.
    fn clear(&self);
}

/// Unbounded in-memory [`Cache`] backed by a `RwLock<HashMap>`.
///
/// # Examples
/// ```
/// use saferoute_core::{Cache, MemoryCache};
///
/// let cache: MemoryCache<String, u32> = MemoryCache::new();
/// cache.put("a".to_owned(), 1);
/// cache.put("a".to_owned(), 2);
/// assert_eq!(cache.get(&"a".to_owned()), Some(1));
/// ```
#[derive(Debug)]
pub struct MemoryCache<K, V> {
    entries: RwLock<HashMap<K, V>>,
}

impl<K, V> MemoryCache<K, V> {
    /// Create an empty cache.
    #[must_use]
    pub fn new() -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
        }
    }

    /// Number of cached entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Whether the cache holds no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<K, V> Default for MemoryCache<K, V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K, V> Cache<K, V> for MemoryCache<K, V>
where
    K: Eq + Hash + Send + Sync,
    V: Clone + Send + Sync,
{
    fn get(&self, key: &K) -> Option<V> {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(key)
            .cloned()
    }

    fn put(&self, key: K, value: V) {
        self.entries
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .entry(key)
            .or_insert(value);
    }

    fn clear(&self) {
        self.entries
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }
}
