//! Per-owner memoization.

use super::stats::{AtomicStats, CacheStats};
use crate::{Error, ErrorContext, Result};
use lru::LruCache;
use std::fmt;
use std::hash::Hash;
use std::num::NonZeroUsize;
use std::sync::{Mutex, MutexGuard};
use tracing::{debug, trace};

/// Default number of entries kept by a bounded cache.
pub const DEFAULT_CAPACITY: usize = 128;

/// LRU memoization meant to live in a field of the value it caches for.
///
/// Because the cache belongs to its owner, values cached for one owner never
/// evict another owner's entries, and dropping the owner drops its cache.
///
/// ```
/// use fnkit::cache::MethodCache;
///
/// struct Squares {
///     calls: std::cell::Cell<u32>,
///     cache: MethodCache<u64, u64>,
/// }
///
/// impl Squares {
///     fn square(&self, x: u64) -> u64 {
///         self.cache.get_or_insert_with(x, || {
///             self.calls.set(self.calls.get() + 1);
///             x * x
///         })
///     }
/// }
///
/// let s = Squares { calls: Default::default(), cache: MethodCache::new() };
/// assert_eq!(s.square(9), 81);
/// assert_eq!(s.square(9), 81);
/// assert_eq!(s.calls.get(), 1);
/// ```
///
/// Storage is allocated on first insert, so [`MethodCache::cache_clear`] is
/// valid at any time. Values are computed without holding the lock; two
/// threads missing on the same key at once both compute, and the later
/// insert wins.
pub struct MethodCache<K, V> {
    capacity: Option<NonZeroUsize>,
    entries: Mutex<Option<LruCache<K, V>>>,
    stats: AtomicStats,
}

impl<K, V> MethodCache<K, V> {
    /// Bounded cache holding [`DEFAULT_CAPACITY`] entries.
    pub fn new() -> Self {
        Self::bounded(NonZeroUsize::new(DEFAULT_CAPACITY).unwrap_or(NonZeroUsize::MIN))
    }

    pub fn bounded(capacity: NonZeroUsize) -> Self {
        Self {
            capacity: Some(capacity),
            entries: Mutex::new(None),
            stats: AtomicStats::default(),
        }
    }

    /// Bounded cache of `capacity` entries; zero is rejected.
    pub fn with_capacity(capacity: usize) -> Result<Self> {
        let capacity = NonZeroUsize::new(capacity).ok_or_else(|| {
            Error::configuration_with_context(
                "cache capacity must be at least 1",
                ErrorContext::new()
                    .with_field_path("cache.capacity")
                    .with_source("method_cache"),
            )
        })?;
        Ok(Self::bounded(capacity))
    }

    /// Cache that never evicts.
    pub fn unbounded() -> Self {
        Self {
            capacity: None,
            entries: Mutex::new(None),
            stats: AtomicStats::default(),
        }
    }

    /// `None` when unbounded.
    pub fn capacity(&self) -> Option<NonZeroUsize> {
        self.capacity
    }

    pub fn stats(&self) -> CacheStats {
        self.stats.to_stats()
    }

    fn lock(&self) -> MutexGuard<'_, Option<LruCache<K, V>>> {
        // Entries are only ever inserted whole, so a poisoned map is still consistent.
        match self.entries.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

impl<K: Hash + Eq, V> MethodCache<K, V> {
    /// Drop every cached entry. A no-op before the first insert.
    pub fn cache_clear(&self) {
        let mut entries = self.lock();
        if let Some(cache) = entries.as_mut() {
            debug!(entries = cache.len(), "clearing method cache");
            cache.clear();
        }
        self.stats.clear();
    }

    pub fn len(&self) -> usize {
        self.lock().as_ref().map(LruCache::len).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<K: Hash + Eq, V: Clone> MethodCache<K, V> {
    fn lookup(&self, key: &K) -> Option<V> {
        let mut entries = self.lock();
        let found = entries.as_mut().and_then(|c| c.get(key).cloned());
        match found {
            Some(_) => self.stats.hit(),
            None => self.stats.miss(),
        }
        found
    }

    fn store(&self, key: K, value: V) {
        let mut entries = self.lock();
        let capacity = self.capacity;
        let cache = entries.get_or_insert_with(|| match capacity {
            Some(cap) => LruCache::new(cap),
            None => LruCache::unbounded(),
        });
        cache.put(key, value);
        self.stats.insert();
    }

    /// Return the cached value for `key`, computing and storing it on a miss.
    pub fn get_or_insert_with<F>(&self, key: K, compute: F) -> V
    where
        F: FnOnce() -> V,
    {
        if let Some(value) = self.lookup(&key) {
            return value;
        }
        trace!("method cache miss");
        let value = compute();
        self.store(key, value.clone());
        value
    }

    /// Like [`MethodCache::get_or_insert_with`], but failures are returned
    /// and not cached.
    pub fn try_get_or_insert_with<E, F>(&self, key: K, compute: F) -> std::result::Result<V, E>
    where
        F: FnOnce() -> std::result::Result<V, E>,
    {
        if let Some(value) = self.lookup(&key) {
            return Ok(value);
        }
        trace!("method cache miss");
        let value = compute()?;
        self.store(key, value.clone());
        Ok(value)
    }

    /// Cached value for `key`, if any. Marks it most recently used but does
    /// not touch the statistics.
    pub fn get(&self, key: &K) -> Option<V> {
        self.lock().as_mut().and_then(|c| c.get(key).cloned())
    }

    pub fn contains(&self, key: &K) -> bool {
        self.lock().as_ref().map(|c| c.contains(key)).unwrap_or(false)
    }
}

impl<K, V> Default for MethodCache<K, V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: Hash + Eq + Clone, V: Clone> Clone for MethodCache<K, V> {
    /// Copies the entries; the clone and the original evolve independently.
    fn clone(&self) -> Self {
        Self {
            capacity: self.capacity,
            entries: Mutex::new(self.lock().clone()),
            stats: AtomicStats::from_stats(self.stats.to_stats()),
        }
    }
}

impl<K: Hash + Eq, V> fmt::Debug for MethodCache<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MethodCache")
            .field("capacity", &self.capacity)
            .field("len", &self.len())
            .field("stats", &self.stats())
            .finish()
    }
}
