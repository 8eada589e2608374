//! Memoized free functions.

use super::method_cache::MethodCache;
use super::stats::CacheStats;
use crate::Result;
use std::fmt;
use std::hash::Hash;

/// A unary function whose results are cached by argument.
pub struct Memoize<F, K, V> {
    func: F,
    cache: MethodCache<K, V>,
}

impl<F, K, V> Memoize<F, K, V>
where
    F: Fn(K) -> V,
    K: Hash + Eq + Clone,
    V: Clone,
{
    pub fn new(func: F) -> Self {
        Self {
            func,
            cache: MethodCache::new(),
        }
    }

    pub fn with_capacity(func: F, capacity: usize) -> Result<Self> {
        Ok(Self {
            func,
            cache: MethodCache::with_capacity(capacity)?,
        })
    }

    pub fn unbounded(func: F) -> Self {
        Self {
            func,
            cache: MethodCache::unbounded(),
        }
    }

    pub fn call(&self, arg: K) -> V {
        self.cache
            .get_or_insert_with(arg.clone(), || (self.func)(arg))
    }

    pub fn cache_clear(&self) {
        self.cache.cache_clear();
    }

    pub fn stats(&self) -> CacheStats {
        self.cache.stats()
    }

    pub fn cache(&self) -> &MethodCache<K, V> {
        &self.cache
    }
}

impl<F, K: Hash + Eq, V> fmt::Debug for Memoize<F, K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Memoize")
            .field("cache", &self.cache)
            .finish_non_exhaustive()
    }
}

/// Memoize `func` with the default LRU capacity.
pub fn memoize<F, K, V>(func: F) -> Memoize<F, K, V>
where
    F: Fn(K) -> V,
    K: Hash + Eq + Clone,
    V: Clone,
{
    Memoize::new(func)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[test]
    fn test_memoize_calls_once_per_key() {
        let calls = AtomicU32::new(0);
        let slow_len = memoize(|s: String| {
            calls.fetch_add(1, Ordering::SeqCst);
            s.len()
        });
        assert_eq!(slow_len.call("abc".to_string()), 3);
        assert_eq!(slow_len.call("abc".to_string()), 3);
        assert_eq!(slow_len.call("hello".to_string()), 5);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert_eq!(slow_len.stats().hits, 1);
    }

    #[test]
    fn test_memoize_clear() {
        let calls = AtomicU32::new(0);
        let f = Memoize::with_capacity(
            |x: u8| {
                calls.fetch_add(1, Ordering::SeqCst);
                x
            },
            4,
        )
        .unwrap();
        f.call(1);
        f.cache_clear();
        f.call(1);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_memoize_capacity_evicts() {
        let f = Memoize::with_capacity(|x: u32| x + 1, 1).unwrap();
        f.call(1);
        f.call(2);
        assert!(!f.cache().contains(&1));
        assert!(f.cache().contains(&2));
    }
}
