//! Generic LRU memoization cache, grounded on `core/terrain.py::get_elevation`'s
//! `@lru_cache(maxsize=200000)` decorator.
//!
//! Python's `lru_cache` decorates a free function and is process-wide by
//! construction; the idiomatic Rust shape is an explicit, injectable cache
//! type wrapped in a mutex so concurrent lookups are safe, modeled as a
//! `Cache<K, V>` injected into providers.

use std::hash::Hash;
use std::sync::Mutex;

use lru::LruCache;
use std::num::NonZeroUsize;

/// Default capacity matching the Python `maxsize=200000`.
pub const DEFAULT_CAPACITY: usize = 200_000;

/// A thread-safe memoization cache over an arbitrary key/value pair.
pub struct Cache<K, V> {
    inner: Mutex<LruCache<K, V>>,
}

impl<K: Eq + Hash + Clone, V: Clone> Cache<K, V> {
    pub fn new(capacity: usize) -> Self {
        let cap = NonZeroUsize::new(capacity.max(1)).expect("capacity clamped to >= 1 above");
        Self {
            inner: Mutex::new(LruCache::new(cap)),
        }
    }

    pub fn get(&self, key: &K) -> Option<V> {
        self.inner.lock().expect("cache mutex poisoned").get(key).cloned()
    }

    pub fn put(&self, key: K, value: V) {
        self.inner.lock().expect("cache mutex poisoned").put(key, value);
    }

    /// Looks up `key`, computing and storing `f()` on a miss. Mirrors
    /// `lru_cache`'s memoize-on-call-site semantics without holding the lock
    /// across the (potentially slow) computation of `f`.
    pub fn get_or_insert_with(&self, key: K, f: impl FnOnce() -> V) -> V {
        if let Some(v) = self.get(&key) {
            return v;
        }
        let v = f();
        self.put(key, v.clone());
        v
    }
}

impl<K: Eq + Hash + Clone, V: Clone> Default for Cache<K, V> {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

/// Elevation cache key: lat/lon rounded to ~1m precision (5 decimal places)
/// for memoization keyed on rounded lat/lon. `f64` is not `Hash`, so the
/// key stores the rounded value pre-scaled to an integer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ElevationKey {
    lat_e5: i64,
    lon_e5: i64,
}

impl ElevationKey {
    pub fn new(lat: f64, lon: f64) -> Self {
        Self {
            lat_e5: (lat * 1e5).round() as i64,
            lon_e5: (lon * 1e5).round() as i64,
        }
    }
}

pub type ElevationCache = Cache<ElevationKey, f32>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn miss_then_hit_calls_compute_exactly_once() {
        let cache: Cache<ElevationKey, f32> = Cache::new(16);
        let key = ElevationKey::new(50.45, 30.52);

        let mut calls = 0;
        let v1 = cache.get_or_insert_with(key, || {
            calls += 1;
            123.0
        });
        assert_eq!(v1, 123.0);
        assert_eq!(calls, 1);

        let v2 = cache.get_or_insert_with(key, || {
            calls += 1;
            999.0
        });
        assert_eq!(v2, 123.0);
        assert_eq!(calls, 1);
    }

    #[test]
    fn nearby_keys_that_round_differently_are_distinct() {
        let k1 = ElevationKey::new(50.450001, 30.52);
        let k2 = ElevationKey::new(50.450009, 30.52);
        assert_ne!(k1, k2);
    }

    #[test]
    fn keys_rounding_to_the_same_cell_collide() {
        let k1 = ElevationKey::new(50.4500001, 30.52);
        let k2 = ElevationKey::new(50.4500002, 30.52);
        assert_eq!(k1, k2);
    }
}
