//! Lazily computed, invalidatable shared value.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use arc_swap::ArcSwapOption;
use parking_lot::ReentrantMutex;

/// A value computed on first read and republished whole after each
/// [`invalidate`](Cache::invalidate).
///
/// Reads take a lock-free fast path when the value is present. A miss
/// acquires a re-entrant lock, re-checks, and recomputes; concurrent
/// misses therefore compute once and every reader observes either the
/// previous complete value or the new one, never a partial update.
///
/// Invalidation bumps a generation counter under the same lock. A
/// recompute that started before an invalidation still hands its result
/// to its caller but does not publish it.
///
/// # Examples
///
/// ```
/// use std::sync::Arc;
/// use detgeo_geometry::Cache;
///
/// let cache = Cache::new();
/// let a = cache.get_or_compute(|| 42);
/// let b = cache.get_or_compute(|| unreachable!());
/// assert!(Arc::ptr_eq(&a, &b));
///
/// cache.invalidate();
/// assert!(!cache.is_valid());
/// assert_eq!(*cache.get_or_compute(|| 7), 7);
/// ```
pub struct Cache<T> {
    value: ArcSwapOption<T>,
    lock: ReentrantMutex<()>,
    generation: AtomicU64,
}

impl<T> Cache<T> {
    /// An empty (invalid) cache.
    pub fn new() -> Self {
        Self {
            value: ArcSwapOption::empty(),
            lock: ReentrantMutex::new(()),
            generation: AtomicU64::new(0),
        }
    }

    /// Whether a value is currently published.
    pub fn is_valid(&self) -> bool {
        self.value.load().is_some()
    }

    /// The published value, if any. Never computes.
    pub fn get(&self) -> Option<Arc<T>> {
        self.value.load_full()
    }

    /// The published value, computing and publishing it with `f` first
    /// if the cache is invalid.
    pub fn get_or_compute(&self, f: impl FnOnce() -> T) -> Arc<T> {
        if let Some(value) = self.value.load_full() {
            return value;
        }
        let _guard = self.lock.lock();
        if let Some(value) = self.value.load_full() {
            return value;
        }
        self.publish(f)
    }

    /// Recompute unconditionally with `f` and publish the result.
    pub fn refresh(&self, f: impl FnOnce() -> T) -> Arc<T> {
        let _guard = self.lock.lock();
        self.publish(f)
    }

    /// Drop the published value; the next read recomputes.
    pub fn invalidate(&self) {
        let _guard = self.lock.lock();
        self.generation.fetch_add(1, Ordering::AcqRel);
        self.value.store(None);
    }

    /// Number of invalidations so far.
    pub fn generation(&self) -> u64 {
        self.generation.load(Ordering::Acquire)
    }

    // Caller holds `lock`.
    fn publish(&self, f: impl FnOnce() -> T) -> Arc<T> {
        let started = self.generation.load(Ordering::Acquire);
        let fresh = Arc::new(f());
        // `f` may have invalidated this cache re-entrantly.
        if self.generation.load(Ordering::Acquire) == started {
            self.value.store(Some(Arc::clone(&fresh)));
        }
        fresh
    }
}

impl<T> Default for Cache<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> fmt::Debug for Cache<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Cache")
            .field("valid", &self.is_valid())
            .field("generation", &self.generation())
            .finish()
    }
}
