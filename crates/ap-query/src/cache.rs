//! Session cache for loaded selections.
//!
//! Point sets are keyed by place and networks by `(place, NetworkType)`.
//! Values are handed out as `Arc`s so a query keeps its snapshot even if the
//! entry is evicted or invalidated meanwhile.

use std::hash::Hash;
use std::num::NonZeroUsize;
use std::sync::Arc;
use std::time::{Duration, Instant};

use lru::LruCache;
use parking_lot::Mutex;

struct Entry<V> {
    value:     Arc<V>,
    loaded_at: Instant,
}

/// Bounded LRU cache with optional age-based expiry.
///
/// Thread-safe.  `get` takes the lock mutably because an LRU hit reorders
/// the list.
pub struct SelectionCache<K: Hash + Eq, V> {
    inner:   Mutex<LruCache<K, Entry<V>>>,
    max_age: Option<Duration>,
}

impl<K: Hash + Eq, V> SelectionCache<K, V> {
    /// `capacity` of zero is raised to one.
    pub fn new(capacity: usize, max_age: Option<Duration>) -> Self {
        let cap = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        Self { inner: Mutex::new(LruCache::new(cap)), max_age }
    }

    /// The cached value, unless absent or older than `max_age` (an expired
    /// entry is removed).
    pub fn get(&self, key: &K) -> Option<Arc<V>> {
        let mut inner = self.inner.lock();
        let expired = match inner.get(key) {
            None => return None,
            Some(e) => self.max_age.is_some_and(|age| e.loaded_at.elapsed() > age),
        };
        if expired {
            inner.pop(key);
            return None;
        }
        inner.get(key).map(|e| Arc::clone(&e.value))
    }

    pub fn insert(&self, key: K, value: V) -> Arc<V> {
        let value = Arc::new(value);
        self.inner.lock().put(key, Entry { value: Arc::clone(&value), loaded_at: Instant::now() });
        value
    }

    /// Cached value for `key`, or the result of `load` (cached on success).
    ///
    /// The lock is not held during `load`, so two racing misses may both
    /// load; the later insert wins.
    pub fn get_or_try_insert<E>(&self, key: K, load: impl FnOnce() -> Result<V, E>) -> Result<Arc<V>, E> {
        if let Some(v) = self.get(&key) {
            return Ok(v);
        }
        let value = load()?;
        Ok(self.insert(key, value))
    }

    pub fn invalidate(&self, key: &K) {
        self.inner.lock().pop(key);
    }

    pub fn invalidate_all(&self) {
        self.inner.lock().clear();
    }

    pub fn len(&self) -> usize {
        self.inner.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
