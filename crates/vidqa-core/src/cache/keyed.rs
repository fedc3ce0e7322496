//! In-memory key/value store with a single global TTL.
//!
//! Entries expire `ttl` after insertion. Expired entries are evicted lazily
//! on `get`, and `remove_expired` sweeps the whole store for maintenance.
//! All access is serialized through one mutex which is never held across
//! an `.await`.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tokio::time::Instant;
use tracing::{debug, info};

use super::key::CacheKey;

/// Expiry used when `ttl` is too large to add to the clock.
const FAR_FUTURE: Duration = Duration::from_secs(60 * 60 * 24 * 365 * 30);

/// A stored value and the instant after which it is no longer served.
#[derive(Debug, Clone)]
pub struct CacheEntry<V> {
    pub value: V,
    pub expires_at: Instant,
}

impl<V> CacheEntry<V> {
    fn is_live(&self, now: Instant) -> bool {
        self.expires_at > now
    }
}

/// Expiring key/value store safe for concurrent use.
#[derive(Debug)]
pub struct KeyedCache<V> {
    entries: Mutex<HashMap<CacheKey, CacheEntry<V>>>,
    ttl: Duration,
}

impl<V: Clone> KeyedCache<V> {
    /// Create an empty cache whose entries live for `ttl`.
    pub fn new(ttl: Duration) -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            ttl,
        }
    }

    pub const fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Return the live value for `key`, evicting it if it has expired.
    pub fn get(&self, key: &CacheKey) -> Option<V> {
        let now = Instant::now();
        let mut entries = self.lock();
        match entries.get(key) {
            Some(entry) if entry.is_live(now) => {
                debug!(key = %key.short(), "Cache hit");
                Some(entry.value.clone())
            }
            Some(_) => {
                debug!(key = %key.short(), "Cache entry expired, removing");
                entries.remove(key);
                None
            }
            None => None,
        }
    }

    /// Store `value` under `key`, replacing any previous entry.
    pub fn set(&self, key: CacheKey, value: V) {
        let now = Instant::now();
        let expires_at = now
            .checked_add(self.ttl)
            .unwrap_or_else(|| now + FAR_FUTURE);
        debug!(key = %key.short(), ttl_secs = self.ttl.as_secs(), "Added to cache");
        self.lock().insert(key, CacheEntry { value, expires_at });
    }

    /// Remove one entry. Returns whether it was present.
    pub fn remove(&self, key: &CacheKey) -> bool {
        self.lock().remove(key).is_some()
    }

    /// Delete every expired entry and return how many were removed.
    pub fn remove_expired(&self) -> usize {
        let now = Instant::now();
        let mut entries = self.lock();
        let before = entries.len();
        entries.retain(|_, entry| entry.is_live(now));
        let removed = before - entries.len();
        if removed > 0 {
            debug!(removed, "Removed expired items from cache");
        }
        removed
    }

    /// Remove all entries.
    pub fn clear(&self) {
        self.lock().clear();
        info!("Cache cleared");
    }

    /// Number of stored entries, including expired ones not yet evicted.
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<CacheKey, CacheEntry<V>>> {
        // A panic while holding the lock cannot leave the map half-written.
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    fn key(name: &str) -> CacheKey {
        CacheKey::for_operation("test").arg(name).finish()
    }

    #[tokio::test(start_paused = true)]
    async fn test_get_after_set_until_ttl() {
        let cache = KeyedCache::new(Duration::from_secs(60));
        cache.set(key("a"), 1);
        assert_eq!(cache.get(&key("a")), Some(1));

        tokio::time::advance(Duration::from_secs(59)).await;
        assert_eq!(cache.get(&key("a")), Some(1));

        tokio::time::advance(Duration::from_secs(1)).await;
        assert_eq!(cache.get(&key("a")), None);
        // Lazy eviction removed the entry as a side effect.
        assert!(cache.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_remove_expired_counts_only_expired() {
        let cache = KeyedCache::new(Duration::from_secs(10));
        cache.set(key("old-1"), "x");
        cache.set(key("old-2"), "y");
        tokio::time::advance(Duration::from_secs(6)).await;
        cache.set(key("fresh"), "z");
        tokio::time::advance(Duration::from_secs(5)).await;

        assert_eq!(cache.remove_expired(), 2);
        assert_eq!(cache.len(), 1);
        assert_eq!(cache.get(&key("fresh")), Some("z"));
        assert_eq!(cache.remove_expired(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_set_refreshes_expiry() {
        let cache = KeyedCache::new(Duration::from_secs(10));
        cache.set(key("a"), 1);
        tokio::time::advance(Duration::from_secs(8)).await;
        cache.set(key("a"), 2);
        tokio::time::advance(Duration::from_secs(8)).await;
        assert_eq!(cache.get(&key("a")), Some(2));
    }

    #[tokio::test(start_paused = true)]
    async fn test_unbounded_ttl_saturates() {
        let cache = KeyedCache::new(Duration::from_secs(u64::MAX));
        cache.set(key("a"), 1);
        tokio::time::advance(Duration::from_secs(60 * 60 * 24 * 365)).await;
        assert_eq!(cache.get(&key("a")), Some(1));
        assert_eq!(cache.remove_expired(), 0);
    }

    #[test]
    fn test_clear_and_remove() {
        let cache = KeyedCache::new(Duration::from_secs(10));
        cache.set(key("a"), 1);
        cache.set(key("b"), 2);
        assert!(cache.remove(&key("a")));
        assert!(!cache.remove(&key("a")));
        cache.clear();
        assert!(cache.is_empty());
        assert_eq!(cache.get(&key("b")), None);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_writers_do_not_lose_entries() {
        let cache = Arc::new(KeyedCache::new(Duration::from_secs(300)));
        let mut tasks = Vec::new();
        for worker in 0..8 {
            let cache = Arc::clone(&cache);
            tasks.push(tokio::spawn(async move {
                for i in 0..50 {
                    let k = key(&format!("{worker}-{i}"));
                    cache.set(k.clone(), i);
                    assert_eq!(cache.get(&k), Some(i));
                }
            }));
        }
        for task in tasks {
            task.await.unwrap();
        }
        assert_eq!(cache.len(), 400);
    }
}
