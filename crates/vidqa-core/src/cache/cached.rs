//! Memoizing adapter for expensive operations.
//!
//! `CachedOperation::run` wraps any async operation: derive a key from the
//! operation's qualified name and arguments, serve a live cached value, or
//! run the operation and store its result. Results are stored as JSON
//! values in one shared `KeyedCache` so every operation can use the same
//! store regardless of its result type.
//!
//! Without single-flight, concurrent identical calls that all miss may each
//! run the operation. `with_single_flight` adds a per-key async lock with a
//! double-checked read so that only one of them computes.

use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, Mutex, PoisonError};

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, warn};

use super::key::CacheKey;
use super::keyed::KeyedCache;

/// How a single call interacts with the cache.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum CachePolicy {
    /// Serve a live cached value, otherwise compute and store.
    #[default]
    Use,
    /// Always compute, then store the fresh result.
    Refresh,
    /// No read and no write.
    Bypass,
}

impl CachePolicy {
    /// Map a `skip_cache` flag onto a policy.
    pub const fn skip_cache(skip: bool) -> Self {
        if skip { Self::Bypass } else { Self::Use }
    }

    /// Force a fresh computation when `regenerate` is set, unless caching
    /// is bypassed altogether.
    #[must_use]
    pub const fn regenerating(self, regenerate: bool) -> Self {
        match (regenerate, self) {
            (_, Self::Bypass) => Self::Bypass,
            (true, _) => Self::Refresh,
            (false, policy) => policy,
        }
    }
}

/// Results decide whether they are worth keeping.
///
/// Failure results are returned to the caller but not stored, so a
/// transient outage is not replayed for the rest of the TTL.
pub trait Cacheable {
    fn is_cacheable(&self) -> bool {
        true
    }
}

type Gate = Arc<tokio::sync::Mutex<()>>;

/// Cache-aware executor shared by all services.
#[derive(Debug, Clone)]
pub struct CachedOperation {
    cache: Arc<KeyedCache<Value>>,
    in_flight: Option<Arc<Mutex<HashMap<CacheKey, Gate>>>>,
}

impl CachedOperation {
    pub const fn new(cache: Arc<KeyedCache<Value>>) -> Self {
        Self {
            cache,
            in_flight: None,
        }
    }

    /// Enable per-key single-flight deduplication.
    #[must_use]
    pub fn with_single_flight(mut self) -> Self {
        self.in_flight = Some(Arc::new(Mutex::new(HashMap::new())));
        self
    }

    pub fn cache(&self) -> &Arc<KeyedCache<Value>> {
        &self.cache
    }

    pub const fn single_flight(&self) -> bool {
        self.in_flight.is_some()
    }

    /// Run `op` under `policy`, memoizing its result by `key`.
    pub async fn run<T, F, Fut>(&self, key: CacheKey, policy: CachePolicy, op: F) -> T
    where
        T: Cacheable + Serialize + DeserializeOwned,
        F: FnOnce() -> Fut,
        Fut: Future<Output = T>,
    {
        match policy {
            CachePolicy::Bypass => return op().await,
            CachePolicy::Use => {
                if let Some(hit) = self.lookup(&key) {
                    return hit;
                }
            }
            CachePolicy::Refresh => {}
        }

        let Some(in_flight) = &self.in_flight else {
            return self.compute_and_store(key, op).await;
        };

        let gate = Self::gate_for(in_flight, &key);
        let guard = gate.lock().await;

        // Another caller may have filled the entry while we waited.
        let result = match (policy, self.lookup(&key)) {
            (CachePolicy::Use, Some(hit)) => hit,
            _ => self.compute_and_store(key.clone(), op).await,
        };

        drop(guard);
        Self::release_gate(in_flight, &key, gate);
        result
    }

    fn lookup<T: DeserializeOwned>(&self, key: &CacheKey) -> Option<T> {
        let value = self.cache.get(key)?;
        match serde_json::from_value(value) {
            Ok(hit) => Some(hit),
            Err(e) => {
                warn!(key = %key.short(), error = %e, "Cached value has unexpected shape, recomputing");
                self.cache.remove(key);
                None
            }
        }
    }

    async fn compute_and_store<T, F, Fut>(&self, key: CacheKey, op: F) -> T
    where
        T: Cacheable + Serialize,
        F: FnOnce() -> Fut,
        Fut: Future<Output = T>,
    {
        let result = op().await;
        if !result.is_cacheable() {
            debug!(key = %key.short(), "Result not cacheable, skipping store");
            return result;
        }
        match serde_json::to_value(&result) {
            Ok(value) => self.cache.set(key, value),
            Err(e) => warn!(key = %key.short(), error = %e, "Failed to encode result for cache"),
        }
        result
    }

    fn gate_for(in_flight: &Mutex<HashMap<CacheKey, Gate>>, key: &CacheKey) -> Gate {
        let mut gates = in_flight.lock().unwrap_or_else(PoisonError::into_inner);
        Arc::clone(gates.entry(key.clone()).or_default())
    }

    fn release_gate(in_flight: &Mutex<HashMap<CacheKey, Gate>>, key: &CacheKey, gate: Gate) {
        drop(gate);
        let mut gates = in_flight.lock().unwrap_or_else(PoisonError::into_inner);
        if gates.get(key).is_some_and(|g| Arc::strong_count(g) == 1) {
            gates.remove(key);
        }
    }
}
