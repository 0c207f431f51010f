//! Time-boxed response cache.
//!
//! Results are memoized under a string key for a fixed TTL. Nothing
//! invalidates entries early: the live mutator and client creates go straight
//! to the store, so a cached page can show availability up to one TTL old.
//! A replace overwrites the single-station entry it touched.
//!
//! Two requests missing the same key at once may both compute the value;
//! the later insert wins. Values are cloned out whole, so a reader never sees
//! a partially built entry.

use std::time::Duration;

use moka::future::Cache as MokaCache;
use tracing::debug;

/// Configuration for the cache.
#[derive(Debug, Clone)]
pub struct CacheConfig {
    /// TTL for cached entries.
    pub ttl: Duration,

    /// Maximum number of cached entries.
    pub max_capacity: u64,
}

impl CacheConfig {
    /// Set a custom TTL.
    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    /// Set the maximum number of entries.
    pub fn with_max_capacity(mut self, n: u64) -> Self {
        self.max_capacity = n;
        self
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            ttl: Duration::from_secs(5 * 60),
            max_capacity: 10_000,
        }
    }
}

/// TTL cache of computed responses keyed by request parameters.
///
/// Knows nothing about what it stores; `V` is usually an `Arc` so hits are
/// cheap to clone.
pub struct ResponseCache<V> {
    entries: MokaCache<String, V>,
}

impl<V> ResponseCache<V>
where
    V: Clone + Send + Sync + 'static,
{
    /// Create a new cache with the given configuration.
    pub fn new(config: &CacheConfig) -> Self {
        let entries = MokaCache::builder()
            .time_to_live(config.ttl)
            .max_capacity(config.max_capacity)
            .build();

        Self { entries }
    }

    /// Get a cached entry, if present and not expired.
    pub async fn get(&self, key: &str) -> Option<V> {
        self.entries.get(key).await
    }

    /// Insert an entry, replacing any previous value for `key`.
    pub async fn insert(&self, key: String, value: V) {
        self.entries.insert(key, value).await;
    }

    /// Return the cached value for `key`, or compute and cache it.
    ///
    /// Errors from `compute` are returned as-is and nothing is cached.
    pub async fn get_or_try_compute<F, E>(&self, key: String, compute: F) -> Result<V, E>
    where
        F: Future<Output = Result<V, E>>,
    {
        if let Some(hit) = self.get(&key).await {
            debug!(%key, "response cache hit");
            return Ok(hit);
        }

        debug!(%key, "response cache miss");
        let value = compute.await?;
        self.insert(key, value.clone()).await;
        Ok(value)
    }

    /// Get cache statistics (for monitoring).
    pub fn entry_count(&self) -> u64 {
        self.entries.entry_count()
    }
}
