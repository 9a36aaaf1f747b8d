//! Cache key and fetcher traits.
//!
//! The cache is generic over what it stores. A key type describes how it
//! is matched by an invalidation prefix; a fetcher knows how to load the
//! value for a key from the remote service.

use async_trait::async_trait;
use notehub_core::{QueryKey, QueryPrefix, ServiceResult};
use std::fmt;
use std::hash::Hash;

/// Types that can identify a cache entry.
///
/// `Display` is used in logs and in [`notehub_core::FetchError::key`].
pub trait CacheKey: Clone + Eq + Hash + fmt::Display + Send + Sync + 'static {
    /// Whether this key falls under `prefix` for invalidation.
    fn matches(&self, prefix: &QueryPrefix) -> bool;
}

impl CacheKey for QueryKey {
    fn matches(&self, prefix: &QueryPrefix) -> bool {
        QueryKey::matches(self, prefix)
    }
}

/// Loads the value for a key on miss or staleness.
#[async_trait]
pub trait QueryFetcher<K, V>: Send + Sync {
    /// Perform one attempt. Retries are the cache's job.
    async fn fetch(&self, key: &K) -> ServiceResult<V>;
}

/// Statistics about cache usage.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CacheStats {
    /// Reads answered from cached data (fresh or stale).
    pub hits: u64,
    /// Reads that had to wait for a fetch.
    pub misses: u64,
    /// Underlying fetch attempts, retries included.
    pub fetches: u64,
    /// Requests that joined a fetch already in flight.
    pub deduplicated: u64,
    /// Automatic retries after a failed attempt.
    pub retries: u64,
    /// Results dropped because a newer fetch for the key was started.
    pub discarded: u64,
    /// Entries removed by garbage collection.
    pub evictions: u64,
}

impl CacheStats {
    /// Calculate the hit rate (0.0 to 1.0).
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}
