//! Query cache configuration.

use std::time::Duration;

/// Configuration for the query cache.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheConfig {
    /// Automatic retries after a failed fetch before the error surfaces.
    pub retry: u32,
    /// Delay before each automatic retry.
    pub retry_delay: Duration,
    /// Age after which cached data is considered stale. Zero means data is
    /// stale as soon as it lands and every re-request refreshes it.
    pub stale_time: Duration,
    /// How long an unobserved entry stays in memory after its last request.
    pub gc_time: Duration,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            retry: 1,
            retry_delay: Duration::from_secs(1),
            stale_time: Duration::ZERO,
            gc_time: Duration::from_secs(5 * 60),
        }
    }
}

impl CacheConfig {
    /// Create a new cache config with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the number of automatic retries.
    pub fn with_retry(mut self, retry: u32) -> Self {
        self.retry = retry;
        self
    }

    /// Set the delay between retries.
    pub fn with_retry_delay(mut self, delay: Duration) -> Self {
        self.retry_delay = delay;
        self
    }

    /// Set the stale time.
    pub fn with_stale_time(mut self, stale_time: Duration) -> Self {
        self.stale_time = stale_time;
        self
    }

    /// Set the garbage collection time.
    pub fn with_gc_time(mut self, gc_time: Duration) -> Self {
        self.gc_time = gc_time;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_query_client() {
        let config = CacheConfig::default();
        assert_eq!(config.retry, 1);
        assert_eq!(config.stale_time, Duration::ZERO);
        assert_eq!(config.gc_time, Duration::from_secs(300));
    }

    #[test]
    fn test_cache_config_builder() {
        let config = CacheConfig::new()
            .with_retry(3)
            .with_retry_delay(Duration::from_millis(50))
            .with_stale_time(Duration::from_secs(10))
            .with_gc_time(Duration::from_secs(30));

        assert_eq!(config.retry, 3);
        assert_eq!(config.retry_delay, Duration::from_millis(50));
        assert_eq!(config.stale_time, Duration::from_secs(10));
        assert_eq!(config.gc_time, Duration::from_secs(30));
    }
}
