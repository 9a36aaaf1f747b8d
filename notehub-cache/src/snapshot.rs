//! Read results and per-key state snapshots.
//!
//! Reads never hide staleness: [`CacheRead`] says whether the value came
//! from memory and whether a refresh was triggered, and [`QuerySnapshot`]
//! exposes the full state of a key for presentation.

use notehub_core::FetchError;
use tokio::time::Instant;

/// Lifecycle of a single query key.
///
/// `Idle -> Loading -> {Success, Error}`; a refetch moves `Success` or
/// `Error` back to `Loading`. Eviction ends the lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum QueryStatus {
    #[default]
    Idle,
    Loading,
    Success,
    Error,
}

/// Result of [`crate::QueryCache::get`], carrying staleness metadata.
#[derive(Debug, Clone)]
pub struct CacheRead<T> {
    value: T,
    was_cache_hit: bool,
    is_stale: bool,
}

impl<T> CacheRead<T> {
    /// Fresh cached value, no refresh needed.
    pub fn from_cache(value: T) -> Self {
        Self {
            value,
            was_cache_hit: true,
            is_stale: false,
        }
    }

    /// Last-known-good value served while a refresh runs.
    pub fn stale(value: T) -> Self {
        Self {
            value,
            was_cache_hit: true,
            is_stale: true,
        }
    }

    /// Value that had to be fetched before returning.
    pub fn from_fetch(value: T) -> Self {
        Self {
            value,
            was_cache_hit: false,
            is_stale: false,
        }
    }

    pub fn into_value(self) -> T {
        self.value
    }

    pub fn value(&self) -> &T {
        &self.value
    }

    pub fn was_cache_hit(&self) -> bool {
        self.was_cache_hit
    }

    pub fn was_cache_miss(&self) -> bool {
        !self.was_cache_hit
    }

    /// True when a background refresh was triggered for this read.
    pub fn is_stale(&self) -> bool {
        self.is_stale
    }
}

/// Point-in-time view of one key's cache entry.
#[derive(Debug, Clone)]
pub struct QuerySnapshot<T> {
    pub status: QueryStatus,
    /// Last successfully fetched value, kept across refetches and errors.
    pub data: Option<T>,
    /// Error from the most recent settled fetch, if it failed.
    pub error: Option<FetchError>,
    /// A fetch for this key is in flight.
    pub is_fetching: bool,
    /// Marked stale by an invalidation and not refreshed since.
    pub is_invalidated: bool,
    pub data_updated_at: Option<Instant>,
    pub error_updated_at: Option<Instant>,
}

impl<T> QuerySnapshot<T> {
    pub fn idle() -> Self {
        Self {
            status: QueryStatus::Idle,
            data: None,
            error: None,
            is_fetching: false,
            is_invalidated: false,
            data_updated_at: None,
            error_updated_at: None,
        }
    }

    /// First load: nothing to show yet.
    pub fn is_loading(&self) -> bool {
        self.status == QueryStatus::Loading && self.data.is_none()
    }

    pub fn is_error(&self) -> bool {
        self.status == QueryStatus::Error
    }
}

impl<T> Default for QuerySnapshot<T> {
    fn default() -> Self {
        Self::idle()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cache_read_flags() {
        let hit = CacheRead::from_cache(1);
        assert!(hit.was_cache_hit());
        assert!(!hit.is_stale());

        let stale = CacheRead::stale(2);
        assert!(stale.was_cache_hit());
        assert!(stale.is_stale());

        let miss = CacheRead::from_fetch(3);
        assert!(miss.was_cache_miss());
        assert_eq!(miss.into_value(), 3);
    }

    #[test]
    fn test_snapshot_loading_only_without_data() {
        let mut snapshot = QuerySnapshot::<u32> {
            status: QueryStatus::Loading,
            ..QuerySnapshot::idle()
        };
        assert!(snapshot.is_loading());
        snapshot.data = Some(7);
        assert!(!snapshot.is_loading());
    }
}
