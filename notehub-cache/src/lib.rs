//! Query cache with single-flight fetches and explicit staleness.
//!
//! The cache maps a key to the last value fetched for it and coordinates
//! refreshes against the remote service:
//!
//! - concurrent requests for a key collapse into one underlying fetch
//! - stale data stays visible while a refresh runs
//! - a failed fetch is retried once before the error is attached to the key
//! - invalidation by prefix marks entries stale and refetches observed keys
//! - unobserved entries are evicted after `gc_time` without requests
//!
//! # Example
//!
//! ```ignore
//! let cache = notes_cache(service, CacheConfig::default());
//! let _active = cache.observe(&QueryKey::notes(1, ""));
//! let page = cache.get(&QueryKey::notes(1, "")).await?.into_value();
//!
//! // After a create or delete:
//! cache.invalidate(&QueryPrefix::notes()).await;
//! ```

pub mod config;
pub mod notes;
pub mod query_cache;
pub mod snapshot;
pub mod traits;

pub use config::CacheConfig;
pub use notes::{notes_cache, NotePageFetcher, NotesCache};
pub use query_cache::{QueryCache, Subscription};
pub use snapshot::{CacheRead, QuerySnapshot, QueryStatus};
pub use traits::{CacheKey, CacheStats, QueryFetcher};
