//! Cache store
//!
//! Generic in-process `key -> entry` store with TTL expiry, capacity-bound
//! least-recently-accessed eviction, tag invalidation, access metrics, and
//! cache-aside `get_or_set` with stale-while-revalidate.

pub mod entry;
pub mod key;
pub mod metrics;
pub mod store;

pub use entry::{CacheEntry, GetOrSetOptions, SetOptions};
pub use key::{CacheKey, estimate_size};
pub use metrics::CacheMetrics;
pub use store::{CacheEntrySummary, CacheStore, CacheStoreStats};
