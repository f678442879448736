//! # resq
//!
//! Client-resident fault tolerance and caching for applications that talk
//! to remote data sources.
//!
//! ## Features
//!
//! - **Cache Store**: keyed TTL cache with least-recently-accessed eviction,
//!   tag invalidation, and stale-while-revalidate `get_or_set`
//! - **Resilience Coordinator**: error classification, exponential-backoff
//!   retry, per-key circuit breakers, graceful degradation
//! - **Query Execution Wrapper**: cache-aside fetches with metrics,
//!   slow-operation detection, and entity helpers
//!
//! ## Example
//!
//! ```ignore
//! use resq::{AppConfig, QueryOptions, ResilienceLayer};
//!
//! let layer = ResilienceLayer::new(AppConfig::default())?;
//! let result = layer
//!     .query()
//!     .execute_query(|| fetch_profile(42), QueryOptions::new("profile").with_cache_key("profile:42"))
//!     .await;
//! ```
//!
//! ## Architecture
//!
//! - `domain` - Error taxonomy, reports, metrics, and sink ports
//! - `infrastructure` - Cache, resilience, query, configuration, logging

/// Domain layer - error taxonomy and diagnostic records
///
/// Re-exports from the domain crate for convenience
pub mod domain {
    pub use resq_domain::*;
}

/// Infrastructure layer - services, configuration, and logging
///
/// Re-exports from the infrastructure crate for convenience
pub mod infrastructure {
    pub use resq_infrastructure::*;
}

mod layer;

pub use layer::ResilienceLayer;

// Re-export commonly used domain types at the crate root
pub use domain::*;

// Re-export the services and their options
pub use infrastructure::cache::{CacheStore, GetOrSetOptions, SetOptions};
pub use infrastructure::config::{AppConfig, ConfigLoader};
pub use infrastructure::query::{Pagination, QueryExecutor, QueryOptions, QueryResult};
pub use infrastructure::resilience::{HandleOptions, ResilienceCoordinator, RetryPolicy};
