//! # Infrastructure Layer
//!
//! The cache store, the resilience coordinator, and the query execution
//! wrapper, plus the configuration and logging they run on.
//!
//! ## Module Categories
//!
//! ### Data & Storage
//! | Module | Description |
//! |--------|-------------|
//! | [`cache`] | In-process keyed store with TTL, eviction, tags, and cache-aside |
//! | [`query`] | Query wrapper with metrics and entity helpers |
//!
//! ### Fault Tolerance
//! | Module | Description |
//! |--------|-------------|
//! | [`resilience`] | Error classification, retry, circuit breakers, degradation |
//!
//! ### Configuration & Observability
//! | Module | Description |
//! |--------|-------------|
//! | [`config`] | Figment-layered TOML and environment configuration |
//! | [`constants`] | Centralized defaults |
//! | [`logging`] | Structured logging with tracing |

pub mod cache;
pub mod config;
pub mod constants;
pub mod error_ext;
pub mod logging;
pub mod query;
pub mod resilience;
pub mod utils;

// Re-export commonly used types
pub use cache::CacheStore;
pub use error_ext::ErrorContext;
pub use query::QueryExecutor;
pub use resilience::ResilienceCoordinator;
pub use utils::TimedOperation;
