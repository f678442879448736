//! Main application configuration

use super::{CacheConfig, CircuitBreakerConfig, LoggingConfig, QueryConfig, RetryConfig};
use serde::{Deserialize, Serialize};

/// Main application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct AppConfig {
    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
    /// Cache store configuration
    #[serde(default)]
    pub cache: CacheConfig,
    /// Default retry policy
    #[serde(default)]
    pub retry: RetryConfig,
    /// Circuit breaker configuration
    #[serde(default)]
    pub circuit_breaker: CircuitBreakerConfig,
    /// Query execution configuration
    #[serde(default)]
    pub query: QueryConfig,
}
