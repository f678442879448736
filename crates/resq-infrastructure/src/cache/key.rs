//! Cache key and value utilities

use crate::constants::CACHE_NAMESPACE_SEPARATOR;
use resq_domain::error::Result;
use serde::Serialize;

/// Cache key utilities
pub struct CacheKey;

impl CacheKey {
    /// Create a namespaced cache key
    pub fn namespaced(namespace: &str, key: &str) -> String {
        format!("{namespace}{CACHE_NAMESPACE_SEPARATOR}{key}")
    }

    /// Deterministic key for an operation and its serializable arguments
    ///
    /// Struct fields serialize in declaration order and `serde_json::Value`
    /// maps in sorted key order, so equal arguments yield equal keys.
    pub fn for_args<A: Serialize + ?Sized>(namespace: &str, operation: &str, args: &A) -> Result<String> {
        let args = serde_json::to_string(args)?;
        Ok(format!(
            "{namespace}{CACHE_NAMESPACE_SEPARATOR}{operation}{CACHE_NAMESPACE_SEPARATOR}{args}"
        ))
    }
}

/// Estimate the size of a cache value in bytes from its JSON encoding
pub fn estimate_size<T: Serialize + ?Sized>(value: &T) -> Result<usize> {
    Ok(serde_json::to_vec(value)?.len())
}
