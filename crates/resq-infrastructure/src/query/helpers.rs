//! Entity query helpers
//!
//! Thin compositions over [`QueryExecutor::execute_query`]: each builds a
//! deterministic cache key from its serialized arguments and tags the cached
//! result with the entity name, so [`QueryExecutor::invalidate_entity`]
//! drops everything cached for that entity.

use super::executor::{QueryExecutor, QueryOptions, QueryResult};
use crate::cache::CacheKey;
use resq_domain::error::Result;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::future::Future;
use tracing::warn;

/// Page selection for listing and search helpers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pagination {
    /// One-based page number
    pub page: u32,
    /// Items per page
    pub page_size: u32,
}

impl Pagination {
    /// Select `page` with `page_size` items per page
    pub fn new(page: u32, page_size: u32) -> Self {
        Self { page, page_size }
    }

    /// Zero-based index of the first item on the page
    pub fn offset(&self) -> u64 {
        u64::from(self.page.saturating_sub(1)) * u64::from(self.page_size)
    }
}

impl Default for Pagination {
    fn default() -> Self {
        Self {
            page: 1,
            page_size: 20,
        }
    }
}

#[derive(Serialize)]
struct ListArgs<'a, A: ?Sized> {
    filters: &'a A,
    pagination: Pagination,
}

#[derive(Serialize)]
struct SearchArgs<'a> {
    query: &'a str,
    pagination: Pagination,
}

impl QueryExecutor {
    /// Fetch a single entity by id
    pub async fn fetch_by_id<T, F, Fut>(&self, entity: &str, id: &str, fetch: F) -> QueryResult<T>
    where
        T: Serialize + DeserializeOwned,
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let options = entity_options(entity, "fetch_by_id", CacheKey::for_args(entity, "by_id", id));
        self.execute_query(fetch, options).await
    }

    /// Fetch one page of entities matching `filters`
    pub async fn list<T, A, F, Fut>(
        &self,
        entity: &str,
        filters: &A,
        pagination: Pagination,
        fetch: F,
    ) -> QueryResult<T>
    where
        T: Serialize + DeserializeOwned,
        A: Serialize + ?Sized,
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let args = ListArgs {
            filters,
            pagination,
        };
        let options = entity_options(entity, "list", CacheKey::for_args(entity, "list", &args));
        self.execute_query(fetch, options).await
    }

    /// Free-text search over an entity
    pub async fn search<T, F, Fut>(
        &self,
        entity: &str,
        query: &str,
        pagination: Pagination,
        fetch: F,
    ) -> QueryResult<T>
    where
        T: Serialize + DeserializeOwned,
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let args = SearchArgs { query, pagination };
        let options = entity_options(entity, "search", CacheKey::for_args(entity, "search", &args));
        self.execute_query(fetch, options).await
    }

    /// Fetch a batch of entities by id
    ///
    /// Ids are sorted and deduplicated for the key, so the same set in any
    /// order shares one cache entry.
    pub async fn fetch_many<T, S, F, Fut>(&self, entity: &str, ids: &[S], fetch: F) -> QueryResult<T>
    where
        T: Serialize + DeserializeOwned,
        S: AsRef<str>,
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let mut sorted: Vec<&str> = ids.iter().map(AsRef::as_ref).collect();
        sorted.sort_unstable();
        sorted.dedup();
        let options = entity_options(entity, "fetch_many", CacheKey::for_args(entity, "many", &sorted));
        self.execute_query(fetch, options).await
    }

    /// Drop every cached result the helpers stored for `entity`
    pub fn invalidate_entity(&self, entity: &str) -> usize {
        self.cache().invalidate_by_tags(&[entity])
    }
}

fn entity_options(entity: &str, operation: &str, key: Result<String>) -> QueryOptions {
    let options = QueryOptions::new(format!("{entity}.{operation}")).with_tags([entity]);
    match key {
        Ok(key) => options.with_cache_key(key),
        Err(error) => {
            warn!(entity = %entity, operation = %operation, error = %error, "Could not build cache key, query runs uncached");
            options.without_cache()
        }
    }
}
