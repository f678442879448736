//! Cache entries and per-call options

use std::collections::HashSet;
use std::time::Duration;
use tokio::time::Instant;

/// A stored value with its bookkeeping
#[derive(Debug, Clone)]
pub struct CacheEntry<T> {
    /// Cached value
    pub data: T,
    /// Insertion time
    pub created_at: Instant,
    /// Lifetime measured from `created_at`
    pub ttl: Duration,
    /// Successful lookups served by this entry
    pub hit_count: u64,
    /// Time of the last successful lookup, or insertion
    pub last_accessed_at: Instant,
    /// Store-wide access counter at the last access; breaks timestamp ties
    pub(crate) access_seq: u64,
    /// Invalidation tags
    pub tags: HashSet<String>,
    /// Serialized size estimate in bytes
    pub size_estimate_bytes: usize,
    /// Label describing where the value came from
    pub source: String,
}

impl<T> CacheEntry<T> {
    /// Whether the entry is logically absent at `now`
    ///
    /// An entry expires once its full TTL has elapsed, even if the sweep has
    /// not removed it yet.
    pub fn is_expired(&self, now: Instant) -> bool {
        now.duration_since(self.created_at) >= self.ttl
    }

    /// Whether the entry carries any of `tags`
    pub fn has_any_tag<S: AsRef<str>>(&self, tags: &[S]) -> bool {
        tags.iter().any(|tag| self.tags.contains(tag.as_ref()))
    }

    /// Time since insertion
    pub fn age(&self, now: Instant) -> Duration {
        now.duration_since(self.created_at)
    }
}

/// Options for [`CacheStore::set`](super::CacheStore::set)
#[derive(Debug, Clone, Default)]
pub struct SetOptions {
    /// TTL override; the store default applies when unset
    pub ttl: Option<Duration>,
    /// Invalidation tags
    pub tags: Vec<String>,
    /// Source label
    pub source: Option<String>,
}

impl SetOptions {
    /// Create options with store defaults
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the TTL
    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = Some(ttl);
        self
    }

    /// Add an invalidation tag
    pub fn with_tag<S: Into<String>>(mut self, tag: S) -> Self {
        self.tags.push(tag.into());
        self
    }

    /// Replace the invalidation tags
    pub fn with_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags = tags.into_iter().map(Into::into).collect();
        self
    }

    /// Set the source label
    pub fn with_source<S: Into<String>>(mut self, source: S) -> Self {
        self.source = Some(source.into());
        self
    }
}

/// Options for [`CacheStore::get_or_set`](super::CacheStore::get_or_set)
#[derive(Debug, Clone)]
pub struct GetOrSetOptions<T> {
    /// TTL for the fetched value; the store default applies when unset
    pub ttl: Option<Duration>,
    /// Invalidation tags for the fetched value
    pub tags: Vec<String>,
    /// Serve a cached value immediately and refresh it in the background
    pub stale_while_revalidate: bool,
    /// Value to cache briefly and return when the fetch ultimately fails
    pub fallback_data: Option<T>,
}

impl<T> Default for GetOrSetOptions<T> {
    fn default() -> Self {
        Self {
            ttl: None,
            tags: Vec::new(),
            stale_while_revalidate: false,
            fallback_data: None,
        }
    }
}

impl<T> GetOrSetOptions<T> {
    /// Create options with store defaults
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the TTL
    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = Some(ttl);
        self
    }

    /// Replace the invalidation tags
    pub fn with_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags = tags.into_iter().map(Into::into).collect();
        self
    }

    /// Enable stale-while-revalidate
    pub fn stale_while_revalidate(mut self) -> Self {
        self.stale_while_revalidate = true;
        self
    }

    /// Set fallback data
    pub fn with_fallback(mut self, fallback: T) -> Self {
        self.fallback_data = Some(fallback);
        self
    }
}
