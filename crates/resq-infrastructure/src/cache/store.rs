//! Generic cache store

use super::entry::{CacheEntry, GetOrSetOptions, SetOptions};
use super::key::estimate_size;
use super::metrics::{CacheMetrics, MetricsRecorder};
use crate::config::CacheConfig;
use crate::constants::{
    CACHE_DEFAULT_SOURCE, CACHE_FALLBACK_TTL, CACHE_FETCH_BASE_DELAY_MS, CACHE_FETCH_MAX_DELAY_MS,
    CACHE_FETCH_MAX_RETRIES,
};
use crate::resilience::{HandleOptions, ResilienceCoordinator, RetryPolicy};
use crate::utils::TimedOperation;
use resq_domain::constants::STATS_TOP_N;
use resq_domain::error::{Error, Result};
use resq_domain::{ErrorSeverity, ReportContext};
use serde::Serialize;
use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

/// Mutable store state, guarded by one lock
struct StoreState<T> {
    entries: HashMap<String, CacheEntry<T>>,
    metrics: MetricsRecorder,
    access_seq: u64,
}

struct StoreInner<T> {
    config: CacheConfig,
    state: Mutex<StoreState<T>>,
    resilience: Option<Arc<ResilienceCoordinator>>,
    cleanup: Mutex<Option<CancellationToken>>,
}

impl<T> Drop for StoreInner<T> {
    fn drop(&mut self) {
        if let Ok(mut cleanup) = self.cleanup.lock() {
            if let Some(token) = cleanup.take() {
                token.cancel();
            }
        }
    }
}

/// Summary of one entry in the stats view
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct CacheEntrySummary {
    /// Entry key
    pub key: String,
    /// Lookups served
    pub hit_count: u64,
    /// Serialized size estimate in bytes
    pub size_estimate_bytes: usize,
    /// Time since insertion
    pub age_ms: u64,
    /// Configured lifetime
    pub ttl_ms: u64,
    /// Source label
    pub source: String,
}

/// Cache store statistics
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct CacheStoreStats {
    /// Physically stored entries, including expired ones not yet swept
    pub entries: usize,
    /// Metrics block
    pub metrics: CacheMetrics,
    /// Configuration the store runs with
    pub config: CacheConfig,
    /// Most-hit entries, most hits first
    pub top_entries: Vec<CacheEntrySummary>,
}

/// Generic cache store
///
/// Cheap to clone; clones share the same entries. All state changes happen
/// synchronously under one lock that is never held across an await point,
/// so a lookup-then-insert on a key is not interleaved with another
/// caller's mutation.
///
/// # Example
///
/// ```ignore
/// let store: CacheStore<Listing> = CacheStore::new(CacheConfig::default());
/// store.set("listing:42", listing, SetOptions::new().with_tag("listings"));
/// let hit = store.get("listing:42");
/// store.invalidate_by_tags(&["listings"]);
/// ```
pub struct CacheStore<T> {
    inner: Arc<StoreInner<T>>,
}

impl<T> Clone for CacheStore<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

// Construction
impl<T> CacheStore<T>
where
    T: Clone + Serialize + Send + Sync + 'static,
{
    /// Create a standalone store
    ///
    /// Without a coordinator, `get_or_set` calls its fetcher once and
    /// internal failures go straight to the log.
    pub fn new(config: CacheConfig) -> Self {
        Self::build(config, None)
    }

    /// Create a store whose `get_or_set` fetches run through `coordinator`
    pub fn with_resilience(config: CacheConfig, coordinator: Arc<ResilienceCoordinator>) -> Self {
        Self::build(config, Some(coordinator))
    }

    fn build(config: CacheConfig, resilience: Option<Arc<ResilienceCoordinator>>) -> Self {
        Self {
            inner: Arc::new(StoreInner {
                config,
                state: Mutex::new(StoreState {
                    entries: HashMap::new(),
                    metrics: MetricsRecorder::default(),
                    access_seq: 0,
                }),
                resilience,
                cleanup: Mutex::new(None),
            }),
        }
    }

    /// Store configuration
    pub fn config(&self) -> &CacheConfig {
        &self.inner.config
    }

    fn state(&self) -> Option<MutexGuard<'_, StoreState<T>>> {
        match self.inner.state.lock() {
            Ok(state) => Some(state),
            Err(_) => {
                self.report_internal(&Error::cache("cache state lock poisoned"), "cache:state");
                None
            }
        }
    }

    /// Log an internal failure at low severity
    fn report_internal(&self, error: &Error, origin: &str) {
        match &self.inner.resilience {
            Some(coordinator) => {
                coordinator.handle_error(
                    error,
                    ReportContext::new(origin),
                    HandleOptions::handled(ErrorSeverity::Low).without_circuit_tracking(),
                );
            }
            None => warn!(origin = %origin, error = %error, "Cache operation failed"),
        }
    }
}

// Basic operations
impl<T> CacheStore<T>
where
    T: Clone + Serialize + Send + Sync + 'static,
{
    /// Look up a live value
    ///
    /// A hit bumps the entry's hit count and access time. An expired entry is
    /// removed and reported as a miss.
    pub fn get(&self, key: &str) -> Option<T> {
        let timer = TimedOperation::start();
        let mut guard = self.state()?;
        let state = &mut *guard;
        let now = Instant::now();

        let expired = match state.entries.get(key) {
            Some(entry) => entry.is_expired(now),
            None => {
                state.metrics.record_miss();
                return None;
            }
        };
        if expired {
            state.entries.remove(key);
            state.metrics.record_miss();
            debug!(key = %key, "Cache entry expired on read");
            return None;
        }

        state.access_seq += 1;
        let entry = state.entries.get_mut(key)?;
        entry.hit_count += 1;
        entry.last_accessed_at = now;
        entry.access_seq = state.access_seq;
        let data = entry.data.clone();
        state.metrics.record_hit(timer.elapsed_ms_f64());
        Some(data)
    }

    /// Whether a live value exists, without touching metrics or access times
    pub fn has(&self, key: &str) -> bool {
        let now = Instant::now();
        self.state()
            .and_then(|state| state.entries.get(key).map(|entry| !entry.is_expired(now)))
            .unwrap_or(false)
    }

    /// Insert or replace a value
    ///
    /// Inserting a new key into a full store first evicts the least recently
    /// accessed entry. A store with zero capacity holds nothing. Never fails:
    /// internal errors are logged at low severity and the value is not stored.
    pub fn set(&self, key: &str, data: T, options: SetOptions) {
        if self.inner.config.max_size == 0 {
            debug!(key = %key, "Cache capacity is zero, value not stored");
            return;
        }
        let size_estimate_bytes = match estimate_size(&data) {
            Ok(size) => size,
            Err(error) => {
                self.report_internal(&error, "cache:set");
                return;
            }
        };

        let Some(mut guard) = self.state() else {
            return;
        };
        let state = &mut *guard;
        let now = Instant::now();

        if !state.entries.contains_key(key) && state.entries.len() >= self.inner.config.max_size {
            Self::evict_least_recently_accessed(state);
        }

        state.access_seq += 1;
        let entry = CacheEntry {
            data,
            created_at: now,
            ttl: options.ttl.unwrap_or_else(|| self.inner.config.default_ttl()),
            hit_count: 0,
            last_accessed_at: now,
            access_seq: state.access_seq,
            tags: options.tags.into_iter().collect(),
            size_estimate_bytes,
            source: options
                .source
                .unwrap_or_else(|| CACHE_DEFAULT_SOURCE.to_string()),
        };
        state.entries.insert(key.to_string(), entry);
        state.metrics.record_set();
    }

    fn evict_least_recently_accessed(state: &mut StoreState<T>) {
        let victim = state
            .entries
            .iter()
            .min_by_key(|(_, entry)| (entry.last_accessed_at, entry.access_seq))
            .map(|(key, _)| key.clone());

        if let Some(victim) = victim {
            state.entries.remove(&victim);
            state.metrics.record_evictions(1);
            debug!(key = %victim, "Evicted least recently accessed cache entry");
        }
    }

    /// Remove a value, returning whether it existed
    pub fn delete(&self, key: &str) -> bool {
        self.state()
            .is_some_and(|mut state| state.entries.remove(key).is_some())
    }

    /// Remove every entry carrying any of `tags`, returning the count removed
    pub fn invalidate_by_tags<S: AsRef<str>>(&self, tags: &[S]) -> usize {
        let Some(mut state) = self.state() else {
            return 0;
        };
        let before = state.entries.len();
        state.entries.retain(|_, entry| !entry.has_any_tag(tags));
        let removed = before - state.entries.len();
        if removed > 0 {
            info!(removed, "Invalidated cache entries by tag");
        }
        removed
    }

    /// Remove every entry
    pub fn clear(&self) {
        if let Some(mut state) = self.state() {
            state.entries.clear();
        }
    }

    /// Number of physically stored entries
    pub fn len(&self) -> usize {
        self.state().map_or(0, |state| state.entries.len())
    }

    /// Whether the store holds no entries
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Remove every expired entry in one pass, returning the count removed
    pub fn purge_expired(&self) -> usize {
        let Some(mut guard) = self.state() else {
            return 0;
        };
        let state = &mut *guard;
        let now = Instant::now();
        let before = state.entries.len();
        state.entries.retain(|_, entry| !entry.is_expired(now));
        let removed = before - state.entries.len();
        if removed > 0 {
            state.metrics.record_evictions(removed as u64);
            debug!(removed, "Swept expired cache entries");
        }
        removed
    }

    /// Entry count, metrics, configuration, and the most-hit entries
    pub fn stats(&self) -> CacheStoreStats {
        let now = Instant::now();
        let (entries, metrics, mut top_entries) = match self.state() {
            Some(state) => {
                let summaries: Vec<CacheEntrySummary> = state
                    .entries
                    .iter()
                    .map(|(key, entry)| CacheEntrySummary {
                        key: key.clone(),
                        hit_count: entry.hit_count,
                        size_estimate_bytes: entry.size_estimate_bytes,
                        age_ms: duration_ms(entry.age(now)),
                        ttl_ms: duration_ms(entry.ttl),
                        source: entry.source.clone(),
                    })
                    .collect();
                (state.entries.len(), state.metrics.snapshot(), summaries)
            }
            None => (0, CacheMetrics::default(), Vec::new()),
        };

        top_entries.sort_by(|a, b| b.hit_count.cmp(&a.hit_count).then_with(|| a.key.cmp(&b.key)));
        top_entries.truncate(STATS_TOP_N);

        CacheStoreStats {
            entries,
            metrics,
            config: self.inner.config.clone(),
            top_entries,
        }
    }
}

fn duration_ms(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

// Cache-aside
impl<T> CacheStore<T>
where
    T: Clone + Serialize + Send + Sync + 'static,
{
    /// Return the cached value for `key`, fetching and caching it on a miss
    ///
    /// With `stale_while_revalidate`, a hit is returned immediately and one
    /// detached refresh is spawned; its failures are logged, never returned.
    /// On a miss the fetcher runs with bounded retries when a coordinator is
    /// attached. If it ultimately fails, `fallback_data` is cached for a short
    /// TTL and returned; without fallback the error is reported at high
    /// severity and returned. Each failure is reported once.
    pub async fn get_or_set<F, Fut>(
        &self,
        key: &str,
        fetcher: F,
        options: GetOrSetOptions<T>,
    ) -> Result<T>
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<T>> + Send + 'static,
    {
        let GetOrSetOptions {
            ttl,
            tags,
            stale_while_revalidate,
            fallback_data,
        } = options;

        if let Some(cached) = self.get(key) {
            if stale_while_revalidate {
                self.spawn_revalidation(key.to_string(), fetcher, ttl, tags);
            }
            return Ok(cached);
        }

        let origin = format!("cache:{key}");
        let (fetched, retries) = match &self.inner.resilience {
            Some(coordinator) => {
                let policy = Self::fetch_retry_policy();
                match coordinator.run_attempts(&origin, &policy, &fetcher).await {
                    Ok(value) => (Ok(value), 0),
                    Err(failure) => (Err(failure.error), failure.retries),
                }
            }
            None => (fetcher().await, 0),
        };

        let error = match fetched {
            Ok(value) => {
                let options = SetOptions {
                    ttl,
                    tags,
                    source: Some("fetch".to_string()),
                };
                self.set(key, value.clone(), options);
                return Ok(value);
            }
            Err(error) => error,
        };

        if let Some(fallback) = fallback_data {
            match &self.inner.resilience {
                Some(coordinator) => {
                    coordinator.handle_error(
                        &error,
                        ReportContext::new(origin),
                        HandleOptions::handled(ErrorSeverity::Medium)
                            .with_retry_count(retries)
                            .without_circuit_tracking(),
                    );
                }
                None => warn!(key = %key, error = %error, "Fetch failed, serving fallback data"),
            }
            let options = SetOptions {
                ttl: Some(CACHE_FALLBACK_TTL),
                tags,
                source: Some("fallback".to_string()),
            };
            self.set(key, fallback.clone(), options);
            return Ok(fallback);
        }

        match &self.inner.resilience {
            Some(coordinator) => {
                coordinator.handle_error(
                    &error,
                    ReportContext::new(origin),
                    HandleOptions::unhandled(ErrorSeverity::High)
                        .with_retry_count(retries)
                        .without_circuit_tracking(),
                );
            }
            None => error!(key = %key, error = %error, "Cache fetch failed"),
        }
        Err(error)
    }

    fn fetch_retry_policy() -> RetryPolicy {
        RetryPolicy::new(
            CACHE_FETCH_MAX_RETRIES,
            Duration::from_millis(CACHE_FETCH_BASE_DELAY_MS),
            Duration::from_millis(CACHE_FETCH_MAX_DELAY_MS),
            2.0,
        )
    }

    /// Refresh `key` in a detached task
    ///
    /// Races with foreground writes to the same key resolve as last write
    /// wins.
    fn spawn_revalidation<F, Fut>(
        &self,
        key: String,
        fetcher: F,
        ttl: Option<Duration>,
        tags: Vec<String>,
    ) where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<T>> + Send + 'static,
    {
        let Ok(handle) = tokio::runtime::Handle::try_current() else {
            warn!(key = %key, "No runtime available, skipping background revalidation");
            return;
        };
        let store = self.clone();
        handle.spawn(async move {
            match fetcher().await {
                Ok(value) => {
                    let options = SetOptions {
                        ttl,
                        tags,
                        source: Some("revalidate".to_string()),
                    };
                    store.set(&key, value, options);
                    debug!(key = %key, "Background revalidation stored fresh value");
                }
                Err(error) => {
                    store.report_internal(&error, &format!("cache:revalidate:{key}"));
                }
            }
        });
    }
}

// Periodic sweep
impl<T> CacheStore<T>
where
    T: Clone + Serialize + Send + Sync + 'static,
{
    /// Start the periodic expiry sweep
    ///
    /// Returns `false` if a sweep task is already running, the interval is
    /// zero, or no tokio runtime is available. The task holds only a weak
    /// reference and exits once the last store clone is dropped.
    pub fn start_cleanup(&self) -> bool {
        let interval = self.inner.config.cleanup_interval();
        if interval.is_zero() {
            warn!("Cache cleanup interval is zero, sweep not started");
            return false;
        }
        let Ok(handle) = tokio::runtime::Handle::try_current() else {
            warn!("No runtime available, cache sweep not started");
            return false;
        };
        let Ok(mut cleanup) = self.inner.cleanup.lock() else {
            return false;
        };
        if cleanup.as_ref().is_some_and(|token| !token.is_cancelled()) {
            return false;
        }

        let token = CancellationToken::new();
        let cancelled = token.clone();
        let weak = Arc::downgrade(&self.inner);
        handle.spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            // The first tick completes immediately
            ticker.tick().await;
            loop {
                tokio::select! {
                    () = cancelled.cancelled() => break,
                    _ = ticker.tick() => {
                        let Some(inner) = weak.upgrade() else { break };
                        CacheStore { inner }.purge_expired();
                    }
                }
            }
            debug!("Cache sweep task stopped");
        });
        *cleanup = Some(token);
        true
    }

    /// Stop the periodic expiry sweep
    pub fn shutdown(&self) {
        if let Ok(mut cleanup) = self.inner.cleanup.lock() {
            if let Some(token) = cleanup.take() {
                token.cancel();
            }
        }
    }
}
