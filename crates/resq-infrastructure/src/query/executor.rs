//! Query executor

use super::sinks::TracingMetricsSink;
use super::stats::summarize;
use crate::cache::{CacheStore, SetOptions};
use crate::config::QueryConfig;
use crate::resilience::{HandleOptions, ResilienceCoordinator};
use crate::utils::TimedOperation;
use resq_domain::constants::QUERY_METRIC_CAPACITY;
use resq_domain::error::{Error, Result};
use resq_domain::{ErrorSeverity, MetricsSink, QueryMetric, QueryStats, ReportContext};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::collections::VecDeque;
use std::future::Future;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tracing::{debug, warn};

/// Per-call options for [`QueryExecutor::execute_query`]
#[derive(Debug, Clone)]
pub struct QueryOptions {
    /// Operation name used for metrics, retries, and the circuit key
    pub name: String,
    /// Whether this call may use the cache
    pub enable_cache: bool,
    /// Cache key; caching is skipped without one
    pub cache_key: Option<String>,
    /// Invalidation tags for the cached result
    pub tags: Vec<String>,
    /// TTL override for the cached result
    pub ttl: Option<Duration>,
    /// Caller context attached to failure reports
    pub metadata: Option<Value>,
}

impl QueryOptions {
    /// Options for the operation `name`, cache enabled but keyless
    pub fn new<S: Into<String>>(name: S) -> Self {
        Self {
            name: name.into(),
            enable_cache: true,
            cache_key: None,
            tags: Vec::new(),
            ttl: None,
            metadata: None,
        }
    }

    /// Set the cache key
    pub fn with_cache_key<S: Into<String>>(mut self, key: S) -> Self {
        self.cache_key = Some(key.into());
        self
    }

    /// Bypass the cache for this call
    pub fn without_cache(mut self) -> Self {
        self.enable_cache = false;
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

    /// Set the TTL
    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = Some(ttl);
        self
    }

    /// Attach caller metadata
    pub fn with_metadata(mut self, metadata: Value) -> Self {
        self.metadata = Some(metadata);
        self
    }
}

/// Outcome of a wrapped query
///
/// Failures are carried as a value instead of an `Err` so batch callers can
/// inspect partial failures.
#[derive(Debug)]
pub struct QueryResult<T> {
    /// Result data, `None` on failure
    pub data: Option<T>,
    /// Failure, `None` on success
    pub error: Option<Error>,
    /// Whether the data came from the cache
    pub cached: bool,
    /// Time spent in the underlying fetch, zero for cache hits
    pub execution_time: Duration,
}

impl<T> QueryResult<T> {
    fn success(data: T, cached: bool, execution_time: Duration) -> Self {
        Self {
            data: Some(data),
            error: None,
            cached,
            execution_time,
        }
    }

    fn failure(error: Error, execution_time: Duration) -> Self {
        Self {
            data: None,
            error: Some(error),
            cached: false,
            execution_time,
        }
    }

    /// Whether the query produced data
    pub fn is_success(&self) -> bool {
        self.error.is_none() && self.data.is_some()
    }

    /// Convert into a `Result`
    pub fn into_result(self) -> Result<T> {
        match (self.data, self.error) {
            (_, Some(error)) => Err(error),
            (Some(data), None) => Ok(data),
            (None, None) => Err(Error::internal("query produced neither data nor error")),
        }
    }
}

/// Query executor
///
/// Composes the cache store and the resilience coordinator around arbitrary
/// fetch operations. Results are cached as JSON values so one store serves
/// every result type.
pub struct QueryExecutor {
    config: QueryConfig,
    cache: CacheStore<Value>,
    coordinator: Arc<ResilienceCoordinator>,
    metrics: Mutex<VecDeque<QueryMetric>>,
    metric_capacity: usize,
    sink: Arc<dyn MetricsSink>,
}

impl QueryExecutor {
    /// Create an executor over a shared cache and coordinator
    pub fn new(
        config: QueryConfig,
        cache: CacheStore<Value>,
        coordinator: Arc<ResilienceCoordinator>,
    ) -> Self {
        Self {
            config,
            cache,
            coordinator,
            metrics: Mutex::new(VecDeque::new()),
            metric_capacity: QUERY_METRIC_CAPACITY,
            sink: Arc::new(TracingMetricsSink),
        }
    }

    /// Replace the metrics sink
    pub fn with_metrics_sink(mut self, sink: Arc<dyn MetricsSink>) -> Self {
        self.sink = sink;
        self
    }

    /// Bound the number of retained metrics
    pub fn with_metric_capacity(mut self, capacity: usize) -> Self {
        self.metric_capacity = capacity;
        self
    }

    /// Query configuration
    pub fn config(&self) -> &QueryConfig {
        &self.config
    }

    /// Result cache
    pub fn cache(&self) -> &CacheStore<Value> {
        &self.cache
    }

    /// Coordinator the fetches run through
    pub fn coordinator(&self) -> &Arc<ResilienceCoordinator> {
        &self.coordinator
    }

    /// Run `fetch` with cache-aside lookup and retries
    ///
    /// With caching enabled and a cache key present, a live cached result is
    /// returned without calling `fetch`. Otherwise `fetch` runs under the
    /// coordinator's retry and circuit breaker, keyed by the operation name.
    /// A metric is recorded for every call. Successful non-null results are
    /// cached; failures are reported at high severity and returned inside
    /// the result.
    pub async fn execute_query<T, F, Fut>(&self, fetch: F, options: QueryOptions) -> QueryResult<T>
    where
        T: Serialize + DeserializeOwned,
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let cache_key = options
            .cache_key
            .as_deref()
            .filter(|_| self.config.enable_query_caching && options.enable_cache);

        if let Some(key) = cache_key {
            if let Some(hit) = self.cached::<T>(key) {
                let (data, row_count) = hit;
                self.record_metric(&options.name, Duration::ZERO, true, row_count, None, true);
                return QueryResult::success(data, true, Duration::ZERO);
            }
        }

        let timer = TimedOperation::start();
        let policy = self
            .coordinator
            .default_retry_policy()
            .with_max_retries(self.config.max_retries);
        let outcome = self
            .coordinator
            .run_attempts(&options.name, &policy, fetch)
            .await;
        let elapsed = timer.elapsed();

        match outcome {
            Ok(data) => {
                let value = match serde_json::to_value(&data) {
                    Ok(value) => Some(value),
                    Err(error) => {
                        self.coordinator.handle_error(
                            &Error::from(error),
                            ReportContext::new(&options.name),
                            HandleOptions::handled(ErrorSeverity::Low).without_circuit_tracking(),
                        );
                        None
                    }
                };
                let row_count = value.as_ref().and_then(row_count);
                self.record_metric(&options.name, elapsed, true, row_count, None, false);
                self.flag_if_slow(&options.name, elapsed);

                if let (Some(key), Some(value)) = (cache_key, value) {
                    if !value.is_null() {
                        self.store(key, value, &options);
                    }
                }
                QueryResult::success(data, false, elapsed)
            }
            Err(failure) => {
                let message = failure.error.to_string();
                self.record_metric(&options.name, elapsed, false, None, Some(message), false);
                self.flag_if_slow(&options.name, elapsed);

                let mut context = ReportContext::new(&options.name);
                if let Some(metadata) = options.metadata.clone() {
                    context = context.with_data(metadata);
                }
                self.coordinator.handle_error(
                    &failure.error,
                    context,
                    HandleOptions::handled(ErrorSeverity::High)
                        .with_retry_count(failure.retries)
                        .without_circuit_tracking(),
                );
                QueryResult::failure(failure.error, elapsed)
            }
        }
    }

    fn cached<T: DeserializeOwned>(&self, key: &str) -> Option<(T, Option<usize>)> {
        let value = self.cache.get(key)?;
        let rows = row_count(&value);
        match serde_json::from_value(value) {
            Ok(data) => Some((data, rows)),
            Err(error) => {
                warn!(key = %key, error = %error, "Cached query result has an unexpected shape, discarding");
                self.cache.delete(key);
                None
            }
        }
    }

    fn store(&self, key: &str, value: Value, options: &QueryOptions) {
        let set = SetOptions {
            ttl: Some(options.ttl.unwrap_or_else(|| self.config.cache_ttl())),
            tags: options.tags.clone(),
            source: Some(format!("query:{}", options.name)),
        };
        self.cache.set(key, value, set);
    }

    fn flag_if_slow(&self, name: &str, elapsed: Duration) {
        if elapsed <= self.config.slow_operation_threshold() {
            return;
        }
        let elapsed_ms = u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX);
        self.coordinator
            .add_breadcrumb(format!("slow query: {name} took {elapsed_ms}ms"));
        warn!(
            operation = %name,
            execution_time_ms = elapsed_ms,
            threshold_ms = self.config.slow_operation_threshold_ms,
            "Slow query detected"
        );
    }

    fn record_metric(
        &self,
        name: &str,
        elapsed: Duration,
        success: bool,
        row_count: Option<usize>,
        error_message: Option<String>,
        cached: bool,
    ) {
        let metric = QueryMetric {
            operation_name: name.to_string(),
            execution_time_ms: u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX),
            timestamp: chrono::Utc::now(),
            success,
            row_count,
            error_message,
            cached,
        };
        self.sink.record_query(&metric);

        if self.metric_capacity == 0 {
            return;
        }
        if let Ok(mut metrics) = self.metrics.lock() {
            while metrics.len() >= self.metric_capacity {
                metrics.pop_front();
            }
            metrics.push_back(metric);
        }
    }

    /// The most recent `limit` metrics, newest last
    pub fn recent_metrics(&self, limit: usize) -> Vec<QueryMetric> {
        self.metrics
            .lock()
            .map(|metrics| {
                let skip = metrics.len().saturating_sub(limit);
                metrics.iter().skip(skip).cloned().collect()
            })
            .unwrap_or_default()
    }

    /// Rollup of the metrics recorded within `window` of now
    pub fn get_database_stats(&self, window: Duration) -> QueryStats {
        let cutoff = chrono::Duration::from_std(window)
            .ok()
            .and_then(|window| chrono::Utc::now().checked_sub_signed(window));

        let in_window: Vec<QueryMetric> = self
            .metrics
            .lock()
            .map(|metrics| {
                metrics
                    .iter()
                    .filter(|metric| cutoff.is_none_or(|cutoff| metric.timestamp >= cutoff))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default();

        debug!(metrics = in_window.len(), "Summarizing query metrics");
        summarize(&in_window, self.config.slow_operation_threshold_ms)
    }
}

/// Row count of list-shaped results
fn row_count(value: &Value) -> Option<usize> {
    value.as_array().map(Vec::len)
}
