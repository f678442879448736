//! Composition root
//!
//! Builds the coordinator, the shared query cache, and the query executor
//! from one [`AppConfig`] and hands them out as `Arc`-shared services.

use resq_domain::error::Result;
use resq_domain::{MetricsSink, ReportSink};
use resq_infrastructure::cache::CacheStore;
use resq_infrastructure::config::loader::validate_app_config;
use resq_infrastructure::config::{AppConfig, ConfigLoader};
use resq_infrastructure::logging::init_logging;
use resq_infrastructure::query::{QueryExecutor, TracingMetricsSink};
use resq_infrastructure::resilience::{ResilienceCoordinator, TracingReportSink};
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;
use tracing::info;

/// Wired cache, coordinator, and query executor
///
/// # Example
///
/// ```ignore
/// let layer = ResilienceLayer::from_loader(&ConfigLoader::new())?;
/// let listings = layer
///     .query()
///     .list("properties", &filters, Pagination::new(1, 20), || api.list(&filters))
///     .await;
/// layer.shutdown();
/// ```
pub struct ResilienceLayer {
    config: AppConfig,
    coordinator: Arc<ResilienceCoordinator>,
    query_cache: CacheStore<Value>,
    query: Arc<QueryExecutor>,
}

impl ResilienceLayer {
    /// Wire every service from `config` with the tracing sinks
    pub fn new(config: AppConfig) -> Result<Self> {
        Self::with_sinks(config, Arc::new(TracingReportSink), Arc::new(TracingMetricsSink))
    }

    /// Wire every service from `config` with caller-supplied sinks
    ///
    /// Starts the query cache sweep when called inside a tokio runtime.
    pub fn with_sinks(
        config: AppConfig,
        report_sink: Arc<dyn ReportSink>,
        metrics_sink: Arc<dyn MetricsSink>,
    ) -> Result<Self> {
        validate_app_config(&config)?;

        let coordinator =
            Arc::new(ResilienceCoordinator::from_config(&config).with_report_sink(report_sink));
        let query_cache = CacheStore::with_resilience(config.cache.clone(), Arc::clone(&coordinator));
        query_cache.start_cleanup();

        let query = Arc::new(
            QueryExecutor::new(config.query.clone(), query_cache.clone(), Arc::clone(&coordinator))
                .with_metrics_sink(metrics_sink),
        );

        info!(
            cache_max_size = config.cache.max_size,
            failure_threshold = config.circuit_breaker.failure_threshold,
            "Resilience layer initialized"
        );

        Ok(Self {
            config,
            coordinator,
            query_cache,
            query,
        })
    }

    /// Load configuration with `loader` and wire every service
    pub fn from_loader(loader: &ConfigLoader) -> Result<Self> {
        Self::new(loader.load()?)
    }

    /// Install the global tracing subscriber from the logging configuration
    pub fn init_logging(&self) -> Result<()> {
        init_logging(&self.config.logging)
    }

    /// Configuration the layer was built from
    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Shared resilience coordinator
    pub fn coordinator(&self) -> &Arc<ResilienceCoordinator> {
        &self.coordinator
    }

    /// Cache backing the query executor
    pub fn query_cache(&self) -> &CacheStore<Value> {
        &self.query_cache
    }

    /// Shared query executor
    pub fn query(&self) -> &Arc<QueryExecutor> {
        &self.query
    }

    /// Create a typed cache store attached to the shared coordinator
    ///
    /// The store's sweep task is started here; it stops on
    /// [`CacheStore::shutdown`] or when the last clone of the store is dropped.
    pub fn cache<T>(&self) -> CacheStore<T>
    where
        T: Clone + Serialize + Send + Sync + 'static,
    {
        let store = CacheStore::with_resilience(self.config.cache.clone(), Arc::clone(&self.coordinator));
        store.start_cleanup();
        store
    }

    /// Stop background tasks owned by the layer
    pub fn shutdown(&self) {
        self.query_cache.shutdown();
        info!("Resilience layer shut down");
    }
}
