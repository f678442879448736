//! Cache access metrics

use crate::constants::CACHE_ACCESS_SAMPLE_WINDOW;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

/// Cache metrics block
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct CacheMetrics {
    /// Lookups that returned a value
    pub hits: u64,
    /// Lookups that found nothing or an expired entry
    pub misses: u64,
    /// Entries removed by capacity eviction or expiry sweeps
    pub evictions: u64,
    /// Successful insertions
    pub sets: u64,
    /// `hits / (hits + misses)`, 0.0 before any lookup
    pub hit_rate: f64,
    /// Mean lookup time over the most recent hits
    pub avg_access_time_ms: f64,
}

/// Running counters plus the rolling access-time window
#[derive(Debug, Default)]
pub(crate) struct MetricsRecorder {
    metrics: CacheMetrics,
    access_samples: VecDeque<f64>,
}

impl MetricsRecorder {
    pub(crate) fn record_hit(&mut self, access_time_ms: f64) {
        self.metrics.hits += 1;
        if self.access_samples.len() >= CACHE_ACCESS_SAMPLE_WINDOW {
            self.access_samples.pop_front();
        }
        self.access_samples.push_back(access_time_ms);
        self.refresh();
    }

    pub(crate) fn record_miss(&mut self) {
        self.metrics.misses += 1;
        self.refresh();
    }

    pub(crate) fn record_set(&mut self) {
        self.metrics.sets += 1;
    }

    pub(crate) fn record_evictions(&mut self, count: u64) {
        self.metrics.evictions += count;
    }

    pub(crate) fn snapshot(&self) -> CacheMetrics {
        self.metrics.clone()
    }

    #[allow(clippy::cast_precision_loss)]
    fn refresh(&mut self) {
        let lookups = self.metrics.hits + self.metrics.misses;
        self.metrics.hit_rate = if lookups > 0 {
            self.metrics.hits as f64 / lookups as f64
        } else {
            0.0
        };
        self.metrics.avg_access_time_ms = if self.access_samples.is_empty() {
            0.0
        } else {
            self.access_samples.iter().sum::<f64>() / self.access_samples.len() as f64
        };
    }
}
