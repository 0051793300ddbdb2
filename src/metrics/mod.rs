//! Basic metrics instrumentation for tracking performance.
//!
//! Counts upstream traffic, cache effectiveness and rate-limit rejections.
//! A snapshot is served on `/metrics`.

use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Metrics collector shared by the client, services and server.
#[derive(Debug, Clone)]
pub struct Metrics {
    /// Total number of upstream HTTP requests made
    upstream_requests_total: Arc<AtomicU64>,

    /// Total number of upstream HTTP errors
    upstream_errors_total: Arc<AtomicU64>,

    /// Total duration of all upstream requests in milliseconds
    upstream_duration_total_ms: Arc<AtomicU64>,

    /// Lookups answered from cache
    cache_hits_total: Arc<AtomicU64>,

    /// Lookups that had to go upstream
    cache_misses_total: Arc<AtomicU64>,

    /// Requests rejected by the rate limiter
    rate_limited_total: Arc<AtomicU64>,
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}

impl Metrics {
    /// Create a new metrics collector.
    pub fn new() -> Self {
        Self {
            upstream_requests_total: Arc::new(AtomicU64::new(0)),
            upstream_errors_total: Arc::new(AtomicU64::new(0)),
            upstream_duration_total_ms: Arc::new(AtomicU64::new(0)),
            cache_hits_total: Arc::new(AtomicU64::new(0)),
            cache_misses_total: Arc::new(AtomicU64::new(0)),
            rate_limited_total: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Record an upstream request with duration.
    pub fn record_upstream_request(&self, duration: Duration) {
        self.upstream_requests_total.fetch_add(1, Ordering::Relaxed);
        self.upstream_duration_total_ms
            .fetch_add(duration.as_millis() as u64, Ordering::Relaxed);
    }

    /// Record an upstream error.
    pub fn record_upstream_error(&self) {
        self.upstream_errors_total.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_cache_hit(&self) {
        self.cache_hits_total.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_cache_miss(&self) {
        self.cache_misses_total.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_rate_limited(&self) {
        self.rate_limited_total.fetch_add(1, Ordering::Relaxed);
    }

    pub fn upstream_requests_total(&self) -> u64 {
        self.upstream_requests_total.load(Ordering::Relaxed)
    }

    pub fn upstream_errors_total(&self) -> u64 {
        self.upstream_errors_total.load(Ordering::Relaxed)
    }

    pub fn upstream_duration_total_ms(&self) -> u64 {
        self.upstream_duration_total_ms.load(Ordering::Relaxed)
    }

    /// Get average upstream request duration in milliseconds.
    pub fn upstream_duration_avg_ms(&self) -> f64 {
        let total = self.upstream_duration_total_ms.load(Ordering::Relaxed);
        let count = self.upstream_requests_total.load(Ordering::Relaxed);
        if count == 0 {
            0.0
        } else {
            total as f64 / count as f64
        }
    }

    pub fn cache_hits_total(&self) -> u64 {
        self.cache_hits_total.load(Ordering::Relaxed)
    }

    pub fn cache_misses_total(&self) -> u64 {
        self.cache_misses_total.load(Ordering::Relaxed)
    }

    pub fn rate_limited_total(&self) -> u64 {
        self.rate_limited_total.load(Ordering::Relaxed)
    }

    /// Get a summary of all metrics.
    pub fn summary(&self) -> MetricsSummary {
        MetricsSummary {
            upstream_requests_total: self.upstream_requests_total(),
            upstream_errors_total: self.upstream_errors_total(),
            upstream_duration_total_ms: self.upstream_duration_total_ms(),
            upstream_duration_avg_ms: self.upstream_duration_avg_ms(),
            cache_hits_total: self.cache_hits_total(),
            cache_misses_total: self.cache_misses_total(),
            rate_limited_total: self.rate_limited_total(),
        }
    }
}

/// A snapshot of metrics values.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricsSummary {
    pub upstream_requests_total: u64,
    pub upstream_errors_total: u64,
    pub upstream_duration_total_ms: u64,
    pub upstream_duration_avg_ms: f64,
    pub cache_hits_total: u64,
    pub cache_misses_total: u64,
    pub rate_limited_total: u64,
}

/// Helper for timing upstream requests.
pub struct HttpTimer {
    start: Instant,
    metrics: Metrics,
}

impl HttpTimer {
    /// Start timing an upstream request.
    pub fn new(metrics: Metrics) -> Self {
        Self {
            start: Instant::now(),
            metrics,
        }
    }

    /// Complete the timing and record the duration.
    pub fn complete(self) {
        let duration = self.start.elapsed();
        self.metrics.record_upstream_request(duration);
    }

    /// Complete the timing and record as an error.
    pub fn complete_with_error(self) {
        let duration = self.start.elapsed();
        self.metrics.record_upstream_request(duration);
        self.metrics.record_upstream_error();
    }
}
