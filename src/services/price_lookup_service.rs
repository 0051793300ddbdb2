//! Price lookup service.
//!
//! Fetch, extract, trim-mean, cache: one service instance per sales source.

use crate::cache::TimedCache;
use crate::error::{LookupResult, PricingError};
use crate::metrics::Metrics;
use crate::models::{PriceSummary, SalesQuery};
use crate::pricing::summarize;
use crate::sources::SalesSource;
use async_trait::async_trait;
use futures::future::join_all;
use serde::Serialize;
use std::sync::Arc;

const MAX_CARD_LENGTH: usize = 300;

/// Price lookup trait for business operations.
#[async_trait]
pub trait PriceLookupService: Send + Sync {
    /// Name of the underlying source.
    fn source_name(&self) -> &'static str;

    /// Look up the price summary for a card, answering from cache when fresh.
    async fn lookup(&self, query: &SalesQuery) -> LookupResult<PriceSummary>;
}

/// Default implementation backed by a [`SalesSource`] and a [`TimedCache`].
pub struct PriceLookupServiceImpl {
    source: Arc<dyn SalesSource>,
    cache: TimedCache<String, PriceSummary>,
    metrics: Metrics,
}

impl PriceLookupServiceImpl {
    pub fn new(source: Arc<dyn SalesSource>, ttl_seconds: u64, metrics: Metrics) -> Self {
        Self {
            source,
            cache: TimedCache::new(ttl_seconds),
            metrics,
        }
    }

    /// Handle to the cache, for the background sweeper.
    pub fn cache(&self) -> &TimedCache<String, PriceSummary> {
        &self.cache
    }

    fn validate_query(query: &SalesQuery) -> Result<(), String> {
        if query.card.trim().is_empty() {
            return Err("card is required".to_string());
        }
        if query.card.len() > MAX_CARD_LENGTH {
            return Err(format!(
                "card too long (max {} characters)",
                MAX_CARD_LENGTH
            ));
        }
        Ok(())
    }
}

#[async_trait]
impl PriceLookupService for PriceLookupServiceImpl {
    fn source_name(&self) -> &'static str {
        self.source.name()
    }

    async fn lookup(&self, query: &SalesQuery) -> LookupResult<PriceSummary> {
        Self::validate_query(query).map_err(PricingError::InvalidInput)?;

        let key = self.source.cache_key(query);
        if let Some(summary) = self.cache.get(&key) {
            tracing::trace!("{} cache hit for {}", self.source.name(), key);
            self.metrics.record_cache_hit();
            return Ok(summary);
        }
        self.metrics.record_cache_miss();

        let search_text = self.source.search_text(query);
        tracing::debug!("{} lookup for \"{}\"", self.source.name(), search_text);

        let sales = self.source.fetch_sales(query).await?;
        let summary = summarize(&search_text, sales)?;

        self.cache.insert(key, summary.clone());
        Ok(summary)
    }
}

/// One source's answer in a comparison.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SourceResult {
    pub source: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<PriceSummary>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Query several sources concurrently. A failing source does not fail the rest.
pub async fn compare(
    services: &[Arc<dyn PriceLookupService>],
    query: &SalesQuery,
) -> Vec<SourceResult> {
    let lookups = services.iter().map(|service| async move {
        let result = service.lookup(query).await;
        match result {
            Ok(summary) => SourceResult {
                source: service.source_name().to_string(),
                summary: Some(summary),
                error: None,
            },
            Err(e) => {
                tracing::debug!("{} failed during comparison: {}", service.source_name(), e);
                SourceResult {
                    source: service.source_name().to_string(),
                    summary: None,
                    error: Some(e.to_string()),
                }
            }
        }
    });

    join_all(lookups).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{LookupError, UpstreamError, UpstreamResult};
    use crate::models::Sale;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct FixedSource {
        prices: Vec<f64>,
        calls: AtomicUsize,
        fail: bool,
    }

    impl FixedSource {
        fn new(prices: Vec<f64>) -> Self {
            Self {
                prices,
                calls: AtomicUsize::new(0),
                fail: false,
            }
        }

        fn failing() -> Self {
            Self {
                prices: Vec::new(),
                calls: AtomicUsize::new(0),
                fail: true,
            }
        }
    }

    #[async_trait]
    impl SalesSource for FixedSource {
        fn name(&self) -> &'static str {
            "fixed"
        }

        fn search_text(&self, query: &SalesQuery) -> String {
            query.graded_search_text()
        }

        async fn fetch_sales(&self, _query: &SalesQuery) -> UpstreamResult<Vec<Sale>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                return Err(UpstreamError::Timeout);
            }
            Ok(self
                .prices
                .iter()
                .map(|p| Sale::new(*p, "card", "2024-01-01"))
                .collect())
        }
    }

    #[tokio::test]
    async fn test_lookup_caches_by_normalized_key() {
        let source = Arc::new(FixedSource::new(vec![100.0, 110.0, 90.0]));
        let metrics = Metrics::new();
        let service = PriceLookupServiceImpl::new(source.clone(), 60, metrics.clone());

        let first = service
            .lookup(&SalesQuery::new("Charizard Base").with_grade(Some("10".into())))
            .await
            .unwrap();
        let second = service
            .lookup(&SalesQuery::new("charizard  base").with_grade(Some("10".into())))
            .await
            .unwrap();

        assert_eq!(first, second);
        assert_eq!(first.average_price, 100.0);
        assert_eq!(first.query, "Charizard Base PSA 10");
        assert_eq!(source.calls.load(Ordering::SeqCst), 1);
        assert_eq!(metrics.cache_hits_total(), 1);
        assert_eq!(metrics.cache_misses_total(), 1);
    }

    #[tokio::test]
    async fn test_no_sales_is_not_cached() {
        let source = Arc::new(FixedSource::new(Vec::new()));
        let service = PriceLookupServiceImpl::new(source.clone(), 60, Metrics::new());

        for _ in 0..2 {
            let err = service.lookup(&SalesQuery::new("nothing")).await.unwrap_err();
            assert!(matches!(err, LookupError::Pricing(PricingError::NoSales(_))));
        }
        assert_eq!(source.calls.load(Ordering::SeqCst), 2);
        assert!(service.cache().is_empty());
    }

    #[tokio::test]
    async fn test_empty_card_rejected() {
        let source = Arc::new(FixedSource::new(vec![1.0]));
        let service = PriceLookupServiceImpl::new(source.clone(), 60, Metrics::new());

        let err = service.lookup(&SalesQuery::new("  ")).await.unwrap_err();
        assert!(matches!(err, LookupError::Pricing(PricingError::InvalidInput(_))));
        assert_eq!(source.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_compare_keeps_partial_results() {
        let ok: Arc<dyn PriceLookupService> = Arc::new(PriceLookupServiceImpl::new(
            Arc::new(FixedSource::new(vec![10.0])),
            60,
            Metrics::new(),
        ));
        let failing: Arc<dyn PriceLookupService> = Arc::new(PriceLookupServiceImpl::new(
            Arc::new(FixedSource::failing()),
            60,
            Metrics::new(),
        ));

        let results = compare(&[ok, failing], &SalesQuery::new("Mew")).await;
        assert_eq!(results.len(), 2);
        assert!(results[0].summary.is_some());
        assert_eq!(results[1].error.as_deref(), Some("Request timeout"));
    }
}
