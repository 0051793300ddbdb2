//! Card catalog service.
//!
//! TCGPlayer product search (cached) and PSA certificate verification.

use crate::cache::TimedCache;
use crate::error::{UpstreamError, UpstreamResult};
use crate::metrics::Metrics;
use crate::models::sale::normalize;
use crate::models::{CardProduct, PsaCert};
use crate::sources::tcgplayer::MAX_SEARCH_RESULTS;
use crate::sources::{PsaCertClient, TcgPlayerCatalog};
use async_trait::async_trait;
use std::sync::Arc;

/// Card service trait for business operations.
#[async_trait]
pub trait CardService: Send + Sync {
    /// Search the product catalog by name.
    async fn search_products(&self, query: &str, limit: usize) -> UpstreamResult<Vec<CardProduct>>;

    /// Verify a PSA certificate.
    async fn lookup_cert(&self, cert_number: &str) -> UpstreamResult<PsaCert>;
}

pub struct CardServiceImpl {
    catalog: Arc<TcgPlayerCatalog>,
    certs: Arc<PsaCertClient>,
    search_cache: TimedCache<String, Vec<CardProduct>>,
    metrics: Metrics,
}

impl CardServiceImpl {
    pub fn new(
        catalog: Arc<TcgPlayerCatalog>,
        certs: Arc<PsaCertClient>,
        cache_ttl_seconds: u64,
        metrics: Metrics,
    ) -> Self {
        Self {
            catalog,
            certs,
            search_cache: TimedCache::new(cache_ttl_seconds),
            metrics,
        }
    }

    pub fn cache(&self) -> &TimedCache<String, Vec<CardProduct>> {
        &self.search_cache
    }

    fn validate_search_query(query: &str) -> Result<(), String> {
        if query.trim().is_empty() {
            return Err("Search query cannot be empty".to_string());
        }
        if query.len() > 300 {
            return Err("Search query too long (max 300 characters)".to_string());
        }
        Ok(())
    }
}

/// Cache key for a catalog search; `limit` must already be clamped.
fn search_cache_key(query: &str, limit: usize) -> String {
    format!("{}|{}", normalize(query), limit)
}

#[async_trait]
impl CardService for CardServiceImpl {
    async fn search_products(&self, query: &str, limit: usize) -> UpstreamResult<Vec<CardProduct>> {
        Self::validate_search_query(query).map_err(UpstreamError::InvalidRequest)?;

        let limit = limit.clamp(1, MAX_SEARCH_RESULTS);
        let key = search_cache_key(query, limit);
        if let Some(products) = self.search_cache.get(&key) {
            self.metrics.record_cache_hit();
            return Ok(products);
        }
        self.metrics.record_cache_miss();

        let products = self.catalog.search(query, limit).await?;
        self.search_cache.insert(key, products.clone());
        Ok(products)
    }

    async fn lookup_cert(&self, cert_number: &str) -> UpstreamResult<PsaCert> {
        self.certs.lookup(cert_number).await
    }
}
