//! Inventory service layer.
//!
//! Validated CRUD over the inventory repository, fuzzy search, and publishing
//! items to the storefront.

use crate::error::{UpstreamError, UpstreamResult};
use crate::matching::{CardMatch, CardMatcher};
use crate::models::{InventoryItem, InventoryUpdate, NewInventoryItem};
use crate::repositories::{InventoryRepository, ListingPublisher};
use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::Mutex;

pub const DEFAULT_PAGE_SIZE: usize = 50;
pub const MAX_PAGE_SIZE: usize = 200;

/// How many rows a fuzzy search scans.
const SEARCH_SCAN_LIMIT: usize = 1000;

/// Minimum fuzzy score for a search hit.
const MIN_SEARCH_SCORE: u8 = 30;

/// Inventory service trait for business operations.
#[async_trait]
pub trait InventoryService: Send + Sync {
    async fn list(&self, limit: Option<usize>, offset: Option<usize>)
        -> UpstreamResult<Vec<InventoryItem>>;

    async fn get(&self, id: i64) -> UpstreamResult<InventoryItem>;

    async fn create(&self, item: NewInventoryItem) -> UpstreamResult<InventoryItem>;

    async fn update(&self, id: i64, update: InventoryUpdate) -> UpstreamResult<InventoryItem>;

    async fn delete(&self, id: i64) -> UpstreamResult<()>;

    /// Rank inventory against a free-text query.
    async fn search(&self, query: &str, limit: Option<usize>) -> UpstreamResult<Vec<CardMatch>>;

    /// List the item on the storefront and record the product id.
    ///
    /// Items that already carry a product id are returned unchanged.
    async fn publish(&self, id: i64) -> UpstreamResult<InventoryItem>;
}

/// Default implementation of InventoryService.
///
/// Either collaborator may be absent when its credentials are not configured;
/// operations needing it then fail with [`UpstreamError::NotConfigured`].
pub struct InventoryServiceImpl {
    repository: Option<Arc<dyn InventoryRepository>>,
    publisher: Option<Arc<dyn ListingPublisher>>,
    matcher: Mutex<CardMatcher>,
}

/// Validation helper functions.
impl InventoryServiceImpl {
    fn validate_id(id: i64) -> Result<(), String> {
        if id <= 0 {
            return Err("Inventory ID must be a positive integer".to_string());
        }
        Ok(())
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

    fn page_size(limit: Option<usize>) -> usize {
        limit.unwrap_or(DEFAULT_PAGE_SIZE).clamp(1, MAX_PAGE_SIZE)
    }
}

impl InventoryServiceImpl {
    pub fn new(
        repository: Option<Arc<dyn InventoryRepository>>,
        publisher: Option<Arc<dyn ListingPublisher>>,
    ) -> Self {
        Self {
            repository,
            publisher,
            matcher: Mutex::new(CardMatcher::new()),
        }
    }

    fn repository(&self) -> UpstreamResult<&Arc<dyn InventoryRepository>> {
        self.repository
            .as_ref()
            .ok_or_else(|| UpstreamError::NotConfigured("Inventory database".to_string()))
    }

    fn publisher(&self) -> UpstreamResult<&Arc<dyn ListingPublisher>> {
        self.publisher
            .as_ref()
            .ok_or_else(|| UpstreamError::NotConfigured("Shopify".to_string()))
    }
}

#[async_trait]
impl InventoryService for InventoryServiceImpl {
    async fn list(
        &self,
        limit: Option<usize>,
        offset: Option<usize>,
    ) -> UpstreamResult<Vec<InventoryItem>> {
        self.repository()?
            .list(Self::page_size(limit), offset.unwrap_or(0))
            .await
    }

    async fn get(&self, id: i64) -> UpstreamResult<InventoryItem> {
        Self::validate_id(id).map_err(UpstreamError::InvalidRequest)?;
        self.repository()?.get(id).await
    }

    async fn create(&self, item: NewInventoryItem) -> UpstreamResult<InventoryItem> {
        item.validate().map_err(UpstreamError::InvalidRequest)?;

        let created = self.repository()?.create(&item).await?;
        tracing::info!("Added inventory item {} ({})", created.id, created.card_name);
        Ok(created)
    }

    async fn update(&self, id: i64, update: InventoryUpdate) -> UpstreamResult<InventoryItem> {
        Self::validate_id(id).map_err(UpstreamError::InvalidRequest)?;
        if update.is_empty() {
            return Err(UpstreamError::InvalidRequest(
                "Update must change at least one field".to_string(),
            ));
        }
        update.validate().map_err(UpstreamError::InvalidRequest)?;

        self.repository()?.update(id, &update).await
    }

    async fn delete(&self, id: i64) -> UpstreamResult<()> {
        Self::validate_id(id).map_err(UpstreamError::InvalidRequest)?;
        self.repository()?.delete(id).await?;
        tracing::info!("Deleted inventory item {}", id);
        Ok(())
    }

    async fn search(&self, query: &str, limit: Option<usize>) -> UpstreamResult<Vec<CardMatch>> {
        Self::validate_search_query(query).map_err(UpstreamError::InvalidRequest)?;

        let items = self.repository()?.list(SEARCH_SCAN_LIMIT, 0).await?;
        let mut matcher = self.matcher.lock().await;
        Ok(matcher.find_matches(query, &items, Self::page_size(limit), MIN_SEARCH_SCORE))
    }

    async fn publish(&self, id: i64) -> UpstreamResult<InventoryItem> {
        Self::validate_id(id).map_err(UpstreamError::InvalidRequest)?;

        let repository = self.repository()?;
        let publisher = self.publisher()?;

        let item = repository.get(id).await?;
        if item.shopify_product_id.is_some() {
            tracing::debug!("Inventory item {} is already published", id);
            return Ok(item);
        }

        let product_id = publisher.publish(&item).await?;
        let update = InventoryUpdate {
            shopify_product_id: Some(product_id),
            ..Default::default()
        };
        repository.update(id, &update).await
    }
}
