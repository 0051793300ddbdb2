use crate::error::UpstreamResult;
use crate::models::{InventoryItem, InventoryUpdate, NewInventoryItem};
use async_trait::async_trait;

/// Repository for the shop's card inventory.
///
/// Provides abstraction over inventory storage so services can be tested
/// against an in-memory implementation.
#[async_trait]
pub trait InventoryRepository: Send + Sync {
    /// Retrieve items, newest first, with pagination.
    async fn list(&self, limit: usize, offset: usize) -> UpstreamResult<Vec<InventoryItem>>;

    /// Retrieve a single item by ID.
    async fn get(&self, id: i64) -> UpstreamResult<InventoryItem>;

    /// Insert a new item and return the stored row.
    async fn create(&self, item: &NewInventoryItem) -> UpstreamResult<InventoryItem>;

    /// Apply a partial update and return the stored row.
    async fn update(&self, id: i64, update: &InventoryUpdate) -> UpstreamResult<InventoryItem>;

    /// Delete an item.
    async fn delete(&self, id: i64) -> UpstreamResult<()>;
}

/// Publishes inventory items as storefront listings.
#[async_trait]
pub trait ListingPublisher: Send + Sync {
    /// Create a listing for the item and return the storefront product ID.
    async fn publish(&self, item: &InventoryItem) -> UpstreamResult<String>;
}
