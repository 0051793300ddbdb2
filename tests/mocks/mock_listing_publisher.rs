use async_trait::async_trait;
use card_tradein_server::error::{UpstreamError, UpstreamResult};
use card_tradein_server::models::InventoryItem;
use card_tradein_server::repositories::ListingPublisher;
use std::sync::{Arc, Mutex};

/// Mock storefront publisher that records what it was asked to publish.
#[allow(dead_code)]
#[derive(Clone, Default)]
pub struct MockListingPublisher {
    published: Arc<Mutex<Vec<i64>>>,
    fail: bool,
}

#[allow(dead_code)]
impl MockListingPublisher {
    pub fn new() -> Self {
        Self::default()
    }

    /// A publisher whose every call fails like an unreachable store.
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    pub fn published_ids(&self) -> Vec<i64> {
        self.published.lock().unwrap().clone()
    }
}

#[async_trait]
impl ListingPublisher for MockListingPublisher {
    async fn publish(&self, item: &InventoryItem) -> UpstreamResult<String> {
        if self.fail {
            return Err(UpstreamError::HttpError("Connection failed".to_string()));
        }
        self.published.lock().unwrap().push(item.id);
        Ok(format!("{}", 9_000_000 + item.id))
    }
}
