use async_trait::async_trait;
use card_tradein_server::error::{UpstreamError, UpstreamResult};
use card_tradein_server::models::{InventoryItem, InventoryUpdate, NewInventoryItem};
use card_tradein_server::repositories::InventoryRepository;
use chrono::Utc;
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

/// Mock inventory repository for testing.
///
/// Provides an in-memory implementation of InventoryRepository that can be
/// seeded with test data and tracks method calls for verification.
#[allow(dead_code)]
#[derive(Clone)]
pub struct MockInventoryRepository {
    items: Arc<Mutex<BTreeMap<i64, InventoryItem>>>,
    next_id: Arc<Mutex<i64>>,
    call_counts: Arc<Mutex<BTreeMap<String, usize>>>,
}

#[allow(dead_code)]
impl MockInventoryRepository {
    pub fn new() -> Self {
        Self {
            items: Arc::new(Mutex::new(BTreeMap::new())),
            next_id: Arc::new(Mutex::new(1)),
            call_counts: Arc::new(Mutex::new(BTreeMap::new())),
        }
    }

    /// Add an item with its own id.
    pub fn add_item(&self, item: InventoryItem) {
        let mut next_id = self.next_id.lock().unwrap();
        *next_id = (*next_id).max(item.id + 1);
        self.items.lock().unwrap().insert(item.id, item);
    }

    pub fn item(&self, id: i64) -> Option<InventoryItem> {
        self.items.lock().unwrap().get(&id).cloned()
    }

    pub fn len(&self) -> usize {
        self.items.lock().unwrap().len()
    }

    /// Get the number of times a method was called.
    pub fn get_call_count(&self, method: &str) -> usize {
        let counts = self.call_counts.lock().unwrap();
        *counts.get(method).unwrap_or(&0)
    }

    fn track_call(&self, method: &str) {
        let mut counts = self.call_counts.lock().unwrap();
        *counts.entry(method.to_string()).or_insert(0) += 1;
    }

    fn not_found(id: i64) -> UpstreamError {
        UpstreamError::NotFound(format!("inventory item {}", id))
    }
}

impl Default for MockInventoryRepository {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl InventoryRepository for MockInventoryRepository {
    async fn list(&self, limit: usize, offset: usize) -> UpstreamResult<Vec<InventoryItem>> {
        self.track_call("list");

        let items = self.items.lock().unwrap();
        // newest first, like the database ordering
        Ok(items
            .values()
            .rev()
            .skip(offset)
            .take(limit)
            .cloned()
            .collect())
    }

    async fn get(&self, id: i64) -> UpstreamResult<InventoryItem> {
        self.track_call("get");
        self.item(id).ok_or_else(|| Self::not_found(id))
    }

    async fn create(&self, item: &NewInventoryItem) -> UpstreamResult<InventoryItem> {
        self.track_call("create");

        let id = {
            let mut next_id = self.next_id.lock().unwrap();
            let id = *next_id;
            *next_id += 1;
            id
        };
        let now = Utc::now();
        let stored = InventoryItem {
            id,
            card_name: item.card_name.trim().to_string(),
            set_name: item.set_name.clone(),
            card_number: item.card_number.clone(),
            condition: item.condition.clone(),
            grade: item.grade.clone(),
            quantity: item.quantity,
            purchase_price: item.purchase_price,
            market_price: item.market_price,
            list_price: item.list_price,
            notes: item.notes.clone(),
            shopify_product_id: None,
            created_at: Some(now),
            updated_at: Some(now),
        };
        self.items.lock().unwrap().insert(id, stored.clone());
        Ok(stored)
    }

    async fn update(&self, id: i64, update: &InventoryUpdate) -> UpstreamResult<InventoryItem> {
        self.track_call("update");

        let mut items = self.items.lock().unwrap();
        let item = items.get_mut(&id).ok_or_else(|| Self::not_found(id))?;

        if let Some(v) = &update.card_name {
            item.card_name = v.trim().to_string();
        }
        if let Some(v) = &update.set_name {
            item.set_name = Some(v.clone());
        }
        if let Some(v) = &update.card_number {
            item.card_number = Some(v.clone());
        }
        if let Some(v) = &update.condition {
            item.condition = Some(v.clone());
        }
        if let Some(v) = &update.grade {
            item.grade = Some(v.clone());
        }
        if let Some(v) = update.quantity {
            item.quantity = v;
        }
        if let Some(v) = update.purchase_price {
            item.purchase_price = Some(v);
        }
        if let Some(v) = update.market_price {
            item.market_price = Some(v);
        }
        if let Some(v) = update.list_price {
            item.list_price = Some(v);
        }
        if let Some(v) = &update.notes {
            item.notes = Some(v.clone());
        }
        if let Some(v) = &update.shopify_product_id {
            item.shopify_product_id = Some(v.clone());
        }
        item.updated_at = Some(Utc::now());

        Ok(item.clone())
    }

    async fn delete(&self, id: i64) -> UpstreamResult<()> {
        self.track_call("delete");

        self.items
            .lock()
            .unwrap()
            .remove(&id)
            .map(|_| ())
            .ok_or_else(|| Self::not_found(id))
    }
}
