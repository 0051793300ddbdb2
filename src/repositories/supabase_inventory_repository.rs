use async_trait::async_trait;
use chrono::Utc;
use std::sync::Arc;

use crate::client::{join_url, AsyncUpstreamClient, UpstreamRequest};
use crate::error::{UpstreamError, UpstreamResult};
use crate::models::{InventoryItem, InventoryUpdate, NewInventoryItem};
use crate::repositories::traits::InventoryRepository;

const TABLE_PATH: &str = "/rest/v1/inventory";

/// Inventory repository backed by the Supabase PostgREST API.
///
/// Every call authenticates with the service key both as `apikey` and as a
/// bearer token. Writes ask for `return=representation` so the stored row
/// comes back in the response.
pub struct SupabaseInventoryRepository {
    client: Arc<dyn AsyncUpstreamClient>,
    table_url: String,
    service_key: String,
}

impl SupabaseInventoryRepository {
    pub fn new(
        client: Arc<dyn AsyncUpstreamClient>,
        base_url: &str,
        service_key: impl Into<String>,
    ) -> Self {
        Self {
            client,
            table_url: join_url(base_url, TABLE_PATH),
            service_key: service_key.into(),
        }
    }

    fn authorized(&self, request: UpstreamRequest) -> UpstreamRequest {
        request
            .header("apikey", self.service_key.clone())
            .bearer(&self.service_key)
    }

    fn row_filter(request: UpstreamRequest, id: i64) -> UpstreamRequest {
        request.query("id", format!("eq.{}", id))
    }

    /// Execute a request whose response is a JSON array of rows.
    async fn fetch_rows(&self, request: UpstreamRequest) -> UpstreamResult<Vec<InventoryItem>> {
        let body = self.client.execute(self.authorized(request)).await?;
        if body.trim().is_empty() {
            return Ok(Vec::new());
        }
        Ok(serde_json::from_str(&body)?)
    }

    async fn fetch_one(&self, request: UpstreamRequest, id: i64) -> UpstreamResult<InventoryItem> {
        self.fetch_rows(request)
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| UpstreamError::NotFound(format!("inventory item {}", id)))
    }
}

#[async_trait]
impl InventoryRepository for SupabaseInventoryRepository {
    async fn list(&self, limit: usize, offset: usize) -> UpstreamResult<Vec<InventoryItem>> {
        let request = UpstreamRequest::get(self.table_url.clone())
            .query("select", "*")
            .query("order", "created_at.desc")
            .query("limit", limit.to_string())
            .query("offset", offset.to_string());
        self.fetch_rows(request).await
    }

    async fn get(&self, id: i64) -> UpstreamResult<InventoryItem> {
        let request = Self::row_filter(UpstreamRequest::get(self.table_url.clone()), id)
            .query("select", "*");
        self.fetch_one(request, id).await
    }

    async fn create(&self, item: &NewInventoryItem) -> UpstreamResult<InventoryItem> {
        let request = UpstreamRequest::post_json(self.table_url.clone(), item.to_row(Utc::now()))
            .header("Prefer", "return=representation");

        self.fetch_rows(request)
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| UpstreamError::Parse("insert returned no row".to_string()))
    }

    async fn update(&self, id: i64, update: &InventoryUpdate) -> UpstreamResult<InventoryItem> {
        let request = Self::row_filter(
            UpstreamRequest::patch_json(self.table_url.clone(), update.to_row(Utc::now())),
            id,
        )
        .header("Prefer", "return=representation");
        self.fetch_one(request, id).await
    }

    async fn delete(&self, id: i64) -> UpstreamResult<()> {
        let request = Self::row_filter(UpstreamRequest::delete(self.table_url.clone()), id)
            .header("Prefer", "return=representation");
        self.fetch_one(request, id).await.map(|_| ())
    }
}
