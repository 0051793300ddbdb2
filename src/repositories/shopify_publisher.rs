use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;

use crate::client::{join_url, AsyncUpstreamClient, UpstreamRequest};
use crate::error::{UpstreamError, UpstreamResult};
use crate::models::InventoryItem;
use crate::repositories::traits::ListingPublisher;

const API_VERSION: &str = "2024-01";
const PRODUCT_TYPE: &str = "Trading Card";

#[derive(Debug, Deserialize)]
struct ProductEnvelope {
    product: CreatedProduct,
}

#[derive(Debug, Deserialize)]
struct CreatedProduct {
    id: u64,
}

/// Creates storefront products through the Shopify Admin REST API.
pub struct ShopifyPublisher {
    client: Arc<dyn AsyncUpstreamClient>,
    store_url: String,
    access_token: String,
}

impl ShopifyPublisher {
    pub fn new(
        client: Arc<dyn AsyncUpstreamClient>,
        store_url: impl Into<String>,
        access_token: impl Into<String>,
    ) -> Self {
        Self {
            client,
            store_url: store_url.into(),
            access_token: access_token.into(),
        }
    }
}

/// Listing title: name followed by whichever of set, number and grade are known.
pub fn listing_title(item: &InventoryItem) -> String {
    let mut title = item.card_name.trim().to_string();
    if let Some(set) = item.set_name.as_deref().filter(|s| !s.trim().is_empty()) {
        title.push_str(" - ");
        title.push_str(set.trim());
    }
    if let Some(number) = item.card_number.as_deref().filter(|s| !s.trim().is_empty()) {
        title.push_str(&format!(" #{}", number.trim()));
    }
    if let Some(grade) = item.grade.as_deref().filter(|s| !s.trim().is_empty()) {
        title.push_str(&format!(" ({})", grade.trim()));
    }
    title
}

/// Product payload for the Admin API. Needs a list or market price.
pub fn product_payload(item: &InventoryItem) -> UpstreamResult<Value> {
    let price = item.list_price.or(item.market_price).ok_or_else(|| {
        UpstreamError::InvalidRequest(format!(
            "Inventory item {} has no list or market price",
            item.id
        ))
    })?;

    let tags: Vec<&str> = [item.set_name.as_deref(), item.condition.as_deref(), item.grade.as_deref()]
        .into_iter()
        .flatten()
        .filter(|t| !t.trim().is_empty())
        .collect();

    Ok(json!({
        "product": {
            "title": listing_title(item),
            "body_html": item.notes.clone().unwrap_or_default(),
            "product_type": PRODUCT_TYPE,
            "tags": tags.join(", "),
            "status": "active",
            "variants": [{
                "price": format!("{:.2}", price),
                "sku": format!("INV-{}", item.id),
                "inventory_management": "shopify",
                "inventory_quantity": item.quantity,
            }],
        }
    }))
}

#[async_trait]
impl ListingPublisher for ShopifyPublisher {
    async fn publish(&self, item: &InventoryItem) -> UpstreamResult<String> {
        let url = join_url(
            &self.store_url,
            &format!("/admin/api/{}/products.json", API_VERSION),
        );
        let request = UpstreamRequest::post_json(url, product_payload(item)?)
            .header("X-Shopify-Access-Token", self.access_token.clone());

        let body = self.client.execute(request).await?;
        let envelope: ProductEnvelope = serde_json::from_str(&body)?;

        tracing::info!(
            "Published inventory item {} as Shopify product {}",
            item.id,
            envelope.product.id
        );
        Ok(envelope.product.id.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item() -> InventoryItem {
        InventoryItem {
            id: 12,
            card_name: "Charizard".to_string(),
            set_name: Some("Base Set".to_string()),
            card_number: Some("4/102".to_string()),
            condition: Some("Near Mint".to_string()),
            grade: Some("PSA 9".to_string()),
            quantity: 1,
            market_price: Some(1050.0),
            ..Default::default()
        }
    }

    #[test]
    fn test_listing_title() {
        assert_eq!(listing_title(&item()), "Charizard - Base Set #4/102 (PSA 9)");

        let bare = InventoryItem {
            card_name: "Pikachu".to_string(),
            ..Default::default()
        };
        assert_eq!(listing_title(&bare), "Pikachu");
    }

    #[test]
    fn test_payload_prefers_list_price() {
        let mut with_list = item();
        with_list.list_price = Some(1199.0);

        let payload = product_payload(&with_list).unwrap();
        assert_eq!(payload["product"]["variants"][0]["price"], "1199.00");
        assert_eq!(payload["product"]["variants"][0]["sku"], "INV-12");
        assert_eq!(payload["product"]["tags"], "Base Set, Near Mint, PSA 9");

        let payload = product_payload(&item()).unwrap();
        assert_eq!(payload["product"]["variants"][0]["price"], "1050.00");
    }

    #[test]
    fn test_payload_requires_price() {
        let mut unpriced = item();
        unpriced.market_price = None;
        assert!(matches!(
            product_payload(&unpriced),
            Err(UpstreamError::InvalidRequest(_))
        ));
    }
}
