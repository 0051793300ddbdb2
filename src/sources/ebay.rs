//! eBay Browse API item search.

use crate::client::{join_url, AsyncUpstreamClient, UpstreamRequest};
use crate::error::{UpstreamError, UpstreamResult};
use crate::models::{Sale, SalesQuery};
use crate::sources::{usable, SalesSource};
use async_trait::async_trait;
use serde::Deserialize;
use std::sync::Arc;

const SEARCH_PATH: &str = "/buy/browse/v1/item_summary/search";
const SEARCH_LIMIT: &str = "50";
const MARKETPLACE: &str = "EBAY_US";

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SearchResponse {
    #[serde(default)]
    item_summaries: Vec<ItemSummary>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ItemSummary {
    #[serde(default)]
    title: String,
    price: Option<Amount>,
    item_end_date: Option<String>,
    item_creation_date: Option<String>,
}

/// eBay sends amounts as strings; accept numbers too.
#[derive(Debug, Deserialize)]
struct Amount {
    value: serde_json::Value,
}

impl Amount {
    fn as_f64(&self) -> Option<f64> {
        match &self.value {
            serde_json::Value::Number(n) => n.as_f64(),
            serde_json::Value::String(s) => s.trim().parse().ok(),
            _ => None,
        }
    }
}

pub struct EbaySource {
    client: Arc<dyn AsyncUpstreamClient>,
    base_url: String,
    token: Option<String>,
}

impl EbaySource {
    pub fn new(
        client: Arc<dyn AsyncUpstreamClient>,
        base_url: impl Into<String>,
        token: Option<String>,
    ) -> Self {
        Self {
            client,
            base_url: base_url.into(),
            token,
        }
    }
}

#[async_trait]
impl SalesSource for EbaySource {
    fn name(&self) -> &'static str {
        "ebay"
    }

    fn search_text(&self, query: &SalesQuery) -> String {
        query.graded_search_text()
    }

    async fn fetch_sales(&self, query: &SalesQuery) -> UpstreamResult<Vec<Sale>> {
        let token = self
            .token
            .as_deref()
            .ok_or_else(|| UpstreamError::NotConfigured("eBay".to_string()))?;

        let request = UpstreamRequest::get(join_url(&self.base_url, SEARCH_PATH))
            .query("q", self.search_text(query))
            .query("limit", SEARCH_LIMIT)
            .bearer(token)
            .header("X-EBAY-C-MARKETPLACE-ID", MARKETPLACE);

        let body = self.client.execute(request).await?;
        parse_search_response(&body)
    }
}

/// Turn a Browse search response into sales.
pub fn parse_search_response(body: &str) -> UpstreamResult<Vec<Sale>> {
    let response: SearchResponse = serde_json::from_str(body)?;

    let sales = response
        .item_summaries
        .into_iter()
        .filter_map(|item| {
            let price = item.price.as_ref().and_then(Amount::as_f64)?;
            let date = item
                .item_end_date
                .or(item.item_creation_date)
                .unwrap_or_default();
            Some(Sale::new(price, item.title, date))
        })
        .collect();

    Ok(usable(sales))
}
