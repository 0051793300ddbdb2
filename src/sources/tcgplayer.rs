//! TCGPlayer latest sales and catalog search.
//!
//! Both endpoints are the JSON APIs behind the TCGPlayer marketplace site.
//! Latest sales are keyed by numeric product id, so for this source
//! `SalesQuery::card` holds the id.

use crate::client::{join_url, AsyncUpstreamClient, UpstreamRequest};
use crate::error::{UpstreamError, UpstreamResult};
use crate::models::sale::normalize;
use crate::models::{CardProduct, Sale, SalesQuery};
use crate::sources::{usable, SalesSource};
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;

const LATEST_SALES_LIMIT: usize = 25;

/// Upper bound on catalog search page size.
pub const MAX_SEARCH_RESULTS: usize = 50;

#[derive(Debug, Deserialize)]
struct LatestSalesResponse {
    #[serde(default)]
    data: Vec<LatestSale>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LatestSale {
    #[serde(default)]
    title: String,
    #[serde(default)]
    condition: String,
    purchase_price: Option<f64>,
    #[serde(default)]
    order_date: String,
}

pub struct TcgPlayerSource {
    client: Arc<dyn AsyncUpstreamClient>,
    base_url: String,
}

impl TcgPlayerSource {
    pub fn new(client: Arc<dyn AsyncUpstreamClient>, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into(),
        }
    }
}

/// Parse a product id, rejecting anything that is not a positive integer.
pub fn parse_product_id(raw: &str) -> UpstreamResult<u64> {
    match raw.trim().parse::<u64>() {
        Ok(id) if id > 0 => Ok(id),
        _ => Err(UpstreamError::InvalidRequest(format!(
            "productId must be a positive integer, got \"{}\"",
            raw.trim()
        ))),
    }
}

#[async_trait]
impl SalesSource for TcgPlayerSource {
    fn name(&self) -> &'static str {
        "tcgplayer"
    }

    fn search_text(&self, query: &SalesQuery) -> String {
        match query.condition.as_deref() {
            Some(condition) => format!("{} {}", query.card.trim(), condition.trim()),
            None => query.card.trim().to_string(),
        }
    }

    async fn fetch_sales(&self, query: &SalesQuery) -> UpstreamResult<Vec<Sale>> {
        let product_id = parse_product_id(&query.card)?;

        let request = UpstreamRequest::post_json(
            join_url(
                &self.base_url,
                &format!("/v2/product/{}/latestsales", product_id),
            ),
            json!({
                "conditions": [],
                "languages": [],
                "variants": [],
                "listingType": "All",
                "limit": LATEST_SALES_LIMIT,
            }),
        );

        let body = self.client.execute(request).await?;
        parse_latest_sales(&body, query.condition.as_deref())
    }
}

/// Extract sales, keeping only the requested condition when one is given.
pub fn parse_latest_sales(body: &str, condition: Option<&str>) -> UpstreamResult<Vec<Sale>> {
    let response: LatestSalesResponse = serde_json::from_str(body)?;
    let wanted = condition.map(normalize);

    let sales = response
        .data
        .into_iter()
        .filter(|sale| match &wanted {
            Some(wanted) => normalize(&sale.condition) == *wanted,
            None => true,
        })
        .filter_map(|sale| {
            Some(Sale::new(
                sale.purchase_price?,
                sale.title,
                sale.order_date,
            ))
        })
        .collect();

    Ok(usable(sales))
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    results: Vec<SearchResultPage>,
}

#[derive(Debug, Deserialize)]
struct SearchResultPage {
    #[serde(default)]
    results: Vec<SearchHit>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SearchHit {
    /// Sent as a float by the search API
    product_id: f64,
    #[serde(default)]
    product_name: String,
    set_name: Option<String>,
    product_line_name: Option<String>,
    rarity_name: Option<String>,
    market_price: Option<f64>,
    custom_attributes: Option<CustomAttributes>,
}

#[derive(Debug, Deserialize)]
struct CustomAttributes {
    number: Option<String>,
}

/// Product search against the marketplace search API.
pub struct TcgPlayerCatalog {
    client: Arc<dyn AsyncUpstreamClient>,
    search_url: String,
}

impl TcgPlayerCatalog {
    pub fn new(client: Arc<dyn AsyncUpstreamClient>, search_url: impl Into<String>) -> Self {
        Self {
            client,
            search_url: search_url.into(),
        }
    }

    /// Search products by name.
    pub async fn search(&self, query: &str, limit: usize) -> UpstreamResult<Vec<CardProduct>> {
        let query = query.trim();
        if query.is_empty() {
            return Err(UpstreamError::InvalidRequest(
                "Search query cannot be empty".to_string(),
            ));
        }
        let limit = limit.clamp(1, MAX_SEARCH_RESULTS);

        let url = format!(
            "{}?q={}&isList=false",
            join_url(&self.search_url, "/v1/search/request"),
            urlencoding::encode(query)
        );
        let request = UpstreamRequest::post_json(
            url,
            json!({
                "algorithm": "sales_synonym_v2",
                "from": 0,
                "size": limit,
                "filters": { "term": {}, "range": {}, "match": {} },
                "context": { "shippingCountry": "US" },
                "sort": {},
            }),
        );

        let body = self.client.execute(request).await?;
        let mut products = parse_search_results(&body)?;
        products.truncate(limit);
        Ok(products)
    }
}

/// Flatten the search API's nested result pages into products.
pub fn parse_search_results(body: &str) -> UpstreamResult<Vec<CardProduct>> {
    let response: SearchResponse = serde_json::from_str(body)?;

    let products = response
        .results
        .into_iter()
        .next()
        .map(|page| page.results)
        .unwrap_or_default()
        .into_iter()
        .filter(|hit| hit.product_id.is_finite() && hit.product_id >= 1.0)
        .map(|hit| {
            let product_id = hit.product_id as u64;
            CardProduct {
                product_id,
                name: hit.product_name,
                set_name: hit.set_name,
                product_line: hit.product_line_name,
                rarity: hit.rarity_name,
                number: hit.custom_attributes.and_then(|a| a.number),
                market_price: hit.market_price,
                image_url: CardProduct::image_url_for(product_id),
            }
        })
        .collect();

    Ok(products)
}
