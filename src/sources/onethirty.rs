//! 130point sold-listing search.
//!
//! 130point answers a form POST with an HTML fragment holding one `<tr>` per
//! sale. The row carries its price in a `data-price` attribute; the title and
//! date live in elements with the ids `titleText` and `dateText`.

use crate::client::{join_url, AsyncUpstreamClient, UpstreamRequest};
use crate::error::UpstreamResult;
use crate::models::{Sale, SalesQuery};
use crate::sources::{clean_text, parse_price, usable, SalesSource};
use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::Regex;
use std::sync::Arc;

static ROW_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?s)<tr[^>]*\bid=["']dRow["'][^>]*>(.*?)</tr>"#)
        .expect("Failed to compile 130point row regex")
});

static ROW_PRICE_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"<tr[^>]*\bdata-price=["']([^"']+)["']"#)
        .expect("Failed to compile 130point price regex")
});

static TITLE_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?s)\bid=["']titleText["'][^>]*>(.*?)</a>"#)
        .expect("Failed to compile 130point title regex")
});

static DATE_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?s)\bid=["']dateText["'][^>]*>(.*?)</span>"#)
        .expect("Failed to compile 130point date regex")
});

pub struct OneThirtyPointSource {
    client: Arc<dyn AsyncUpstreamClient>,
    base_url: String,
}

impl OneThirtyPointSource {
    pub fn new(client: Arc<dyn AsyncUpstreamClient>, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into(),
        }
    }
}

#[async_trait]
impl SalesSource for OneThirtyPointSource {
    fn name(&self) -> &'static str {
        "130point"
    }

    fn search_text(&self, query: &SalesQuery) -> String {
        query.graded_search_text()
    }

    async fn fetch_sales(&self, query: &SalesQuery) -> UpstreamResult<Vec<Sale>> {
        let request = UpstreamRequest::post_form(
            join_url(&self.base_url, "/sales/"),
            vec![
                ("query".to_string(), self.search_text(query)),
                ("type".to_string(), "2".to_string()),
                ("subcat".to_string(), "-1".to_string()),
            ],
        );

        let html = self.client.execute(request).await?;
        let sales = usable(parse_sales_html(&html));
        tracing::debug!("130point returned {} usable sales", sales.len());
        Ok(sales)
    }
}

/// Extract every sale row from a 130point results fragment.
pub fn parse_sales_html(html: &str) -> Vec<Sale> {
    let mut sales = Vec::new();

    for row in ROW_REGEX.captures_iter(html) {
        let (Some(whole), Some(body)) = (row.get(0), row.get(1)) else {
            continue;
        };

        let price = ROW_PRICE_REGEX
            .captures(whole.as_str())
            .and_then(|c| c.get(1))
            .and_then(|m| parse_price(m.as_str()));
        let Some(price) = price else {
            continue;
        };

        let title = TITLE_REGEX
            .captures(body.as_str())
            .and_then(|c| c.get(1))
            .map(|m| clean_text(m.as_str()))
            .unwrap_or_default();

        let date = DATE_REGEX
            .captures(body.as_str())
            .and_then(|c| c.get(1))
            .map(|m| clean_text(m.as_str()))
            .map(|d| d.trim_start_matches("Date:").trim().to_string())
            .unwrap_or_default();

        sales.push(Sale::new(price, title, date));
    }

    sales
}
