//! Upstream sales sources.
//!
//! Each source knows how to turn a [`SalesQuery`] into an upstream request and
//! how to pull individual sales back out of the response, whether that is a
//! scraped HTML page or a JSON API.

pub mod ebay;
pub mod onethirty;
pub mod psa;
pub mod tcgplayer;

pub use ebay::EbaySource;
pub use onethirty::OneThirtyPointSource;
pub use psa::{PsaAuctionSource, PsaCertClient};
pub use tcgplayer::{TcgPlayerCatalog, TcgPlayerSource};

use crate::error::UpstreamResult;
use crate::models::sale::normalize;
use crate::models::{Sale, SalesQuery};
use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::Regex;

/// A place sold-listing prices can be fetched from.
#[async_trait]
pub trait SalesSource: Send + Sync {
    /// Short name used in logs and cache sweeper names.
    fn name(&self) -> &'static str;

    /// The search text sent upstream; echoed back as `PriceSummary::query`.
    fn search_text(&self, query: &SalesQuery) -> String;

    /// Key under which results for `query` are cached.
    fn cache_key(&self, query: &SalesQuery) -> String {
        query.cache_key()
    }

    /// Fetch and extract sales. Unusable prices are already dropped.
    async fn fetch_sales(&self, query: &SalesQuery) -> UpstreamResult<Vec<Sale>>;
}

static HTML_TAG_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"<[^>]*>").expect("Failed to compile HTML tag regex"));

static PRICE_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"-?\d[\d,]*(?:\.\d+)?").expect("Failed to compile price regex"));

static GRADE_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\d+(?:\.\d+)?").expect("Failed to compile grade regex"));

/// Parse a displayed price such as `"$1,234.56"` or `"USD 12"`.
pub fn parse_price(text: &str) -> Option<f64> {
    let raw = PRICE_REGEX.find(text)?.as_str().replace(',', "");
    raw.parse::<f64>().ok()
}

/// Strip tags, decode the common entities and collapse whitespace.
pub fn clean_text(html: &str) -> String {
    let text = HTML_TAG_REGEX.replace_all(html, " ");
    let decoded = text
        .replace("&nbsp;", " ")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&#039;", "'")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&amp;", "&");
    decoded.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Numeric part of a grade label: `"GEM MT 10"` and `"PSA 10"` both give `"10"`.
pub fn grade_number(label: &str) -> Option<&str> {
    GRADE_REGEX.find_iter(label).last().map(|m| m.as_str())
}

/// Whether a row's grade label satisfies the requested grade.
pub fn grade_matches(label: &str, wanted: &str) -> bool {
    match (grade_number(label), grade_number(wanted)) {
        (Some(have), Some(want)) => {
            match (have.parse::<f64>(), want.parse::<f64>()) {
                (Ok(a), Ok(b)) => (a - b).abs() < f64::EPSILON,
                _ => have == want,
            }
        }
        _ => normalize(label).contains(&normalize(wanted)),
    }
}

/// Keep only sales whose price can be averaged.
pub(crate) fn usable(sales: Vec<Sale>) -> Vec<Sale> {
    sales.into_iter().filter(Sale::has_usable_price).collect()
}
