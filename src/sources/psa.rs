//! PSA auction prices and certificate lookup.
//!
//! The auction-prices search page lists recent sales as a results table whose
//! body rows hold four cells: sale date, item title, grade and price. The cert
//! lookup goes through the PSA public API instead and needs a bearer token.

use crate::client::{join_url, AsyncUpstreamClient, UpstreamRequest};
use crate::error::{UpstreamError, UpstreamResult};
use crate::models::{PsaCert, Sale, SalesQuery};
use crate::sources::{clean_text, grade_matches, parse_price, usable, SalesSource};
use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Deserialize;
use std::sync::Arc;

static ROW_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)<tr[^>]*>(.*?)</tr>").expect("Failed to compile PSA row regex"));

static CELL_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)<td[^>]*>(.*?)</td>").expect("Failed to compile PSA cell regex"));

const MAX_CERT_DIGITS: usize = 12;

/// One parsed row of the auction-prices table.
#[derive(Debug, Clone, PartialEq)]
pub struct AuctionRow {
    pub date: String,
    pub title: String,
    pub grade: String,
    pub price: f64,
}

pub struct PsaAuctionSource {
    client: Arc<dyn AsyncUpstreamClient>,
    base_url: String,
}

impl PsaAuctionSource {
    pub fn new(client: Arc<dyn AsyncUpstreamClient>, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into(),
        }
    }
}

#[async_trait]
impl SalesSource for PsaAuctionSource {
    fn name(&self) -> &'static str {
        "psa"
    }

    /// The page search only takes the card; the grade is applied to the rows.
    fn search_text(&self, query: &SalesQuery) -> String {
        query.card.trim().to_string()
    }

    async fn fetch_sales(&self, query: &SalesQuery) -> UpstreamResult<Vec<Sale>> {
        let url = format!(
            "{}?q={}",
            join_url(&self.base_url, "/auctionprices/search"),
            urlencoding::encode(&self.search_text(query))
        );

        let html = self.client.execute(UpstreamRequest::get(url)).await?;
        let rows = parse_auction_rows(&html);
        let total = rows.len();

        let sales: Vec<Sale> = rows
            .into_iter()
            .filter(|row| match query.grade.as_deref() {
                Some(wanted) => grade_matches(&row.grade, wanted),
                None => true,
            })
            .map(|row| Sale::new(row.price, row.title, row.date))
            .collect();

        tracing::debug!(
            "PSA returned {} rows, {} for requested grade",
            total,
            sales.len()
        );
        Ok(usable(sales))
    }
}

/// Extract auction rows. Header rows and rows without a readable price are skipped.
pub fn parse_auction_rows(html: &str) -> Vec<AuctionRow> {
    ROW_REGEX
        .captures_iter(html)
        .filter_map(|row| {
            let body = row.get(1)?.as_str();
            let cells: Vec<String> = CELL_REGEX
                .captures_iter(body)
                .filter_map(|c| c.get(1).map(|m| clean_text(m.as_str())))
                .collect();

            if cells.len() < 4 {
                return None;
            }

            Some(AuctionRow {
                date: cells[0].clone(),
                title: cells[1].clone(),
                grade: cells[2].clone(),
                price: parse_price(&cells[3])?,
            })
        })
        .collect()
}

#[derive(Debug, Deserialize)]
struct CertResponse {
    #[serde(rename = "PSACert")]
    psa_cert: Option<PsaCert>,
}

/// PSA public API client for certificate verification.
pub struct PsaCertClient {
    client: Arc<dyn AsyncUpstreamClient>,
    api_base_url: String,
    token: Option<String>,
}

impl PsaCertClient {
    pub fn new(
        client: Arc<dyn AsyncUpstreamClient>,
        api_base_url: impl Into<String>,
        token: Option<String>,
    ) -> Self {
        Self {
            client,
            api_base_url: api_base_url.into(),
            token,
        }
    }

    /// Look up a certificate by number.
    pub async fn lookup(&self, cert_number: &str) -> UpstreamResult<PsaCert> {
        let cert_number = cert_number.trim();
        validate_cert_number(cert_number)?;

        let token = self
            .token
            .as_deref()
            .ok_or_else(|| UpstreamError::NotConfigured("PSA API".to_string()))?;

        let request = UpstreamRequest::get(join_url(
            &self.api_base_url,
            &format!("/cert/GetByCertNumber/{}", cert_number),
        ))
        .bearer(token);

        let body = self.client.execute(request).await?;
        let response: CertResponse = serde_json::from_str(&body)?;

        match response.psa_cert {
            Some(cert) if !cert.cert_number.is_empty() => Ok(cert),
            _ => Err(UpstreamError::NotFound(format!("PSA cert {}", cert_number))),
        }
    }
}

fn validate_cert_number(cert_number: &str) -> UpstreamResult<()> {
    if cert_number.is_empty()
        || cert_number.len() > MAX_CERT_DIGITS
        || !cert_number.chars().all(|c| c.is_ascii_digit())
    {
        return Err(UpstreamError::InvalidRequest(format!(
            "Cert number must be 1-{} digits",
            MAX_CERT_DIGITS
        )));
    }
    Ok(())
}
