//! Trade-in quote request and response.

use serde::{Deserialize, Serialize};

fn default_quantity() -> u32 {
    1
}

/// One card (or stack of identical cards) a customer brings in.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TradeLine {
    pub name: String,
    /// Market price of a single copy
    pub market_price: f64,
    #[serde(default = "default_quantity")]
    pub quantity: u32,
}

/// Body of `POST /api/trade/quote`.
///
/// Percentages override the shop defaults for this quote only.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct TradeQuoteRequest {
    pub items: Vec<TradeLine>,
    #[serde(default)]
    pub cash_percentage: Option<f64>,
    #[serde(default)]
    pub credit_percentage: Option<f64>,
}

/// Offer for one line; values cover the whole quantity.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TradeLineQuote {
    pub name: String,
    pub quantity: u32,
    pub market_price: f64,
    pub market_total: f64,
    pub cash_value: f64,
    pub credit_value: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TradeQuote {
    pub items: Vec<TradeLineQuote>,
    pub cash_percentage: f64,
    pub credit_percentage: f64,
    pub total_market: f64,
    pub total_cash: f64,
    pub total_credit: f64,
}
