//! Cash and store-credit offers for a trade-in.

use crate::error::{PricingError, PricingResult};
use crate::models::{TradeLine, TradeLineQuote, TradeQuote};
use crate::pricing::round_cents;

/// Shop-wide default offer percentages.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TradeRates {
    pub cash_percentage: f64,
    pub credit_percentage: f64,
}

impl TradeRates {
    pub fn new(cash_percentage: f64, credit_percentage: f64) -> Self {
        Self {
            cash_percentage,
            credit_percentage,
        }
    }

    /// Apply per-request overrides.
    pub fn with_overrides(self, cash: Option<f64>, credit: Option<f64>) -> Self {
        Self {
            cash_percentage: cash.unwrap_or(self.cash_percentage),
            credit_percentage: credit.unwrap_or(self.credit_percentage),
        }
    }

    fn validate(&self) -> PricingResult<()> {
        for (name, value) in [
            ("cashPercentage", self.cash_percentage),
            ("creditPercentage", self.credit_percentage),
        ] {
            if !value.is_finite() || !(0.0..=100.0).contains(&value) {
                return Err(PricingError::InvalidInput(format!(
                    "{} must be between 0 and 100",
                    name
                )));
            }
        }
        Ok(())
    }
}

/// Value of `market` at `percentage` percent.
pub fn offer(market: f64, percentage: f64) -> f64 {
    market * percentage / 100.0
}

/// Price every line at the given rates and total them.
///
/// Line values are rounded to cents; totals are sums of the rounded lines so
/// the receipt adds up.
pub fn quote(items: &[TradeLine], rates: TradeRates) -> PricingResult<TradeQuote> {
    rates.validate()?;

    if items.is_empty() {
        return Err(PricingError::InvalidInput(
            "At least one item is required".to_string(),
        ));
    }

    let mut lines = Vec::with_capacity(items.len());
    for item in items {
        if item.name.trim().is_empty() {
            return Err(PricingError::InvalidInput(
                "Item name cannot be empty".to_string(),
            ));
        }
        if !item.market_price.is_finite() || item.market_price < 0.0 {
            return Err(PricingError::InvalidInput(format!(
                "Market price for \"{}\" must be a non-negative number",
                item.name
            )));
        }
        if item.quantity == 0 {
            return Err(PricingError::InvalidInput(format!(
                "Quantity for \"{}\" must be at least 1",
                item.name
            )));
        }

        let market_total = item.market_price * f64::from(item.quantity);
        lines.push(TradeLineQuote {
            name: item.name.trim().to_string(),
            quantity: item.quantity,
            market_price: round_cents(item.market_price),
            market_total: round_cents(market_total),
            cash_value: round_cents(offer(market_total, rates.cash_percentage)),
            credit_value: round_cents(offer(market_total, rates.credit_percentage)),
        });
    }

    let total_market = round_cents(lines.iter().map(|l| l.market_total).sum());
    let total_cash = round_cents(lines.iter().map(|l| l.cash_value).sum());
    let total_credit = round_cents(lines.iter().map(|l| l.credit_value).sum());

    Ok(TradeQuote {
        items: lines,
        cash_percentage: rates.cash_percentage,
        credit_percentage: rates.credit_percentage,
        total_market,
        total_cash,
        total_credit,
    })
}
