//! Outlier-resistant averaging of sale prices.
//!
//! The mean of all prices is computed first. Prices outside
//! `[LOWER_BOUND × mean, UPPER_BOUND × mean]` are dropped and the mean is
//! recomputed over the rest. When nothing survives, the full-set mean stands.

use crate::error::{PricingError, PricingResult};
use crate::models::{PriceSummary, Sale};

pub const LOWER_BOUND: f64 = 0.5;
pub const UPPER_BOUND: f64 = 1.5;

/// Result of [`trimmed_mean`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrimmedMean {
    pub average: f64,
    /// How many prices the average was computed over
    pub used: usize,
}

pub fn mean(prices: &[f64]) -> Option<f64> {
    if prices.is_empty() {
        None
    } else {
        Some(prices.iter().sum::<f64>() / prices.len() as f64)
    }
}

/// Average of `prices` after discarding outliers. `None` for empty input.
pub fn trimmed_mean(prices: &[f64]) -> Option<TrimmedMean> {
    let initial = mean(prices)?;
    let low = initial * LOWER_BOUND;
    let high = initial * UPPER_BOUND;

    let kept: Vec<f64> = prices
        .iter()
        .copied()
        .filter(|&p| p >= low && p <= high)
        .collect();

    match mean(&kept) {
        Some(average) => Some(TrimmedMean {
            average,
            used: kept.len(),
        }),
        None => Some(TrimmedMean {
            average: initial,
            used: prices.len(),
        }),
    }
}

/// Round to whole cents.
pub fn round_cents(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Build the response for a lookup.
///
/// Sales whose price is not a positive finite number are dropped before
/// counting. Fails with [`PricingError::NoSales`] when nothing usable remains.
pub fn summarize(query: &str, sales: Vec<Sale>) -> PricingResult<PriceSummary> {
    let sales: Vec<Sale> = sales.into_iter().filter(Sale::has_usable_price).collect();
    let prices: Vec<f64> = sales.iter().map(|s| s.price).collect();

    let trimmed = trimmed_mean(&prices).ok_or_else(|| PricingError::NoSales(query.to_string()))?;

    Ok(PriceSummary {
        average_price: round_cents(trimmed.average),
        sales_count: sales.len(),
        filtered_sales_count: trimmed.used,
        sales,
        query: query.to_string(),
    })
}
