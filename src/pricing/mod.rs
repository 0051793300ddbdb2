//! Price math: trimmed-mean aggregation of sales and trade-in offers.

pub mod trade_value;
pub mod trimmed_mean;

pub use trade_value::{quote, TradeRates};
pub use trimmed_mean::{mean, round_cents, summarize, trimmed_mean, TrimmedMean};
