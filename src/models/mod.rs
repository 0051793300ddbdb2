//! Data models for the trade-in desk.
//!
//! Sales and price summaries returned by the pricing routes, catalog records
//! from TCGPlayer and PSA, shop inventory rows and trade quotes.

pub mod card;
pub mod inventory;
pub mod sale;
pub mod trade;

pub use card::{CardProduct, PsaCert};
pub use inventory::{InventoryItem, InventoryUpdate, NewInventoryItem};
pub use sale::{PriceSummary, Sale, SalesQuery};
pub use trade::{TradeLine, TradeLineQuote, TradeQuote, TradeQuoteRequest};
