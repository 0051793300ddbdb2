//! Card Trade-In Server - pricing proxy and inventory backend for a trading-card
//! shop's trade-in desk.
//!
//! Staff-facing front ends call this server to price cards from several
//! marketplaces, quote cash and store-credit offers, and manage inventory.
//!
//! # Architecture
//!
//! - **models**: Sales, price summaries, catalog records, inventory rows, trade quotes
//! - **error**: Custom error types for precise error handling
//! - **config**: Configuration management from environment variables
//! - **client**: Blocking HTTP client for upstream APIs with an async wrapper
//! - **sources**: Per-marketplace fetch and extract strategies
//! - **pricing**: Trimmed-mean aggregation and trade-value math
//! - **cache**: TTL cache with a periodic sweeper
//! - **rate_limit**: Per-client sliding-window limiter
//! - **matching**: Fuzzy matching for inventory search
//! - **repositories**: Inventory database and storefront publishing
//! - **services**: Business logic between handlers and data access
//! - **server**: axum router, middleware and error boundary

pub mod cache;
pub mod client;
pub mod config;
pub mod error;
pub mod matching;
pub mod metrics;
pub mod models;
pub mod pricing;
pub mod rate_limit;
pub mod repositories;
pub mod server;
pub mod services;
pub mod sources;

pub use cache::TimedCache;
pub use client::{AsyncUpstreamClient, UpstreamClient, UpstreamRequest};
pub use config::Config;
pub use error::{ConfigError, LookupError, PricingError, UpstreamError};
pub use matching::{CardMatch, CardMatcher};
pub use metrics::{HttpTimer, Metrics, MetricsSummary};
pub use models::{InventoryItem, PriceSummary, Sale, SalesQuery, TradeQuote};
pub use pricing::{summarize, trimmed_mean, TradeRates, TrimmedMean};
pub use rate_limit::SlidingWindowLimiter;
pub use server::{build_router, run_server, AppError, AppState};
