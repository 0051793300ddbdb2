//! Error types for the trade-in server.
//!
//! Library code returns the precise `thiserror` enums below. The HTTP layer
//! converts them into [`crate::server::AppError`] at the route boundary.

use thiserror::Error;

/// Errors that can occur when talking to an upstream pricing, marketplace or
/// database API.
#[derive(Error, Debug)]
pub enum UpstreamError {
    /// HTTP request failed
    #[error("HTTP request failed: {0}")]
    HttpError(String),

    /// API returned an error status code
    #[error("API error (status {status}): {message}")]
    ApiError { status: u16, message: String },

    /// Failed to parse JSON response
    #[error("JSON parse error: {0}")]
    JsonError(#[from] serde_json::Error),

    /// Page or payload did not have the expected shape
    #[error("Unexpected upstream response: {0}")]
    Parse(String),

    /// Network timeout
    #[error("Request timeout")]
    Timeout,

    /// Resource not found
    #[error("Resource not found: {0}")]
    NotFound(String),

    /// Authentication failed
    #[error("Authentication failed")]
    Unauthorized,

    /// Rate limit exceeded
    #[error("Rate limit exceeded")]
    RateLimitExceeded,

    /// Credentials or base URL for the service were not configured
    #[error("{0} is not configured")]
    NotConfigured(String),

    /// Invalid request
    #[error("Invalid request: {0}")]
    InvalidRequest(String),
}

/// Errors that can occur during configuration loading.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Environment variable has invalid value
    #[error("Invalid value for {var}: {reason}")]
    InvalidValue { var: String, reason: String },
}

/// Errors produced by price aggregation and trade-value calculation.
#[derive(Error, Debug, PartialEq)]
pub enum PricingError {
    /// Upstream returned no usable sales for the query
    #[error("No sales found for \"{0}\"")]
    NoSales(String),

    /// Caller supplied values the calculation cannot use
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

/// Errors surfaced by the price lookup pipeline (fetch, extract, aggregate).
#[derive(Error, Debug)]
pub enum LookupError {
    #[error(transparent)]
    Upstream(#[from] UpstreamError),

    #[error(transparent)]
    Pricing(#[from] PricingError),
}

/// Convenience type alias for Results with UpstreamError
pub type UpstreamResult<T> = Result<T, UpstreamError>;

/// Convenience type alias for Results with ConfigError
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Convenience type alias for Results with PricingError
pub type PricingResult<T> = Result<T, PricingError>;

/// Convenience type alias for Results with LookupError
pub type LookupResult<T> = Result<T, LookupError>;
