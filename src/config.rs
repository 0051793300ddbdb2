//! Configuration management for the trade-in server.
//!
//! This module handles loading and validating configuration from environment variables.
//! A `.env` file in the working directory is loaded first when present.

use crate::error::{ConfigError, ConfigResult};
use std::env;
use std::time::Duration;

pub const DEFAULT_ONETHIRTY_BASE_URL: &str = "https://back.130point.com";
pub const DEFAULT_PSA_BASE_URL: &str = "https://www.psacard.com";
pub const DEFAULT_PSA_API_BASE_URL: &str = "https://api.psacard.com/publicapi";
pub const DEFAULT_EBAY_BASE_URL: &str = "https://api.ebay.com";
pub const DEFAULT_TCGPLAYER_MP_API_URL: &str = "https://mpapi.tcgplayer.com";
pub const DEFAULT_TCGPLAYER_SEARCH_URL: &str = "https://mp-search-api.tcgplayer.com";

/// Configuration for the trade-in server.
#[derive(Debug, Clone)]
pub struct Config {
    /// Socket address the HTTP server binds to (default: 0.0.0.0:8787)
    pub bind_address: String,

    /// HTTP request timeout for upstream calls in seconds (default: 10)
    pub request_timeout: u64,

    /// Requests allowed per client IP in any trailing 60 seconds (default: 30, 0 disables)
    pub rate_limit_per_minute: usize,

    /// Period of the expired cache entry sweep in seconds (default: 300)
    pub cache_sweep_interval_secs: u64,

    /// 130point cache TTL in seconds (default: 1 hour)
    pub onethirty_cache_ttl_secs: u64,

    /// PSA auction-price cache TTL in seconds (default: 24 hours)
    pub psa_cache_ttl_secs: u64,

    /// eBay cache TTL in seconds (default: 30 minutes)
    pub ebay_cache_ttl_secs: u64,

    /// TCGPlayer cache TTL in seconds (default: 5 minutes)
    pub tcgplayer_cache_ttl_secs: u64,

    /// Default cash offer as a percentage of market price (default: 50)
    pub cash_percentage: u8,

    /// Default store-credit offer as a percentage of market price (default: 70)
    pub credit_percentage: u8,

    /// Allowed CORS origins; `["*"]` allows any origin
    pub cors_allowed_origins: Vec<String>,

    pub onethirty_base_url: String,
    pub psa_base_url: String,
    pub psa_api_base_url: String,
    pub ebay_base_url: String,
    pub tcgplayer_mp_api_url: String,
    pub tcgplayer_search_url: String,

    /// OAuth application token for the eBay Browse API
    pub ebay_oauth_token: Option<String>,

    /// Bearer token for the PSA public API
    pub psa_api_token: Option<String>,

    /// Supabase project URL (inventory database)
    pub supabase_url: Option<String>,

    /// Supabase service role key
    pub supabase_service_key: Option<String>,

    /// Shopify store admin URL, e.g. `https://my-shop.myshopify.com`
    pub shopify_store_url: Option<String>,

    /// Shopify Admin API access token
    pub shopify_access_token: Option<String>,

    /// Log level used when `RUST_LOG` is unset (default: "info")
    pub log_level: String,
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// Nothing is strictly required: the pricing routes work against the public
    /// upstream endpoints, and the inventory and Shopify routes report
    /// themselves as unconfigured until their credentials are set.
    pub fn from_env() -> ConfigResult<Self> {
        let _ = dotenvy::dotenv();

        let bind_address =
            env::var("BIND_ADDRESS").unwrap_or_else(|_| "0.0.0.0:8787".to_string());

        let request_timeout = Self::parse_env_u64("REQUEST_TIMEOUT", 10)?;
        if request_timeout == 0 {
            return Err(ConfigError::InvalidValue {
                var: "REQUEST_TIMEOUT".to_string(),
                reason: "Must be at least 1 second".to_string(),
            });
        }

        let rate_limit_per_minute = Self::parse_env_usize("RATE_LIMIT_PER_MINUTE", 30)?;
        let cache_sweep_interval_secs = Self::parse_env_u64("CACHE_SWEEP_INTERVAL_SECS", 300)?;
        let onethirty_cache_ttl_secs = Self::parse_env_u64("ONETHIRTY_CACHE_TTL_SECS", 3600)?;
        let psa_cache_ttl_secs = Self::parse_env_u64("PSA_CACHE_TTL_SECS", 86_400)?;
        let ebay_cache_ttl_secs = Self::parse_env_u64("EBAY_CACHE_TTL_SECS", 1800)?;
        let tcgplayer_cache_ttl_secs = Self::parse_env_u64("TCGPLAYER_CACHE_TTL_SECS", 300)?;

        let cash_percentage = Self::parse_env_percentage("CASH_PERCENTAGE", 50)?;
        let credit_percentage = Self::parse_env_percentage("CREDIT_PERCENTAGE", 70)?;

        let cors_allowed_origins = env::var("CORS_ALLOWED_ORIGINS")
            .unwrap_or_else(|_| "*".to_string())
            .split(',')
            .map(|origin| origin.trim().to_string())
            .filter(|origin| !origin.is_empty())
            .collect();

        let supabase_url = Self::optional_url("SUPABASE_URL")?;
        let shopify_store_url = Self::optional_url("SHOPIFY_STORE_URL")?;

        let log_level = env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string());

        Ok(Config {
            bind_address,
            request_timeout,
            rate_limit_per_minute,
            cache_sweep_interval_secs,
            onethirty_cache_ttl_secs,
            psa_cache_ttl_secs,
            ebay_cache_ttl_secs,
            tcgplayer_cache_ttl_secs,
            cash_percentage,
            credit_percentage,
            cors_allowed_origins,
            onethirty_base_url: Self::url_with_default(
                "ONETHIRTY_BASE_URL",
                DEFAULT_ONETHIRTY_BASE_URL,
            )?,
            psa_base_url: Self::url_with_default("PSA_BASE_URL", DEFAULT_PSA_BASE_URL)?,
            psa_api_base_url: Self::url_with_default(
                "PSA_API_BASE_URL",
                DEFAULT_PSA_API_BASE_URL,
            )?,
            ebay_base_url: Self::url_with_default("EBAY_BASE_URL", DEFAULT_EBAY_BASE_URL)?,
            tcgplayer_mp_api_url: Self::url_with_default(
                "TCGPLAYER_MP_API_URL",
                DEFAULT_TCGPLAYER_MP_API_URL,
            )?,
            tcgplayer_search_url: Self::url_with_default(
                "TCGPLAYER_SEARCH_URL",
                DEFAULT_TCGPLAYER_SEARCH_URL,
            )?,
            ebay_oauth_token: Self::optional_secret("EBAY_OAUTH_TOKEN"),
            psa_api_token: Self::optional_secret("PSA_API_TOKEN"),
            supabase_url,
            supabase_service_key: Self::optional_secret("SUPABASE_SERVICE_KEY"),
            shopify_store_url,
            shopify_access_token: Self::optional_secret("SHOPIFY_ACCESS_TOKEN"),
            log_level,
        })
    }

    /// Sweep period as a `Duration`, never shorter than one second.
    pub fn cache_sweep_interval(&self) -> Duration {
        Duration::from_secs(self.cache_sweep_interval_secs.max(1))
    }

    /// Parse an environment variable as u64 with a default value.
    fn parse_env_u64(var_name: &str, default: u64) -> ConfigResult<u64> {
        match env::var(var_name) {
            Ok(val) => val.trim().parse::<u64>().map_err(|_| ConfigError::InvalidValue {
                var: var_name.to_string(),
                reason: format!("Must be a positive number, got: {}", val),
            }),
            Err(_) => Ok(default),
        }
    }

    /// Parse an environment variable as usize with a default value.
    fn parse_env_usize(var_name: &str, default: usize) -> ConfigResult<usize> {
        match env::var(var_name) {
            Ok(val) => val.trim().parse::<usize>().map_err(|_| ConfigError::InvalidValue {
                var: var_name.to_string(),
                reason: format!("Must be a positive number, got: {}", val),
            }),
            Err(_) => Ok(default),
        }
    }

    /// Parse an environment variable as a whole percentage (0-100).
    fn parse_env_percentage(var_name: &str, default: u8) -> ConfigResult<u8> {
        let value = match env::var(var_name) {
            Ok(val) => val.trim().parse::<u8>().map_err(|_| ConfigError::InvalidValue {
                var: var_name.to_string(),
                reason: format!("Must be a number between 0-100, got: {}", val),
            })?,
            Err(_) => default,
        };

        if value > 100 {
            return Err(ConfigError::InvalidValue {
                var: var_name.to_string(),
                reason: "Must be between 0 and 100".to_string(),
            });
        }
        Ok(value)
    }

    fn url_with_default(var_name: &str, default: &str) -> ConfigResult<String> {
        match env::var(var_name) {
            Ok(val) => Self::validate_url(var_name, val.trim()),
            Err(_) => Ok(default.to_string()),
        }
    }

    fn optional_url(var_name: &str) -> ConfigResult<Option<String>> {
        match Self::optional_secret(var_name) {
            Some(val) => Self::validate_url(var_name, &val).map(Some),
            None => Ok(None),
        }
    }

    /// Read a variable, treating unset and blank values alike.
    fn optional_secret(var_name: &str) -> Option<String> {
        env::var(var_name)
            .ok()
            .map(|val| val.trim().to_string())
            .filter(|val| !val.is_empty())
    }

    fn validate_url(var_name: &str, url: &str) -> ConfigResult<String> {
        if !url.starts_with("http://") && !url.starts_with("https://") {
            return Err(ConfigError::InvalidValue {
                var: var_name.to_string(),
                reason: "Must start with http:// or https://".to_string(),
            });
        }
        Ok(url.trim_end_matches('/').to_string())
    }
}

impl Default for Config {
    fn default() -> Self {
        Config {
            bind_address: "0.0.0.0:8787".to_string(),
            request_timeout: 10,
            rate_limit_per_minute: 30,
            cache_sweep_interval_secs: 300,
            onethirty_cache_ttl_secs: 3600,
            psa_cache_ttl_secs: 86_400,
            ebay_cache_ttl_secs: 1800,
            tcgplayer_cache_ttl_secs: 300,
            cash_percentage: 50,
            credit_percentage: 70,
            cors_allowed_origins: vec!["*".to_string()],
            onethirty_base_url: DEFAULT_ONETHIRTY_BASE_URL.to_string(),
            psa_base_url: DEFAULT_PSA_BASE_URL.to_string(),
            psa_api_base_url: DEFAULT_PSA_API_BASE_URL.to_string(),
            ebay_base_url: DEFAULT_EBAY_BASE_URL.to_string(),
            tcgplayer_mp_api_url: DEFAULT_TCGPLAYER_MP_API_URL.to_string(),
            tcgplayer_search_url: DEFAULT_TCGPLAYER_SEARCH_URL.to_string(),
            ebay_oauth_token: None,
            psa_api_token: None,
            supabase_url: None,
            supabase_service_key: None,
            shopify_store_url: None,
            shopify_access_token: None,
            log_level: "info".to_string(),
        }
    }
}
