//! Card Trade-In Server - Main entry point
//!
//! Loads configuration, wires the services and serves the HTTP API until
//! Ctrl-C or SIGTERM.

use anyhow::Result;
use card_tradein_server::server::{build_router, run_server, AppState};
use card_tradein_server::{Config, Metrics};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    // Config is read before logging starts so LOG_LEVEL (from .env too) applies
    let loaded = Config::from_env();
    let level = loaded
        .as_ref()
        .map(|cfg| cfg.log_level.clone())
        .unwrap_or_else(|_| "info".to_string());

    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let config = match loaded {
        Ok(cfg) => {
            info!("Configuration loaded successfully");
            cfg
        }
        Err(e) => {
            error!("Failed to load configuration: {}", e);
            return Err(e.into());
        }
    };

    info!(
        "Rate limit: {} requests/minute per client, cache sweep every {}s",
        config.rate_limit_per_minute, config.cache_sweep_interval_secs
    );
    info!(
        "Trade rates: {}% cash, {}% credit",
        config.cash_percentage, config.credit_percentage
    );

    let (state, background) = AppState::start(&config, Metrics::new());
    info!("Started {} background tasks", background.len());

    let router = build_router(state, &config.cors_allowed_origins);
    let result = run_server(router, &config.bind_address).await;

    background.shutdown();

    match &result {
        Ok(()) => info!("Card trade-in server shutdown complete"),
        Err(e) => error!("Server error: {}", e),
    }
    result
}
