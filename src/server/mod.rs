//! HTTP server for the trade-in desk.
//!
//! One axum router serves the pricing proxies, the card catalog, trade quotes
//! and inventory management. All `/api` routes pass through the per-client
//! rate limiter; every route gets CORS headers.

pub mod error;
pub mod handlers;
pub mod middleware;
pub mod state;

pub use error::AppError;
pub use state::{AppState, BackgroundTasks};

use std::net::SocketAddr;
use std::time::Duration;

use anyhow::Result;
use axum::http::header::{AUTHORIZATION, CONTENT_TYPE};
use axum::http::{HeaderValue, Method};
use axum::routing::{get, post};
use axum::Router;
use tokio::net::TcpListener;
use tokio::signal;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tracing::{info, warn};

use handlers::*;

/// Build the CORS layer. `*` anywhere in the list allows every origin.
pub fn cors_layer(allowed_origins: &[String]) -> CorsLayer {
    let origin = if allowed_origins.is_empty() || allowed_origins.iter().any(|o| o == "*") {
        AllowOrigin::from(Any)
    } else {
        let origins: Vec<HeaderValue> = allowed_origins
            .iter()
            .filter_map(|o| match HeaderValue::from_str(o) {
                Ok(value) => Some(value),
                Err(_) => {
                    warn!("Ignoring invalid CORS origin {:?}", o);
                    None
                }
            })
            .collect();
        AllowOrigin::list(origins)
    };

    CorsLayer::new()
        .allow_origin(origin)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([CONTENT_TYPE, AUTHORIZATION])
        .max_age(Duration::from_secs(60 * 60))
}

/// Assemble the application router.
pub fn build_router(state: AppState, allowed_origins: &[String]) -> Router {
    let api = Router::new()
        .route("/api/prices/130point", get(onethirty_prices))
        .route("/api/prices/psa", get(psa_prices))
        .route("/api/prices/ebay", get(ebay_prices))
        .route("/api/prices/tcgplayer", get(tcgplayer_prices))
        .route("/api/prices/compare", get(compare_prices))
        .route("/api/cards/search", get(search_cards))
        .route("/api/cards/cert/:cert", get(psa_cert))
        .route("/api/trade/quote", post(trade_quote))
        .route("/api/inventory", get(list_inventory).post(create_inventory))
        .route("/api/inventory/search", get(search_inventory))
        .route(
            "/api/inventory/:id",
            get(get_inventory)
                .patch(update_inventory)
                .delete(delete_inventory),
        )
        .route("/api/inventory/:id/publish", post(publish_inventory))
        .route_layer(axum::middleware::from_fn_with_state(
            state.clone(),
            middleware::rate_limit,
        ));

    Router::new()
        .route("/healthz", get(health))
        .route("/metrics", get(metrics))
        .merge(api)
        .layer(cors_layer(allowed_origins))
        .with_state(state)
}

/// Serve `router` on `bind_address` until Ctrl-C or SIGTERM.
pub async fn run_server(router: Router, bind_address: &str) -> Result<()> {
    let listener = TcpListener::bind(bind_address).await?;
    info!("Listening on {}", listener.local_addr()?);

    axum::serve(
        listener,
        router.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!("Failed to listen for Ctrl-C: {}", e);
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                warn!("Failed to listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received");
}
