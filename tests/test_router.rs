//! End-to-end router tests using `tower::ServiceExt::oneshot`.

mod mocks;

use async_trait::async_trait;
use axum::body::{to_bytes, Body};
use axum::http::{Request, StatusCode};
use axum::Router;
use card_tradein_server::error::{UpstreamError, UpstreamResult};
use card_tradein_server::models::{CardProduct, PsaCert, Sale, SalesQuery};
use card_tradein_server::pricing::TradeRates;
use card_tradein_server::rate_limit::SlidingWindowLimiter;
use card_tradein_server::repositories::InventoryRepository;
use card_tradein_server::server::{build_router, AppState};
use card_tradein_server::services::{
    CardService, InventoryServiceImpl, PriceLookupService, PriceLookupServiceImpl,
};
use card_tradein_server::sources::SalesSource;
use card_tradein_server::Metrics;
use mocks::MockInventoryRepository;
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt;

struct StubSource {
    name: &'static str,
    prices: Vec<f64>,
}

#[async_trait]
impl SalesSource for StubSource {
    fn name(&self) -> &'static str {
        self.name
    }

    fn search_text(&self, query: &SalesQuery) -> String {
        query.graded_search_text()
    }

    async fn fetch_sales(&self, query: &SalesQuery) -> UpstreamResult<Vec<Sale>> {
        if query.card.contains("timeout") {
            return Err(UpstreamError::Timeout);
        }
        Ok(self
            .prices
            .iter()
            .map(|p| Sale::new(*p, format!("{} sale", query.card), "2024-03-01"))
            .collect())
    }
}

struct StubCards;

#[async_trait]
impl CardService for StubCards {
    async fn search_products(&self, query: &str, _limit: usize) -> UpstreamResult<Vec<CardProduct>> {
        Ok(vec![CardProduct {
            product_id: 1,
            name: query.to_string(),
            set_name: None,
            product_line: None,
            rarity: None,
            number: None,
            market_price: Some(1.5),
            image_url: CardProduct::image_url_for(1),
        }])
    }

    async fn lookup_cert(&self, cert_number: &str) -> UpstreamResult<PsaCert> {
        if cert_number == "404" {
            return Err(UpstreamError::NotFound(format!("PSA cert {}", cert_number)));
        }
        Ok(PsaCert {
            cert_number: cert_number.to_string(),
            ..Default::default()
        })
    }
}

fn lookup_service(
    name: &'static str,
    prices: Vec<f64>,
    metrics: &Metrics,
) -> Arc<dyn PriceLookupService> {
    Arc::new(PriceLookupServiceImpl::new(
        Arc::new(StubSource { name, prices }),
        60,
        metrics.clone(),
    ))
}

fn app_with(repo: Option<MockInventoryRepository>, rate_limit: usize) -> (Router, Metrics) {
    app_with_origins(repo, rate_limit, &["*".to_string()])
}

fn app_with_origins(
    repo: Option<MockInventoryRepository>,
    rate_limit: usize,
    origins: &[String],
) -> (Router, Metrics) {
    let metrics = Metrics::new();
    let repository = repo.map(|r| Arc::new(r) as Arc<dyn InventoryRepository>);

    let state = AppState {
        onethirty: lookup_service("130point", vec![100.0, 110.0, 90.0, 400.0], &metrics),
        psa: lookup_service("psa", vec![50.0], &metrics),
        ebay: lookup_service("ebay", Vec::new(), &metrics),
        tcgplayer: lookup_service("tcgplayer", vec![3.0, 4.0], &metrics),
        cards: Arc::new(StubCards),
        inventory: Arc::new(InventoryServiceImpl::new(repository, None)),
        trade_rates: TradeRates::new(50.0, 70.0),
        limiter: Arc::new(SlidingWindowLimiter::new(rate_limit)),
        metrics: metrics.clone(),
    };

    (build_router(state, origins), metrics)
}

fn app() -> Router {
    app_with(Some(MockInventoryRepository::new()), 0).0
}

async fn send(app: Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, body)
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

fn json_request(method: &str, uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

#[tokio::test]
async fn test_health() {
    let (status, body) = send(app(), get("/healthz")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"status": "ok"}));
}

#[tokio::test]
async fn test_price_summary_trims_outliers() {
    let (status, body) = send(app(), get("/api/prices/130point?card=Charizard&grade=9")).await;

    assert_eq!(status, StatusCode::OK);
    // mean of all four is 175; 400 falls outside [87.5, 262.5]
    assert_eq!(body["averagePrice"], 100.0);
    assert_eq!(body["salesCount"], 4);
    assert_eq!(body["filteredSalesCount"], 3);
    assert_eq!(body["query"], "Charizard PSA 9");
    assert_eq!(body["sales"][0]["title"], "Charizard sale");
}

#[tokio::test]
async fn test_missing_card_is_bad_request() {
    let (status, body) = send(app(), get("/api/prices/psa")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "card is required");
}

#[tokio::test]
async fn test_no_sales_is_not_found() {
    let (status, body) = send(app(), get("/api/prices/ebay?card=Nothing")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(body["error"].as_str().unwrap().contains("No sales found"));
}

#[tokio::test]
async fn test_upstream_timeout_is_gateway_timeout() {
    let (status, body) = send(app(), get("/api/prices/psa?card=timeout")).await;
    assert_eq!(status, StatusCode::GATEWAY_TIMEOUT);
    assert_eq!(body["error"], "Request timeout");
}

#[tokio::test]
async fn test_tcgplayer_requires_product_id() {
    let (status, _) = send(app(), get("/api/prices/tcgplayer?condition=Near%20Mint")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = send(app(), get("/api/prices/tcgplayer?productId=42346")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["averagePrice"], 3.5);
}

#[tokio::test]
async fn test_compare_reports_each_source() {
    let (status, body) = send(app(), get("/api/prices/compare?card=Mew")).await;
    assert_eq!(status, StatusCode::OK);

    let results = body["results"].as_array().unwrap();
    assert_eq!(results.len(), 3);
    assert_eq!(results[0]["source"], "130point");
    assert!(results[1]["summary"].is_object());
    assert!(results[2]["error"].as_str().unwrap().contains("No sales"));
}

#[tokio::test]
async fn test_card_search_and_cert() {
    let (status, body) = send(app(), get("/api/cards/search?q=Mewtwo")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body[0]["name"], "Mewtwo");

    let (status, body) = send(app(), get("/api/cards/cert/12345678")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["certNumber"], "12345678");

    let (status, _) = send(app(), get("/api/cards/cert/404")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_trade_quote_uses_defaults_and_overrides() {
    let request = json_request(
        "POST",
        "/api/trade/quote",
        json!({"items": [{"name": "Charizard", "marketPrice": 100.0, "quantity": 2}]}),
    );
    let (status, body) = send(app(), request).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["totalMarket"], 200.0);
    assert_eq!(body["totalCash"], 100.0);
    assert_eq!(body["totalCredit"], 140.0);

    let request = json_request(
        "POST",
        "/api/trade/quote",
        json!({"items": [{"name": "Charizard", "marketPrice": 100.0}], "cashPercentage": 60}),
    );
    let (_, body) = send(app(), request).await;
    assert_eq!(body["totalCash"], 60.0);
    assert_eq!(body["cashPercentage"], 60.0);
}

#[tokio::test]
async fn test_trade_quote_rejects_bad_input() {
    let request = json_request(
        "POST",
        "/api/trade/quote",
        json!({"items": [], "creditPercentage": 70}),
    );
    let (status, _) = send(app(), request).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let malformed = Request::builder()
        .method("POST")
        .uri("/api/trade/quote")
        .header("content-type", "application/json")
        .body(Body::from("{not json"))
        .unwrap();
    let (status, body) = send(app(), malformed).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].is_string());
}

#[tokio::test]
async fn test_inventory_crud() {
    let repo = MockInventoryRepository::new();
    let (app, _) = app_with(Some(repo.clone()), 0);

    let (status, created) = send(
        app.clone(),
        json_request(
            "POST",
            "/api/inventory",
            json!({"cardName": "Charizard", "setName": "Base Set", "marketPrice": 350.0}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let id = created["id"].as_i64().unwrap();
    assert_eq!(created["quantity"], 1);

    let (status, item) = send(app.clone(), get(&format!("/api/inventory/{}", id))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(item["cardName"], "Charizard");

    let (status, item) = send(
        app.clone(),
        json_request(
            "PATCH",
            &format!("/api/inventory/{}", id),
            json!({"listPrice": 399.0}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(item["listPrice"], 399.0);

    let (status, found) = send(app.clone(), get("/api/inventory/search?q=charizard")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(found[0]["item"]["id"], id);
    assert_eq!(found[0]["score"], 100);

    let (status, list) = send(app.clone(), get("/api/inventory?limit=10")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(list.as_array().unwrap().len(), 1);

    let delete = Request::builder()
        .method("DELETE")
        .uri(format!("/api/inventory/{}", id))
        .body(Body::empty())
        .unwrap();
    let (status, _) = send(app.clone(), delete).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    assert_eq!(repo.len(), 0);

    let (status, _) = send(app, get(&format!("/api/inventory/{}", id))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_inventory_bad_id() {
    let (status, body) = send(app(), get("/api/inventory/abc")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].is_string());
}

#[tokio::test]
async fn test_unconfigured_services_are_unavailable() {
    let (app, _) = app_with(None, 0);
    let (status, body) = send(app.clone(), get("/api/inventory")).await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["error"], "Inventory database is not configured");

    let publish = Request::builder()
        .method("POST")
        .uri("/api/inventory/1/publish")
        .body(Body::empty())
        .unwrap();
    let (status, _) = send(app, publish).await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
}

#[tokio::test]
async fn test_rate_limit_per_client() {
    let (app, metrics) = app_with(Some(MockInventoryRepository::new()), 2);

    let from = |ip: &str| {
        Request::builder()
            .uri("/api/cards/search?q=Mew")
            .header("x-forwarded-for", ip)
            .body(Body::empty())
            .unwrap()
    };

    for _ in 0..2 {
        let response = app.clone().oneshot(from("203.0.113.1")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    let response = app.clone().oneshot(from("203.0.113.1")).await.unwrap();
    assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
    assert_eq!(response.headers()["retry-after"], "60");

    // another client has its own window
    let response = app.clone().oneshot(from("203.0.113.2")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    // health checks are not limited
    let response = app.oneshot(get("/healthz")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    assert_eq!(metrics.rate_limited_total(), 1);
}

#[tokio::test]
async fn test_cors_headers() {
    let preflight = Request::builder()
        .method("OPTIONS")
        .uri("/api/inventory")
        .header("origin", "https://shop.example.com")
        .header("access-control-request-method", "PATCH")
        .body(Body::empty())
        .unwrap();
    let response = app().oneshot(preflight).await.unwrap();
    assert!(response.status().is_success());
    assert_eq!(response.headers()["access-control-allow-origin"], "*");
    let methods = response.headers()["access-control-allow-methods"]
        .to_str()
        .unwrap()
        .to_string();
    assert!(methods.contains("PATCH"));

    let simple = Request::builder()
        .uri("/healthz")
        .header("origin", "https://shop.example.com")
        .body(Body::empty())
        .unwrap();
    let response = app().oneshot(simple).await.unwrap();
    assert_eq!(response.headers()["access-control-allow-origin"], "*");
}

#[tokio::test]
async fn test_metrics_endpoint_counts_cache() {
    let (app, _) = app_with(Some(MockInventoryRepository::new()), 0);
    send(app.clone(), get("/api/prices/psa?card=Mew")).await;
    send(app.clone(), get("/api/prices/psa?card=mew")).await;

    let (status, body) = send(app, get("/metrics")).await;
    assert_eq!(status, StatusCode::OK);
    // second lookup differs only in case
    assert_eq!(body["cacheMissesTotal"], 1);
    assert_eq!(body["cacheHitsTotal"], 1);
    assert_eq!(body["rateLimitedTotal"], 0);
}

#[tokio::test]
async fn test_cors_explicit_origin_list() {
    let origins = vec!["https://shop.example.com".to_string()];
    let (app, _) = app_with_origins(Some(MockInventoryRepository::new()), 0, &origins);

    let from = |origin: &str| {
        Request::builder()
            .uri("/healthz")
            .header("origin", origin)
            .body(Body::empty())
            .unwrap()
    };

    let response = app.clone().oneshot(from("https://shop.example.com")).await.unwrap();
    assert_eq!(
        response.headers()["access-control-allow-origin"],
        "https://shop.example.com"
    );

    let response = app.oneshot(from("https://evil.example.net")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert!(response
        .headers()
        .get("access-control-allow-origin")
        .is_none());
}
