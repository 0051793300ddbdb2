//! Route handlers.
//!
//! Handlers parse the request, call one service and serialize the result.
//! Extractor rejections are turned into [`AppError::BadRequest`] so clients
//! always get the JSON error shape.

use std::sync::Arc;

use axum::extract::rejection::{JsonRejection, PathRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::matching::CardMatch;
use crate::metrics::MetricsSummary;
use crate::models::{
    CardProduct, InventoryItem, InventoryUpdate, NewInventoryItem, PriceSummary, PsaCert,
    SalesQuery, TradeQuote, TradeQuoteRequest,
};
use crate::pricing::quote;
use crate::server::error::AppError;
use crate::server::state::AppState;
use crate::services::{compare, PriceLookupService};

const DEFAULT_CARD_SEARCH_LIMIT: usize = 20;

pub type ApiResult<T> = Result<T, AppError>;

#[derive(Debug, Deserialize)]
pub struct CardPriceParams {
    pub card: Option<String>,
    pub grade: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductPriceParams {
    pub product_id: Option<String>,
    pub condition: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct SearchParams {
    pub q: Option<String>,
    pub limit: Option<usize>,
}

#[derive(Debug, Deserialize)]
pub struct PageParams {
    pub limit: Option<usize>,
    pub offset: Option<usize>,
}

fn required(value: Option<String>, name: &str) -> ApiResult<String> {
    value
        .filter(|v| !v.trim().is_empty())
        .ok_or_else(|| AppError::BadRequest(format!("{} is required", name)))
}

fn card_query(params: CardPriceParams) -> ApiResult<SalesQuery> {
    let card = required(params.card, "card")?;
    Ok(SalesQuery::new(card).with_grade(params.grade))
}

async fn lookup(
    service: &Arc<dyn PriceLookupService>,
    query: SalesQuery,
) -> ApiResult<Json<PriceSummary>> {
    Ok(Json(service.lookup(&query).await?))
}

pub async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

pub async fn metrics(State(state): State<AppState>) -> Json<MetricsSummary> {
    Json(state.metrics.summary())
}

pub async fn onethirty_prices(
    State(state): State<AppState>,
    params: Result<Query<CardPriceParams>, QueryRejection>,
) -> ApiResult<Json<PriceSummary>> {
    let Query(params) = params?;
    lookup(&state.onethirty, card_query(params)?).await
}

pub async fn psa_prices(
    State(state): State<AppState>,
    params: Result<Query<CardPriceParams>, QueryRejection>,
) -> ApiResult<Json<PriceSummary>> {
    let Query(params) = params?;
    lookup(&state.psa, card_query(params)?).await
}

pub async fn ebay_prices(
    State(state): State<AppState>,
    params: Result<Query<CardPriceParams>, QueryRejection>,
) -> ApiResult<Json<PriceSummary>> {
    let Query(params) = params?;
    lookup(&state.ebay, card_query(params)?).await
}

pub async fn tcgplayer_prices(
    State(state): State<AppState>,
    params: Result<Query<ProductPriceParams>, QueryRejection>,
) -> ApiResult<Json<PriceSummary>> {
    let Query(params) = params?;
    let product_id = required(params.product_id, "productId")?;
    let query = SalesQuery::new(product_id).with_condition(params.condition);
    lookup(&state.tcgplayer, query).await
}

/// Graded-card price from every card-name source at once.
pub async fn compare_prices(
    State(state): State<AppState>,
    params: Result<Query<CardPriceParams>, QueryRejection>,
) -> ApiResult<Json<Value>> {
    let Query(params) = params?;
    let query = card_query(params)?;

    let services = [state.onethirty.clone(), state.psa.clone(), state.ebay.clone()];
    let results = compare(&services, &query).await;

    Ok(Json(json!({
        "card": query.card,
        "grade": query.grade,
        "results": results,
    })))
}

pub async fn search_cards(
    State(state): State<AppState>,
    params: Result<Query<SearchParams>, QueryRejection>,
) -> ApiResult<Json<Vec<CardProduct>>> {
    let Query(params) = params?;
    let q = required(params.q, "q")?;
    let limit = params.limit.unwrap_or(DEFAULT_CARD_SEARCH_LIMIT);
    Ok(Json(state.cards.search_products(&q, limit).await?))
}

pub async fn psa_cert(
    State(state): State<AppState>,
    cert: Result<Path<String>, PathRejection>,
) -> ApiResult<Json<PsaCert>> {
    let Path(cert) = cert?;
    Ok(Json(state.cards.lookup_cert(&cert).await?))
}

pub async fn trade_quote(
    State(state): State<AppState>,
    body: Result<Json<TradeQuoteRequest>, JsonRejection>,
) -> ApiResult<Json<TradeQuote>> {
    let Json(request) = body?;
    let rates = state
        .trade_rates
        .with_overrides(request.cash_percentage, request.credit_percentage);
    Ok(Json(quote(&request.items, rates)?))
}

pub async fn list_inventory(
    State(state): State<AppState>,
    params: Result<Query<PageParams>, QueryRejection>,
) -> ApiResult<Json<Vec<InventoryItem>>> {
    let Query(params) = params?;
    Ok(Json(state.inventory.list(params.limit, params.offset).await?))
}

pub async fn create_inventory(
    State(state): State<AppState>,
    body: Result<Json<NewInventoryItem>, JsonRejection>,
) -> ApiResult<impl IntoResponse> {
    let Json(item) = body?;
    let created = state.inventory.create(item).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

pub async fn search_inventory(
    State(state): State<AppState>,
    params: Result<Query<SearchParams>, QueryRejection>,
) -> ApiResult<Json<Vec<CardMatch>>> {
    let Query(params) = params?;
    let q = required(params.q, "q")?;
    Ok(Json(state.inventory.search(&q, params.limit).await?))
}

pub async fn get_inventory(
    State(state): State<AppState>,
    id: Result<Path<i64>, PathRejection>,
) -> ApiResult<Json<InventoryItem>> {
    let Path(id) = id?;
    Ok(Json(state.inventory.get(id).await?))
}

pub async fn update_inventory(
    State(state): State<AppState>,
    id: Result<Path<i64>, PathRejection>,
    body: Result<Json<InventoryUpdate>, JsonRejection>,
) -> ApiResult<Json<InventoryItem>> {
    let Path(id) = id?;
    let Json(update) = body?;
    Ok(Json(state.inventory.update(id, update).await?))
}

pub async fn delete_inventory(
    State(state): State<AppState>,
    id: Result<Path<i64>, PathRejection>,
) -> ApiResult<StatusCode> {
    let Path(id) = id?;
    state.inventory.delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn publish_inventory(
    State(state): State<AppState>,
    id: Result<Path<i64>, PathRejection>,
) -> ApiResult<Json<InventoryItem>> {
    let Path(id) = id?;
    Ok(Json(state.inventory.publish(id).await?))
}
