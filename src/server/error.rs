//! HTTP error boundary.
//!
//! Every failure leaves the server as `{ "error": string }` with a status
//! code chosen from the error kind.

use axum::extract::rejection::{JsonRejection, PathRejection, QueryRejection};
use axum::http::{HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use thiserror::Error;

use crate::error::{LookupError, PricingError, UpstreamError};

/// Seconds a rate-limited client is told to wait.
pub const RETRY_AFTER_SECS: &str = "60";

#[derive(Error, Debug)]
pub enum AppError {
    #[error("{0}")]
    BadRequest(String),

    #[error("Too many requests, please try again later")]
    RateLimited,

    #[error(transparent)]
    Upstream(#[from] UpstreamError),

    #[error(transparent)]
    Pricing(#[from] PricingError),
}

impl From<LookupError> for AppError {
    fn from(err: LookupError) -> Self {
        match err {
            LookupError::Upstream(e) => AppError::Upstream(e),
            LookupError::Pricing(e) => AppError::Pricing(e),
        }
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::BadRequest(rejection.body_text())
    }
}

impl From<QueryRejection> for AppError {
    fn from(rejection: QueryRejection) -> Self {
        AppError::BadRequest(rejection.body_text())
    }
}

impl From<PathRejection> for AppError {
    fn from(rejection: PathRejection) -> Self {
        AppError::BadRequest(rejection.body_text())
    }
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::RateLimited => StatusCode::TOO_MANY_REQUESTS,
            AppError::Pricing(PricingError::InvalidInput(_)) => StatusCode::BAD_REQUEST,
            AppError::Pricing(PricingError::NoSales(_)) => StatusCode::NOT_FOUND,
            AppError::Upstream(e) => match e {
                UpstreamError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
                UpstreamError::NotFound(_) => StatusCode::NOT_FOUND,
                UpstreamError::RateLimitExceeded => StatusCode::TOO_MANY_REQUESTS,
                UpstreamError::Timeout => StatusCode::GATEWAY_TIMEOUT,
                UpstreamError::NotConfigured(_) => StatusCode::SERVICE_UNAVAILABLE,
                UpstreamError::HttpError(_)
                | UpstreamError::ApiError { .. }
                | UpstreamError::JsonError(_)
                | UpstreamError::Parse(_)
                | UpstreamError::Unauthorized => StatusCode::BAD_GATEWAY,
            },
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();

        if status.is_server_error() {
            tracing::warn!("Request failed with {}: {}", status, self);
        }

        let mut response = (status, Json(json!({ "error": self.to_string() }))).into_response();
        if status == StatusCode::TOO_MANY_REQUESTS {
            response
                .headers_mut()
                .insert("retry-after", HeaderValue::from_static(RETRY_AFTER_SECS));
        }
        response
    }
}
