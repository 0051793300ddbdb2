//! HTTP client for the upstream pricing, marketplace and database APIs.
//!
//! This module provides a synchronous HTTP client that can be used from async contexts
//! via `tokio::task::spawn_blocking`. Every upstream call is described by an
//! [`UpstreamRequest`]; the client executes it, maps failures onto
//! [`UpstreamError`] and records timing metrics.

mod async_wrapper;
pub use async_wrapper::{AsyncUpstreamClient, AsyncUpstreamClientImpl};

use crate::config::Config;
use crate::error::{UpstreamError, UpstreamResult};
use crate::metrics::{HttpTimer, Metrics};
use std::sync::Arc;
use std::time::Duration;

/// Sent on every request; some of the scraped sites reject empty agents.
pub const USER_AGENT: &str =
    "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) card-tradein-server";

/// HTTP method of an upstream request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
    Patch,
    Delete,
}

impl Method {
    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Post => "POST",
            Method::Patch => "PATCH",
            Method::Delete => "DELETE",
        }
    }
}

/// Request body variants used by the upstreams.
#[derive(Debug, Clone, PartialEq)]
pub enum RequestBody {
    Empty,
    Form(Vec<(String, String)>),
    Json(serde_json::Value),
}

/// A fully described upstream call.
#[derive(Debug, Clone, PartialEq)]
pub struct UpstreamRequest {
    pub method: Method,
    pub url: String,
    pub headers: Vec<(String, String)>,
    pub query: Vec<(String, String)>,
    pub body: RequestBody,
}

impl UpstreamRequest {
    fn new(method: Method, url: impl Into<String>, body: RequestBody) -> Self {
        Self {
            method,
            url: url.into(),
            headers: Vec::new(),
            query: Vec::new(),
            body,
        }
    }

    pub fn get(url: impl Into<String>) -> Self {
        Self::new(Method::Get, url, RequestBody::Empty)
    }

    pub fn delete(url: impl Into<String>) -> Self {
        Self::new(Method::Delete, url, RequestBody::Empty)
    }

    pub fn post_form(url: impl Into<String>, fields: Vec<(String, String)>) -> Self {
        Self::new(Method::Post, url, RequestBody::Form(fields))
    }

    pub fn post_json(url: impl Into<String>, body: serde_json::Value) -> Self {
        Self::new(Method::Post, url, RequestBody::Json(body))
    }

    pub fn patch_json(url: impl Into<String>, body: serde_json::Value) -> Self {
        Self::new(Method::Patch, url, RequestBody::Json(body))
    }

    pub fn header(mut self, name: &str, value: impl Into<String>) -> Self {
        self.headers.push((name.to_string(), value.into()));
        self
    }

    pub fn bearer(self, token: &str) -> Self {
        self.header("Authorization", format!("Bearer {}", token))
    }

    /// Append a query parameter; ureq percent-encodes it.
    pub fn query(mut self, name: &str, value: impl Into<String>) -> Self {
        self.query.push((name.to_string(), value.into()));
        self
    }
}

/// Join a base URL and a path with exactly one slash.
pub fn join_url(base: &str, path: &str) -> String {
    format!(
        "{}/{}",
        base.trim_end_matches('/'),
        path.trim_start_matches('/')
    )
}

/// Blocking HTTP client shared by every upstream integration.
///
/// This client uses `ureq` for synchronous HTTP requests and can be called
/// from async contexts using `tokio::task::spawn_blocking`.
#[derive(Clone)]
pub struct UpstreamClient {
    agent: Arc<ureq::Agent>,
    metrics: Metrics,
}

impl UpstreamClient {
    /// Create a new client from configuration.
    pub fn new(config: &Config, metrics: Metrics) -> Self {
        Self::with_timeout(Duration::from_secs(config.request_timeout), metrics)
    }

    pub fn with_timeout(timeout: Duration, metrics: Metrics) -> Self {
        let agent = ureq::AgentBuilder::new()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .build();

        Self {
            agent: Arc::new(agent),
            metrics,
        }
    }

    /// Get a reference to the metrics collector.
    pub fn metrics(&self) -> &Metrics {
        &self.metrics
    }

    /// Execute a request and return the response body as text.
    pub fn execute(&self, request: &UpstreamRequest) -> UpstreamResult<String> {
        let timer = HttpTimer::new(self.metrics.clone());

        tracing::debug!("{} {}", request.method.as_str(), request.url);

        let mut call = self.agent.request(request.method.as_str(), &request.url);
        for (name, value) in &request.headers {
            call = call.set(name, value);
        }
        for (name, value) in &request.query {
            call = call.query(name, value);
        }

        let result = match &request.body {
            RequestBody::Empty => call.call(),
            RequestBody::Form(fields) => {
                let pairs: Vec<(&str, &str)> = fields
                    .iter()
                    .map(|(k, v)| (k.as_str(), v.as_str()))
                    .collect();
                call.send_form(&pairs)
            }
            RequestBody::Json(body) => call.send_json(body),
        };

        let body = result
            .map_err(|e| self.map_error(e))
            .and_then(|response| {
                response
                    .into_string()
                    .map_err(|e| UpstreamError::HttpError(e.to_string()))
            });

        match &body {
            Ok(_) => timer.complete(),
            Err(e) => {
                tracing::warn!("{} {} - Error: {}", request.method.as_str(), request.url, e);
                timer.complete_with_error();
            }
        }

        body
    }

    /// Map a ureq error to an UpstreamError.
    fn map_error(&self, error: ureq::Error) -> UpstreamError {
        match error {
            ureq::Error::Status(code, response) => {
                let reason = response.status_text().to_string();
                let message = response
                    .into_string()
                    .map(|body| error_message(&body, &reason))
                    .unwrap_or_else(|_| "Unknown error".to_string());

                match code {
                    401 | 403 => UpstreamError::Unauthorized,
                    404 => UpstreamError::NotFound(message),
                    429 => UpstreamError::RateLimitExceeded,
                    _ => UpstreamError::ApiError {
                        status: code,
                        message,
                    },
                }
            }
            ureq::Error::Transport(transport) => {
                if transport.kind() == ureq::ErrorKind::ConnectionFailed {
                    UpstreamError::HttpError("Connection failed".to_string())
                } else if transport.kind() == ureq::ErrorKind::Io {
                    UpstreamError::Timeout
                } else {
                    UpstreamError::HttpError(transport.to_string())
                }
            }
        }
    }
}

/// Longest upstream error body passed on to callers.
pub const MAX_ERROR_MESSAGE_CHARS: usize = 200;

/// Message for a failed upstream response.
///
/// HTML pages collapse to the status reason; other bodies are cut to
/// [`MAX_ERROR_MESSAGE_CHARS`].
pub fn error_message(body: &str, reason: &str) -> String {
    let body = body.trim();
    let is_html = body.starts_with('<') || body.contains("<html");

    if body.is_empty() || is_html {
        return if reason.is_empty() {
            "Unknown error".to_string()
        } else {
            reason.to_string()
        };
    }

    if body.chars().count() <= MAX_ERROR_MESSAGE_CHARS {
        return body.to_string();
    }

    let mut message: String = body.chars().take(MAX_ERROR_MESSAGE_CHARS).collect();
    message.push_str("...");
    message
}
