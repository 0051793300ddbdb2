//! Async wrapper around the synchronous UpstreamClient.
//!
//! Runs blocking HTTP calls on tokio's blocking pool so request handlers never
//! stall the runtime.

use crate::client::{UpstreamClient, UpstreamRequest};
use crate::error::{UpstreamError, UpstreamResult};
use async_trait::async_trait;
use std::sync::Arc;

/// Async interface to upstream HTTP.
///
/// Sources and repositories depend on this trait rather than on the concrete
/// client so tests can substitute canned responses.
#[async_trait]
pub trait AsyncUpstreamClient: Send + Sync {
    async fn execute(&self, request: UpstreamRequest) -> UpstreamResult<String>;
}

/// Uses `tokio::task::spawn_blocking` to run synchronous HTTP
/// operations on a dedicated thread pool.
#[derive(Clone)]
pub struct AsyncUpstreamClientImpl {
    client: Arc<UpstreamClient>,
}

impl AsyncUpstreamClientImpl {
    pub fn new(client: UpstreamClient) -> Self {
        Self {
            client: Arc::new(client),
        }
    }
}

#[async_trait]
impl AsyncUpstreamClient for AsyncUpstreamClientImpl {
    async fn execute(&self, request: UpstreamRequest) -> UpstreamResult<String> {
        let client = self.client.clone();

        tokio::task::spawn_blocking(move || client.execute(&request))
            .await
            .map_err(|e| UpstreamError::HttpError(format!("Task join error: {}", e)))?
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metrics::Metrics;
    use std::time::Duration;

    #[tokio::test]
    async fn test_async_client_creation() {
        let client = UpstreamClient::with_timeout(Duration::from_secs(1), Metrics::new());
        let async_client = AsyncUpstreamClientImpl::new(client);

        let _cloned = async_client.clone();
    }

    #[tokio::test]
    async fn test_connection_failure_maps_to_error() {
        let client = UpstreamClient::with_timeout(Duration::from_secs(1), Metrics::new());
        let async_client = AsyncUpstreamClientImpl::new(client);

        // port 9 (discard) on localhost is not expected to accept connections
        let result = async_client
            .execute(UpstreamRequest::get("http://127.0.0.1:9/"))
            .await;
        assert!(result.is_err());
    }
}
