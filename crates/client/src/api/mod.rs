//! Marketplace REST API client.
//!
//! A thin wrapper over `reqwest` with one method per endpoint. There is no
//! retry, batching or caching; every call carries the configured deadline.
//!
//! # Example
//!
//! ```rust,ignore
//! use ramm_client::{ApiClient, ClientConfig};
//!
//! let config = ClientConfig::from_env()?;
//! let api = ApiClient::from_config(&config)?;
//! let listings = api.list_products(None).await?;
//! ```

mod admin;
mod orders;
mod products;
pub mod types;

use std::sync::Arc;
use std::time::Duration;

use reqwest::{RequestBuilder, Response};
use serde::de::DeserializeOwned;
use tracing::warn;
use url::Url;

pub use orders::PurchaseParams;
pub use products::{ProgressFn, SearchParams};

use crate::config::ClientConfig;
use crate::error::ClientError;
use types::ErrorBody;

/// Marketplace API client.
///
/// Cheap to clone; clones share the connection pool.
#[derive(Clone)]
pub struct ApiClient {
    inner: Arc<ApiClientInner>,
}

struct ApiClientInner {
    client: reqwest::Client,
    base_url: Url,
}

impl ApiClient {
    /// Create a client for `base_url` with a per-request deadline.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client fails to build.
    pub fn new(base_url: Url, timeout: Duration) -> Result<Self, ClientError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ClientError::Network(format!("Failed to build HTTP client: {e}")))?;

        Ok(Self {
            inner: Arc::new(ApiClientInner {
                client,
                base_url: with_trailing_slash(base_url),
            }),
        })
    }

    /// Create a client from the loaded configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client fails to build.
    pub fn from_config(config: &ClientConfig) -> Result<Self, ClientError> {
        Self::new(config.api_base_url.clone(), config.request_timeout)
    }

    /// Base URL requests are resolved against.
    #[must_use]
    pub fn base_url(&self) -> &Url {
        &self.inner.base_url
    }

    /// Resolve an API path (`api/...`) against the base URL.
    fn url(&self, path: &str) -> Result<Url, ClientError> {
        self.inner
            .base_url
            .join(path.trim_start_matches('/'))
            .map_err(|e| ClientError::validation(format!("Invalid request path {path}: {e}")))
    }

    fn http(&self) -> &reqwest::Client {
        &self.inner.client
    }

    /// Send a request, turning error statuses into [`ClientError::Backend`].
    async fn send(&self, request: RequestBuilder) -> Result<Response, ClientError> {
        let response = request.send().await?;
        if response.status().is_success() {
            return Ok(response);
        }
        Err(self.parse_error(response).await)
    }

    /// Send a request and decode the JSON body.
    async fn send_json<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T, ClientError> {
        let response = self.send(request).await?;
        let body = response.bytes().await?;
        serde_json::from_slice(&body)
            .map_err(|e| ClientError::InvalidResponse(format!("Failed to parse response: {e}")))
    }

    /// Parse an error response, preferring the API's `detail` field.
    async fn parse_error(&self, response: Response) -> ClientError {
        let status = response.status();
        let body = response.text().await.unwrap_or_default();

        let detail = match serde_json::from_str::<ErrorBody>(&body) {
            Ok(ErrorBody {
                detail: serde_json::Value::String(detail),
            }) => detail,
            Ok(ErrorBody { detail }) => detail.to_string(),
            Err(_) if !body.trim().is_empty() => body,
            Err(_) => status
                .canonical_reason()
                .unwrap_or("Unknown error")
                .to_string(),
        };

        warn!(status = status.as_u16(), detail = %detail, "API request failed");
        ClientError::Backend {
            status: status.as_u16(),
            detail,
        }
    }
}

impl std::fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiClient")
            .field("base_url", &self.inner.base_url.as_str())
            .finish_non_exhaustive()
    }
}

/// `Url::join` drops the last segment unless the base ends with `/`.
fn with_trailing_slash(mut url: Url) -> Url {
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    url
}
