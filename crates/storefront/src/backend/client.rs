//! `reqwest` implementation of [`StoreApi`].
//!
//! Response bodies are read as text first so failures can be logged with a
//! truncated copy of what the backend actually sent.

use std::sync::Arc;

use qkart_core::{Product, RawCartEntry};
use serde::de::DeserializeOwned;
use tracing::{debug, instrument};
use url::Url;

use super::{ApiError, StoreApi};
use crate::config::StorefrontConfig;
use crate::session::AuthToken;

/// Longest slice of a response body copied into logs.
const LOGGED_BODY_CHARS: usize = 500;

/// HTTP client for the QKart backend.
///
/// Cheaply cloneable; clones share one connection pool.
#[derive(Clone)]
pub struct BackendClient {
    inner: Arc<BackendClientInner>,
}

struct BackendClientInner {
    client: reqwest::Client,
    endpoint: Url,
}

impl std::fmt::Debug for BackendClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BackendClient")
            .field("endpoint", &self.inner.endpoint.as_str())
            .finish_non_exhaustive()
    }
}

impl BackendClient {
    /// Create a new backend client.
    ///
    /// # Errors
    ///
    /// Returns error if the HTTP client fails to build.
    pub fn new(config: &StorefrontConfig) -> Result<Self, ApiError> {
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()?;

        Ok(Self {
            inner: Arc::new(BackendClientInner {
                client,
                endpoint: config.api_endpoint.clone(),
            }),
        })
    }

    /// Base URL every request is resolved against.
    #[must_use]
    pub fn endpoint(&self) -> &Url {
        &self.inner.endpoint
    }

    /// Resolve `path` relative to the configured endpoint.
    fn url(&self, path: &str) -> Result<Url, ApiError> {
        self.inner
            .endpoint
            .join(path)
            .map_err(|e| ApiError::Parse(format!("Invalid request URL '{path}': {e}")))
    }

    /// Map the response status, then decode a JSON body.
    async fn read_json<T: DeserializeOwned>(response: reqwest::Response) -> Result<T, ApiError> {
        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            debug!(
                status = %status,
                body = %truncate(&body),
                "Backend returned non-success status"
            );
            return Err(ApiError::from_status(status, &body));
        }

        serde_json::from_str(&body).map_err(|e| {
            tracing::error!(
                error = %e,
                body = %truncate(&body),
                "Failed to parse backend response"
            );
            ApiError::from(e)
        })
    }
}

impl StoreApi for BackendClient {
    #[instrument(skip(self))]
    async fn fetch_products(&self) -> Result<Vec<Product>, ApiError> {
        let url = self.url("products")?;
        let response = self.inner.client.get(url).send().await?;
        let products: Vec<Product> = Self::read_json(response).await?;
        debug!(count = products.len(), "Fetched catalog");
        Ok(products)
    }

    #[instrument(skip(self, query), fields(query = %query))]
    async fn search_products(&self, query: &str) -> Result<Vec<Product>, ApiError> {
        let mut url = self.url("products/search")?;
        url.query_pairs_mut().append_pair("value", query);

        let response = self.inner.client.get(url).send().await?;
        let products: Vec<Product> = Self::read_json(response).await?;
        debug!(count = products.len(), "Search returned products");
        Ok(products)
    }

    #[instrument(skip(self, token))]
    async fn fetch_cart(&self, token: &AuthToken) -> Result<Vec<RawCartEntry>, ApiError> {
        let url = self.url("cart")?;
        let response = self
            .inner
            .client
            .get(url)
            .bearer_auth(token.expose())
            .send()
            .await?;
        Self::read_json(response).await
    }

    #[instrument(skip(self, token, entry), fields(product_id = %entry.product_id, qty = entry.quantity))]
    async fn update_cart(
        &self,
        token: &AuthToken,
        entry: &RawCartEntry,
    ) -> Result<Vec<RawCartEntry>, ApiError> {
        let url = self.url("cart")?;
        let response = self
            .inner
            .client
            .post(url)
            .bearer_auth(token.expose())
            .json(entry)
            .send()
            .await?;
        Self::read_json(response).await
    }
}

fn truncate(body: &str) -> String {
    body.chars().take(LOGGED_BODY_CHARS).collect()
}
