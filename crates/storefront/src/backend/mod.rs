//! QKart backend API access.
//!
//! # Architecture
//!
//! - [`StoreApi`] is the seam between the synchronization engine and the
//!   network. Components are generic over it so tests can substitute a fake.
//! - [`BackendClient`] is the production implementation over `reqwest`.
//! - The backend is the source of truth for the cart - NO local mutation,
//!   every change round-trips and the response replaces local state.
//!
//! # Endpoints
//!
//! - `GET /products` - full catalog
//! - `GET /products/search?value=<text>` - filtered catalog, 404 when empty
//! - `GET /cart` - raw cart for the bearer token
//! - `POST /cart` - add or update one entry, returns the new raw cart

mod client;
#[cfg(test)]
pub(crate) mod fake;

use std::future::Future;

use qkart_core::{Product, RawCartEntry};
use serde::Deserialize;
use thiserror::Error;

use crate::session::AuthToken;

pub use client::BackendClient;

/// Errors that can occur when talking to the QKart backend.
#[derive(Debug, Clone, Error)]
pub enum ApiError {
    /// No response at all: connection refused, DNS failure, timeout.
    #[error("Backend unavailable: {0}")]
    BackendUnavailable(String),

    /// The backend answered 404.
    #[error("Not found: {0}")]
    NotFound(String),

    /// The backend rejected the bearer token (401).
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// The backend rejected the request (400).
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Any other non-success status, typically 5xx.
    #[error("Server error ({status}): {message}")]
    Server { status: u16, message: String },

    /// The response body was not the expected JSON.
    #[error("Parse error: {0}")]
    Parse(String),
}

impl ApiError {
    /// Whether re-invoking the same operation may succeed.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(self, Self::BackendUnavailable(_) | Self::Server { .. })
    }

    /// Whether the backend produced no usable response (unreachable, or
    /// not valid JSON).
    #[must_use]
    pub const fn is_connectivity(&self) -> bool {
        matches!(self, Self::BackendUnavailable(_) | Self::Parse(_))
    }

    /// HTTP status the backend answered with, if it answered.
    #[must_use]
    pub const fn status(&self) -> Option<u16> {
        match self {
            Self::NotFound(_) => Some(404),
            Self::Unauthorized(_) => Some(401),
            Self::BadRequest(_) => Some(400),
            Self::Server { status, .. } => Some(*status),
            Self::BackendUnavailable(_) | Self::Parse(_) => None,
        }
    }

    /// Build an error from a non-success status and the raw response body.
    ///
    /// The backend reports failures as `{"success": false, "message": "..."}`;
    /// the message is used when present, otherwise the status reason phrase.
    #[must_use]
    pub fn from_status(status: reqwest::StatusCode, body: &str) -> Self {
        let message = serde_json::from_str::<ErrorBody>(body)
            .ok()
            .and_then(|b| b.message)
            .filter(|m| !m.is_empty())
            .unwrap_or_else(|| {
                status
                    .canonical_reason()
                    .unwrap_or("Unknown error")
                    .to_string()
            });

        match status {
            reqwest::StatusCode::NOT_FOUND => Self::NotFound(message),
            reqwest::StatusCode::UNAUTHORIZED => Self::Unauthorized(message),
            reqwest::StatusCode::BAD_REQUEST => Self::BadRequest(message),
            other => Self::Server {
                status: other.as_u16(),
                message,
            },
        }
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            Self::Parse(err.to_string())
        } else {
            Self::BackendUnavailable(err.to_string())
        }
    }
}

impl From<serde_json::Error> for ApiError {
    fn from(err: serde_json::Error) -> Self {
        Self::Parse(err.to_string())
    }
}

/// Failure body returned by the backend.
#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: Option<String>,
}

/// Operations the synchronization engine needs from the backend.
///
/// These are the only suspension points of the engine. Implementations must
/// return `Send` futures so the search controller can run them on spawned
/// tasks.
pub trait StoreApi: Send + Sync + 'static {
    /// Fetch the full product catalog.
    fn fetch_products(&self) -> impl Future<Output = Result<Vec<Product>, ApiError>> + Send;

    /// Search the catalog. A search with no matches is `ApiError::NotFound`.
    fn search_products(
        &self,
        query: &str,
    ) -> impl Future<Output = Result<Vec<Product>, ApiError>> + Send;

    /// Fetch the authoritative cart for `token`.
    fn fetch_cart(
        &self,
        token: &AuthToken,
    ) -> impl Future<Output = Result<Vec<RawCartEntry>, ApiError>> + Send;

    /// Add or update one cart entry; returns the new authoritative cart.
    fn update_cart(
        &self,
        token: &AuthToken,
        entry: &RawCartEntry,
    ) -> impl Future<Output = Result<Vec<RawCartEntry>, ApiError>> + Send;
}
