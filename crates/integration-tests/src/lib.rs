//! Integration tests for the QKart storefront.
//!
//! The tests run the real `BackendClient` over HTTP against [`FakeBackend`],
//! an in-process `axum` server that mimics the QKart backend API:
//!
//! - `GET /api/v1/products`
//! - `GET /api/v1/products/search?value=<text>` (404 when nothing matches)
//! - `GET /api/v1/cart` and `POST /api/v1/cart` (bearer token required)
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p qkart-integration-tests
//! ```

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use axum::extract::{Query, State};
use axum::http::{HeaderMap, StatusCode, header};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use qkart_core::{Product, ProductId, RawCartEntry};
use qkart_storefront::config::ConfigError;
use qkart_storefront::{
    ApiError, BackendClient, Notice, Notifier, SessionContext, Storefront, StorefrontConfig,
};
use serde::Deserialize;
use serde_json::json;
use thiserror::Error;
use tokio::net::TcpListener;
use tokio::sync::mpsc::UnboundedReceiver;
use tokio::task::JoinHandle;

/// Debounce used by [`FakeBackend::config`], short enough for real-clock tests.
pub const TEST_DEBOUNCE: Duration = Duration::from_millis(50);

/// Build a catalog product.
#[must_use]
pub fn product(id: &str, name: &str, category: &str, cost: u64) -> Product {
    Product {
        id: ProductId::new(id),
        name: name.to_string(),
        category: category.to_string(),
        cost,
        rating: 4.0,
        image_url: format!("https://images.example.com/{id}.png"),
    }
}

/// Errors setting up a test storefront.
#[derive(Debug, Error)]
pub enum HarnessError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Api(#[from] ApiError),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// A storefront opened by the test harness plus its notice stream.
pub type OpenedStorefront = (Storefront<BackendClient>, UnboundedReceiver<Notice>);

/// Open a storefront for `context` against `config`.
///
/// # Errors
///
/// Returns `HarnessError` if the HTTP client cannot be built.
pub async fn open_storefront(
    config: &StorefrontConfig,
    context: SessionContext,
) -> Result<OpenedStorefront, HarnessError> {
    let api = Arc::new(BackendClient::new(config)?);
    let (notifier, notices) = Notifier::channel();
    let storefront = Storefront::open(api, context, config, notifier).await;
    Ok((storefront, notices))
}

/// Drain every notice received so far.
pub fn drain_notices(notices: &mut UnboundedReceiver<Notice>) -> Vec<Notice> {
    let mut drained = Vec::new();
    while let Ok(notice) = notices.try_recv() {
        drained.push(notice);
    }
    drained
}

/// Configuration pointing at a local port nothing listens on.
///
/// # Errors
///
/// Returns `HarnessError` if no local port can be bound.
pub async fn unreachable_config() -> Result<StorefrontConfig, HarnessError> {
    let listener = TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;
    drop(listener);

    let mut config = StorefrontConfig::default().with_endpoint(&format!("http://{addr}/api/v1"))?;
    config.search_debounce = TEST_DEBOUNCE;
    config.request_timeout = Duration::from_secs(2);
    Ok(config)
}

#[derive(Default)]
struct BackendState {
    products: Vec<Product>,
    carts: HashMap<String, Vec<RawCartEntry>>,
    products_failure: Option<StatusCode>,
    products_garbled: bool,
    search_failure: Option<StatusCode>,
    requests: Vec<String>,
}

type SharedState = Arc<Mutex<BackendState>>;

fn lock(state: &SharedState) -> MutexGuard<'_, BackendState> {
    state.lock().unwrap_or_else(PoisonError::into_inner)
}

/// An in-process QKart backend bound to an ephemeral local port.
///
/// The server is shut down when the value is dropped.
pub struct FakeBackend {
    addr: SocketAddr,
    state: SharedState,
    server: JoinHandle<()>,
}

impl FakeBackend {
    /// Start serving `products`.
    ///
    /// # Errors
    ///
    /// Returns an error if no local port can be bound.
    pub async fn start(products: Vec<Product>) -> std::io::Result<Self> {
        let state: SharedState = Arc::new(Mutex::new(BackendState {
            products,
            ..BackendState::default()
        }));

        let app = Router::new()
            .route("/api/v1/products", get(list_products))
            .route("/api/v1/products/search", get(search_products))
            .route("/api/v1/cart", get(get_cart).post(update_cart))
            .with_state(Arc::clone(&state));

        let listener = TcpListener::bind("127.0.0.1:0").await?;
        let addr = listener.local_addr()?;
        let server = tokio::spawn(async move {
            let _ = axum::serve(listener, app).await;
        });

        Ok(Self {
            addr,
            state,
            server,
        })
    }

    /// Base URL of the fake API.
    #[must_use]
    pub fn endpoint(&self) -> String {
        format!("http://{}/api/v1", self.addr)
    }

    /// Client configuration pointing at this backend.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the endpoint cannot be parsed.
    pub fn config(&self) -> Result<StorefrontConfig, ConfigError> {
        let mut config = StorefrontConfig::default().with_endpoint(&self.endpoint())?;
        config.search_debounce = TEST_DEBOUNCE;
        config.request_timeout = Duration::from_secs(5);
        Ok(config)
    }

    /// Open a storefront for `context` against this backend.
    ///
    /// # Errors
    ///
    /// Returns `HarnessError` if the client cannot be configured.
    pub async fn open(&self, context: SessionContext) -> Result<OpenedStorefront, HarnessError> {
        open_storefront(&self.config()?, context).await
    }

    /// Register a user token with its stored cart.
    pub fn with_cart(&self, token: &str, entries: Vec<RawCartEntry>) {
        lock(&self.state).carts.insert(token.to_string(), entries);
    }

    /// The stored cart of `token`.
    #[must_use]
    pub fn cart_of(&self, token: &str) -> Vec<RawCartEntry> {
        lock(&self.state)
            .carts
            .get(token)
            .cloned()
            .unwrap_or_default()
    }

    /// Make `GET /products` answer with `status`.
    pub fn fail_products(&self, status: StatusCode) {
        lock(&self.state).products_failure = Some(status);
    }

    /// Make `GET /products` answer 200 with a body that is not JSON.
    pub fn garble_products(&self) {
        lock(&self.state).products_garbled = true;
    }

    /// Make `GET /products/search` answer with `status`.
    pub fn fail_search(&self, status: StatusCode) {
        lock(&self.state).search_failure = Some(status);
    }

    /// Requests received so far, as `"METHOD path?query"`.
    #[must_use]
    pub fn requests(&self) -> Vec<String> {
        lock(&self.state).requests.clone()
    }

    /// Requests received so far whose line starts with `prefix`.
    #[must_use]
    pub fn requests_matching(&self, prefix: &str) -> Vec<String> {
        self.requests()
            .into_iter()
            .filter(|r| r.starts_with(prefix))
            .collect()
    }
}

impl Drop for FakeBackend {
    fn drop(&mut self) {
        self.server.abort();
    }
}

// =============================================================================
// Handlers
// =============================================================================

fn failure(status: StatusCode, message: &str) -> Response {
    (status, Json(json!({ "success": false, "message": message }))).into_response()
}

async fn list_products(State(state): State<SharedState>) -> Response {
    let mut state = lock(&state);
    state.requests.push("GET /products".to_string());

    if let Some(status) = state.products_failure {
        return failure(status, "Internal server error");
    }
    if state.products_garbled {
        return (StatusCode::OK, "<html>not json</html>").into_response();
    }
    Json(state.products.clone()).into_response()
}

#[derive(Deserialize)]
struct SearchParams {
    #[serde(default)]
    value: String,
}

async fn search_products(
    State(state): State<SharedState>,
    Query(params): Query<SearchParams>,
) -> Response {
    let mut state = lock(&state);
    state
        .requests
        .push(format!("GET /products/search?value={}", params.value));

    if let Some(status) = state.search_failure {
        return failure(status, "Search index offline");
    }

    let needle = params.value.to_lowercase();
    let matches: Vec<Product> = state
        .products
        .iter()
        .filter(|p| {
            p.name.to_lowercase().contains(&needle) || p.category.to_lowercase().contains(&needle)
        })
        .cloned()
        .collect();

    if matches.is_empty() {
        return (StatusCode::NOT_FOUND, Json(matches)).into_response();
    }
    Json(matches).into_response()
}

fn unauthorized() -> Response {
    failure(
        StatusCode::UNAUTHORIZED,
        "Protected route, Oauth2 Bearer token not found",
    )
}

fn bearer(headers: &HeaderMap) -> Option<String> {
    headers
        .get(header::AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
        .map(str::to_string)
}

async fn get_cart(State(state): State<SharedState>, headers: HeaderMap) -> Response {
    let mut state = lock(&state);
    state.requests.push("GET /cart".to_string());

    match bearer(&headers).and_then(|token| state.carts.get(&token)) {
        Some(cart) => Json(cart.clone()).into_response(),
        None => unauthorized(),
    }
}

async fn update_cart(
    State(state): State<SharedState>,
    headers: HeaderMap,
    Json(entry): Json<RawCartEntry>,
) -> Response {
    let mut state = lock(&state);
    state
        .requests
        .push(format!("POST /cart {} {}", entry.product_id, entry.quantity));

    let known = state.products.iter().any(|p| p.id == entry.product_id);
    let Some(token) = bearer(&headers) else {
        return unauthorized();
    };
    let Some(cart) = state.carts.get_mut(&token) else {
        return unauthorized();
    };
    if !known {
        return failure(StatusCode::NOT_FOUND, "Product doesn't exist");
    }

    match cart.iter().position(|e| e.product_id == entry.product_id) {
        Some(index) if entry.quantity == 0 => {
            cart.remove(index);
        }
        Some(index) => {
            if let Some(existing) = cart.get_mut(index) {
                existing.quantity = entry.quantity;
            }
        }
        None if entry.quantity == 0 => {}
        None => cart.push(entry),
    }
    Json(cart.clone()).into_response()
}
