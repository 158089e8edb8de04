//! Scriptable in-memory [`StoreApi`] for unit tests.

use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};

use qkart_core::{Product, RawCartEntry};
use tokio::sync::oneshot;

use super::{ApiError, StoreApi};
use crate::session::AuthToken;

/// A backend call as observed by the fake.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    FetchProducts,
    Search(String),
    FetchCart(String),
    UpdateCart(RawCartEntry),
}

/// Fake backend.
///
/// - `fetch_products` answers with the scripted catalog result.
/// - `search_products` answers with the scripted result for the query,
///   or `NotFound` when none was scripted. A gated query waits until its
///   gate is released.
/// - `update_cart` answers with the next scripted response if any, else
///   upserts into its own cart like the real backend (zero removes).
#[derive(Default)]
pub struct FakeApi {
    products: Mutex<Option<Result<Vec<Product>, ApiError>>>,
    searches: Mutex<HashMap<String, Result<Vec<Product>, ApiError>>>,
    gates: Mutex<HashMap<String, oneshot::Receiver<()>>>,
    cart: Mutex<Option<Result<Vec<RawCartEntry>, ApiError>>>,
    update_responses: Mutex<Vec<Result<Vec<RawCartEntry>, ApiError>>>,
    calls: Mutex<Vec<Call>>,
}

fn lock<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl FakeApi {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_products(self, products: Vec<Product>) -> Self {
        *lock(&self.products) = Some(Ok(products));
        self
    }

    pub fn with_products_error(self, err: ApiError) -> Self {
        *lock(&self.products) = Some(Err(err));
        self
    }

    pub fn with_cart(self, entries: Vec<RawCartEntry>) -> Self {
        *lock(&self.cart) = Some(Ok(entries));
        self
    }

    pub fn with_cart_error(self, err: ApiError) -> Self {
        *lock(&self.cart) = Some(Err(err));
        self
    }

    pub fn with_search(self, query: &str, result: Result<Vec<Product>, ApiError>) -> Self {
        lock(&self.searches).insert(query.to_string(), result);
        self
    }

    /// Make searches for `query` wait until the returned sender fires.
    pub fn gate_search(&self, query: &str) -> oneshot::Sender<()> {
        let (tx, rx) = oneshot::channel();
        lock(&self.gates).insert(query.to_string(), rx);
        tx
    }

    /// Queue a response for the next `update_cart` call.
    pub fn push_update_response(&self, response: Result<Vec<RawCartEntry>, ApiError>) {
        lock(&self.update_responses).insert(0, response);
    }

    pub fn calls(&self) -> Vec<Call> {
        lock(&self.calls).clone()
    }

    pub fn search_calls(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                Call::Search(query) => Some(query),
                _ => None,
            })
            .collect()
    }

    pub fn update_calls(&self) -> usize {
        self.calls()
            .iter()
            .filter(|call| matches!(call, Call::UpdateCart(_)))
            .count()
    }

    fn record(&self, call: Call) {
        lock(&self.calls).push(call);
    }
}

impl StoreApi for FakeApi {
    async fn fetch_products(&self) -> Result<Vec<Product>, ApiError> {
        self.record(Call::FetchProducts);
        lock(&self.products).clone().unwrap_or_else(|| Ok(Vec::new()))
    }

    async fn search_products(&self, query: &str) -> Result<Vec<Product>, ApiError> {
        self.record(Call::Search(query.to_string()));

        let gate = lock(&self.gates).remove(query);
        if let Some(gate) = gate {
            let _ = gate.await;
        }

        lock(&self.searches)
            .get(query)
            .cloned()
            .unwrap_or_else(|| Err(ApiError::NotFound(String::new())))
    }

    async fn fetch_cart(&self, token: &AuthToken) -> Result<Vec<RawCartEntry>, ApiError> {
        self.record(Call::FetchCart(token.expose().to_string()));
        lock(&self.cart).clone().unwrap_or_else(|| Ok(Vec::new()))
    }

    async fn update_cart(
        &self,
        _token: &AuthToken,
        entry: &RawCartEntry,
    ) -> Result<Vec<RawCartEntry>, ApiError> {
        self.record(Call::UpdateCart(entry.clone()));

        if let Some(response) = lock(&self.update_responses).pop() {
            return response;
        }

        let mut cart = lock(&self.cart);
        let mut entries = match cart.take() {
            Some(Ok(entries)) => entries,
            _ => Vec::new(),
        };
        if let Some(existing) = entries
            .iter_mut()
            .find(|e| e.product_id == entry.product_id)
        {
            existing.quantity = entry.quantity;
        } else {
            entries.push(entry.clone());
        }
        entries.retain(|e| e.quantity > 0);
        *cart = Some(Ok(entries.clone()));
        Ok(entries)
    }
}
