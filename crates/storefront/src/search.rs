//! Debounced, race-safe catalog search.
//!
//! # Ordering
//!
//! Every call to [`SearchController::on_query_changed`] starts a new
//! generation and cancels the pending debounce timer. When the timer fires
//! the query is issued; from then on the request runs to completion and is
//! never aborted on the wire. Its response is applied only if its generation
//! is still the latest one when it arrives, so the display always reflects the
//! last query the user typed, not whichever response happened to arrive last.
//!
//! # Outcomes
//!
//! | backend result | display | notice |
//! |---|---|---|
//! | products | the products | - |
//! | 404 | empty | - |
//! | other status | full catalog | error text |
//! | no response / bad JSON | unchanged | "Could not fetch products..." |
//!
//! Empty text is a query too: after the same delay it restores the full
//! catalog, without a network call.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use qkart_core::Product;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, instrument};

use crate::backend::{ApiError, StoreApi};
use crate::catalog::ProductCatalog;
use crate::error::search_failure_notice;
use crate::notify::Notifier;

/// What the product grid is showing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SearchPhase {
    /// No query typed (or cleared): full catalog.
    Idle,
    /// Waiting for the user to stop typing.
    Debouncing,
    /// A request for this query is in flight.
    Loading(String),
    /// The last query matched products.
    Results,
    /// The last query matched nothing.
    NoMatches,
    /// The last query failed; see the notice channel.
    Failed,
}

/// Published search state.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchView {
    pub phase: SearchPhase,
    pub products: Vec<Product>,
}

/// Debounced search over the backend's `/products/search`.
///
/// Must be used from within a Tokio runtime. Dropping the controller cancels
/// a pending (not yet issued) search.
pub struct SearchController<A> {
    inner: Arc<SearchInner<A>>,
}

struct SearchInner<A> {
    api: Arc<A>,
    catalog: ProductCatalog,
    debounce: Duration,
    notifier: Notifier,
    control: Mutex<SearchControl>,
    view: watch::Sender<SearchView>,
}

#[derive(Default)]
struct SearchControl {
    /// Debounce timer of the latest generation, until it fires.
    pending: Option<JoinHandle<()>>,
    /// Bumped on every keystroke.
    generation: u64,
    last_issued: Option<String>,
}

impl<A: StoreApi> SearchController<A> {
    /// Create a controller showing the full `catalog`.
    #[must_use]
    pub fn new(
        api: Arc<A>,
        catalog: ProductCatalog,
        debounce: Duration,
        notifier: Notifier,
    ) -> Self {
        let (view, _) = watch::channel(SearchView {
            phase: SearchPhase::Idle,
            products: catalog.products().to_vec(),
        });

        Self {
            inner: Arc::new(SearchInner {
                api,
                catalog,
                debounce,
                notifier,
                control: Mutex::new(SearchControl::default()),
                view,
            }),
        }
    }

    /// Record a keystroke. Restarts the debounce timer; returns immediately.
    pub fn on_query_changed(&self, text: impl Into<String>) {
        let text = text.into();
        let mut control = self.inner.lock_control();

        if let Some(pending) = control.pending.take() {
            pending.abort();
        }
        control.generation += 1;
        let generation = control.generation;

        let inner = Arc::clone(&self.inner);
        control.pending = Some(tokio::spawn(async move {
            inner.run(generation, text).await;
        }));

        self.inner
            .view
            .send_modify(|view| view.phase = SearchPhase::Debouncing);
    }

    /// Products currently displayed.
    #[must_use]
    pub fn current_display(&self) -> Vec<Product> {
        self.inner.view.borrow().products.clone()
    }

    #[must_use]
    pub fn phase(&self) -> SearchPhase {
        self.inner.view.borrow().phase.clone()
    }

    /// Text of the most recently issued query.
    #[must_use]
    pub fn last_issued_query(&self) -> Option<String> {
        self.inner.lock_control().last_issued.clone()
    }

    /// Watch display changes.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<SearchView> {
        self.inner.view.subscribe()
    }
}

impl<A> Drop for SearchController<A> {
    fn drop(&mut self) {
        let pending = self
            .inner
            .control
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .pending
            .take();
        if let Some(pending) = pending {
            pending.abort();
        }
    }
}

impl<A: StoreApi> SearchInner<A> {
    fn lock_control(&self) -> MutexGuard<'_, SearchControl> {
        self.control.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Debounce, then issue and apply one query.
    #[instrument(skip(self, text), fields(query = %text))]
    async fn run(&self, generation: u64, text: String) {
        tokio::time::sleep(self.debounce).await;

        let query = text.trim();
        if !self.issue(generation, query) || query.is_empty() {
            return;
        }
        debug!("Issuing search");

        match self.api.search_products(query).await {
            Ok(products) if products.is_empty() => {
                self.apply(generation, SearchPhase::NoMatches, Some(products));
            }
            Ok(products) => {
                self.apply(generation, SearchPhase::Results, Some(products));
            }
            Err(ApiError::NotFound(_)) => {
                self.apply(generation, SearchPhase::NoMatches, Some(Vec::new()));
            }
            Err(err) => {
                let fallback =
                    (!err.is_connectivity()).then(|| self.catalog.products().to_vec());
                if self.apply(generation, SearchPhase::Failed, fallback) {
                    self.notifier.notify(search_failure_notice(&err));
                }
            }
        }
    }

    /// Commit `query` as issued if `generation` is still current.
    ///
    /// The generation check, the detach, `last_issued` and the `Loading`
    /// (or, for an empty query, `Idle` with the full catalog) publication
    /// happen under one lock, so a keystroke either supersedes the query
    /// before this point or arrives after it was issued.
    fn issue(&self, generation: u64, query: &str) -> bool {
        let mut control = self.lock_control();
        if control.generation != generation {
            return false;
        }
        // Detach: once issued, the request is not cancellable.
        control.pending = None;
        control.last_issued = Some(query.to_string());

        self.view.send_modify(|view| {
            if query.is_empty() {
                view.phase = SearchPhase::Idle;
                view.products = self.catalog.products().to_vec();
            } else {
                view.phase = SearchPhase::Loading(query.to_string());
            }
        });
        drop(control);
        true
    }

    /// Publish a result if `generation` is still current.
    ///
    /// Returns `false` (and changes nothing) for a superseded generation.
    fn apply(&self, generation: u64, phase: SearchPhase, products: Option<Vec<Product>>) -> bool {
        let control = self.lock_control();
        if control.generation != generation {
            debug!(generation, latest = control.generation, "Discarding stale search result");
            return false;
        }

        self.view.send_modify(|view| {
            view.phase = phase;
            if let Some(products) = products {
                view.products = products;
            }
        });
        drop(control);
        true
    }
}
