//! Shopping cart synchronized with the backend.
//!
//! # Model
//!
//! The backend stores a minimal cart (`productId` + `qty`). The client joins
//! it with the catalog ([`reconcile`]) to get display items. Local state is
//! never edited in place: every mutation round-trips through `POST /cart` and
//! the response replaces the cart wholesale.
//!
//! # State machine
//!
//! ```text
//! Empty -> Loading -> Ready            (load)
//! Ready -> Mutating -> Ready           (add / update, success or failure)
//! ```
//!
//! A failed mutation returns to `Ready` with the previous cart. Mutations on
//! one [`CartSession`] are serialized: a second click waits for the first
//! response, so the last response applied is always the last one sent.

mod mutator;
mod reconcile;

use std::sync::Arc;

use qkart_core::{CartItem, ProductId, RawCartEntry};
use tokio::sync::{Mutex, watch};
use tracing::{debug, instrument};

use crate::backend::StoreApi;
use crate::catalog::ProductCatalog;
use crate::error::{CartError, cart_failure_notice};
use crate::notify::Notifier;
use crate::session::{AuthToken, SessionContext};

pub use mutator::{AddPolicy, CartMutator};
pub use reconcile::reconcile;

/// An authoritative cart snapshot and its reconciled display items.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Cart {
    entries: Vec<RawCartEntry>,
    items: Vec<CartItem>,
}

impl Cart {
    /// Reconcile backend entries against `catalog`.
    #[must_use]
    pub fn reconciled(entries: Vec<RawCartEntry>, catalog: &ProductCatalog) -> Self {
        let items = reconcile(Some(&entries), catalog);
        Self { entries, items }
    }

    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    /// Entries exactly as the backend returned them, orphans included.
    #[must_use]
    pub fn entries(&self) -> &[RawCartEntry] {
        &self.entries
    }

    /// Display items in backend order.
    #[must_use]
    pub fn items(&self) -> &[CartItem] {
        &self.items
    }

    /// Whether the backend cart holds `product_id`.
    #[must_use]
    pub fn contains(&self, product_id: &ProductId) -> bool {
        self.entries.iter().any(|e| &e.product_id == product_id)
    }

    /// Quantity of `product_id` among the display items.
    #[must_use]
    pub fn quantity_of(&self, product_id: &ProductId) -> Option<u32> {
        self.items
            .iter()
            .find(|i| &i.product.id == product_id)
            .map(|i| i.quantity)
    }

    /// Sum of all line totals.
    #[must_use]
    pub fn total_cost(&self) -> u64 {
        self.items.iter().map(CartItem::line_total).sum()
    }

    /// Number of units across all items.
    #[must_use]
    pub fn total_items(&self) -> u64 {
        self.items.iter().map(|i| u64::from(i.quantity)).sum()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// Where a cart session is in its lifecycle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum CartPhase {
    #[default]
    Empty,
    Loading,
    Ready,
    Mutating,
}

/// Published cart state.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CartView {
    pub phase: CartPhase,
    pub cart: Cart,
}

/// Fetch the raw cart for `token`.
///
/// `None` when there is no token (not an error, nothing is reported) or when
/// the fetch failed (reported through `notifier`).
pub async fn fetch_raw_cart<A: StoreApi>(
    api: &A,
    token: Option<&AuthToken>,
    notifier: &Notifier,
) -> Option<Vec<RawCartEntry>> {
    let token = token?;
    match api.fetch_cart(token).await {
        Ok(entries) => Some(entries),
        Err(err) => {
            notifier.notify(cart_failure_notice(&err));
            None
        }
    }
}

/// The displayed cart of one shopping session.
///
/// Owns the cart state; nothing else writes it. Reads never wait on an
/// in-flight mutation.
pub struct CartSession<A> {
    api: Arc<A>,
    mutator: CartMutator<A>,
    context: SessionContext,
    catalog: ProductCatalog,
    notifier: Notifier,
    state: watch::Sender<CartView>,
    queue: Mutex<()>,
}

impl<A: StoreApi> CartSession<A> {
    /// Create an `Empty` session. Call [`load`](Self::load) to fetch the cart.
    #[must_use]
    pub fn new(
        api: Arc<A>,
        context: SessionContext,
        catalog: ProductCatalog,
        notifier: Notifier,
    ) -> Self {
        let mutator = CartMutator::new(Arc::clone(&api), notifier.clone());
        let (state, _) = watch::channel(CartView::default());

        Self {
            api,
            mutator,
            context,
            catalog,
            notifier,
            state,
            queue: Mutex::new(()),
        }
    }

    /// Create a `Ready` session from an already fetched raw cart.
    #[must_use]
    pub fn from_raw_cart(
        api: Arc<A>,
        context: SessionContext,
        catalog: ProductCatalog,
        notifier: Notifier,
        raw_cart: Option<Vec<RawCartEntry>>,
    ) -> Self {
        let session = Self::new(api, context, catalog, notifier);
        let cart = raw_cart.map_or_else(Cart::empty, |entries| {
            Cart::reconciled(entries, &session.catalog)
        });
        session.publish(CartPhase::Ready, Some(cart));
        session
    }

    /// Fetch the cart from the backend.
    ///
    /// On failure the previous cart is kept and a notice is sent.
    #[instrument(skip(self))]
    pub async fn load(&self) {
        let _turn = self.queue.lock().await;
        self.publish(CartPhase::Loading, None);

        let raw = fetch_raw_cart(&*self.api, self.context.token.as_ref(), &self.notifier).await;
        let cart = raw.map(|entries| Cart::reconciled(entries, &self.catalog));
        debug!(loaded = cart.is_some(), "Cart load finished");

        self.publish(CartPhase::Ready, cart);
    }

    /// Catalog "Add to Cart": one unit, refused if already in the cart.
    ///
    /// # Errors
    ///
    /// See [`CartMutator::add_or_update`].
    pub async fn add_to_cart(&self, product_id: &ProductId) -> Result<(), CartError> {
        self.mutate(product_id, 1, AddPolicy::PreventDuplicate).await
    }

    /// Cart quantity control: set the quantity of a product.
    ///
    /// # Errors
    ///
    /// See [`CartMutator::add_or_update`].
    pub async fn set_quantity(
        &self,
        product_id: &ProductId,
        quantity: u32,
    ) -> Result<(), CartError> {
        self.mutate(product_id, quantity, AddPolicy::AllowUpdate)
            .await
    }

    async fn mutate(
        &self,
        product_id: &ProductId,
        quantity: u32,
        policy: AddPolicy,
    ) -> Result<(), CartError> {
        let _turn = self.queue.lock().await;
        let current = self.state.borrow().cart.entries().to_vec();
        self.publish(CartPhase::Mutating, None);

        let result = self
            .mutator
            .add_or_update(
                self.context.token.as_ref(),
                &current,
                &self.catalog,
                product_id,
                quantity,
                policy,
            )
            .await;

        match result {
            Ok(cart) => {
                self.publish(CartPhase::Ready, Some(cart));
                Ok(())
            }
            Err(err) => {
                self.publish(CartPhase::Ready, None);
                Err(err)
            }
        }
    }

    /// Move to `phase`, replacing the cart when one is given.
    fn publish(&self, phase: CartPhase, cart: Option<Cart>) {
        self.state.send_modify(|view| {
            view.phase = phase;
            if let Some(cart) = cart {
                view.cart = cart;
            }
        });
    }

    /// Current cart snapshot.
    #[must_use]
    pub fn cart(&self) -> Cart {
        self.state.borrow().cart.clone()
    }

    /// Current display items.
    #[must_use]
    pub fn items(&self) -> Vec<CartItem> {
        self.state.borrow().cart.items().to_vec()
    }

    #[must_use]
    pub fn phase(&self) -> CartPhase {
        self.state.borrow().phase
    }

    /// Watch cart changes.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<CartView> {
        self.state.subscribe()
    }

    #[must_use]
    pub const fn context(&self) -> &SessionContext {
        &self.context
    }

    #[must_use]
    pub const fn catalog(&self) -> &ProductCatalog {
        &self.catalog
    }
}
