//! Add-to-cart and quantity updates against `POST /cart`.

use std::sync::Arc;

use qkart_core::{ProductId, RawCartEntry};
use tracing::{debug, instrument};

use super::Cart;
use crate::backend::StoreApi;
use crate::catalog::ProductCatalog;
use crate::error::CartError;
use crate::notify::Notifier;
use crate::session::AuthToken;

/// Whether a mutation may touch a product that is already in the cart.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddPolicy {
    /// Catalog "Add to Cart" buttons: first add only.
    PreventDuplicate,
    /// Cart quantity controls: always allowed, zero included.
    AllowUpdate,
}

/// Sends cart mutations and reconciles the authoritative response.
pub struct CartMutator<A> {
    api: Arc<A>,
    notifier: Notifier,
}

impl<A: StoreApi> CartMutator<A> {
    #[must_use]
    pub const fn new(api: Arc<A>, notifier: Notifier) -> Self {
        Self { api, notifier }
    }

    /// Set `product_id` to `quantity` in the cart.
    ///
    /// Guards run before any network traffic: no token is
    /// [`CartError::Unauthenticated`], and a product already in
    /// `current_cart` under [`AddPolicy::PreventDuplicate`] is
    /// [`CartError::AlreadyInCart`]. Otherwise the backend's response is
    /// reconciled against `catalog` into the new cart. Quantity zero is sent
    /// as-is; the backend decides what it means.
    ///
    /// Every error is also pushed to the notifier. On error the caller keeps
    /// its previous cart.
    ///
    /// # Errors
    ///
    /// Returns `CartError` if a guard refuses the request or the backend call
    /// fails.
    #[instrument(skip(self, token, current_cart, catalog, product_id), fields(product_id = %product_id))]
    pub async fn add_or_update(
        &self,
        token: Option<&AuthToken>,
        current_cart: &[RawCartEntry],
        catalog: &ProductCatalog,
        product_id: &ProductId,
        quantity: u32,
        policy: AddPolicy,
    ) -> Result<Cart, CartError> {
        let result = self
            .send(token, current_cart, catalog, product_id, quantity, policy)
            .await;

        if let Err(err) = &result {
            debug!(error = %err, "Cart mutation not applied");
            self.notifier.notify(err.notice());
        }

        result
    }

    async fn send(
        &self,
        token: Option<&AuthToken>,
        current_cart: &[RawCartEntry],
        catalog: &ProductCatalog,
        product_id: &ProductId,
        quantity: u32,
        policy: AddPolicy,
    ) -> Result<Cart, CartError> {
        let token = token.ok_or(CartError::Unauthenticated)?;

        if policy == AddPolicy::PreventDuplicate
            && current_cart.iter().any(|e| &e.product_id == product_id)
        {
            return Err(CartError::AlreadyInCart(product_id.clone()));
        }

        let entry = RawCartEntry::new(product_id.clone(), quantity);
        let entries = self.api.update_cart(token, &entry).await?;

        Ok(Cart::reconciled(entries, catalog))
    }
}
