//! Per-session storefront state: catalog, cart and search wired together.

use std::sync::Arc;

use qkart_core::Product;
use tracing::{info, instrument};

use crate::backend::StoreApi;
use crate::cart::{CartSession, fetch_raw_cart};
use crate::catalog::ProductCatalog;
use crate::config::StorefrontConfig;
use crate::error::catalog_failure_notice;
use crate::notify::Notifier;
use crate::search::SearchController;
use crate::session::SessionContext;

/// Everything one storefront page session needs.
///
/// Cheaply cloneable via `Arc`.
pub struct Storefront<A> {
    inner: Arc<StorefrontInner<A>>,
}

impl<A> Clone for Storefront<A> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

struct StorefrontInner<A> {
    catalog: ProductCatalog,
    cart: CartSession<A>,
    search: SearchController<A>,
}

impl<A: StoreApi> Storefront<A> {
    /// Load a storefront session.
    ///
    /// The catalog and cart are fetched concurrently; the cart is reconciled
    /// only once both have completed. Failures are reported through
    /// `notifier` and degrade to an empty catalog / empty cart.
    #[instrument(skip_all, fields(authenticated = context.is_authenticated()))]
    pub async fn open(
        api: Arc<A>,
        context: SessionContext,
        config: &StorefrontConfig,
        notifier: Notifier,
    ) -> Self {
        let (products, raw_cart) = tokio::join!(
            fetch_catalog(&*api, &notifier),
            fetch_raw_cart(&*api, context.token.as_ref(), &notifier),
        );

        let catalog = ProductCatalog::new(products);
        let cart = CartSession::from_raw_cart(
            Arc::clone(&api),
            context,
            catalog.clone(),
            notifier.clone(),
            raw_cart,
        );
        let search =
            SearchController::new(api, catalog.clone(), config.search_debounce, notifier);

        info!(
            products = catalog.len(),
            cart_items = cart.cart().items().len(),
            "Storefront session ready"
        );

        Self {
            inner: Arc::new(StorefrontInner {
                catalog,
                cart,
                search,
            }),
        }
    }

    /// The full catalog fetched at open.
    #[must_use]
    pub fn catalog(&self) -> &ProductCatalog {
        &self.inner.catalog
    }

    /// The session's cart.
    #[must_use]
    pub fn cart(&self) -> &CartSession<A> {
        &self.inner.cart
    }

    /// The session's search controller.
    #[must_use]
    pub fn search(&self) -> &SearchController<A> {
        &self.inner.search
    }

    /// Who is shopping.
    #[must_use]
    pub fn context(&self) -> &SessionContext {
        self.inner.cart.context()
    }
}

/// Fetch the catalog; on failure report it and fall back to no products.
async fn fetch_catalog<A: StoreApi>(api: &A, notifier: &Notifier) -> Vec<Product> {
    match api.fetch_products().await {
        Ok(products) => products,
        Err(err) => {
            notifier.notify(catalog_failure_notice(&err));
            Vec::new()
        }
    }
}
