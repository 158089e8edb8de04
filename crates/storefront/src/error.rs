//! Cart errors and the translation of failures into user-facing notices.
//!
//! Every failure the engine can hit is caught at a component boundary and
//! turned into a [`Notice`] plus a safe fallback state. This module owns the
//! wording so that internal error details never reach the user.

use qkart_core::ProductId;
use thiserror::Error;

use crate::backend::ApiError;
use crate::notify::Notice;

/// Shown when an add-to-cart is attempted without a session token.
pub const LOGIN_REQUIRED_MESSAGE: &str = "Login to add an item to the Cart";

/// Shown when the catalog "Add to Cart" button is used for a product that is
/// already in the cart.
pub const ALREADY_IN_CART_MESSAGE: &str =
    "Item already in cart. Use the cart sidebar to update quantity or remove item.";

/// Shown when the catalog fetch fails with a server error.
pub const CATALOG_SERVER_ERROR_MESSAGE: &str =
    "Something went wrong. Check the backend console for more details";

/// Shown when products cannot be fetched at all.
pub const PRODUCTS_UNAVAILABLE_MESSAGE: &str = "Could not fetch products. Check that the backend is running, reachable and returns valid JSON.";

/// Shown when cart calls fail for any reason other than a 400 or 404.
pub const CART_UNAVAILABLE_MESSAGE: &str = "Could not fetch cart details. Check that the backend is running, reachable and returns valid JSON.";

/// Outcome of a cart mutation that did not produce a new cart.
#[derive(Debug, Clone, Error)]
pub enum CartError {
    /// No session token; the server was not contacted.
    #[error("Not logged in")]
    Unauthenticated,

    /// Duplicate-add policy refused the request; the server was not
    /// contacted. Expected and user-correctable.
    #[error("Product {0} is already in the cart")]
    AlreadyInCart(ProductId),

    /// The backend call failed; the previous cart is untouched.
    #[error("Cart update failed: {0}")]
    MutationFailed(#[from] ApiError),
}

impl CartError {
    /// Whether re-invoking the same mutation may succeed.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        match self {
            Self::MutationFailed(err) => err.is_retryable(),
            Self::Unauthenticated | Self::AlreadyInCart(_) => false,
        }
    }

    /// Whether the backend reported that the product does not exist.
    /// Terminal for that product id.
    #[must_use]
    pub const fn is_invalid_product(&self) -> bool {
        matches!(self, Self::MutationFailed(ApiError::NotFound(_)))
    }

    /// The notice shown to the user for this outcome.
    #[must_use]
    pub fn notice(&self) -> Notice {
        match self {
            Self::Unauthenticated => Notice::warning(LOGIN_REQUIRED_MESSAGE),
            Self::AlreadyInCart(_) => Notice::warning(ALREADY_IN_CART_MESSAGE),
            Self::MutationFailed(err) => cart_failure_notice(err),
        }
    }
}

/// Notice for a failed `GET /products`.
#[must_use]
pub fn catalog_failure_notice(err: &ApiError) -> Notice {
    match err {
        ApiError::Server { .. } => Notice::error(CATALOG_SERVER_ERROR_MESSAGE),
        _ => Notice::error(PRODUCTS_UNAVAILABLE_MESSAGE),
    }
}

/// Notice for a failed search that still produced a response.
#[must_use]
pub fn search_failure_notice(err: &ApiError) -> Notice {
    if err.is_connectivity() {
        Notice::error(PRODUCTS_UNAVAILABLE_MESSAGE)
    } else {
        Notice::error(err.to_string())
    }
}

/// Notice for a failed `GET /cart` or `POST /cart`.
#[must_use]
pub fn cart_failure_notice(err: &ApiError) -> Notice {
    match err {
        ApiError::BadRequest(message) | ApiError::NotFound(message) => {
            Notice::error(message.clone())
        }
        _ => Notice::error(CART_UNAVAILABLE_MESSAGE),
    }
}
