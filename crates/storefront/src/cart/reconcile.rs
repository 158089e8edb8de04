//! Join the backend's minimal cart with the local catalog.

use std::collections::HashSet;

use qkart_core::{CartItem, RawCartEntry};
use tracing::warn;

use crate::catalog::ProductCatalog;

/// Produce display-ready cart items from a raw cart.
///
/// - `None` (no token, or the cart fetch failed) yields an empty cart.
/// - Entries whose product is not in `catalog` are dropped. The backend cart
///   and catalog are only eventually consistent, so this is logged but not
///   reported to the user.
/// - Entries with a zero quantity are dropped; a cart item always holds at
///   least one unit.
/// - If the backend repeats a product id, the first entry wins.
/// - Output order follows `raw_cart`.
///
/// Pure: no I/O, and the same inputs always give the same output.
#[must_use]
pub fn reconcile(raw_cart: Option<&[RawCartEntry]>, catalog: &ProductCatalog) -> Vec<CartItem> {
    let Some(raw_cart) = raw_cart else {
        return Vec::new();
    };

    let mut seen = HashSet::with_capacity(raw_cart.len());
    let mut items = Vec::with_capacity(raw_cart.len());

    for entry in raw_cart {
        if entry.quantity == 0 {
            continue;
        }
        let Some(product) = catalog.get(&entry.product_id) else {
            warn!(product_id = %entry.product_id, "Dropping cart entry for product missing from catalog");
            continue;
        };
        if !seen.insert(&entry.product_id) {
            warn!(product_id = %entry.product_id, "Dropping repeated cart entry");
            continue;
        }

        items.push(CartItem {
            product: product.clone(),
            quantity: entry.quantity,
        });
    }

    items
}
