//! Cart shapes: the backend's minimal entries and the enriched display items.

use serde::{Deserialize, Serialize};

use super::id::ProductId;
use super::product::Product;

/// One line of the authoritative cart as stored by the backend.
///
/// Carries no product details; unique per product within one snapshot.
/// The backend calls the quantity field `qty`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RawCartEntry {
    /// Product this entry refers to.
    #[serde(rename = "productId")]
    pub product_id: ProductId,
    /// Number of units in the cart.
    #[serde(rename = "qty", alias = "quantity")]
    pub quantity: u32,
}

impl RawCartEntry {
    /// Create a new cart entry.
    #[must_use]
    pub fn new(product_id: impl Into<ProductId>, quantity: u32) -> Self {
        Self {
            product_id: product_id.into(),
            quantity,
        }
    }
}

/// A cart line joined with its catalog product, ready for display.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CartItem {
    /// The full catalog product.
    pub product: Product,
    /// Number of units in the cart (always at least one).
    pub quantity: u32,
}

impl CartItem {
    /// Cost of this line: unit cost times quantity.
    #[must_use]
    pub fn line_total(&self) -> u64 {
        self.product.cost.saturating_mul(u64::from(self.quantity))
    }
}
