//! Catalog product as returned by `GET /products`.

use serde::{Deserialize, Serialize};

use super::id::ProductId;

/// A product in the store catalog.
///
/// Products are immutable once fetched. The backend names the identifier
/// `_id` and the image URL `image`; both are renamed here.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    /// Server-assigned unique identifier.
    #[serde(rename = "_id", alias = "id")]
    pub id: ProductId,
    /// Display name.
    pub name: String,
    /// Category the product belongs to.
    pub category: String,
    /// Price in whole currency units.
    pub cost: u64,
    /// Aggregate rating out of five.
    pub rating: f64,
    /// Product image URL.
    #[serde(rename = "image", alias = "imageUrl")]
    pub image_url: String,
}

impl Product {
    /// Rating clamped to the `0..=5` range for display.
    #[must_use]
    pub fn display_rating(&self) -> f64 {
        self.rating.clamp(0.0, 5.0)
    }
}
