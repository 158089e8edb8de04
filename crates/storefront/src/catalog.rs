//! The product catalog fetched once per session.

use std::collections::HashMap;
use std::sync::Arc;

use qkart_core::{Product, ProductId};

/// Ordered, read-only product list with id lookup.
///
/// Cheaply cloneable via `Arc`; every component of a session shares the same
/// snapshot and nothing mutates it after construction.
#[derive(Debug, Clone, Default)]
pub struct ProductCatalog {
    inner: Arc<CatalogInner>,
}

#[derive(Debug, Default)]
struct CatalogInner {
    products: Vec<Product>,
    index: HashMap<ProductId, usize>,
}

impl ProductCatalog {
    /// Build a catalog, keeping backend order.
    ///
    /// If the backend lists an id twice the first occurrence wins lookups.
    #[must_use]
    pub fn new(products: Vec<Product>) -> Self {
        let mut index = HashMap::with_capacity(products.len());
        for (position, product) in products.iter().enumerate() {
            index.entry(product.id.clone()).or_insert(position);
        }

        Self {
            inner: Arc::new(CatalogInner { products, index }),
        }
    }

    /// An empty catalog (e.g. after a failed fetch).
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    /// Look up a product by id.
    #[must_use]
    pub fn get(&self, id: &ProductId) -> Option<&Product> {
        self.inner
            .index
            .get(id)
            .and_then(|&position| self.inner.products.get(position))
    }

    /// Whether `id` is in the catalog.
    #[must_use]
    pub fn contains(&self, id: &ProductId) -> bool {
        self.inner.index.contains_key(id)
    }

    /// All products in backend order.
    #[must_use]
    pub fn products(&self) -> &[Product] {
        &self.inner.products
    }

    /// Iterate over products in backend order.
    pub fn iter(&self) -> std::slice::Iter<'_, Product> {
        self.inner.products.iter()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.products.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.inner.products.is_empty()
    }
}

impl<'a> IntoIterator for &'a ProductCatalog {
    type Item = &'a Product;
    type IntoIter = std::slice::Iter<'a, Product>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl From<Vec<Product>> for ProductCatalog {
    fn from(products: Vec<Product>) -> Self {
        Self::new(products)
    }
}


#[cfg(test)]
mod tests {
    use super::test_support::product;
    use super::*;

    #[test]
    fn test_lookup_and_order() {
        let catalog = ProductCatalog::new(vec![product("B", 50), product("A", 100)]);

        assert_eq!(catalog.len(), 2);
        assert_eq!(catalog.get(&ProductId::new("A")).map(|p| p.cost), Some(100));
        assert!(catalog.get(&ProductId::new("Z")).is_none());

        let ids: Vec<&str> = catalog.iter().map(|p| p.id.as_str()).collect();
        assert_eq!(ids, vec!["B", "A"]);
    }

    #[test]
    fn test_duplicate_ids_first_wins() {
        let catalog = ProductCatalog::new(vec![product("A", 1), product("A", 2)]);
        assert_eq!(catalog.get(&ProductId::new("A")).map(|p| p.cost), Some(1));
    }

    #[test]
    fn test_empty_catalog() {
        let catalog = ProductCatalog::empty();
        assert!(catalog.is_empty());
        assert!(!catalog.contains(&ProductId::new("A")));
    }

    #[test]
    fn test_clones_share_snapshot() {
        let catalog = ProductCatalog::new(vec![product("A", 1)]);
        let clone = catalog.clone();
        assert!(std::ptr::eq(catalog.products(), clone.products()));
    }
}
