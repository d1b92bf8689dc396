//! core::catalog
//!
//! The product catalog: the owned set of data products.
//!
//! # Architecture
//!
//! Products are held in insertion order in a `Vec`, with a name index for
//! O(1) lookup. Listing iterates the vector so results are deterministic
//! and order-stable across identical calls.
//!
//! # Invariants
//!
//! - Names are unique across the catalog; delete + recreate yields a
//!   fresh record, never a resurrection of the old one
//! - `updated_at >= created_at` for every product
//! - The catalog never exceeds its configured capacity

use std::collections::HashMap;
use thiserror::Error;

use super::product::{DataProduct, ProductDraft, ProductPatch};
use super::types::{Page, ProductName, ProductStatus, UtcTimestamp};

/// Errors from catalog operations.
#[derive(Debug, Error, PartialEq)]
pub enum CatalogError {
    /// A product with this name is already registered.
    #[error("product already exists: {0}")]
    DuplicateName(ProductName),

    /// No product with this name is registered.
    #[error("product not found: {0}")]
    NotFound(ProductName),

    /// The catalog is at its configured maximum size.
    #[error("maximum number of products ({limit}) reached")]
    CapacityExceeded {
        /// The configured maximum.
        limit: usize,
    },
}

/// Equality filter for catalog listing.
///
/// `None` fields match everything.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProductFilter {
    /// Match products in this domain.
    pub domain: Option<String>,
    /// Match products with this status.
    pub status: Option<ProductStatus>,
    /// Match products carrying this tag (normalized form).
    pub tag: Option<String>,
}

impl ProductFilter {
    fn matches(&self, product: &DataProduct) -> bool {
        if let Some(domain) = &self.domain {
            if !product.domain.eq_ignore_ascii_case(domain) {
                return false;
            }
        }
        if let Some(status) = self.status {
            if product.status != status {
                return false;
            }
        }
        if let Some(tag) = &self.tag {
            if !product.tags.contains(&tag.to_lowercase()) {
                return false;
            }
        }
        true
    }
}

/// The product catalog.
///
/// Owns every registered [`DataProduct`] and enforces name uniqueness
/// and the capacity limit. Persistence is not the catalog's concern:
/// the engine snapshots and restores it as a whole.
#[derive(Debug, Default)]
pub struct ProductCatalog {
    /// Products in insertion order.
    products: Vec<DataProduct>,
    /// Name to position in `products`.
    index: HashMap<ProductName, usize>,
    /// Maximum number of products, if bounded.
    capacity: Option<usize>,
}

impl ProductCatalog {
    /// Create an empty, unbounded catalog.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty catalog holding at most `capacity` products.
    pub fn with_capacity_limit(capacity: usize) -> Self {
        Self {
            capacity: Some(capacity),
            ..Self::default()
        }
    }

    /// Number of registered products.
    pub fn len(&self) -> usize {
        self.products.len()
    }

    /// True if no products are registered.
    pub fn is_empty(&self) -> bool {
        self.products.is_empty()
    }

    /// Register a new product from a draft.
    ///
    /// Stamps `created_at = updated_at = now` and normalizes tags.
    ///
    /// # Errors
    ///
    /// - [`CatalogError::CapacityExceeded`] if the catalog is full
    /// - [`CatalogError::DuplicateName`] if the name is taken
    pub fn create(&mut self, draft: ProductDraft) -> Result<&DataProduct, CatalogError> {
        if let Some(limit) = self.capacity {
            if self.products.len() >= limit {
                return Err(CatalogError::CapacityExceeded { limit });
            }
        }
        if self.index.contains_key(&draft.name) {
            return Err(CatalogError::DuplicateName(draft.name));
        }

        let product = draft.into_product(UtcTimestamp::now());
        self.index.insert(product.name.clone(), self.products.len());
        self.products.push(product);
        Ok(self.products.last().expect("just pushed"))
    }

    /// Apply a partial update to a product.
    ///
    /// Omitted patch fields keep their prior value; `updated_at`
    /// advances strictly past its prior value, even when the clock is
    /// too coarse to have moved. The name itself is never mutable.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::NotFound`] if the name is not registered.
    pub fn update(
        &mut self,
        name: &ProductName,
        patch: ProductPatch,
    ) -> Result<&DataProduct, CatalogError> {
        let pos = *self
            .index
            .get(name)
            .ok_or_else(|| CatalogError::NotFound(name.clone()))?;
        let product = &mut self.products[pos];
        patch.apply_to(product);
        // A coarse or stepped-back clock can repeat an instant; updates
        // must still move updated_at strictly forward.
        product.updated_at = UtcTimestamp::now().max(product.updated_at.next());
        Ok(&self.products[pos])
    }

    /// Remove a product.
    ///
    /// Lineage edges referencing the name are untouched; they become
    /// dangling references owned by the graph.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::NotFound`] if the name is not registered.
    pub fn delete(&mut self, name: &ProductName) -> Result<DataProduct, CatalogError> {
        let pos = self
            .index
            .remove(name)
            .ok_or_else(|| CatalogError::NotFound(name.clone()))?;
        let removed = self.products.remove(pos);
        // Positions after the removed entry shift down by one.
        for (i, product) in self.products.iter().enumerate().skip(pos) {
            self.index.insert(product.name.clone(), i);
        }
        Ok(removed)
    }

    /// Look up a product by name.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::NotFound`] if the name is not registered.
    pub fn get(&self, name: &ProductName) -> Result<&DataProduct, CatalogError> {
        self.index
            .get(name)
            .map(|&pos| &self.products[pos])
            .ok_or_else(|| CatalogError::NotFound(name.clone()))
    }

    /// True if a product with this name is registered.
    pub fn contains(&self, name: &ProductName) -> bool {
        self.index.contains_key(name)
    }

    /// List products matching `filter`, in insertion order, windowed by `page`.
    ///
    /// The page limit must already be clamped by the caller.
    pub fn list(&self, filter: &ProductFilter, page: Page) -> Vec<&DataProduct> {
        page.apply(self.products.iter().filter(|p| filter.matches(p)))
    }

    /// Iterate all products in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &DataProduct> {
        self.products.iter()
    }

    /// Replace the catalog contents from a restored snapshot.
    ///
    /// Insertion order follows the input order. The capacity limit is
    /// kept as configured, even if the snapshot exceeds it; only new
    /// registrations are capacity-checked.
    pub(crate) fn restore(&mut self, products: Vec<DataProduct>) {
        self.index = products
            .iter()
            .enumerate()
            .map(|(i, p)| (p.name.clone(), i))
            .collect();
        self.products = products;
    }

    /// Clone the full product list in insertion order, for snapshotting.
    pub(crate) fn to_vec(&self) -> Vec<DataProduct> {
        self.products.clone()
    }
}
