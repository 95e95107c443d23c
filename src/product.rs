// Copyright 2026 AutoHub Garage.

//! Product ledger: authoritative price and stock
//!
//! Products live in the merchant's hosted database; this core reads them in
//! batches during checkout and writes them through exactly one path, the
//! stock decrement. The ledger seam is async because every call is a network
//! round-trip in production. `InMemoryProductLedger` is the reference
//! implementation used by tests and embedders without a database.

use crate::entity::{CategoryId, ProductId};
use crate::errors::{DomainError, DomainResult};
use crate::money::Money;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

/// A product row as the ledger sees it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    /// Product identifier
    pub id: ProductId,
    /// Display name
    pub name: String,
    /// Optional long description
    pub description: Option<String>,
    /// Authoritative price - the only price checkout will bill
    pub price: Money,
    /// Units on hand
    pub stock: u32,
    /// Image URLs
    pub images: Vec<String>,
    /// Owning category, if categorized
    pub category_id: Option<CategoryId>,
    /// Inactive products are invisible to checkout
    pub is_active: bool,
    /// Merchandising flag for the storefront landing page
    pub is_best_selling: bool,
}

impl Product {
    /// Create an active product with the given name, price and stock.
    pub fn new(name: impl Into<String>, price: Money, stock: u32) -> Self {
        Self {
            id: ProductId::new(),
            name: name.into(),
            description: None,
            price,
            stock,
            images: Vec::new(),
            category_id: None,
            is_active: true,
            is_best_selling: false,
        }
    }
}

/// The authoritative price/stock ledger seam.
#[async_trait]
pub trait ProductLedger: Send + Sync {
    /// Batch-fetch the referenced products, filtered to active ones.
    ///
    /// Missing or inactive ids are simply absent from the result; the caller
    /// decides whether absence is an error.
    async fn fetch_active(&self, ids: &[ProductId]) -> DomainResult<Vec<Product>>;

    /// Conditionally decrement stock for every line, all or nothing.
    ///
    /// Succeeds only if every product exists with `stock >= quantity` at
    /// decrement time; otherwise nothing is applied and the first losing
    /// line is reported as a `StockConflict`. This is the compare-and-swap
    /// that closes the window between checkout's validation read and its
    /// stock write.
    async fn decrement_stock_all(&self, lines: &[(ProductId, u32)]) -> DomainResult<()>;

    /// Add stock back for every line (cancellation restoration).
    async fn restore_stock_all(&self, lines: &[(ProductId, u32)]) -> DomainResult<()>;
}

/// In-memory ledger for tests and embedding.
#[derive(Default, Clone)]
pub struct InMemoryProductLedger {
    products: Arc<RwLock<HashMap<ProductId, Product>>>,
}

impl InMemoryProductLedger {
    /// Create an empty ledger.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a product row.
    pub fn upsert(&self, product: Product) {
        self.products
            .write()
            .unwrap()
            .insert(product.id, product);
    }

    /// Read a single product row, active or not.
    pub fn get(&self, id: ProductId) -> Option<Product> {
        self.products.read().unwrap().get(&id).cloned()
    }

    /// Current stock for a product, if it exists.
    pub fn stock_of(&self, id: ProductId) -> Option<u32> {
        self.products.read().unwrap().get(&id).map(|p| p.stock)
    }
}

#[async_trait]
impl ProductLedger for InMemoryProductLedger {
    async fn fetch_active(&self, ids: &[ProductId]) -> DomainResult<Vec<Product>> {
        let products = self.products.read().unwrap();
        Ok(ids
            .iter()
            .filter_map(|id| products.get(id))
            .filter(|p| p.is_active)
            .cloned()
            .collect())
    }

    async fn decrement_stock_all(&self, lines: &[(ProductId, u32)]) -> DomainResult<()> {
        // Check and apply under one write lock so concurrent checkouts
        // serialize here rather than both passing a stale validation read.
        let mut products = self.products.write().unwrap();

        for (id, quantity) in lines {
            match products.get(id) {
                Some(product) if product.stock >= *quantity => {}
                Some(product) => {
                    return Err(DomainError::StockConflict {
                        product_id: id.to_string(),
                        requested: *quantity,
                        available: product.stock,
                    });
                }
                None => {
                    return Err(DomainError::EntityNotFound {
                        entity_type: "Product".to_string(),
                        id: id.to_string(),
                    });
                }
            }
        }

        for (id, quantity) in lines {
            if let Some(product) = products.get_mut(id) {
                product.stock -= *quantity;
            }
        }

        Ok(())
    }

    async fn restore_stock_all(&self, lines: &[(ProductId, u32)]) -> DomainResult<()> {
        let mut products = self.products.write().unwrap();

        for (id, quantity) in lines {
            match products.get_mut(id) {
                Some(product) => product.stock = product.stock.saturating_add(*quantity),
                None => {
                    tracing::warn!(product_id = %id, "cannot restore stock for missing product");
                }
            }
        }

        Ok(())
    }
}
