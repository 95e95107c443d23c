// Copyright 2026 AutoHub Garage.

//! Shopping cart aggregate
//!
//! A cart is a per-identity ordered collection of line items, held on the
//! client and serialized as a whole unit on every mutation. It is not a
//! stored server-side entity: checkout receives a snapshot of it and treats
//! the ledger, not the cart, as authoritative for price and stock.
//!
//! Invariants:
//! - at most one line per product; adding the same product again merges
//!   quantities into the existing line
//! - every line's quantity is at least 1
//! - all lines share one currency, enforced at add time

mod session;
mod store;

pub use session::CartSession;
pub use store::{CartBus, CartChanged, CartStorage, InMemoryCartStorage, LocalCartStore};

use crate::entity::ProductId;
use crate::errors::{DomainError, DomainResult};
use crate::money::{Currency, Money};
use crate::product::Product;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Client-generated line identifier: product id + creation timestamp.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LineItemId(String);

impl LineItemId {
    /// Generate a fresh id for a line holding the given product.
    pub fn generate(product_id: ProductId) -> Self {
        Self(format!(
            "{product_id}-{}",
            chrono::Utc::now().timestamp_millis()
        ))
    }

    /// The raw id value.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for LineItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Denormalized product descriptor captured at add time for offline display.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductSnapshot {
    /// Product identifier
    pub product_id: ProductId,
    /// Name at add time
    pub name: String,
    /// Price at add time - display only, never billed
    pub price: Money,
    /// Stock ceiling at add time - display only, checkout re-validates
    pub stock: u32,
    /// Image URLs at add time
    pub images: Vec<String>,
}

impl From<&Product> for ProductSnapshot {
    fn from(product: &Product) -> Self {
        Self {
            product_id: product.id,
            name: product.name.clone(),
            price: product.price.clone(),
            stock: product.stock,
            images: product.images.clone(),
        }
    }
}

/// One product+quantity+price entry within a cart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartLineItem {
    /// Client-generated line id
    pub id: LineItemId,
    /// The product this line holds
    pub product_id: ProductId,
    /// Units requested, always >= 1
    pub quantity: u32,
    /// Snapshot price captured at add time
    pub price: Money,
    /// Denormalized product descriptor
    pub product: ProductSnapshot,
}

impl CartLineItem {
    /// This line's contribution to the cart total (snapshot price x quantity).
    pub fn line_total(&self) -> DomainResult<Money> {
        self.price.checked_mul(self.quantity)
    }
}

/// A per-identity ordered collection of cart lines.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cart {
    currency: Currency,
    #[serde(
        serialize_with = "serialize_lines",
        deserialize_with = "deserialize_lines"
    )]
    items: IndexMap<ProductId, CartLineItem>,
}

impl Cart {
    /// Create an empty cart in the given currency.
    pub fn new(currency: Currency) -> Self {
        Self {
            currency,
            items: IndexMap::new(),
        }
    }

    /// The cart's currency.
    pub fn currency(&self) -> &Currency {
        &self.currency
    }

    /// Add a product to the cart.
    ///
    /// If a line for the product already exists its quantity grows by
    /// `quantity`; otherwise a new line is appended with a fresh id and the
    /// given snapshot. A zero quantity is a no-op. No stock ceiling is
    /// enforced here - checkout is the authoritative gate.
    pub fn add(&mut self, snapshot: ProductSnapshot, quantity: u32) -> DomainResult<()> {
        if quantity == 0 {
            return Ok(());
        }
        if snapshot.price.currency() != &self.currency {
            return Err(DomainError::ValidationError(format!(
                "Cart currency is {}, product is priced in {}",
                self.currency.code,
                snapshot.price.currency().code
            )));
        }

        match self.items.get_mut(&snapshot.product_id) {
            Some(line) => {
                line.quantity += quantity;
            }
            None => {
                let line = CartLineItem {
                    id: LineItemId::generate(snapshot.product_id),
                    product_id: snapshot.product_id,
                    quantity,
                    price: snapshot.price.clone(),
                    product: snapshot,
                };
                self.items.insert(line.product_id, line);
            }
        }
        Ok(())
    }

    /// Replace a line's quantity.
    ///
    /// Quantities below 1 are a no-op at this layer; removal on decrement to
    /// zero is a UI decision. Returns whether anything changed.
    pub fn update_quantity(&mut self, line_id: &LineItemId, quantity: u32) -> bool {
        if quantity < 1 {
            return false;
        }
        for line in self.items.values_mut() {
            if &line.id == line_id {
                line.quantity = quantity;
                return true;
            }
        }
        false
    }

    /// Delete a line if present. Absence is a no-op, not an error.
    pub fn remove(&mut self, line_id: &LineItemId) -> bool {
        let key = self
            .items
            .iter()
            .find(|(_, line)| &line.id == line_id)
            .map(|(key, _)| *key);
        match key {
            Some(key) => self.items.shift_remove(&key).is_some(),
            None => false,
        }
    }

    /// Empty the cart.
    pub fn clear(&mut self) {
        self.items.clear();
    }

    /// The lines in insertion order.
    pub fn lines(&self) -> impl Iterator<Item = &CartLineItem> {
        self.items.values()
    }

    /// The line holding a product, if any.
    pub fn line_for_product(&self, product_id: ProductId) -> Option<&CartLineItem> {
        self.items.get(&product_id)
    }

    /// Number of distinct lines.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Whether the cart has no lines.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Sum of quantities across lines.
    pub fn item_count(&self) -> u32 {
        self.items.values().map(|line| line.quantity).sum()
    }

    /// Sum of snapshot price x quantity across lines.
    ///
    /// Display only - checkout recomputes totals from the ledger.
    pub fn total(&self) -> Money {
        let minor = self
            .items
            .values()
            .map(|line| line.price.amount_minor().saturating_mul(line.quantity as i128))
            .fold(0i128, i128::saturating_add);
        Money::from_minor(minor, self.currency.clone())
    }
}

fn serialize_lines<S>(
    items: &IndexMap<ProductId, CartLineItem>,
    serializer: S,
) -> Result<S::Ok, S::Error>
where
    S: serde::Serializer,
{
    serializer.collect_seq(items.values())
}

fn deserialize_lines<'de, D>(
    deserializer: D,
) -> Result<IndexMap<ProductId, CartLineItem>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let lines = Vec::<CartLineItem>::deserialize(deserializer)?;
    let mut items = IndexMap::with_capacity(lines.len());
    for line in lines {
        // Persisted blobs are untrusted; duplicate product lines merge
        // rather than breaking the one-line-per-product invariant.
        match items.get_mut(&line.product_id) {
            None => {
                items.insert(line.product_id, line);
            }
            Some(existing) => {
                existing.quantity += line.quantity;
            }
        }
    }
    Ok(items)
}
