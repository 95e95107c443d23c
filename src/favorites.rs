// Copyright 2026 AutoHub Garage.

//! Saved products (favorites)
//!
//! Favorites are per-customer rows in the merchant database, fronted on the
//! client by a cache owned by the UI session. The cache loads through on
//! first read and must be explicitly invalidated when the session's identity
//! changes - it is deliberately not a process-wide singleton, so two
//! sessions never observe each other's favorites.

use crate::entity::{CustomerId, ProductId};
use crate::errors::{DomainError, DomainResult};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, RwLock};
use uuid::Uuid;

/// One saved product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Favorite {
    /// Row identifier
    pub id: Uuid,
    /// The saved product
    pub product_id: ProductId,
    /// When the product was saved
    pub created_at: DateTime<Utc>,
}

/// Favorites persistence seam.
#[async_trait]
pub trait FavoritesStore: Send + Sync {
    /// A customer's favorites, newest first.
    async fn list(&self, customer: CustomerId) -> DomainResult<Vec<Favorite>>;

    /// Save a product. Saving twice is idempotent and returns the existing row.
    async fn add(&self, customer: CustomerId, product: ProductId) -> DomainResult<Favorite>;

    /// Remove a saved product. Fails with `NotFound` if it was never saved.
    async fn remove(&self, customer: CustomerId, product: ProductId) -> DomainResult<()>;
}

/// In-memory favorites store for tests and embedding.
#[derive(Default, Clone)]
pub struct InMemoryFavoritesStore {
    rows: Arc<RwLock<HashMap<CustomerId, Vec<Favorite>>>>,
}

impl InMemoryFavoritesStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl FavoritesStore for InMemoryFavoritesStore {
    async fn list(&self, customer: CustomerId) -> DomainResult<Vec<Favorite>> {
        let rows = self.rows.read().unwrap();
        let mut favorites = rows.get(&customer).cloned().unwrap_or_default();
        favorites.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(favorites)
    }

    async fn add(&self, customer: CustomerId, product: ProductId) -> DomainResult<Favorite> {
        let mut rows = self.rows.write().unwrap();
        let favorites = rows.entry(customer).or_default();

        if let Some(existing) = favorites.iter().find(|f| f.product_id == product) {
            return Ok(existing.clone());
        }

        let favorite = Favorite {
            id: Uuid::new_v4(),
            product_id: product,
            created_at: Utc::now(),
        };
        favorites.push(favorite.clone());
        Ok(favorite)
    }

    async fn remove(&self, customer: CustomerId, product: ProductId) -> DomainResult<()> {
        let mut rows = self.rows.write().unwrap();
        let favorites = rows.entry(customer).or_default();
        let before = favorites.len();
        favorites.retain(|f| f.product_id != product);
        if favorites.len() == before {
            return Err(DomainError::NotFound(format!("Favorite {product}")));
        }
        Ok(())
    }
}

/// Session-scoped favorites cache.
///
/// Owned by one UI session. Guests have no favorites; an authenticated
/// session lazily loads the id set once and keeps it in sync with its own
/// writes. [`FavoritesCache::switch_identity`] is the invalidation hook the
/// session calls on login and logout.
pub struct FavoritesCache {
    store: Arc<dyn FavoritesStore>,
    identity: Option<CustomerId>,
    ids: RwLock<Option<HashSet<ProductId>>>,
}

impl FavoritesCache {
    /// Create a cache for the given identity.
    pub fn new(store: Arc<dyn FavoritesStore>, identity: Option<CustomerId>) -> Self {
        Self {
            store,
            identity,
            ids: RwLock::new(None),
        }
    }

    /// The identity the cache is scoped to.
    pub fn identity(&self) -> Option<CustomerId> {
        self.identity
    }

    /// Drop the cached id set; the next read loads through again.
    pub fn invalidate(&self) {
        *self.ids.write().unwrap() = None;
    }

    /// Swap identity and invalidate (the login/logout hook).
    pub fn switch_identity(&mut self, identity: Option<CustomerId>) {
        if identity == self.identity {
            return;
        }
        self.identity = identity;
        self.invalidate();
    }

    /// Whether a product is saved. Always false for guests.
    pub async fn is_favorite(&self, product: ProductId) -> DomainResult<bool> {
        if self.identity.is_none() {
            return Ok(false);
        }
        let ids = self.load_through().await?;
        Ok(ids.contains(&product))
    }

    /// The customer's favorites, newest first. Empty for guests.
    pub async fn list(&self) -> DomainResult<Vec<Favorite>> {
        match self.identity {
            None => Ok(Vec::new()),
            Some(customer) => self.store.list(customer).await,
        }
    }

    /// Save a product.
    pub async fn add(&self, product: ProductId) -> DomainResult<Favorite> {
        let customer = self.require_identity()?;
        let favorite = self.store.add(customer, product).await?;
        if let Some(ids) = self.ids.write().unwrap().as_mut() {
            ids.insert(product);
        }
        Ok(favorite)
    }

    /// Remove a saved product.
    pub async fn remove(&self, product: ProductId) -> DomainResult<()> {
        let customer = self.require_identity()?;
        self.store.remove(customer, product).await?;
        if let Some(ids) = self.ids.write().unwrap().as_mut() {
            ids.remove(&product);
        }
        Ok(())
    }

    /// Save the product if unsaved, remove it otherwise. Returns whether the
    /// product is saved afterwards.
    pub async fn toggle(&self, product: ProductId) -> DomainResult<bool> {
        if self.is_favorite(product).await? {
            self.remove(product).await?;
            Ok(false)
        } else {
            self.add(product).await?;
            Ok(true)
        }
    }

    fn require_identity(&self) -> DomainResult<CustomerId> {
        self.identity.ok_or_else(|| {
            DomainError::AuthenticationError("Sign in to save products".to_string())
        })
    }

    async fn load_through(&self) -> DomainResult<HashSet<ProductId>> {
        if let Some(ids) = self.ids.read().unwrap().as_ref() {
            return Ok(ids.clone());
        }
        let customer = self.require_identity()?;
        let ids: HashSet<ProductId> = self
            .store
            .list(customer)
            .await?
            .into_iter()
            .map(|f| f.product_id)
            .collect();
        *self.ids.write().unwrap() = Some(ids.clone());
        Ok(ids)
    }
}
