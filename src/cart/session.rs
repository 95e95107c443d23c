// Copyright 2026 AutoHub Garage.

//! UI-facing cart operations
//!
//! `CartSession` wraps a [`LocalCartStore`](super::LocalCartStore) with the
//! loading/error flags a view layer binds to. Operations funnel through the
//! store and re-raise errors to the caller while also recording them for
//! passive display. Switching identity swaps to that identity's bucket - a
//! different, independent cart; the two are never merged.

use super::{Cart, CartBus, CartStorage, LineItemId, LocalCartStore, ProductSnapshot};
use crate::errors::DomainResult;
use crate::identity::CustomerIdentity;
use crate::money::{Currency, Money};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, RwLock};

/// Session-scoped cart state for one browsing context.
pub struct CartSession {
    storage: Arc<dyn CartStorage>,
    bus: CartBus,
    currency: Currency,
    identity: CustomerIdentity,
    store: LocalCartStore,
    error: RwLock<Option<String>>,
    loading: AtomicBool,
}

impl CartSession {
    /// Open a session for the given identity.
    pub fn new(
        storage: Arc<dyn CartStorage>,
        bus: CartBus,
        currency: Currency,
        identity: CustomerIdentity,
    ) -> Self {
        let store = LocalCartStore::open(storage.clone(), bus.clone(), &identity, currency.clone());
        Self {
            storage,
            bus,
            currency,
            identity,
            store,
            error: RwLock::new(None),
            loading: AtomicBool::new(false),
        }
    }

    /// The identity this session shops as.
    pub fn identity(&self) -> CustomerIdentity {
        self.identity
    }

    /// The underlying store (for subscribing to change signals).
    pub fn store(&self) -> &LocalCartStore {
        &self.store
    }

    /// The last recorded error, for passive display.
    pub fn error(&self) -> Option<String> {
        self.error.read().unwrap().clone()
    }

    /// Clear the recorded error.
    pub fn clear_error(&self) {
        *self.error.write().unwrap() = None;
    }

    /// Whether an operation is in flight.
    pub fn is_loading(&self) -> bool {
        self.loading.load(Ordering::SeqCst)
    }

    /// Point-in-time cart contents.
    pub fn items(&self) -> Cart {
        self.store.snapshot()
    }

    /// Sum of quantities across lines.
    pub fn item_count(&self) -> u32 {
        self.store.item_count()
    }

    /// Display total from snapshot prices.
    pub fn total(&self) -> Money {
        self.store.total()
    }

    /// Add a product to the cart.
    pub fn add_to_cart(&self, snapshot: ProductSnapshot, quantity: u32) -> DomainResult<()> {
        self.run(|store| store.add(snapshot, quantity))
    }

    /// Replace a line's quantity (quantities below 1 are ignored).
    pub fn update_quantity(&self, line_id: &LineItemId, quantity: u32) {
        let _ = self.run(|store| {
            store.update_quantity(line_id, quantity);
            Ok(())
        });
    }

    /// Remove a line from the cart.
    pub fn remove_from_cart(&self, line_id: &LineItemId) {
        let _ = self.run(|store| {
            store.remove(line_id);
            Ok(())
        });
    }

    /// Empty the cart (after a successful checkout).
    pub fn clear_cart(&self) {
        let _ = self.run(|store| {
            store.clear();
            Ok(())
        });
    }

    /// Re-read the persisted cart (on a change signal from another context).
    pub fn refresh(&self) {
        self.store.reload();
    }

    /// Swap to another identity's cart bucket.
    ///
    /// Login and logout land here: the session re-synchronizes against the
    /// new bucket and the previous bucket's contents stay behind, untouched.
    pub fn switch_identity(&mut self, identity: CustomerIdentity) {
        if identity == self.identity {
            return;
        }
        self.identity = identity;
        self.store = LocalCartStore::open(
            self.storage.clone(),
            self.bus.clone(),
            &self.identity,
            self.currency.clone(),
        );
        self.clear_error();
    }

    fn run<T>(&self, op: impl FnOnce(&LocalCartStore) -> DomainResult<T>) -> DomainResult<T> {
        self.loading.store(true, Ordering::SeqCst);
        self.clear_error();
        let result = op(&self.store);
        if let Err(err) = &result {
            *self.error.write().unwrap() = Some(err.to_string());
        }
        self.loading.store(false, Ordering::SeqCst);
        result
    }
}

#[cfg(test)]
mod tests {
    use super::super::InMemoryCartStorage;
    use super::*;
    use crate::entity::CustomerId;
    use crate::money::Money;
    use crate::product::Product;

    fn snapshot(price_minor: i128) -> ProductSnapshot {
        let product = Product::new(
            "Air filter",
            Money::from_minor(price_minor, Currency::ugx()),
            10,
        );
        ProductSnapshot::from(&product)
    }

    fn guest_session(storage: &Arc<dyn CartStorage>, bus: &CartBus) -> CartSession {
        CartSession::new(
            storage.clone(),
            bus.clone(),
            Currency::ugx(),
            CustomerIdentity::Guest,
        )
    }

    #[test]
    fn test_operations_funnel_through_store() {
        let storage: Arc<dyn CartStorage> = Arc::new(InMemoryCartStorage::new());
        let bus = CartBus::default();
        let session = guest_session(&storage, &bus);

        session.add_to_cart(snapshot(1000), 2).unwrap();
        assert_eq!(session.item_count(), 2);
        assert_eq!(session.total().amount_minor(), 2000);
        assert!(!session.is_loading());
        assert!(session.error().is_none());
    }

    #[test]
    fn test_errors_are_recorded_and_raised() {
        let storage: Arc<dyn CartStorage> = Arc::new(InMemoryCartStorage::new());
        let bus = CartBus::default();
        let session = guest_session(&storage, &bus);

        let foreign = Product::new(
            "Imported part",
            Money::from_minor(100, Currency::new("USD", 2)),
            1,
        );
        let result = session.add_to_cart(ProductSnapshot::from(&foreign), 1);

        assert!(result.is_err());
        assert!(session.error().is_some());

        session.clear_error();
        assert!(session.error().is_none());
    }

    #[test]
    fn test_switch_identity_swaps_buckets_without_merging() {
        let storage: Arc<dyn CartStorage> = Arc::new(InMemoryCartStorage::new());
        let bus = CartBus::default();
        let mut session = guest_session(&storage, &bus);

        session.add_to_cart(snapshot(1000), 2).unwrap();
        assert_eq!(session.item_count(), 2);

        // Login: the customer's own (empty) cart takes over
        let customer = CustomerIdentity::Customer(CustomerId::new());
        session.switch_identity(customer);
        assert_eq!(session.identity(), customer);
        assert_eq!(session.item_count(), 0);

        // Logout: the guest cart is still waiting in its bucket
        session.switch_identity(CustomerIdentity::Guest);
        assert_eq!(session.item_count(), 2);
    }

    #[test]
    fn test_switch_to_same_identity_is_noop() {
        let storage: Arc<dyn CartStorage> = Arc::new(InMemoryCartStorage::new());
        let bus = CartBus::default();
        let mut session = guest_session(&storage, &bus);

        session.add_to_cart(snapshot(1000), 1).unwrap();
        session.switch_identity(CustomerIdentity::Guest);
        assert_eq!(session.item_count(), 1);
    }

    #[test]
    fn test_clear_cart() {
        let storage: Arc<dyn CartStorage> = Arc::new(InMemoryCartStorage::new());
        let bus = CartBus::default();
        let session = guest_session(&storage, &bus);

        session.add_to_cart(snapshot(1000), 2).unwrap();
        session.clear_cart();
        assert_eq!(session.item_count(), 0);
    }
}
