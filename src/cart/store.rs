// Copyright 2026 AutoHub Garage.

//! Durable, broadcast-synchronized cart store
//!
//! Every browsing context of the same origin sees one cart per identity
//! bucket. The store keeps the working copy in memory, writes the whole
//! collection to the backing key-value store on every mutation, and signals
//! the change on a broadcast bus. Listeners do not receive deltas - on a
//! signal they re-read the full collection from storage and re-derive their
//! view (last write wins on the persisted blob).
//!
//! Failure semantics: storage write failures are swallowed so the in-memory
//! state still advances; read failures and malformed blobs fall back to an
//! empty cart and are never surfaced to the UI.

use super::{Cart, LineItemId, ProductSnapshot};
use crate::errors::DomainResult;
use crate::identity::CustomerIdentity;
use crate::money::{Currency, Money};
use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use tokio::sync::broadcast;

/// Durable string-keyed blob store (the client persistence collaborator).
pub trait CartStorage: Send + Sync {
    /// Read the blob stored under `key`, if any.
    fn read(&self, key: &str) -> DomainResult<Option<String>>;

    /// Write `value` under `key`, replacing any previous blob.
    fn write(&self, key: &str, value: &str) -> DomainResult<()>;
}

/// In-memory storage for tests and embedding.
#[derive(Default, Clone)]
pub struct InMemoryCartStorage {
    blobs: Arc<RwLock<HashMap<String, String>>>,
}

impl InMemoryCartStorage {
    /// Create an empty storage.
    pub fn new() -> Self {
        Self::default()
    }
}

impl CartStorage for InMemoryCartStorage {
    fn read(&self, key: &str) -> DomainResult<Option<String>> {
        Ok(self.blobs.read().unwrap().get(key).cloned())
    }

    fn write(&self, key: &str, value: &str) -> DomainResult<()> {
        self.blobs
            .write()
            .unwrap()
            .insert(key.to_string(), value.to_string());
        Ok(())
    }
}

/// Change notification carried on the cart bus.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CartChanged {
    /// The identity bucket whose cart changed
    pub bucket: String,
}

/// Broadcast bus shared by every cart store handle of one origin.
#[derive(Clone)]
pub struct CartBus {
    tx: broadcast::Sender<CartChanged>,
}

impl CartBus {
    /// Create a bus with room for `capacity` in-flight notifications.
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx }
    }

    /// Subscribe to change notifications.
    pub fn subscribe(&self) -> broadcast::Receiver<CartChanged> {
        self.tx.subscribe()
    }

    /// Publish a change. Having no listeners is not an error.
    pub fn publish(&self, change: CartChanged) {
        let _ = self.tx.send(change);
    }
}

impl Default for CartBus {
    fn default() -> Self {
        Self::new(16)
    }
}

/// One browsing context's handle on the identity bucket's cart.
pub struct LocalCartStore {
    storage: Arc<dyn CartStorage>,
    bus: CartBus,
    bucket: String,
    currency: Currency,
    items: RwLock<Cart>,
}

impl LocalCartStore {
    /// Open the cart for an identity, loading whatever the bucket holds.
    pub fn open(
        storage: Arc<dyn CartStorage>,
        bus: CartBus,
        identity: &CustomerIdentity,
        currency: Currency,
    ) -> Self {
        let bucket = identity.bucket_key();
        let items = RwLock::new(read_cart(storage.as_ref(), &bucket, &currency));
        Self {
            storage,
            bus,
            bucket,
            currency,
            items,
        }
    }

    /// The identity bucket this store is bound to.
    pub fn bucket(&self) -> &str {
        &self.bucket
    }

    /// Re-read the persisted collection, replacing the working copy.
    ///
    /// Called by listeners when a change signal arrives from another
    /// context; missing or malformed data resets to an empty cart.
    pub fn reload(&self) {
        let cart = read_cart(self.storage.as_ref(), &self.bucket, &self.currency);
        *self.items.write().unwrap() = cart;
    }

    /// A point-in-time copy of the cart.
    pub fn snapshot(&self) -> Cart {
        self.items.read().unwrap().clone()
    }

    /// Subscribe to change signals for any bucket on this origin's bus.
    pub fn subscribe(&self) -> broadcast::Receiver<CartChanged> {
        self.bus.subscribe()
    }

    /// Add a product, merging into an existing line for the same product.
    pub fn add(&self, snapshot: ProductSnapshot, quantity: u32) -> DomainResult<()> {
        let mut items = self.items.write().unwrap();
        items.add(snapshot, quantity)?;
        self.persist_and_notify(&items);
        Ok(())
    }

    /// Replace a line's quantity. Quantities below 1 leave everything
    /// untouched - no write, no signal.
    pub fn update_quantity(&self, line_id: &LineItemId, quantity: u32) {
        if quantity < 1 {
            return;
        }
        let mut items = self.items.write().unwrap();
        items.update_quantity(line_id, quantity);
        self.persist_and_notify(&items);
    }

    /// Delete a line if present.
    pub fn remove(&self, line_id: &LineItemId) {
        let mut items = self.items.write().unwrap();
        items.remove(line_id);
        self.persist_and_notify(&items);
    }

    /// Empty the cart. Callers invoke this only after checkout succeeds.
    pub fn clear(&self) {
        let mut items = self.items.write().unwrap();
        items.clear();
        self.persist_and_notify(&items);
    }

    /// Sum of quantities across lines.
    pub fn item_count(&self) -> u32 {
        self.items.read().unwrap().item_count()
    }

    /// Display total from snapshot prices.
    pub fn total(&self) -> Money {
        self.items.read().unwrap().total()
    }

    fn persist_and_notify(&self, cart: &Cart) {
        match serde_json::to_string(cart) {
            Ok(blob) => {
                // Durability is best-effort; the in-memory cart has already
                // advanced and the UI keeps working.
                if let Err(err) = self.storage.write(&self.bucket, &blob) {
                    tracing::warn!(bucket = %self.bucket, error = %err, "cart write failed");
                }
            }
            Err(err) => {
                tracing::warn!(bucket = %self.bucket, error = %err, "cart serialization failed");
            }
        }
        self.bus.publish(CartChanged {
            bucket: self.bucket.clone(),
        });
    }
}

fn read_cart(storage: &dyn CartStorage, bucket: &str, currency: &Currency) -> Cart {
    let blob = match storage.read(bucket) {
        Ok(Some(blob)) => blob,
        Ok(None) => return Cart::new(currency.clone()),
        Err(err) => {
            tracing::warn!(bucket = %bucket, error = %err, "cart read failed, starting empty");
            return Cart::new(currency.clone());
        }
    };

    match serde_json::from_str(&blob) {
        Ok(cart) => cart,
        Err(err) => {
            tracing::warn!(bucket = %bucket, error = %err, "malformed cart blob, starting empty");
            Cart::new(currency.clone())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::DomainError;
    use crate::product::Product;

    fn snapshot(price_minor: i128) -> ProductSnapshot {
        let product = Product::new(
            "Spark plug",
            Money::from_minor(price_minor, Currency::ugx()),
            10,
        );
        ProductSnapshot::from(&product)
    }

    fn open_guest(storage: &Arc<dyn CartStorage>, bus: &CartBus) -> LocalCartStore {
        LocalCartStore::open(
            storage.clone(),
            bus.clone(),
            &CustomerIdentity::Guest,
            Currency::ugx(),
        )
    }

    #[test]
    fn test_mutations_persist_whole_cart() {
        let storage: Arc<dyn CartStorage> = Arc::new(InMemoryCartStorage::new());
        let bus = CartBus::default();
        let store = open_guest(&storage, &bus);

        store.add(snapshot(1000), 2).unwrap();

        let blob = storage.read("cart_guest").unwrap().unwrap();
        let cart: Cart = serde_json::from_str(&blob).unwrap();
        assert_eq!(cart.item_count(), 2);
    }

    #[test]
    fn test_reload_picks_up_other_writer() {
        let storage: Arc<dyn CartStorage> = Arc::new(InMemoryCartStorage::new());
        let bus = CartBus::default();
        let tab_a = open_guest(&storage, &bus);
        let tab_b = open_guest(&storage, &bus);

        let mut signals = tab_b.subscribe();
        tab_a.add(snapshot(1000), 3).unwrap();

        // The other context receives a signal and re-reads the whole cart
        let change = signals.try_recv().unwrap();
        assert_eq!(change.bucket, "cart_guest");
        tab_b.reload();
        assert_eq!(tab_b.item_count(), 3);
    }

    #[test]
    fn test_malformed_blob_falls_back_to_empty() {
        let storage = InMemoryCartStorage::new();
        storage.write("cart_guest", "not json at all").unwrap();

        let store = LocalCartStore::open(
            Arc::new(storage),
            CartBus::default(),
            &CustomerIdentity::Guest,
            Currency::ugx(),
        );
        assert_eq!(store.item_count(), 0);
    }

    struct FailingStorage;

    impl CartStorage for FailingStorage {
        fn read(&self, _key: &str) -> DomainResult<Option<String>> {
            Err(DomainError::InternalError("storage offline".to_string()))
        }

        fn write(&self, _key: &str, _value: &str) -> DomainResult<()> {
            Err(DomainError::InternalError("storage offline".to_string()))
        }
    }

    #[test]
    fn test_write_failure_is_swallowed() {
        let store = LocalCartStore::open(
            Arc::new(FailingStorage),
            CartBus::default(),
            &CustomerIdentity::Guest,
            Currency::ugx(),
        );

        // The write fails, the in-memory cart still advances
        store.add(snapshot(1000), 2).unwrap();
        assert_eq!(store.item_count(), 2);
    }

    #[test]
    fn test_quantity_floor_sends_no_signal() {
        let storage: Arc<dyn CartStorage> = Arc::new(InMemoryCartStorage::new());
        let bus = CartBus::default();
        let store = open_guest(&storage, &bus);

        store.add(snapshot(1000), 2).unwrap();
        let line_id = store
            .snapshot()
            .lines()
            .next()
            .unwrap()
            .id
            .clone();

        let mut signals = store.subscribe();
        store.update_quantity(&line_id, 0);

        assert!(signals.try_recv().is_err());
        assert_eq!(store.item_count(), 2);
    }

    #[test]
    fn test_clear_then_reload_is_empty() {
        let storage: Arc<dyn CartStorage> = Arc::new(InMemoryCartStorage::new());
        let bus = CartBus::default();
        let store = open_guest(&storage, &bus);

        store.add(snapshot(1000), 2).unwrap();
        store.clear();
        store.reload();

        assert_eq!(store.item_count(), 0);
        assert!(store.total().is_zero());
    }

    #[test]
    fn test_buckets_are_independent() {
        let storage: Arc<dyn CartStorage> = Arc::new(InMemoryCartStorage::new());
        let bus = CartBus::default();

        let guest = open_guest(&storage, &bus);
        guest.add(snapshot(1000), 2).unwrap();

        let customer = LocalCartStore::open(
            storage.clone(),
            bus.clone(),
            &CustomerIdentity::Customer(crate::entity::CustomerId::new()),
            Currency::ugx(),
        );

        // The customer bucket starts empty; carts are never merged
        assert_eq!(customer.item_count(), 0);
        assert_eq!(guest.item_count(), 2);
    }
}
