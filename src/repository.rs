// Copyright 2026 AutoHub Garage.

//! Order persistence seam
//!
//! Orders live in the merchant's hosted database; every call is an
//! independent network round-trip. `InMemoryOrderRepository` backs tests and
//! embedders without a database.

use crate::entity::{AggregateRoot, CustomerId, OrderId};
use crate::errors::{DomainError, DomainResult};
use crate::order::Order;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

/// Repository trait for loading and saving orders
#[async_trait]
pub trait OrderRepository: Send + Sync {
    /// Insert a freshly placed order. Fails with `AlreadyExists` on id reuse.
    async fn insert(&self, order: Order) -> DomainResult<()>;

    /// Load an order by id.
    async fn load(&self, id: OrderId) -> DomainResult<Option<Order>>;

    /// Persist changes to an existing order.
    async fn update(&self, order: Order) -> DomainResult<()>;

    /// All orders owned by a customer, newest first.
    async fn list_for_customer(&self, customer: CustomerId) -> DomainResult<Vec<Order>>;
}

/// In-memory repository for testing
#[derive(Default, Clone)]
pub struct InMemoryOrderRepository {
    storage: Arc<RwLock<HashMap<OrderId, Order>>>,
}

impl InMemoryOrderRepository {
    /// Create a new in-memory repository for testing
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored orders.
    pub fn len(&self) -> usize {
        self.storage.read().unwrap().len()
    }

    /// Whether the repository holds no orders.
    pub fn is_empty(&self) -> bool {
        self.storage.read().unwrap().is_empty()
    }
}

#[async_trait]
impl OrderRepository for InMemoryOrderRepository {
    async fn insert(&self, order: Order) -> DomainResult<()> {
        let mut storage = self.storage.write().unwrap();
        if storage.contains_key(&order.id()) {
            return Err(DomainError::AlreadyExists(format!(
                "Order {}",
                order.id()
            )));
        }
        storage.insert(order.id(), order);
        Ok(())
    }

    async fn load(&self, id: OrderId) -> DomainResult<Option<Order>> {
        Ok(self.storage.read().unwrap().get(&id).cloned())
    }

    async fn update(&self, order: Order) -> DomainResult<()> {
        let mut storage = self.storage.write().unwrap();
        if !storage.contains_key(&order.id()) {
            return Err(DomainError::AggregateNotFound(format!(
                "Order {}",
                order.id()
            )));
        }
        storage.insert(order.id(), order);
        Ok(())
    }

    async fn list_for_customer(&self, customer: CustomerId) -> DomainResult<Vec<Order>> {
        let storage = self.storage.read().unwrap();
        let mut orders: Vec<Order> = storage
            .values()
            .filter(|order| order.customer_id() == Some(customer))
            .cloned()
            .collect();
        orders.sort_by(|a, b| b.created_at().cmp(&a.created_at()));
        Ok(orders)
    }
}
