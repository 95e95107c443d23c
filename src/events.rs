// Copyright 2026 AutoHub Garage.

//! Domain events for the storefront
//!
//! Events represent facts that have occurred in the domain. They are
//! immutable and feed downstream consumers (dashboards, notifications)
//! through the [`EventPublisher`] seam; publishing is best-effort from the
//! services' point of view.

use crate::entity::{CustomerId, OrderId};
use crate::errors::DomainResult;
use crate::money::Money;
use crate::order::{OrderNumber, OrderStatus};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::{Arc, RwLock};
use uuid::Uuid;

/// Base trait for all domain events
pub trait DomainEvent: Send + Sync + std::fmt::Debug {
    /// Get the aggregate ID this event relates to
    fn aggregate_id(&self) -> Uuid;

    /// Get the event type name
    fn event_type(&self) -> &'static str;

    /// Get the schema version
    fn version(&self) -> &'static str {
        "v1"
    }
}

/// Correlation ID tying the events of one operation together.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CorrelationId(pub Uuid);

impl CorrelationId {
    /// Create a fresh correlation id.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for CorrelationId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for CorrelationId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "correlation:{}", self.0)
    }
}

/// An order was created from a validated cart snapshot.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderPlaced {
    /// The new order's id
    pub order_id: OrderId,
    /// The human-readable order number
    pub order_number: OrderNumber,
    /// The owning customer
    pub customer_id: Option<CustomerId>,
    /// Grand total billed on delivery
    pub total_amount: Money,
    /// Number of lines in the order
    pub line_count: usize,
    /// When the order was placed
    pub placed_at: DateTime<Utc>,
}

impl DomainEvent for OrderPlaced {
    fn aggregate_id(&self) -> Uuid {
        self.order_id.into()
    }

    fn event_type(&self) -> &'static str {
        "OrderPlaced"
    }
}

/// An order moved to a new lifecycle state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderStatusChanged {
    /// The order that changed
    pub order_id: OrderId,
    /// State before the transition
    pub from: OrderStatus,
    /// State after the transition
    pub to: OrderStatus,
    /// Whether the transition bypassed the table (permissive admin policy)
    pub forced: bool,
    /// When the transition occurred
    pub changed_at: DateTime<Utc>,
}

impl DomainEvent for OrderStatusChanged {
    fn aggregate_id(&self) -> Uuid {
        self.order_id.into()
    }

    fn event_type(&self) -> &'static str {
        "OrderStatusChanged"
    }
}

/// An order was cancelled by its owning customer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderCancelled {
    /// The cancelled order
    pub order_id: OrderId,
    /// The customer who cancelled
    pub customer_id: CustomerId,
    /// Whether the decremented stock was restored to the ledger
    pub stock_restored: bool,
    /// When the cancellation occurred
    pub cancelled_at: DateTime<Utc>,
}

impl DomainEvent for OrderCancelled {
    fn aggregate_id(&self) -> Uuid {
        self.order_id.into()
    }

    fn event_type(&self) -> &'static str {
        "OrderCancelled"
    }
}

/// Event publisher trait for services to emit events
pub trait EventPublisher: Send + Sync {
    /// Publish domain events
    fn publish_events(
        &self,
        events: Vec<Box<dyn DomainEvent>>,
        correlation_id: CorrelationId,
    ) -> DomainResult<()>;
}

/// Mock event publisher for testing
#[derive(Clone, Default)]
pub struct MockEventPublisher {
    published_events: Arc<RwLock<Vec<(String, CorrelationId)>>>,
}

impl MockEventPublisher {
    /// Create a new mock event publisher for testing
    pub fn new() -> Self {
        Self::default()
    }

    /// Get all published events for verification in tests
    pub fn get_published_events(&self) -> Vec<(String, CorrelationId)> {
        // Only event type names are tracked to avoid cloning trait objects.
        self.published_events.read().unwrap().clone()
    }

    /// Event type names in publish order.
    pub fn event_types(&self) -> Vec<String> {
        self.published_events
            .read()
            .unwrap()
            .iter()
            .map(|(event_type, _)| event_type.clone())
            .collect()
    }
}

impl EventPublisher for MockEventPublisher {
    fn publish_events(
        &self,
        events: Vec<Box<dyn DomainEvent>>,
        correlation_id: CorrelationId,
    ) -> DomainResult<()> {
        let mut published = self.published_events.write().unwrap();
        for event in events.into_iter() {
            published.push((event.event_type().to_string(), correlation_id));
        }
        Ok(())
    }
}
