// Copyright 2026 AutoHub Garage.

//! Order lifecycle operations
//!
//! Customers read their own orders and may cancel early; administrators
//! move orders along the delivery pipeline and edit a bounded set of
//! fields. Status writes pass through the transition table under the
//! configured [`TransitionPolicy`].

use crate::entity::OrderId;
use crate::errors::{DomainError, DomainResult};
use crate::events::{
    CorrelationId, DomainEvent, EventPublisher, OrderCancelled, OrderStatusChanged,
};
use crate::identity::{BearerToken, IdentityProvider};
use crate::order::{Order, OrderActor, OrderStatus, OrderUpdate};
use crate::product::ProductLedger;
use crate::repository::OrderRepository;
use crate::state_machine::State;
use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// How status writes treat the transition table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransitionPolicy {
    /// Reject transitions outside the table
    Strict,
    /// Log transitions outside the table and apply them anyway - the
    /// legacy dashboard behavior, kept as an explicit choice
    Permissive,
}

/// Response returned to a customer who cancelled an order.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct CancellationReceipt {
    /// The cancelled order
    pub id: OrderId,
    /// The order's status after cancellation (always `CANCELLED`)
    pub status: OrderStatus,
    /// When the cancellation occurred
    pub cancelled_at: DateTime<Utc>,
}

/// Order lifecycle service.
pub struct OrderService {
    orders: Arc<dyn OrderRepository>,
    ledger: Arc<dyn ProductLedger>,
    identity: Arc<dyn IdentityProvider>,
    events: Arc<dyn EventPublisher>,
    policy: TransitionPolicy,
}

impl OrderService {
    /// Wire up an order service with strict transition enforcement.
    pub fn new(
        orders: Arc<dyn OrderRepository>,
        ledger: Arc<dyn ProductLedger>,
        identity: Arc<dyn IdentityProvider>,
        events: Arc<dyn EventPublisher>,
    ) -> Self {
        Self {
            orders,
            ledger,
            identity,
            events,
            policy: TransitionPolicy::Strict,
        }
    }

    /// Override the transition policy.
    pub fn with_policy(mut self, policy: TransitionPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Load an order by id.
    pub async fn get(&self, order_id: OrderId) -> DomainResult<Order> {
        self.orders
            .load(order_id)
            .await?
            .ok_or_else(|| DomainError::EntityNotFound {
                entity_type: "Order".to_string(),
                id: order_id.to_string(),
            })
    }

    /// The requesting customer's order history, newest first.
    pub async fn list_for_customer(&self, token: &BearerToken) -> DomainResult<Vec<Order>> {
        let customer = self.identity.resolve(token).await?;
        self.orders.list_for_customer(customer).await
    }

    /// Cancel an order on behalf of the requesting customer.
    ///
    /// Permitted only for the order's owner and only while the order is
    /// still `PENDING` or `CASH_ON_DELIVERY`. On success the decremented
    /// stock is restored to the ledger; a restoration failure is logged and
    /// does not undo the cancellation.
    pub async fn cancel(
        &self,
        token: &BearerToken,
        order_id: OrderId,
    ) -> DomainResult<CancellationReceipt> {
        let customer = self.identity.resolve(token).await?;
        let mut order = self.get(order_id).await?;

        let transition = order.cancel_by_customer(customer)?;

        if let Err(err) = self.orders.update(order.clone()).await {
            tracing::error!(error = %err, order_id = %order_id, "failed to persist cancellation");
            return Err(DomainError::InternalError(
                "Failed to cancel order".to_string(),
            ));
        }

        let stock_restored = match self.ledger.restore_stock_all(&order.stock_lines()).await {
            Ok(()) => true,
            Err(err) => {
                tracing::error!(error = %err, order_id = %order_id, "failed to restore stock after cancellation");
                false
            }
        };

        let event: Box<dyn DomainEvent> = Box::new(OrderCancelled {
            order_id,
            customer_id: customer,
            stock_restored,
            cancelled_at: transition.timestamp,
        });
        if let Err(err) = self.events.publish_events(vec![event], CorrelationId::new()) {
            tracing::warn!(error = %err, "failed to publish OrderCancelled");
        }

        Ok(CancellationReceipt {
            id: order_id,
            status: order.status(),
            cancelled_at: transition.timestamp,
        })
    }

    /// Move an order to a new status from the admin dashboard.
    ///
    /// Under the strict policy, transitions outside the table are rejected
    /// with `InvalidStateTransition`. Under the permissive policy they are
    /// logged and applied anyway.
    pub async fn set_status_as_admin(
        &self,
        order_id: OrderId,
        target: OrderStatus,
    ) -> DomainResult<Order> {
        let mut order = self.get(order_id).await?;
        let from = order.status();

        let forced = match order.set_status(target, OrderActor::Admin) {
            Ok(_) => false,
            Err(err @ DomainError::InvalidStateTransition { .. }) => match self.policy {
                TransitionPolicy::Strict => return Err(err),
                TransitionPolicy::Permissive => {
                    tracing::warn!(
                        order_id = %order_id,
                        from = from.name(),
                        to = target.name(),
                        "out-of-band admin transition applied under permissive policy"
                    );
                    order.force_status(target, OrderActor::Admin);
                    true
                }
            },
            Err(err) => return Err(err),
        };

        self.orders.update(order.clone()).await?;

        let event: Box<dyn DomainEvent> = Box::new(OrderStatusChanged {
            order_id,
            from,
            to: target,
            forced,
            changed_at: Utc::now(),
        });
        if let Err(err) = self.events.publish_events(vec![event], CorrelationId::new()) {
            tracing::warn!(error = %err, "failed to publish OrderStatusChanged");
        }

        Ok(order)
    }

    /// Edit the bounded administrative field set.
    pub async fn update_as_admin(
        &self,
        order_id: OrderId,
        update: OrderUpdate,
    ) -> DomainResult<Order> {
        let mut order = self.get(order_id).await?;
        order.apply_update(update);
        self.orders.update(order.clone()).await?;
        Ok(order)
    }
}
