// Copyright 2026 AutoHub Garage.

//! Checkout orchestration
//!
//! Converts a client-asserted cart snapshot into an authoritative order.
//! The ledger, not the cart, decides prices and stock: snapshot prices
//! carried in the request are display artifacts and never billed.
//!
//! Write ordering: stock is reserved first with an all-or-nothing
//! conditional decrement, then the order aggregate is persisted. If
//! persistence fails the reservation is rolled back by restoring stock, so
//! "create an order and reflect its effect on stock" behaves as a unit.

use crate::cart::Cart;
use crate::entity::{OrderId, ProductId};
use crate::errors::{DomainError, DomainResult};
use crate::events::{CorrelationId, DomainEvent, EventPublisher, OrderPlaced};
use crate::identity::{BearerToken, IdentityProvider};
use crate::money::{Currency, Money};
use crate::order::{
    Order, OrderDetails, OrderLineItem, OrderNumber, OrderStatus, PaymentMethod,
};
use crate::product::{Product, ProductLedger};
use crate::repository::OrderRepository;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;

/// Fee schedule for checkout.
///
/// The simple mode fixes both fees at zero; the distance-based model in the
/// order schema is an extension point that plugs in here.
#[derive(Debug, Clone)]
pub struct CheckoutConfig {
    /// The merchant's billing currency
    pub currency: Currency,
    /// Flat transport fee added to every order
    pub transport_fee: Money,
    /// Flat service fee added to every order
    pub service_fee: Money,
}

impl CheckoutConfig {
    /// Simple checkout: no transport or service fees.
    pub fn simple(currency: Currency) -> Self {
        Self {
            transport_fee: Money::zero(currency.clone()),
            service_fee: Money::zero(currency.clone()),
            currency,
        }
    }
}

/// Contact details collected at checkout.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct ContactInfo {
    /// Phone number the courier calls
    pub phone: String,
}

/// One requested line of a checkout.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct CheckoutLine {
    /// The product to order
    pub product_id: ProductId,
    /// Units requested
    pub quantity: u32,
    /// The client's cached snapshot price. Carried for diagnostics only;
    /// billing always uses the ledger price.
    pub snapshot_price: Option<Money>,
}

/// A checkout request: contact, destination, and the cart snapshot.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct CheckoutRequest {
    /// Contact details
    pub contact: ContactInfo,
    /// Delivery location descriptor
    pub delivery_location: String,
    /// The cart snapshot being checked out
    pub lines: Vec<CheckoutLine>,
}

impl CheckoutRequest {
    /// Build a request from the local cart's current contents.
    pub fn from_cart(cart: &Cart, phone: impl Into<String>, location: impl Into<String>) -> Self {
        Self {
            contact: ContactInfo {
                phone: phone.into(),
            },
            delivery_location: location.into(),
            lines: cart
                .lines()
                .map(|line| CheckoutLine {
                    product_id: line.product_id,
                    quantity: line.quantity,
                    snapshot_price: Some(line.price.clone()),
                })
                .collect(),
        }
    }
}

/// Confirmation returned on a successful checkout.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct CheckoutConfirmation {
    /// The new order's id
    pub order_id: OrderId,
    /// The human-readable order number
    pub order_number: OrderNumber,
    /// Sum of ledger price x quantity across lines
    pub products_total: Money,
    /// Transport fee billed
    pub transport_fee: Money,
    /// Service fee billed
    pub service_fee: Money,
    /// Grand total billed on delivery
    pub total_amount: Money,
    /// How the order is paid
    pub payment_method: PaymentMethod,
    /// The order's initial status
    pub status: OrderStatus,
}

/// The checkout orchestrator.
pub struct CheckoutService {
    ledger: Arc<dyn ProductLedger>,
    orders: Arc<dyn OrderRepository>,
    identity: Arc<dyn IdentityProvider>,
    events: Arc<dyn EventPublisher>,
    config: CheckoutConfig,
}

impl CheckoutService {
    /// Wire up a checkout service.
    pub fn new(
        ledger: Arc<dyn ProductLedger>,
        orders: Arc<dyn OrderRepository>,
        identity: Arc<dyn IdentityProvider>,
        events: Arc<dyn EventPublisher>,
        config: CheckoutConfig,
    ) -> Self {
        Self {
            ledger,
            orders,
            identity,
            events,
            config,
        }
    }

    /// Place an order from a cart snapshot.
    ///
    /// Validation failures surface verbatim so the shopper can fix stock or
    /// contact issues; ledger and repository failures are logged and surface
    /// as generic internal errors. The caller clears the local cart only
    /// after receiving a confirmation.
    pub async fn checkout(
        &self,
        token: &BearerToken,
        request: CheckoutRequest,
    ) -> DomainResult<CheckoutConfirmation> {
        let customer = self.identity.resolve(token).await?;

        if request.lines.is_empty() {
            return Err(DomainError::ValidationError("Cart is empty".to_string()));
        }
        if request.contact.phone.trim().is_empty() || request.delivery_location.trim().is_empty() {
            return Err(DomainError::ValidationError(
                "Phone number and delivery location are required".to_string(),
            ));
        }
        if request.lines.iter().any(|line| line.quantity < 1) {
            return Err(DomainError::ValidationError(
                "Invalid quantity in cart".to_string(),
            ));
        }

        let products = self.fetch_products(&request.lines).await?;

        // Stock validation against the ledger, before any write occurs.
        // Billing below uses the ledger price; the request's snapshot
        // prices are never consulted.
        let mut order_lines = Vec::with_capacity(request.lines.len());
        for line in &request.lines {
            let product = products.get(&line.product_id).ok_or_else(|| {
                DomainError::ValidationError("Invalid product in cart".to_string())
            })?;
            if product.stock < line.quantity {
                return Err(DomainError::ValidationError(
                    "Insufficient stock for one or more items".to_string(),
                ));
            }
            order_lines.push(OrderLineItem {
                product_id: product.id,
                quantity: line.quantity,
                price: product.price.clone(),
            });
        }

        let order = Order::place(OrderDetails {
            customer_id: Some(customer),
            email: None,
            phone: request.contact.phone.clone(),
            location_name: request.delivery_location.clone(),
            lines: order_lines,
            transport_fee: self.config.transport_fee.clone(),
            service_fee: self.config.service_fee.clone(),
            status: OrderStatus::CashOnDelivery,
        })?;

        // Reserve stock first; a lost race against a concurrent checkout
        // surfaces here as a conflict with nothing applied.
        let stock_lines = order.stock_lines();
        self.ledger.decrement_stock_all(&stock_lines).await?;

        if let Err(err) = self.orders.insert(order.clone()).await {
            tracing::error!(error = %err, order_number = %order.order_number(), "order insert failed, restoring reserved stock");
            if let Err(restore_err) = self.ledger.restore_stock_all(&stock_lines).await {
                tracing::error!(error = %restore_err, "stock restoration after failed insert also failed");
            }
            return Err(DomainError::InternalError(
                "Failed to create order".to_string(),
            ));
        }

        let placed: Box<dyn DomainEvent> = Box::new(OrderPlaced {
            order_id: order.order_id(),
            order_number: order.order_number().clone(),
            customer_id: order.customer_id(),
            total_amount: order.total_amount().clone(),
            line_count: order.lines().len(),
            placed_at: chrono::Utc::now(),
        });
        if let Err(err) = self
            .events
            .publish_events(vec![placed], CorrelationId::new())
        {
            tracing::warn!(error = %err, "failed to publish OrderPlaced");
        }

        Ok(CheckoutConfirmation {
            order_id: order.order_id(),
            order_number: order.order_number().clone(),
            products_total: order.products_total().clone(),
            transport_fee: order.transport_fee().clone(),
            service_fee: order.service_fee().clone(),
            total_amount: order.total_amount().clone(),
            payment_method: order.payment_method(),
            status: order.status(),
        })
    }

    async fn fetch_products(
        &self,
        lines: &[CheckoutLine],
    ) -> DomainResult<HashMap<ProductId, Product>> {
        let mut ids: Vec<ProductId> = Vec::with_capacity(lines.len());
        for line in lines {
            if !ids.contains(&line.product_id) {
                ids.push(line.product_id);
            }
        }

        let products = self.ledger.fetch_active(&ids).await.map_err(|err| {
            tracing::error!(error = %err, "failed to fetch products during checkout");
            DomainError::InternalError("Failed to fetch products for cart items".to_string())
        })?;

        Ok(products
            .into_iter()
            .map(|product| (product.id, product))
            .collect())
    }
}
