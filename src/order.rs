// Copyright 2026 AutoHub Garage.

//! Order aggregate and status lifecycle
//!
//! An order is created once from a validated cart snapshot and afterwards
//! changes only through its status machine and a bounded set of
//! administrative field edits. Line items are immutable: their quantity and
//! ledger-price snapshot together reproduce the order's total.
//!
//! Status transitions depend on who asks. Administrators move orders along
//! the delivery pipeline; customers hold exactly one transition, cancelling
//! an order that has not left the shop yet.

use crate::entity::{AggregateRoot, CustomerId, Entity, OrderId, OrderMarker, ProductId};
use crate::errors::{DomainError, DomainResult};
use crate::money::Money;
use crate::state_machine::{
    MealyMachine, MealyStateTransitions, State, StateTransition, TransitionInput,
};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Lifecycle states of an order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderStatus {
    /// Placed but not yet acknowledged
    Pending,
    /// Acknowledged cash-on-delivery order, awaiting dispatch
    CashOnDelivery,
    /// Payment recorded by an administrator
    Paid,
    /// Handed to the courier
    OutForDelivery,
    /// Terminal: received by the customer
    Delivered,
    /// Terminal: cancelled by the customer or an administrator
    Cancelled,
}

/// The party requesting a status transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OrderActor {
    /// The customer who owns the order
    Customer(CustomerId),
    /// A dashboard administrator
    Admin,
}

impl TransitionInput for OrderActor {
    fn description(&self) -> String {
        match self {
            OrderActor::Customer(id) => format!("customer {id}"),
            OrderActor::Admin => "admin".to_string(),
        }
    }
}

impl State for OrderStatus {
    fn name(&self) -> &'static str {
        match self {
            Self::Pending => "Pending",
            Self::CashOnDelivery => "CashOnDelivery",
            Self::Paid => "Paid",
            Self::OutForDelivery => "OutForDelivery",
            Self::Delivered => "Delivered",
            Self::Cancelled => "Cancelled",
        }
    }

    fn is_terminal(&self) -> bool {
        matches!(self, Self::Delivered | Self::Cancelled)
    }
}

impl MealyStateTransitions for OrderStatus {
    type Input = OrderActor;

    fn can_transition_to(&self, target: &Self, input: &Self::Input) -> bool {
        self.valid_transitions(input).contains(target)
    }

    fn valid_transitions(&self, input: &Self::Input) -> Vec<Self> {
        use OrderStatus::*;

        match input {
            // Customers hold exactly one transition: early cancellation.
            OrderActor::Customer(_) => match self {
                Pending | CashOnDelivery => vec![Cancelled],
                _ => vec![],
            },
            OrderActor::Admin => match self {
                Pending => vec![CashOnDelivery, Paid, Cancelled],
                CashOnDelivery => vec![OutForDelivery, Paid, Cancelled],
                OutForDelivery => vec![Delivered, Paid],
                Paid => vec![OutForDelivery, Delivered],
                Delivered | Cancelled => vec![],
            },
        }
    }
}

impl OrderStatus {
    /// Whether the owning customer may still cancel from this state.
    pub fn customer_cancellable(&self) -> bool {
        matches!(self, Self::Pending | Self::CashOnDelivery)
    }
}

/// How the customer pays. Cash on delivery is the only method offered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub enum PaymentMethod {
    /// Pay the courier on delivery
    #[serde(rename = "COD")]
    CashOnDelivery,
}

impl fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PaymentMethod::CashOnDelivery => write!(f, "COD"),
        }
    }
}

/// Human-readable, collision-resistant order number.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
pub struct OrderNumber(String);

impl OrderNumber {
    /// Generate a fresh order number.
    ///
    /// UUID-derived rather than timestamp-derived so concurrent checkouts
    /// cannot collide.
    pub fn generate() -> Self {
        Self(format!(
            "ORD-{}",
            Uuid::new_v4().simple().to_string().to_uppercase()
        ))
    }

    /// The raw order number.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for OrderNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One immutable product+quantity+price entry within an order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderLineItem {
    /// The product ordered
    pub product_id: ProductId,
    /// Units ordered
    pub quantity: u32,
    /// Ledger price at order time - never the client-supplied snapshot
    pub price: Money,
}

impl OrderLineItem {
    /// This line's contribution to the order total.
    pub fn line_total(&self) -> DomainResult<Money> {
        self.price.checked_mul(self.quantity)
    }
}

/// Everything needed to place an order from a validated cart snapshot.
#[derive(Debug, Clone)]
pub struct OrderDetails {
    /// Owning customer (orders are nullable-owner in the schema, but the
    /// checkout flow always sets one)
    pub customer_id: Option<CustomerId>,
    /// Contact email, if the identity provider supplied one
    pub email: Option<String>,
    /// Contact phone
    pub phone: String,
    /// Delivery location descriptor
    pub location_name: String,
    /// Lines priced from the ledger
    pub lines: Vec<OrderLineItem>,
    /// Transport fee (zero in the simple checkout mode)
    pub transport_fee: Money,
    /// Service fee (zero in the simple checkout mode)
    pub service_fee: Money,
    /// Initial status
    pub status: OrderStatus,
}

/// Bounded set of administratively editable fields.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct OrderUpdate {
    /// Replacement contact phone
    pub phone: Option<String>,
    /// Replacement delivery location
    pub location_name: Option<String>,
}

/// Order aggregate root.
#[derive(Debug, Clone)]
pub struct Order {
    entity: Entity<OrderMarker>,
    version: u64,
    order_number: OrderNumber,
    customer_id: Option<CustomerId>,
    email: Option<String>,
    phone: String,
    location_name: String,
    /// Geo/distance fields exist in the schema for a distance-based fee
    /// model; the simple checkout leaves them unset.
    latitude: Option<f64>,
    longitude: Option<f64>,
    distance_km: f64,
    products_total: Money,
    transport_fee: Money,
    service_fee: Money,
    total_amount: Money,
    payment_method: PaymentMethod,
    status: MealyMachine<OrderStatus, OrderMarker>,
    lines: Vec<OrderLineItem>,
}

impl Order {
    /// Place an order from validated details.
    ///
    /// Totals are computed here, from the lines, so the invariant
    /// `total == sum(price x quantity) + fees` holds by construction.
    pub fn place(details: OrderDetails) -> DomainResult<Self> {
        if details.lines.is_empty() {
            return Err(DomainError::ValidationError("Cart is empty".to_string()));
        }

        let currency = details.transport_fee.currency().clone();
        let mut products_total = Money::zero(currency);
        for line in &details.lines {
            products_total = products_total.checked_add(&line.line_total()?)?;
        }
        let total_amount = products_total
            .checked_add(&details.transport_fee)?
            .checked_add(&details.service_fee)?;

        let entity = Entity::<OrderMarker>::new();
        let status = MealyMachine::new(details.status, entity.id);

        Ok(Self {
            entity,
            version: 0,
            order_number: OrderNumber::generate(),
            customer_id: details.customer_id,
            email: details.email,
            phone: details.phone,
            location_name: details.location_name,
            latitude: None,
            longitude: None,
            distance_km: 0.0,
            products_total,
            transport_fee: details.transport_fee,
            service_fee: details.service_fee,
            total_amount,
            payment_method: PaymentMethod::CashOnDelivery,
            status,
            lines: details.lines,
        })
    }

    /// The order's id.
    pub fn order_id(&self) -> OrderId {
        self.entity.id
    }

    /// The human-readable order number.
    pub fn order_number(&self) -> &OrderNumber {
        &self.order_number
    }

    /// The owning customer, if any.
    pub fn customer_id(&self) -> Option<CustomerId> {
        self.customer_id
    }

    /// Contact email.
    pub fn email(&self) -> Option<&str> {
        self.email.as_deref()
    }

    /// Contact phone.
    pub fn phone(&self) -> &str {
        &self.phone
    }

    /// Delivery location descriptor.
    pub fn location_name(&self) -> &str {
        &self.location_name
    }

    /// Latitude, when the distance-fee extension is in play.
    pub fn latitude(&self) -> Option<f64> {
        self.latitude
    }

    /// Longitude, when the distance-fee extension is in play.
    pub fn longitude(&self) -> Option<f64> {
        self.longitude
    }

    /// Computed delivery distance (zero in the simple checkout mode).
    pub fn distance_km(&self) -> f64 {
        self.distance_km
    }

    /// Sum of line contributions.
    pub fn products_total(&self) -> &Money {
        &self.products_total
    }

    /// Transport fee.
    pub fn transport_fee(&self) -> &Money {
        &self.transport_fee
    }

    /// Service fee.
    pub fn service_fee(&self) -> &Money {
        &self.service_fee
    }

    /// Grand total billed on delivery.
    pub fn total_amount(&self) -> &Money {
        &self.total_amount
    }

    /// How the order is paid.
    pub fn payment_method(&self) -> PaymentMethod {
        self.payment_method
    }

    /// Current lifecycle state.
    pub fn status(&self) -> OrderStatus {
        *self.status.current_state()
    }

    /// Status transition history, oldest first.
    pub fn status_history(&self) -> &[StateTransition<OrderStatus, OrderActor>] {
        self.status.history()
    }

    /// The order's immutable lines.
    pub fn lines(&self) -> &[OrderLineItem] {
        &self.lines
    }

    /// `(product, quantity)` pairs for ledger stock adjustments.
    pub fn stock_lines(&self) -> Vec<(ProductId, u32)> {
        self.lines
            .iter()
            .map(|line| (line.product_id, line.quantity))
            .collect()
    }

    /// When the order was created.
    pub fn created_at(&self) -> std::time::SystemTime {
        self.entity.created_at
    }

    /// Move the order to a new status, enforcing the transition table.
    pub fn set_status(
        &mut self,
        target: OrderStatus,
        actor: OrderActor,
    ) -> DomainResult<StateTransition<OrderStatus, OrderActor>> {
        let transition = self.status.transition_to(target, actor)?;
        self.increment_version();
        Ok(transition)
    }

    /// Move the order to a new status without consulting the table.
    ///
    /// Only the permissive admin policy calls this; the transition is still
    /// recorded in the history.
    pub fn force_status(
        &mut self,
        target: OrderStatus,
        actor: OrderActor,
    ) -> StateTransition<OrderStatus, OrderActor> {
        let transition = self.status.force_transition_to(target, actor);
        self.increment_version();
        transition
    }

    /// Cancel on behalf of the requesting customer.
    ///
    /// Fails with `AuthorizationError` when the requester does not own the
    /// order, and with `ValidationError` when the order has progressed past
    /// the cancellable states. No stock restoration happens here; the
    /// service layer owns that side effect.
    pub fn cancel_by_customer(
        &mut self,
        requester: CustomerId,
    ) -> DomainResult<StateTransition<OrderStatus, OrderActor>> {
        if self.customer_id != Some(requester) {
            return Err(DomainError::AuthorizationError(
                "You can only cancel your own orders".to_string(),
            ));
        }
        if !self.status().customer_cancellable() {
            return Err(DomainError::ValidationError(
                "Order cannot be cancelled at this stage".to_string(),
            ));
        }
        self.set_status(OrderStatus::Cancelled, OrderActor::Customer(requester))
    }

    /// Apply a bounded administrative field edit.
    pub fn apply_update(&mut self, update: OrderUpdate) {
        if let Some(phone) = update.phone {
            self.phone = phone;
        }
        if let Some(location_name) = update.location_name {
            self.location_name = location_name;
        }
        self.increment_version();
    }
}

impl AggregateRoot for Order {
    type Id = OrderId;

    fn id(&self) -> Self::Id {
        self.entity.id
    }

    fn version(&self) -> u64 {
        self.version
    }

    fn increment_version(&mut self) {
        self.version += 1;
        self.entity.touch();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::money::Currency;
    use test_case::test_case;

    fn ugx(minor: i128) -> Money {
        Money::from_minor(minor, Currency::ugx())
    }

    fn details(lines: Vec<OrderLineItem>) -> OrderDetails {
        OrderDetails {
            customer_id: Some(CustomerId::new()),
            email: Some("shopper@example.com".to_string()),
            phone: "0700000000".to_string(),
            location_name: "Kampala".to_string(),
            lines,
            transport_fee: ugx(0),
            service_fee: ugx(0),
            status: OrderStatus::CashOnDelivery,
        }
    }

    fn line(price_minor: i128, quantity: u32) -> OrderLineItem {
        OrderLineItem {
            product_id: ProductId::new(),
            quantity,
            price: ugx(price_minor),
        }
    }

    #[test]
    fn test_place_computes_totals_from_lines() {
        let order = Order::place(details(vec![line(1200, 2), line(500, 1)])).unwrap();

        assert_eq!(order.products_total().amount_minor(), 2900);
        assert_eq!(order.total_amount().amount_minor(), 2900);
        assert_eq!(order.status(), OrderStatus::CashOnDelivery);
        assert_eq!(order.payment_method(), PaymentMethod::CashOnDelivery);
        assert!(order.order_number().as_str().starts_with("ORD-"));
    }

    #[test]
    fn test_place_adds_fees_to_total() {
        let mut d = details(vec![line(1000, 1)]);
        d.transport_fee = ugx(300);
        d.service_fee = ugx(200);

        let order = Order::place(d).unwrap();
        assert_eq!(order.products_total().amount_minor(), 1000);
        assert_eq!(order.total_amount().amount_minor(), 1500);
    }

    #[test]
    fn test_place_rejects_empty_lines() {
        let err = Order::place(details(vec![])).unwrap_err();
        assert!(err.is_validation_error());
    }

    #[test]
    fn test_order_numbers_are_unique() {
        let a = OrderNumber::generate();
        let b = OrderNumber::generate();
        assert_ne!(a, b);
    }

    #[test]
    fn test_admin_pipeline_happy_path() {
        let mut order = Order::place(details(vec![line(1000, 1)])).unwrap();

        order
            .set_status(OrderStatus::OutForDelivery, OrderActor::Admin)
            .unwrap();
        order
            .set_status(OrderStatus::Delivered, OrderActor::Admin)
            .unwrap();

        assert_eq!(order.status(), OrderStatus::Delivered);
        assert_eq!(order.status_history().len(), 2);
    }

    #[test_case(OrderStatus::Pending, OrderStatus::CashOnDelivery, true; "pending to cod")]
    #[test_case(OrderStatus::Pending, OrderStatus::Cancelled, true; "pending to cancelled")]
    #[test_case(OrderStatus::Pending, OrderStatus::Delivered, false; "pending skips to delivered")]
    #[test_case(OrderStatus::CashOnDelivery, OrderStatus::OutForDelivery, true; "cod to out for delivery")]
    #[test_case(OrderStatus::CashOnDelivery, OrderStatus::Paid, true; "cod to paid")]
    #[test_case(OrderStatus::OutForDelivery, OrderStatus::Delivered, true; "out to delivered")]
    #[test_case(OrderStatus::OutForDelivery, OrderStatus::Cancelled, false; "out cannot cancel")]
    #[test_case(OrderStatus::Paid, OrderStatus::Delivered, true; "paid to delivered")]
    #[test_case(OrderStatus::Delivered, OrderStatus::Pending, false; "delivered is terminal")]
    #[test_case(OrderStatus::Cancelled, OrderStatus::Pending, false; "cancelled is terminal")]
    fn test_admin_transition_table(from: OrderStatus, to: OrderStatus, allowed: bool) {
        assert_eq!(from.can_transition_to(&to, &OrderActor::Admin), allowed);
    }

    #[test]
    fn test_customer_transitions_are_cancel_only() {
        let customer = OrderActor::Customer(CustomerId::new());

        assert!(OrderStatus::Pending.can_transition_to(&OrderStatus::Cancelled, &customer));
        assert!(OrderStatus::CashOnDelivery.can_transition_to(&OrderStatus::Cancelled, &customer));

        assert!(!OrderStatus::Pending.can_transition_to(&OrderStatus::CashOnDelivery, &customer));
        assert!(!OrderStatus::Paid.can_transition_to(&OrderStatus::Cancelled, &customer));
        assert!(!OrderStatus::OutForDelivery.can_transition_to(&OrderStatus::Cancelled, &customer));
    }

    #[test]
    fn test_cancel_by_customer_owner_check() {
        let owner = CustomerId::new();
        let mut d = details(vec![line(1000, 1)]);
        d.customer_id = Some(owner);
        let mut order = Order::place(d).unwrap();

        let err = order.cancel_by_customer(CustomerId::new()).unwrap_err();
        assert!(matches!(err, DomainError::AuthorizationError(_)));
        assert_eq!(order.status(), OrderStatus::CashOnDelivery);

        order.cancel_by_customer(owner).unwrap();
        assert_eq!(order.status(), OrderStatus::Cancelled);
    }

    #[test]
    fn test_cancel_by_customer_stage_check() {
        let owner = CustomerId::new();
        let mut d = details(vec![line(1000, 1)]);
        d.customer_id = Some(owner);
        let mut order = Order::place(d).unwrap();

        order
            .set_status(OrderStatus::OutForDelivery, OrderActor::Admin)
            .unwrap();

        let err = order.cancel_by_customer(owner).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Validation error: Order cannot be cancelled at this stage"
        );
    }

    #[test]
    fn test_force_status_records_history() {
        let mut order = Order::place(details(vec![line(1000, 1)])).unwrap();

        // Delivered straight from CashOnDelivery is off the table
        assert!(order
            .set_status(OrderStatus::Delivered, OrderActor::Admin)
            .is_err());

        let transition = order.force_status(OrderStatus::Delivered, OrderActor::Admin);
        assert_eq!(transition.to, OrderStatus::Delivered);
        assert_eq!(order.status(), OrderStatus::Delivered);
        assert_eq!(order.status_history().len(), 1);
    }

    #[test]
    fn test_apply_update_bounded_fields() {
        let mut order = Order::place(details(vec![line(1000, 1)])).unwrap();
        let before_version = crate::entity::AggregateRoot::version(&order);

        order.apply_update(OrderUpdate {
            phone: Some("0711111111".to_string()),
            location_name: Some("Entebbe".to_string()),
        });

        assert_eq!(order.phone(), "0711111111");
        assert_eq!(order.location_name(), "Entebbe");
        assert!(crate::entity::AggregateRoot::version(&order) > before_version);
        // Totals and lines stay untouched
        assert_eq!(order.total_amount().amount_minor(), 1000);
    }

    #[test]
    fn test_status_serde_wire_names() {
        assert_eq!(
            serde_json::to_string(&OrderStatus::CashOnDelivery).unwrap(),
            "\"CASH_ON_DELIVERY\""
        );
        assert_eq!(
            serde_json::to_string(&OrderStatus::OutForDelivery).unwrap(),
            "\"OUT_FOR_DELIVERY\""
        );
        assert_eq!(
            serde_json::to_string(&PaymentMethod::CashOnDelivery).unwrap(),
            "\"COD\""
        );
    }
}
