//! Order lifecycle behavior: the cancellation guard matrix, stock
//! restoration, and admin pipeline transitions under both policies.

use autohub_commerce::{
    Currency, CustomerId, DomainError, InMemoryOrderRepository, InMemoryProductLedger,
    MockEventPublisher, Money, Order, OrderDetails, OrderLineItem, OrderRepository, OrderService,
    OrderStatus, Product, StaticTokenProvider, TransitionPolicy,
};
use pretty_assertions::assert_eq;
use std::sync::Arc;
use test_case::test_case;

fn ugx(minor: i128) -> Money {
    Money::from_minor(minor, Currency::ugx())
}

struct World {
    orders: Arc<InMemoryOrderRepository>,
    ledger: Arc<InMemoryProductLedger>,
    identity: Arc<StaticTokenProvider>,
    events: Arc<MockEventPublisher>,
}

fn world() -> World {
    World {
        orders: Arc::new(InMemoryOrderRepository::new()),
        ledger: Arc::new(InMemoryProductLedger::new()),
        identity: Arc::new(StaticTokenProvider::new()),
        events: Arc::new(MockEventPublisher::new()),
    }
}

fn service(w: &World, policy: TransitionPolicy) -> OrderService {
    OrderService::new(
        w.orders.clone(),
        w.ledger.clone(),
        w.identity.clone(),
        w.events.clone(),
    )
    .with_policy(policy)
}

async fn seed_order(
    w: &World,
    customer: CustomerId,
    product: &Product,
    quantity: u32,
    status: OrderStatus,
) -> Order {
    let order = Order::place(OrderDetails {
        customer_id: Some(customer),
        email: Some("shopper@example.com".to_string()),
        phone: "0700000000".to_string(),
        location_name: "Kampala".to_string(),
        lines: vec![OrderLineItem {
            product_id: product.id,
            quantity,
            price: product.price.clone(),
        }],
        transport_fee: ugx(0),
        service_fee: ugx(0),
        status,
    })
    .unwrap();
    w.orders.insert(order.clone()).await.unwrap();
    order
}

#[test_case(OrderStatus::Pending, true; "pending is cancellable")]
#[test_case(OrderStatus::CashOnDelivery, true; "cash on delivery is cancellable")]
#[test_case(OrderStatus::Paid, false; "paid is not cancellable")]
#[test_case(OrderStatus::OutForDelivery, false; "out for delivery is not cancellable")]
#[test_case(OrderStatus::Delivered, false; "delivered is not cancellable")]
#[test_case(OrderStatus::Cancelled, false; "cancelled is not cancellable again")]
#[tokio::test]
async fn cancellation_guard_matrix(status: OrderStatus, allowed: bool) {
    let w = world();
    let svc = service(&w, TransitionPolicy::Strict);
    let customer = CustomerId::new();
    let token = w.identity.issue(customer);

    let product = Product::new("Gear oil", ugx(1200), 10);
    w.ledger.upsert(product.clone());
    let order = seed_order(&w, customer, &product, 2, status).await;

    let result = svc.cancel(&token, order.order_id()).await;

    if allowed {
        let receipt = result.unwrap();
        assert_eq!(receipt.status, OrderStatus::Cancelled);
        assert_eq!(receipt.id, order.order_id());
    } else {
        let err = result.unwrap_err();
        assert_eq!(
            err.to_string(),
            "Validation error: Order cannot be cancelled at this stage"
        );
        let stored = svc.get(order.order_id()).await.unwrap();
        assert_eq!(stored.status(), status);
    }
}

#[tokio::test]
async fn cancellation_by_non_owner_is_forbidden() {
    let w = world();
    let svc = service(&w, TransitionPolicy::Strict);
    let owner = CustomerId::new();
    let stranger_token = w.identity.issue(CustomerId::new());

    let product = Product::new("Gear oil", ugx(1200), 10);
    w.ledger.upsert(product.clone());
    let order = seed_order(&w, owner, &product, 2, OrderStatus::CashOnDelivery).await;

    let err = svc.cancel(&stranger_token, order.order_id()).await.unwrap_err();
    assert_eq!(
        err.to_string(),
        "Authorization error: You can only cancel your own orders"
    );
}

#[tokio::test]
async fn cancellation_restores_decremented_stock() {
    let w = world();
    let svc = service(&w, TransitionPolicy::Strict);
    let customer = CustomerId::new();
    let token = w.identity.issue(customer);

    // Stock as checkout left it: 10 on the shelf minus 4 ordered
    let product = Product::new("Radiator cap", ugx(600), 6);
    w.ledger.upsert(product.clone());
    let order = seed_order(&w, customer, &product, 4, OrderStatus::CashOnDelivery).await;

    svc.cancel(&token, order.order_id()).await.unwrap();

    assert_eq!(w.ledger.stock_of(product.id), Some(10));
    assert_eq!(w.events.event_types(), vec!["OrderCancelled"]);
}

#[tokio::test]
async fn full_admin_pipeline_to_delivery() {
    let w = world();
    let svc = service(&w, TransitionPolicy::Strict);
    let customer = CustomerId::new();

    let product = Product::new("Gear oil", ugx(1200), 10);
    w.ledger.upsert(product.clone());
    let order = seed_order(&w, customer, &product, 1, OrderStatus::Pending).await;
    let id = order.order_id();

    for status in [
        OrderStatus::CashOnDelivery,
        OrderStatus::OutForDelivery,
        OrderStatus::Delivered,
    ] {
        let updated = svc.set_status_as_admin(id, status).await.unwrap();
        assert_eq!(updated.status(), status);
    }

    let stored = svc.get(id).await.unwrap();
    assert_eq!(stored.status(), OrderStatus::Delivered);
    assert_eq!(stored.status_history().len(), 3);
    assert_eq!(
        w.events.event_types(),
        vec![
            "OrderStatusChanged",
            "OrderStatusChanged",
            "OrderStatusChanged"
        ]
    );
}

#[test_case(OrderStatus::Pending, OrderStatus::Paid; "pending straight to paid")]
#[test_case(OrderStatus::CashOnDelivery, OrderStatus::Paid; "cod to paid")]
#[test_case(OrderStatus::OutForDelivery, OrderStatus::Paid; "paid on the road")]
#[tokio::test]
async fn paid_is_reachable_administratively(from: OrderStatus, to: OrderStatus) {
    let w = world();
    let svc = service(&w, TransitionPolicy::Strict);

    let product = Product::new("Gear oil", ugx(1200), 10);
    w.ledger.upsert(product.clone());
    let order = seed_order(&w, CustomerId::new(), &product, 1, from).await;

    let updated = svc.set_status_as_admin(order.order_id(), to).await.unwrap();
    assert_eq!(updated.status(), OrderStatus::Paid);
}

#[tokio::test]
async fn strict_policy_rejects_terminal_escapes() {
    let w = world();
    let svc = service(&w, TransitionPolicy::Strict);

    let product = Product::new("Gear oil", ugx(1200), 10);
    w.ledger.upsert(product.clone());
    let order = seed_order(&w, CustomerId::new(), &product, 1, OrderStatus::Delivered).await;

    let err = svc
        .set_status_as_admin(order.order_id(), OrderStatus::Pending)
        .await
        .unwrap_err();
    assert!(matches!(err, DomainError::InvalidStateTransition { .. }));

    let stored = svc.get(order.order_id()).await.unwrap();
    assert_eq!(stored.status(), OrderStatus::Delivered);
}

#[tokio::test]
async fn permissive_policy_applies_out_of_band_transitions() {
    let w = world();
    let svc = service(&w, TransitionPolicy::Permissive);

    let product = Product::new("Gear oil", ugx(1200), 10);
    w.ledger.upsert(product.clone());
    let order = seed_order(&w, CustomerId::new(), &product, 1, OrderStatus::Pending).await;

    // Pending -> Delivered skips the pipeline; permissive lets it through
    let updated = svc
        .set_status_as_admin(order.order_id(), OrderStatus::Delivered)
        .await
        .unwrap();
    assert_eq!(updated.status(), OrderStatus::Delivered);
    assert_eq!(w.events.event_types(), vec!["OrderStatusChanged"]);
}

#[tokio::test]
async fn order_history_is_per_customer_and_newest_first() {
    let w = world();
    let svc = service(&w, TransitionPolicy::Strict);
    let customer = CustomerId::new();
    let token = w.identity.issue(customer);

    let product = Product::new("Gear oil", ugx(1200), 10);
    w.ledger.upsert(product.clone());

    let first = seed_order(&w, customer, &product, 1, OrderStatus::CashOnDelivery).await;
    std::thread::sleep(std::time::Duration::from_millis(5));
    let second = seed_order(&w, customer, &product, 2, OrderStatus::CashOnDelivery).await;
    seed_order(&w, CustomerId::new(), &product, 1, OrderStatus::CashOnDelivery).await;

    let mine = svc.list_for_customer(&token).await.unwrap();
    assert_eq!(mine.len(), 2);
    assert_eq!(mine[0].order_id(), second.order_id());
    assert_eq!(mine[1].order_id(), first.order_id());
}

#[tokio::test]
async fn totals_survive_the_lifecycle_unchanged() {
    let w = world();
    let svc = service(&w, TransitionPolicy::Strict);
    let customer = CustomerId::new();

    let product = Product::new("Gear oil", ugx(1200), 10);
    w.ledger.upsert(product.clone());
    let order = seed_order(&w, customer, &product, 2, OrderStatus::CashOnDelivery).await;

    svc.set_status_as_admin(order.order_id(), OrderStatus::OutForDelivery)
        .await
        .unwrap();
    svc.set_status_as_admin(order.order_id(), OrderStatus::Delivered)
        .await
        .unwrap();

    let stored = svc.get(order.order_id()).await.unwrap();
    assert_eq!(stored.total_amount(), &ugx(2400));
    assert_eq!(stored.lines().len(), 1);
    assert_eq!(stored.lines()[0].price, ugx(1200));
}
