//! # AutoHub Commerce
//!
//! Commerce domain core for the AutoHub Garage storefront. This crate holds
//! the business logic the web layer delegates to:
//!
//! - **Cart**: a per-identity, client-persisted collection of line items,
//!   synchronized across browsing contexts by broadcast-and-reload
//! - **Checkout**: converts a cart snapshot into an authoritative order,
//!   enforcing ledger prices and stock server-side
//! - **Orders**: an aggregate whose lifecycle is an actor-aware state
//!   machine, with customer cancellation and admin pipeline transitions
//! - **Catalog**: the read side serving storefront product, category and
//!   promotion views
//! - **Favorites**: per-customer saved products behind a session-scoped cache
//!
//! ## Design Principles
//!
//! 1. **Ledger authority**: prices and stock come from the product ledger at
//!    checkout time; client-cached snapshots are display artifacts
//! 2. **Type Safety**: phantom-typed ids keep product, order and customer
//!    references apart at compile time
//! 3. **Controlled State**: order status transitions go through an explicit
//!    table keyed by the acting party
//! 4. **Collaborator Seams**: the database, identity provider and client
//!    key-value store sit behind traits with in-memory reference
//!    implementations
//! 5. **Graceful Cart Degradation**: cart storage failures fall back to an
//!    empty cart or best-effort writes, never a broken UI

#![warn(missing_docs)]

mod entity;
mod errors;
mod events;
mod identity;
mod money;
mod order;
mod product;
mod repository;
mod state_machine;

pub mod cart;
pub mod catalog;
pub mod checkout;
pub mod favorites;
pub mod orders;

// Re-export core types
pub use entity::{
    AggregateRoot, CategoryId, CategoryMarker, CustomerId, CustomerMarker, Entity, EntityId,
    OrderId, OrderMarker, ProductId, ProductMarker, PromotionId, PromotionMarker,
};
pub use errors::{DomainError, DomainResult};
pub use events::{
    CorrelationId, DomainEvent, EventPublisher, MockEventPublisher, OrderCancelled, OrderPlaced,
    OrderStatusChanged,
};
pub use identity::{BearerToken, CustomerIdentity, IdentityProvider, StaticTokenProvider};
pub use money::{Currency, Money};
pub use order::{
    Order, OrderActor, OrderDetails, OrderLineItem, OrderNumber, OrderStatus, OrderUpdate,
    PaymentMethod,
};
pub use product::{InMemoryProductLedger, Product, ProductLedger};
pub use repository::{InMemoryOrderRepository, OrderRepository};
pub use state_machine::{
    MealyMachine, MealyStateTransitions, State, StateTransition, TransitionInput,
};

pub use cart::{
    Cart, CartBus, CartChanged, CartLineItem, CartSession, CartStorage, InMemoryCartStorage,
    LineItemId, LocalCartStore, ProductSnapshot,
};
pub use catalog::{
    CategoryQueryHandler, CategoryView, DirectQueryHandler, FindActiveProducts,
    FindActivePromotions, FindBestSelling, FindCategories, FindProductsByCategory, GetProductById,
    InMemoryReadModel, ProductQueryHandler, ProductView, PromotionQueryHandler, PromotionView,
    QueryCriteria, ReadModelStorage,
};
pub use checkout::{
    CheckoutConfig, CheckoutConfirmation, CheckoutLine, CheckoutRequest, CheckoutService,
    ContactInfo,
};
pub use favorites::{Favorite, FavoritesCache, FavoritesStore, InMemoryFavoritesStore};
pub use orders::{CancellationReceipt, OrderService, TransitionPolicy};
