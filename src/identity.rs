// Copyright 2026 AutoHub Garage.

//! Customer identity and bearer-token resolution
//!
//! The storefront separates one shopper's cart from another's by an identity
//! bucket: authenticated customers get a bucket keyed by their id, everyone
//! else shares the guest bucket. Checkout and cancellation additionally
//! require a bearer token resolvable to a customer id by the external
//! identity provider, which this module models as a trait seam.

use crate::entity::CustomerId;
use crate::errors::{DomainError, DomainResult};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::RwLock;

/// The identity owning a cart: a signed-in customer or the shared guest bucket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CustomerIdentity {
    /// Unauthenticated shopper
    Guest,
    /// Authenticated customer
    Customer(CustomerId),
}

impl CustomerIdentity {
    /// The storage partition key for this identity's cart.
    ///
    /// Guest and customer buckets are independent carts; switching identity
    /// switches buckets without merging.
    pub fn bucket_key(&self) -> String {
        match self {
            CustomerIdentity::Guest => "cart_guest".to_string(),
            CustomerIdentity::Customer(id) => format!("cart_{id}"),
        }
    }

    /// The customer id, if authenticated.
    pub fn customer_id(&self) -> Option<CustomerId> {
        match self {
            CustomerIdentity::Guest => None,
            CustomerIdentity::Customer(id) => Some(*id),
        }
    }
}

/// An opaque bearer token presented by the client.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BearerToken(String);

impl BearerToken {
    /// Wrap a raw token string.
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    /// The raw token value.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// External identity provider seam.
///
/// Resolution is a network round-trip to the hosted auth service; absence or
/// invalidity of the token fails with `AuthenticationError`.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Resolve a bearer token to the customer it belongs to.
    async fn resolve(&self, token: &BearerToken) -> DomainResult<CustomerId>;
}

/// Token-table identity provider for tests and embedding.
#[derive(Default)]
pub struct StaticTokenProvider {
    tokens: RwLock<HashMap<String, CustomerId>>,
}

impl StaticTokenProvider {
    /// Create an empty provider.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a token for a customer and return it.
    pub fn issue(&self, customer: CustomerId) -> BearerToken {
        let token = format!("tok-{}", uuid::Uuid::new_v4().simple());
        self.tokens
            .write()
            .unwrap()
            .insert(token.clone(), customer);
        BearerToken::new(token)
    }

    /// Revoke a previously issued token.
    pub fn revoke(&self, token: &BearerToken) {
        self.tokens.write().unwrap().remove(token.as_str());
    }
}

#[async_trait]
impl IdentityProvider for StaticTokenProvider {
    async fn resolve(&self, token: &BearerToken) -> DomainResult<CustomerId> {
        self.tokens
            .read()
            .unwrap()
            .get(token.as_str())
            .copied()
            .ok_or_else(|| DomainError::AuthenticationError("Invalid token".to_string()))
    }
}
