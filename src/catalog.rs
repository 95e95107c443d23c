// Copyright 2026 AutoHub Garage.

//! Catalog read side
//!
//! Query handlers return storefront views from read models kept up to date
//! by the embedder (projected from the product/category/promotion tables).
//! This side never writes: checkout's ledger fetch is the only read path
//! with billing authority, and it goes straight to the ledger instead.

use crate::entity::{CategoryId, ProductId, PromotionId};
use crate::money::Money;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

/// Query result type
pub type QueryResult<T> = Result<T, String>;

/// Query handler trait that returns data directly
pub trait DirectQueryHandler<Q, R> {
    /// Handle the query and return the result
    fn handle(&self, query: Q) -> QueryResult<R>;
}

/// Read model storage trait
pub trait ReadModelStorage<T>: Send + Sync {
    /// Get an item by ID
    fn get(&self, id: &str) -> Option<T>;

    /// Query items by criteria
    fn query(&self, criteria: &QueryCriteria) -> Vec<T>;

    /// Get all items
    fn all(&self) -> Vec<T>;
}

/// Query criteria for filtering
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryCriteria {
    /// Filter conditions as key-value pairs
    pub filters: HashMap<String, serde_json::Value>,
    /// Maximum number of results to return
    pub limit: Option<usize>,
    /// Number of results to skip
    pub offset: Option<usize>,
}

impl QueryCriteria {
    /// Create a new empty query criteria
    pub fn new() -> Self {
        Self {
            filters: HashMap::new(),
            limit: None,
            offset: None,
        }
    }

    /// Add a filter condition
    pub fn with_filter(mut self, key: impl Into<String>, value: impl Serialize) -> Self {
        if let Ok(value) = serde_json::to_value(value) {
            self.filters.insert(key.into(), value);
        }
        self
    }

    /// Set the result limit
    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }
}

impl Default for QueryCriteria {
    fn default() -> Self {
        Self::new()
    }
}

/// In-memory read model storage
#[derive(Clone)]
pub struct InMemoryReadModel<T: Clone> {
    storage: Arc<RwLock<HashMap<String, T>>>,
}

impl<T: Clone> InMemoryReadModel<T> {
    /// Create a new in-memory read model
    pub fn new() -> Self {
        Self {
            storage: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Insert an item into the read model
    pub fn insert(&self, id: String, item: T) {
        self.storage.write().unwrap().insert(id, item);
    }
}

impl<T: Clone> Default for InMemoryReadModel<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Clone + Serialize + Send + Sync> ReadModelStorage<T> for InMemoryReadModel<T> {
    fn get(&self, id: &str) -> Option<T> {
        self.storage.read().unwrap().get(id).cloned()
    }

    fn query(&self, criteria: &QueryCriteria) -> Vec<T> {
        let storage = self.storage.read().unwrap();
        let mut results: Vec<T> = storage
            .values()
            .filter(|item| matches_filters(item, &criteria.filters))
            .cloned()
            .collect();

        if let Some(offset) = criteria.offset {
            results = results.into_iter().skip(offset).collect();
        }
        if let Some(limit) = criteria.limit {
            results.truncate(limit);
        }

        results
    }

    fn all(&self) -> Vec<T> {
        self.storage.read().unwrap().values().cloned().collect()
    }
}

// Filters compare against the item's serialized fields, so any view type
// works without a per-type predicate.
fn matches_filters<T: Serialize>(
    item: &T,
    filters: &HashMap<String, serde_json::Value>,
) -> bool {
    if filters.is_empty() {
        return true;
    }
    let Ok(value) = serde_json::to_value(item) else {
        return false;
    };
    filters
        .iter()
        .all(|(key, expected)| value.get(key) == Some(expected))
}

// Product views and queries

/// Product view for storefront queries
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductView {
    /// Product identifier
    pub product_id: ProductId,
    /// Display name
    pub name: String,
    /// Optional long description
    pub description: Option<String>,
    /// Display price
    pub price: Money,
    /// Units on hand
    pub stock: u32,
    /// Image URLs
    pub images: Vec<String>,
    /// Owning category, if categorized
    pub category_id: Option<CategoryId>,
    /// Whether the product is visible to shoppers
    pub is_active: bool,
    /// Merchandising flag for the landing page
    pub is_best_selling: bool,
}

impl From<&crate::product::Product> for ProductView {
    fn from(product: &crate::product::Product) -> Self {
        Self {
            product_id: product.id,
            name: product.name.clone(),
            description: product.description.clone(),
            price: product.price.clone(),
            stock: product.stock,
            images: product.images.clone(),
            category_id: product.category_id,
            is_active: product.is_active,
            is_best_selling: product.is_best_selling,
        }
    }
}

/// Query to get a product by ID
#[derive(Debug, Clone)]
pub struct GetProductById {
    /// The product to retrieve
    pub product_id: ProductId,
}

/// Query to list active products
#[derive(Debug, Clone)]
pub struct FindActiveProducts {
    /// Maximum number of results to return
    pub limit: Option<usize>,
}

/// Query to list a category's active products
#[derive(Debug, Clone)]
pub struct FindProductsByCategory {
    /// The category to search within
    pub category_id: CategoryId,
    /// Maximum number of results to return
    pub limit: Option<usize>,
}

/// Query to list best-selling products for the landing page
#[derive(Debug, Clone)]
pub struct FindBestSelling {
    /// Maximum number of results to return
    pub limit: Option<usize>,
}

/// Handler for product queries
pub struct ProductQueryHandler<R: ReadModelStorage<ProductView>> {
    read_model: R,
}

impl<R: ReadModelStorage<ProductView>> ProductQueryHandler<R> {
    /// Create a new product query handler
    pub fn new(read_model: R) -> Self {
        Self { read_model }
    }
}

impl<R: ReadModelStorage<ProductView>> DirectQueryHandler<GetProductById, Option<ProductView>>
    for ProductQueryHandler<R>
{
    fn handle(&self, query: GetProductById) -> QueryResult<Option<ProductView>> {
        Ok(self.read_model.get(&query.product_id.to_string()))
    }
}

impl<R: ReadModelStorage<ProductView>> DirectQueryHandler<FindActiveProducts, Vec<ProductView>>
    for ProductQueryHandler<R>
{
    fn handle(&self, query: FindActiveProducts) -> QueryResult<Vec<ProductView>> {
        let criteria = QueryCriteria::new()
            .with_filter("is_active", true)
            .with_limit(query.limit.unwrap_or(100));
        Ok(self.read_model.query(&criteria))
    }
}

impl<R: ReadModelStorage<ProductView>> DirectQueryHandler<FindProductsByCategory, Vec<ProductView>>
    for ProductQueryHandler<R>
{
    fn handle(&self, query: FindProductsByCategory) -> QueryResult<Vec<ProductView>> {
        let criteria = QueryCriteria::new()
            .with_filter("is_active", true)
            .with_filter("category_id", query.category_id)
            .with_limit(query.limit.unwrap_or(100));
        Ok(self.read_model.query(&criteria))
    }
}

impl<R: ReadModelStorage<ProductView>> DirectQueryHandler<FindBestSelling, Vec<ProductView>>
    for ProductQueryHandler<R>
{
    fn handle(&self, query: FindBestSelling) -> QueryResult<Vec<ProductView>> {
        let criteria = QueryCriteria::new()
            .with_filter("is_active", true)
            .with_filter("is_best_selling", true)
            .with_limit(query.limit.unwrap_or(20));
        Ok(self.read_model.query(&criteria))
    }
}

// Category views and queries

/// Category view for storefront navigation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CategoryView {
    /// Category identifier
    pub category_id: CategoryId,
    /// Display name
    pub name: String,
    /// Optional banner image
    pub image: Option<String>,
}

/// Query to list all categories
#[derive(Debug, Clone)]
pub struct FindCategories;

/// Handler for category queries
pub struct CategoryQueryHandler<R: ReadModelStorage<CategoryView>> {
    read_model: R,
}

impl<R: ReadModelStorage<CategoryView>> CategoryQueryHandler<R> {
    /// Create a new category query handler
    pub fn new(read_model: R) -> Self {
        Self { read_model }
    }
}

impl<R: ReadModelStorage<CategoryView>> DirectQueryHandler<FindCategories, Vec<CategoryView>>
    for CategoryQueryHandler<R>
{
    fn handle(&self, _query: FindCategories) -> QueryResult<Vec<CategoryView>> {
        Ok(self.read_model.all())
    }
}

// Promotion views and queries

/// Promotion view for storefront banners
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PromotionView {
    /// Promotion identifier
    pub promotion_id: PromotionId,
    /// Banner title
    pub title: String,
    /// Optional banner copy
    pub description: Option<String>,
    /// Discount percentage advertised, if any
    pub discount_percent: Option<u8>,
    /// Product the banner links to, if any
    pub product_id: Option<ProductId>,
    /// Banner image
    pub image: Option<String>,
    /// When the promotion starts
    pub starts_at: DateTime<Utc>,
    /// When the promotion ends
    pub ends_at: DateTime<Utc>,
    /// Kill switch independent of the date window
    pub is_active: bool,
}

impl PromotionView {
    /// Whether the promotion should show at the given instant.
    pub fn is_live_at(&self, at: DateTime<Utc>) -> bool {
        self.is_active && self.starts_at <= at && at < self.ends_at
    }
}

/// Query to list promotions live at a given instant
#[derive(Debug, Clone)]
pub struct FindActivePromotions {
    /// The instant to evaluate the date window against
    pub at: DateTime<Utc>,
}

/// Handler for promotion queries
pub struct PromotionQueryHandler<R: ReadModelStorage<PromotionView>> {
    read_model: R,
}

impl<R: ReadModelStorage<PromotionView>> PromotionQueryHandler<R> {
    /// Create a new promotion query handler
    pub fn new(read_model: R) -> Self {
        Self { read_model }
    }
}

impl<R: ReadModelStorage<PromotionView>> DirectQueryHandler<FindActivePromotions, Vec<PromotionView>>
    for PromotionQueryHandler<R>
{
    fn handle(&self, query: FindActivePromotions) -> QueryResult<Vec<PromotionView>> {
        // The date window needs a comparison, not an equality filter, so it
        // is evaluated here rather than in QueryCriteria.
        Ok(self
            .read_model
            .query(&QueryCriteria::new().with_filter("is_active", true))
            .into_iter()
            .filter(|promotion| promotion.is_live_at(query.at))
            .collect())
    }
}
