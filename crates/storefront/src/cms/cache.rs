//! Cache types for catalog responses.

use std::sync::Arc;

use zone7_core::ProductId;
use zone7_core::catalog::{Category, Product};

/// Cache key for products and categories.
#[derive(Debug, Clone, Hash, PartialEq, Eq)]
pub enum CacheKey {
    Products,
    Product(ProductId),
    Categories,
}

/// Cached value types.
#[derive(Debug, Clone)]
pub enum CacheValue {
    Products(Arc<Vec<Product>>),
    Product(Box<Product>),
    Categories(Arc<Vec<Category>>),
}
