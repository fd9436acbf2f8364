//! Cache types for records API responses.

use stockyard_core::{Company, CompanyId, Product};

/// Cache key for companies and catalog listings.
#[derive(Debug, Clone, Hash, PartialEq, Eq)]
pub enum CacheKey {
    Company(String),
    Products(CompanyId),
}

/// Cached value types.
#[derive(Debug, Clone)]
pub enum CacheValue {
    Company(Box<Company>),
    Products(Vec<Product>),
}
