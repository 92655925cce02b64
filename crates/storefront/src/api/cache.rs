//! Cache types for catalog responses.

use bakery_core::{Product, ProductId};

use super::envelope::Page;

/// Cache key for catalog reads.
#[derive(Debug, Clone, Hash, PartialEq, Eq)]
pub enum CacheKey {
    Product(ProductId),
    Products(ProductQuery),
}

/// Cached value types.
#[derive(Debug, Clone)]
pub enum CacheValue {
    Product(Box<Product>),
    Products(Page<Product>),
}

/// Catalog listing filters.
#[derive(Debug, Clone, Default, Hash, PartialEq, Eq)]
pub struct ProductQuery {
    /// 1-based page number
    pub page: Option<u32>,
    pub page_size: Option<u32>,
    pub category: Option<String>,
    pub search: Option<String>,
}

impl ProductQuery {
    /// Query-string pairs, skipping unset filters.
    #[must_use]
    pub fn to_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = Vec::new();
        if let Some(page) = self.page {
            pairs.push(("page", page.to_string()));
        }
        if let Some(size) = self.page_size {
            pairs.push(("pageSize", size.to_string()));
        }
        if let Some(category) = self.category.as_deref().filter(|c| !c.trim().is_empty()) {
            pairs.push(("category", category.trim().to_string()));
        }
        if let Some(search) = self.search.as_deref().filter(|s| !s.trim().is_empty()) {
            pairs.push(("search", search.trim().to_string()));
        }
        pairs
    }
}
