//! Thin clients for the product catalog endpoints.
//!
//! Plain paginated GETs plus basic CRUD, with no retry or caching. All
//! requests ride on the shared [`crate::api::ApiClient`], so an
//! authenticated session's Authorization header is attached automatically.

pub mod categories;
pub mod products;

pub use categories::{CategoriesClient, Category, CategoryDraft};
pub use products::{Product, ProductDraft, ProductsClient};

use serde::{Deserialize, Serialize};

/// Query parameters accepted by every list endpoint.
#[derive(Debug, Clone, Serialize)]
pub struct PageQuery {
    /// Zero-based page index.
    pub page: u32,
    pub per_page: u32,
    pub search: String,
    /// Field to sort by, e.g. `productId`.
    pub sort: String,
    /// `asc` or `desc`.
    pub direction: String,
}

impl PageQuery {
    /// First page of ten, ascending by the given sort field.
    pub fn sorted_by(sort: &str) -> Self {
        Self {
            page: 0,
            per_page: 10,
            search: String::new(),
            sort: sort.to_string(),
            direction: "asc".to_string(),
        }
    }

    #[must_use]
    pub fn with_page(mut self, page: u32) -> Self {
        self.page = page;
        self
    }

    #[must_use]
    pub fn with_per_page(mut self, per_page: u32) -> Self {
        self.per_page = per_page;
        self
    }

    #[must_use]
    pub fn with_search(mut self, search: &str) -> Self {
        self.search = search.to_string();
        self
    }
}

/// Standard list envelope returned by the backend.
#[derive(Debug, Clone, Deserialize)]
#[serde(bound(deserialize = "T: Deserialize<'de>"))]
pub struct PageResponse<T> {
    /// Items for the requested page. A missing key parses as an empty page.
    #[serde(default)]
    pub result: Vec<T>,
}
