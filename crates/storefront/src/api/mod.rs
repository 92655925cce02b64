//! Bakery backend REST client.
//!
//! # Architecture
//!
//! - The backend is the source of truth for products, stock and orders
//! - Every response goes through [`envelope`] normalization at the boundary
//! - Catalog reads are cached via `moka` (5 minute TTL); stock checks bypass
//!   the cache
//!
//! # Example
//!
//! ```rust,ignore
//! use bakery_storefront::api::ApiClient;
//!
//! let client = ApiClient::new(&config.api)?;
//! let product = client.get_product(&ProductId::new("12")).await?;
//! ```

mod cache;
mod client;
pub mod envelope;

pub use cache::ProductQuery;
pub use client::ApiClient;
pub use envelope::Page;

use async_trait::async_trait;
use bakery_core::{OrderReceipt, OrderRequest, Product, ProductId};
use thiserror::Error;

/// Machine codes the backend uses for stock conflicts.
const STOCK_CODES: &[&str] = &["INSUFFICIENT_STOCK", "OUT_OF_STOCK"];

/// Message fragments the backend uses for stock conflicts when no code is sent.
const STOCK_PHRASES: &[&str] = &["stock insuficiente", "insufficient stock"];

/// Errors that can occur when talking to the backend.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Transport failure (connection, timeout, TLS).
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The backend answered with a non-success status.
    #[error("{message}")]
    Api {
        status: u16,
        message: String,
        code: Option<String>,
        body: String,
    },

    /// The response body did not match the expected shape.
    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// A request URL could not be built.
    #[error("Invalid URL: {0}")]
    Url(#[from] url::ParseError),
}

/// Why the backend refused an order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderRejection {
    /// At least one line asked for more than the backend has.
    InsufficientStock,
    /// Anything else; surfaced as-is.
    Other,
}

impl ApiError {
    /// Classify an order submission failure.
    ///
    /// A structured code wins; otherwise the message and raw body are
    /// searched for the known stock phrases.
    #[must_use]
    pub fn rejection(&self) -> OrderRejection {
        let Self::Api {
            message, code, body, ..
        } = self
        else {
            return OrderRejection::Other;
        };

        if let Some(code) = code {
            let code = code.trim().to_ascii_uppercase();
            if STOCK_CODES.contains(&code.as_str()) {
                return OrderRejection::InsufficientStock;
            }
        }

        let haystack = format!("{message}\n{body}").to_lowercase();
        if STOCK_PHRASES.iter().any(|phrase| haystack.contains(phrase)) {
            OrderRejection::InsufficientStock
        } else {
            OrderRejection::Other
        }
    }

    /// The message to show the shopper.
    #[must_use]
    pub fn message(&self) -> String {
        match self {
            Self::Api { message, .. } => message.clone(),
            other => other.to_string(),
        }
    }

    /// HTTP status, if the backend answered.
    #[must_use]
    pub const fn status(&self) -> Option<u16> {
        match self {
            Self::Api { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// The backend operations checkout depends on.
#[async_trait]
pub trait OrderBackend: Send + Sync {
    /// Current product record with authoritative stock.
    async fn fetch_product(&self, id: &ProductId) -> Result<Product, ApiError>;

    /// Submit an order.
    async fn submit_order(&self, order: &OrderRequest) -> Result<OrderReceipt, ApiError>;
}

#[async_trait]
impl OrderBackend for ApiClient {
    async fn fetch_product(&self, id: &ProductId) -> Result<Product, ApiError> {
        Self::fetch_product(self, id).await
    }

    async fn submit_order(&self, order: &OrderRequest) -> Result<OrderReceipt, ApiError> {
        self.create_order(order).await
    }
}
