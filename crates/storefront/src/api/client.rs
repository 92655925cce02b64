//! Backend REST client implementation.
//!
//! Uses `reqwest` 0.13 for HTTP. Caches catalog reads using `moka`
//! (5-minute TTL).

use std::sync::Arc;
use std::time::Duration;

use bakery_core::{OrderId, OrderReceipt, OrderRequest, OrderSummary, Product, ProductId};
use moka::future::Cache;
use reqwest::{RequestBuilder, StatusCode};
use secrecy::{ExposeSecret, SecretString};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};
use url::Url;

use super::ApiError;
use super::cache::{CacheKey, CacheValue, ProductQuery};
use super::envelope::{Envelope, ListEnvelope, Page, error_details};
use crate::config::ApiConfig;

/// Longest body excerpt written to logs.
const LOG_BODY_CHARS: usize = 500;

// =============================================================================
// ApiClient
// =============================================================================

/// Client for the bakery backend.
///
/// Cheap to clone; clones share the connection pool and the catalog cache.
#[derive(Clone)]
pub struct ApiClient {
    inner: Arc<ApiClientInner>,
}

struct ApiClientInner {
    client: reqwest::Client,
    base_url: Url,
    token: Option<SecretString>,
    cache: Cache<CacheKey, CacheValue>,
}

/// Payment intent created by the backend.
#[derive(Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentIntent {
    /// Secret the processor needs to confirm the intent.
    pub client_secret: String,
}

impl std::fmt::Debug for PaymentIntent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PaymentIntent")
            .field("client_secret", &"[REDACTED]")
            .finish()
    }
}

impl PaymentIntent {
    /// The intent identifier, i.e. the client secret up to `_secret_`.
    #[must_use]
    pub fn id(&self) -> &str {
        self.client_secret
            .split_once("_secret_")
            .map_or(self.client_secret.as_str(), |(id, _)| id)
    }
}

#[derive(Serialize)]
struct PaymentIntentBody {
    amount: i64,
}

impl ApiClient {
    /// Create a new backend client.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(config: &ApiConfig) -> Result<Self, ApiError> {
        let cache = Cache::builder()
            .max_capacity(1000)
            .time_to_live(Duration::from_secs(300)) // 5 minutes
            .build();

        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = config.timeout {
            builder = builder.timeout(timeout);
        }

        Ok(Self {
            inner: Arc::new(ApiClientInner {
                client: builder.build()?,
                base_url: config.base_url.clone(),
                token: config.token.clone(),
                cache,
            }),
        })
    }

    /// Build an endpoint URL from path segments.
    fn endpoint(&self, segments: &[&str]) -> Result<Url, ApiError> {
        let mut url = self.inner.base_url.clone();
        url.path_segments_mut()
            .map_err(|()| ApiError::Url(url::ParseError::RelativeUrlWithCannotBeABaseBase))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.inner.token {
            Some(token) => request.bearer_auth(token.expose_secret()),
            None => request,
        }
    }

    /// Send a request and return the body text.
    ///
    /// Non-success statuses become `ApiError::Api` carrying the extracted
    /// message, code and the raw body.
    async fn execute(&self, request: RequestBuilder) -> Result<String, ApiError> {
        let response = self
            .authorize(request)
            .header("Accept", "application/json")
            .send()
            .await?;

        let status = response.status();

        // Get response body as text first for better error diagnostics
        let body = response.text().await?;

        if !status.is_success() {
            let details = error_details(status, &body);
            if status.is_server_error() {
                tracing::error!(
                    status = %status,
                    body = %excerpt(&body),
                    "Backend returned server error"
                );
            } else {
                tracing::warn!(
                    status = %status,
                    message = %details.message,
                    "Backend rejected request"
                );
            }
            return Err(ApiError::Api {
                status: status.as_u16(),
                message: details.message,
                code: details.code,
                body,
            });
        }

        Ok(body)
    }

    /// GET a resource, mapping 404 to `ApiError::NotFound`.
    async fn get_json<T: DeserializeOwned>(
        &self,
        url: Url,
        resource: &str,
    ) -> Result<Envelope<T>, ApiError> {
        let body = match self.execute(self.inner.client.get(url)).await {
            Err(ApiError::Api { status, .. }) if status == StatusCode::NOT_FOUND.as_u16() => {
                return Err(ApiError::NotFound(resource.to_string()));
            }
            other => other?,
        };
        parse(&body)
    }

    async fn post_json<B: Serialize + Sync, T: DeserializeOwned>(
        &self,
        url: Url,
        payload: &B,
    ) -> Result<T, ApiError> {
        let body = self
            .execute(self.inner.client.post(url).json(payload))
            .await?;
        parse::<Envelope<T>>(&body).map(Envelope::into_inner)
    }

    // =========================================================================
    // Product Methods
    // =========================================================================

    /// Get a product, served from the catalog cache when fresh.
    ///
    /// # Errors
    ///
    /// Returns an error if the product is not found or the request fails.
    #[instrument(skip(self), fields(product_id = %id))]
    pub async fn get_product(&self, id: &ProductId) -> Result<Product, ApiError> {
        let cache_key = CacheKey::Product(id.clone());

        // Check cache
        if let Some(CacheValue::Product(product)) = self.inner.cache.get(&cache_key).await {
            debug!("Cache hit for product");
            return Ok(*product);
        }

        self.fetch_product(id).await
    }

    /// Get a product straight from the backend, refreshing the cache.
    ///
    /// Used wherever stock must be authoritative.
    ///
    /// # Errors
    ///
    /// Returns an error if the product is not found or the request fails.
    #[instrument(skip(self), fields(product_id = %id))]
    pub async fn fetch_product(&self, id: &ProductId) -> Result<Product, ApiError> {
        let url = self.endpoint(&["products", id.as_str()])?;
        let product: Product = self
            .get_json(url, &format!("product {id}"))
            .await?
            .into_inner();

        // Cache the result
        self.inner
            .cache
            .insert(
                CacheKey::Product(id.clone()),
                CacheValue::Product(Box::new(product.clone())),
            )
            .await;

        Ok(product)
    }

    /// List catalog products.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    #[instrument(skip(self))]
    pub async fn list_products(&self, query: &ProductQuery) -> Result<Page<Product>, ApiError> {
        let cache_key = CacheKey::Products(query.clone());

        if let Some(CacheValue::Products(page)) = self.inner.cache.get(&cache_key).await {
            debug!("Cache hit for product list");
            return Ok(page);
        }

        let mut url = self.endpoint(&["products"])?;
        let pairs = query.to_pairs();
        if !pairs.is_empty() {
            url.query_pairs_mut().extend_pairs(pairs);
        }

        let body = self.execute(self.inner.client.get(url)).await?;
        let page = Page::from(parse::<ListEnvelope<Product>>(&body)?);

        self.inner
            .cache
            .insert(cache_key, CacheValue::Products(page.clone()))
            .await;

        Ok(page)
    }

    // =========================================================================
    // Order Methods
    // =========================================================================

    /// Submit an order.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Api` carrying the backend's message if the order is
    /// refused, or a transport/parse error.
    #[instrument(skip(self, order), fields(lines = order.items.len(), total = %order.total))]
    pub async fn create_order(&self, order: &OrderRequest) -> Result<OrderReceipt, ApiError> {
        let url = self.endpoint(&["orders"])?;
        let receipt: OrderReceipt = self.post_json(url, order).await?;
        tracing::info!(order_id = %receipt.id, "Order created");
        Ok(receipt)
    }

    /// List the current customer's orders.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    #[instrument(skip(self))]
    pub async fn list_orders(&self) -> Result<Page<OrderSummary>, ApiError> {
        let url = self.endpoint(&["orders"])?;
        let body = self.execute(self.inner.client.get(url)).await?;
        Ok(Page::from(parse::<ListEnvelope<OrderSummary>>(&body)?))
    }

    /// Get one order.
    ///
    /// # Errors
    ///
    /// Returns an error if the order is not found or the request fails.
    #[instrument(skip(self), fields(order_id = %id))]
    pub async fn get_order(&self, id: &OrderId) -> Result<OrderSummary, ApiError> {
        let url = self.endpoint(&["orders", id.as_str()])?;
        Ok(self
            .get_json(url, &format!("order {id}"))
            .await?
            .into_inner())
    }

    // =========================================================================
    // Payment Methods
    // =========================================================================

    /// Ask the backend for a payment intent of `amount_minor` cents.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    #[instrument(skip(self))]
    pub async fn create_payment_intent(&self, amount_minor: i64) -> Result<PaymentIntent, ApiError> {
        let url = self.endpoint(&["payments", "create-payment-intent"])?;
        self.post_json(url, &PaymentIntentBody {
            amount: amount_minor,
        })
        .await
    }
}

fn parse<T: DeserializeOwned>(body: &str) -> Result<T, ApiError> {
    serde_json::from_str(body).map_err(|e| {
        tracing::error!(
            error = %e,
            body = %excerpt(body),
            "Failed to parse backend response"
        );
        ApiError::Parse(e)
    })
}

fn excerpt(body: &str) -> String {
    body.chars().take(LOG_BODY_CHARS).collect()
}
