//! Integration tests for the bakery storefront.
//!
//! The tests drive the real HTTP client, payment processor and checkout
//! sequencer against [`FakeBackend`], an in-process axum server that plays
//! both the bakery API and the card processor.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p bakery-integration-tests
//! ```
//!
//! # Test Categories
//!
//! - `checkout` - Full checkout runs (success, stock conflict, decline)
//! - `api` - Response envelopes, list shapes and error messages

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use axum::extract::{Form, Path, Query, State};
use axum::http::{HeaderMap, StatusCode, header};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use bakery_storefront::config::{StorefrontConfig, parse_base_url};
use secrecy::SecretString;
use serde_json::{Value, json};

/// Publishable key configured for tests.
pub const TEST_PUBLISHABLE_KEY: &str = "pk_test_51Hx9mQ2eZvKYlo2C";

/// Shape used when answering list endpoints.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ListShape {
    /// `{"data": [...], "total": n, "page": 1, ...}`
    #[default]
    Paginated,
    /// `{"content": [...], "totalElements": n, "number": 0, ...}`
    Spring,
    /// `{"content": {"content": [...], ...}}`
    Nested,
    /// `[...]`
    Bare,
}

/// How `POST /orders` answers.
#[derive(Debug, Clone, Default)]
pub enum OrderResponse {
    /// Accept the order, echoing the submitted total unless one is given.
    #[default]
    Accept,
    AcceptWithTotal(f64),
    /// Refuse with this status and JSON body.
    Reject { status: u16, body: Value },
}

/// How the card processor answers a confirmation.
#[derive(Debug, Clone, Default)]
pub enum CardResponse {
    #[default]
    Succeed,
    /// HTTP 402 with the processor's error message.
    Decline(String),
    /// HTTP 200 with a non-final intent status.
    Pending(String),
}

/// Everything the fake backend knows and records.
#[derive(Debug, Default)]
pub struct BackendState {
    pub products: HashMap<String, Value>,
    pub orders: Vec<Value>,
    pub list_shape: ListShape,
    pub order_response: OrderResponse,
    pub card_response: CardResponse,
    /// When set, `POST /payments/create-payment-intent` fails with this body.
    pub intent_failure: Option<Value>,

    pub product_fetches: HashMap<String, u32>,
    pub product_queries: Vec<HashMap<String, String>>,
    pub submitted_orders: Vec<Value>,
    pub intent_amounts: Vec<i64>,
    pub confirmations: Vec<HashMap<String, String>>,
    pub authorization_headers: Vec<String>,
    next_order_id: i64,
}

impl BackendState {
    /// Add or replace a product.
    pub fn put_product(&mut self, id: i64, name: &str, price: f64, stock: u32) {
        self.products.insert(
            id.to_string(),
            json!({
                "id": id,
                "name": name,
                "price": price,
                "category": "panes",
                "stock": stock,
                "available": stock > 0,
            }),
        );
    }

    /// Change the stock of an existing product.
    pub fn set_stock(&mut self, id: i64, stock: u32) {
        if let Some(product) = self.products.get_mut(&id.to_string()) {
            product["stock"] = json!(stock);
            product["available"] = json!(stock > 0);
        }
    }

    /// How many times a product was fetched individually.
    #[must_use]
    pub fn fetches(&self, id: i64) -> u32 {
        self.product_fetches
            .get(&id.to_string())
            .copied()
            .unwrap_or_default()
    }
}

type Shared = Arc<Mutex<BackendState>>;

/// In-process bakery backend and card processor.
pub struct FakeBackend {
    addr: SocketAddr,
    state: Shared,
}

impl FakeBackend {
    /// Bind to an ephemeral port and start serving.
    ///
    /// # Panics
    ///
    /// Panics if the listener cannot be bound.
    pub async fn start() -> Self {
        let state = Shared::default();
        let app = router(state.clone());
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .unwrap_or_else(|e| panic!("bind listener: {e}"));
        let addr = listener
            .local_addr()
            .unwrap_or_else(|e| panic!("local addr: {e}"));
        tokio::spawn(async move { axum::serve(listener, app).await });
        Self { addr, state }
    }

    /// Lock the backend state for setup or assertions.
    ///
    /// Drop the guard before awaiting any request to the server.
    pub fn state(&self) -> MutexGuard<'_, BackendState> {
        lock(&self.state)
    }

    /// Root URL of the server.
    #[must_use]
    pub fn url(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// Storefront configuration pointing both the API and the processor here.
    ///
    /// # Panics
    ///
    /// Panics if the server URL does not parse.
    #[must_use]
    pub fn config(&self) -> StorefrontConfig {
        let url = parse_base_url(&self.url()).unwrap_or_else(|e| panic!("server url: {e}"));
        let mut config = StorefrontConfig::new(url.clone(), url);
        config.payments.publishable_key = Some(SecretString::from(TEST_PUBLISHABLE_KEY));
        config
    }
}

fn lock(state: &Shared) -> MutexGuard<'_, BackendState> {
    state.lock().unwrap_or_else(PoisonError::into_inner)
}

fn router(state: Shared) -> Router {
    Router::new()
        .route("/products", get(list_products))
        .route("/products/{id}", get(get_product))
        .route("/orders", get(list_orders).post(create_order))
        .route("/orders/{id}", get(get_order))
        .route("/payments/create-payment-intent", post(create_payment_intent))
        .route("/v1/payment_intents/{id}/confirm", post(confirm_intent))
        .with_state(state)
}

fn not_found(message: &str) -> Response {
    (StatusCode::NOT_FOUND, Json(json!({ "message": message }))).into_response()
}

fn list_body(shape: ListShape, items: Vec<Value>) -> Value {
    let total = items.len();
    match shape {
        ListShape::Paginated => json!({
            "data": items,
            "total": total,
            "page": 1,
            "pageSize": 20,
            "totalPages": 1,
        }),
        ListShape::Spring => json!({
            "content": items,
            "totalElements": total,
            "number": 0,
            "size": 20,
            "totalPages": 1,
        }),
        ListShape::Nested => json!({
            "content": {
                "content": items,
                "totalElements": total,
                "number": 0,
                "size": 20,
                "totalPages": 1,
            }
        }),
        ListShape::Bare => Value::Array(items),
    }
}

async fn list_products(
    State(state): State<Shared>,
    Query(query): Query<HashMap<String, String>>,
) -> Json<Value> {
    let mut backend = lock(&state);
    let category = query.get("category").cloned();
    backend.product_queries.push(query);

    let mut items: Vec<Value> = backend
        .products
        .values()
        .filter(|p| category.as_deref().is_none_or(|c| p["category"] == c))
        .cloned()
        .collect();
    items.sort_by_key(|p| p["id"].as_i64());
    Json(list_body(backend.list_shape, items))
}

async fn get_product(State(state): State<Shared>, Path(id): Path<String>) -> Response {
    let mut backend = lock(&state);
    *backend.product_fetches.entry(id.clone()).or_default() += 1;
    match backend.products.get(&id) {
        Some(product) => Json(json!({ "data": product })).into_response(),
        None => not_found("Producto no encontrado"),
    }
}

async fn create_order(State(state): State<Shared>, Json(order): Json<Value>) -> Response {
    let mut backend = lock(&state);
    backend.submitted_orders.push(order.clone());

    let total = match backend.order_response.clone() {
        OrderResponse::Reject { status, body } => {
            let status = StatusCode::from_u16(status).unwrap_or(StatusCode::BAD_REQUEST);
            return (status, Json(body)).into_response();
        }
        OrderResponse::Accept => order["total"].clone(),
        OrderResponse::AcceptWithTotal(total) => json!(total),
    };

    backend.next_order_id += 1;
    let id = 1000 + backend.next_order_id;
    let stored = json!({
        "id": id,
        "status": "pendiente",
        "total": total,
        "items": order["items"]
            .as_array()
            .map(|lines| {
                lines
                    .iter()
                    .map(|line| json!({ "productId": line["productId"], "quantity": line["quantity"] }))
                    .collect::<Vec<_>>()
            })
            .unwrap_or_default(),
        "address": order["address"],
        "paymentMethod": order["paymentMethod"],
        "createdAt": "2026-10-19T15:30:00Z",
    });
    backend.orders.push(stored);

    (
        StatusCode::CREATED,
        Json(json!({ "data": { "id": id, "status": "pendiente", "total": total } })),
    )
        .into_response()
}

async fn list_orders(State(state): State<Shared>) -> Json<Value> {
    let backend = lock(&state);
    Json(list_body(backend.list_shape, backend.orders.clone()))
}

async fn get_order(State(state): State<Shared>, Path(id): Path<String>) -> Response {
    let backend = lock(&state);
    backend
        .orders
        .iter()
        .find(|order| order["id"].to_string() == id)
        .map_or_else(
            || not_found("Pedido no encontrado"),
            |order| Json(order.clone()).into_response(),
        )
}

async fn create_payment_intent(State(state): State<Shared>, Json(body): Json<Value>) -> Response {
    let mut backend = lock(&state);
    if let Some(failure) = backend.intent_failure.clone() {
        return (StatusCode::INTERNAL_SERVER_ERROR, Json(failure)).into_response();
    }
    let amount = body["amount"].as_i64().unwrap_or_default();
    backend.intent_amounts.push(amount);
    let n = backend.intent_amounts.len();
    Json(json!({ "clientSecret": format!("pi_test{n}_secret_Zx81") })).into_response()
}

async fn confirm_intent(
    State(state): State<Shared>,
    Path(id): Path<String>,
    headers: HeaderMap,
    Form(form): Form<HashMap<String, String>>,
) -> Response {
    let mut backend = lock(&state);
    let authorization = headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .unwrap_or_default()
        .to_string();
    backend.authorization_headers.push(authorization);
    backend.confirmations.push(form);

    match backend.card_response.clone() {
        CardResponse::Succeed => Json(json!({ "id": id, "status": "succeeded" })).into_response(),
        CardResponse::Decline(message) => (
            StatusCode::PAYMENT_REQUIRED,
            Json(json!({ "error": { "message": message, "code": "card_declined" } })),
        )
            .into_response(),
        CardResponse::Pending(status) => Json(json!({ "id": id, "status": status })).into_response(),
    }
}
