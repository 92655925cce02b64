//! Backend client behavior over real HTTP: envelopes, list shapes, caching
//! and error messages.

#![allow(clippy::unwrap_used)]

use bakery_core::{Money, OrderId, OrderStatus, ProductId};
use bakery_integration_tests::{FakeBackend, ListShape};
use bakery_storefront::api::{ApiClient, ApiError, ProductQuery};
use serde_json::json;

async fn start() -> (FakeBackend, ApiClient) {
    let server = FakeBackend::start().await;
    {
        let mut state = server.state();
        state.put_product(1, "Pan de molde", 20.0, 5);
        state.put_product(2, "Torta de chocolate", 12.5, 0);
        state.put_product(3, "Alfajor", 2.5, 40);
    }
    let api = ApiClient::new(&server.config().api).unwrap();
    (server, api)
}

#[tokio::test]
async fn test_product_is_unwrapped_from_data_envelope() {
    let (_server, api) = start().await;

    let product = api.get_product(&ProductId::new("1")).await.unwrap();

    assert_eq!(product.name, "Pan de molde");
    assert_eq!(product.price, Money::from_major_units(20));
    assert_eq!(product.stock, 5);
    assert!(product.is_purchasable());
}

#[tokio::test]
async fn test_sold_out_product_is_not_purchasable() {
    let (_server, api) = start().await;
    let product = api.get_product(&ProductId::new("2")).await.unwrap();
    assert!(!product.is_purchasable());
}

#[tokio::test]
async fn test_get_product_is_cached_but_fetch_is_not() {
    let (server, api) = start().await;
    let id = ProductId::new("3");

    api.get_product(&id).await.unwrap();
    api.get_product(&id).await.unwrap();
    assert_eq!(server.state().fetches(3), 1);

    server.state().set_stock(3, 7);
    let fresh = api.fetch_product(&id).await.unwrap();
    assert_eq!(fresh.stock, 7);
    assert_eq!(server.state().fetches(3), 2);

    // The forced fetch refreshed the cached copy
    let cached = api.get_product(&id).await.unwrap();
    assert_eq!(cached.stock, 7);
    assert_eq!(server.state().fetches(3), 2);
}

#[tokio::test]
async fn test_missing_product_is_not_found() {
    let (_server, api) = start().await;

    let err = api.get_product(&ProductId::new("404")).await.unwrap_err();

    assert!(matches!(err, ApiError::NotFound(_)));
}

#[tokio::test]
async fn test_every_list_shape_yields_the_same_page() {
    for shape in [
        ListShape::Paginated,
        ListShape::Spring,
        ListShape::Nested,
        ListShape::Bare,
    ] {
        let (server, api) = start().await;
        server.state().list_shape = shape;

        let page = api.list_products(&ProductQuery::default()).await.unwrap();

        assert_eq!(page.items.len(), 3, "{shape:?}");
        assert_eq!(page.page, 1, "{shape:?}");
        assert_eq!(page.total, 3, "{shape:?}");
        assert_eq!(page.total_pages, 1, "{shape:?}");
        assert!(!page.has_next(), "{shape:?}");
        assert_eq!(page.items.first().unwrap().name, "Pan de molde", "{shape:?}");
    }
}

#[tokio::test]
async fn test_catalog_query_is_sent_as_parameters() {
    let (server, api) = start().await;
    let query = ProductQuery {
        page: Some(2),
        page_size: Some(12),
        category: Some("panes".to_string()),
        search: Some("  ".to_string()),
    };

    api.list_products(&query).await.unwrap();

    let state = server.state();
    let sent = state.product_queries.first().unwrap();
    assert_eq!(sent.get("page").map(String::as_str), Some("2"));
    assert_eq!(sent.get("pageSize").map(String::as_str), Some("12"));
    assert_eq!(sent.get("category").map(String::as_str), Some("panes"));
    assert!(!sent.contains_key("search"));
}

#[tokio::test]
async fn test_order_history_and_detail() {
    let (server, api) = start().await;
    server.state().orders.push(json!({
        "id": 77,
        "status": "En preparación",
        "total": 45.9,
        "items": [{ "productId": 1, "name": "Pan de molde", "price": 20.0, "quantity": 2 }],
        "paymentMethod": "card",
        "createdAt": "2026-10-18T09:15:00Z",
        "canal": "mostrador",
    }));
    server.state().list_shape = ListShape::Spring;

    let page = api.list_orders().await.unwrap();
    assert_eq!(page.items.len(), 1);
    let summary = page.items.first().unwrap();
    assert_eq!(summary.status, OrderStatus::InPreparation);
    assert_eq!(summary.unit_count(), 2);

    let order = api.get_order(&OrderId::new("77")).await.unwrap();
    assert_eq!(order.total, Money::from_minor_units(4_590));
    assert!(order.created_at.is_some());

    let err = api.get_order(&OrderId::new("78")).await.unwrap_err();
    assert!(matches!(err, ApiError::NotFound(_)));
}

#[tokio::test]
async fn test_backend_error_message_is_kept_verbatim() {
    let (server, api) = start().await;
    server.state().intent_failure = Some(json!({ "detail": "Monto mínimo S/ 2.00" }));

    let err = api.create_payment_intent(50).await.unwrap_err();

    assert_eq!(err.to_string(), "Monto mínimo S/ 2.00");
    assert_eq!(err.status(), Some(500));
}

#[tokio::test]
async fn test_payment_intent_secret_is_returned() {
    let (server, api) = start().await;

    let intent = api.create_payment_intent(5_775).await.unwrap();

    assert_eq!(intent.id(), "pi_test1");
    assert_eq!(server.state().intent_amounts, vec![5_775]);
}

#[tokio::test]
async fn test_unreachable_backend_is_a_transport_error() {
    let (server, _) = start().await;
    let mut config = server.config().api;
    config.base_url = "http://127.0.0.1:9".parse().unwrap();
    let api = ApiClient::new(&config).unwrap();

    let err = api.get_product(&ProductId::new("1")).await.unwrap_err();

    assert!(matches!(err, ApiError::Http(_)));
}
