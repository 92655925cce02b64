//! End-to-end checkout runs against the fake backend.
//!
//! Each test wires the real `ApiClient`, `HostedCardProcessor` and
//! `CheckoutSequencer` to a fresh in-process server.

#![allow(clippy::unwrap_used)]

use bakery_core::{AddressForm, Money, PaymentMethod, Product, ProductId};
use bakery_integration_tests::{CardResponse, FakeBackend, OrderResponse, TEST_PUBLISHABLE_KEY};
use bakery_storefront::api::ApiClient;
use bakery_storefront::cart::{CartBus, CartStorage, CartStore, MemoryStorage};
use bakery_storefront::checkout::{CheckoutError, CheckoutOutcome, CheckoutSequencer, CheckoutStep};
use bakery_storefront::config::StorefrontConfig;
use bakery_storefront::payment::{HostedCardProcessor, PaymentError};
use secrecy::SecretString;
use serde_json::json;

const CARD_TOKEN: &str = "pm_card_visa";

struct Harness {
    server: FakeBackend,
    config: StorefrontConfig,
    api: ApiClient,
    payments: HostedCardProcessor,
    bus: CartBus,
    storage: MemoryStorage,
}

impl Harness {
    async fn start() -> Self {
        let server = FakeBackend::start().await;
        {
            let mut state = server.state();
            state.put_product(1, "Pan de molde", 20.0, 5);
            state.put_product(2, "Torta de chocolate", 12.5, 3);
        }
        let config = server.config();
        let api = ApiClient::new(&config.api).unwrap();
        let payments = HostedCardProcessor::new(&config.payments, api.clone());
        Self {
            server,
            config,
            api,
            payments,
            bus: CartBus::new(),
            storage: MemoryStorage::new(),
        }
    }

    fn store(&self) -> CartStore<MemoryStorage> {
        CartStore::open(self.storage.clone(), self.bus.clone())
    }

    async fn product(&self, id: &str) -> Product {
        self.api.get_product(&ProductId::new(id)).await.unwrap()
    }

    fn sequencer<'a>(
        &'a self,
        store: &'a mut CartStore<MemoryStorage>,
    ) -> CheckoutSequencer<'a, MemoryStorage, ApiClient, HostedCardProcessor> {
        CheckoutSequencer::new(
            store,
            &self.api,
            &self.payments,
            self.config.pricing,
            self.config.delivery_area.clone(),
        )
    }
}

fn address_form() -> AddressForm {
    AddressForm {
        street: "Av. Larco 345".to_string(),
        zip_code: "15074".to_string(),
        phone: "987 654 321".to_string(),
    }
}

/// Fill the cart with 2 x S/ 20.00 and 1 x S/ 12.50.
async fn filled_store(harness: &Harness) -> CartStore<MemoryStorage> {
    let bread = harness.product("1").await;
    let cake = harness.product("2").await;
    let mut store = harness.store();
    store.add_item(&bread, 2);
    store.add_item(&cake, 1);
    store
}

#[tokio::test]
async fn test_checkout_places_order_and_clears_cart() {
    let harness = Harness::start().await;
    let mut store = filled_store(&harness).await;
    let mut badge_store = harness.store();
    assert_eq!(badge_store.item_count(), 3);

    let mut checkout = harness.sequencer(&mut store);
    // 52.50 subtotal ships free; 10% tax
    assert_eq!(checkout.quote().total, Money::from_minor_units(5_775));

    checkout.submit_address(&address_form()).unwrap();
    let authorization = checkout
        .authorize_payment(PaymentMethod::Card, SecretString::from(CARD_TOKEN))
        .await
        .unwrap();
    assert_eq!(authorization.reference, "pi_test1");
    assert_eq!(checkout.step(), CheckoutStep::Review);

    let outcome = checkout.confirm_order().await.unwrap();
    let CheckoutOutcome::Placed(order) = outcome else {
        panic!("expected a placed order");
    };
    assert_eq!(order.receipt.id.as_str(), "1001");
    assert_eq!(order.total, Money::from_minor_units(5_775));
    assert!(!order.total_mismatch);
    assert_eq!(checkout.step(), CheckoutStep::Address);
    assert!(store.is_empty());
    assert_eq!(harness.storage.read().unwrap().as_deref(), Some("[]"));

    assert!(badge_store.sync());
    assert!(badge_store.is_empty());

    let backend = harness.server.state();
    assert_eq!(backend.intent_amounts, vec![5_775]);
    assert_eq!(
        backend.authorization_headers,
        vec![format!("Bearer {TEST_PUBLISHABLE_KEY}")]
    );
    let confirmation = backend.confirmations.first().unwrap();
    assert_eq!(confirmation["payment_method"], CARD_TOKEN);
    assert_eq!(confirmation["client_secret"], "pi_test1_secret_Zx81");

    let submitted = backend.submitted_orders.first().unwrap();
    assert_eq!(submitted["paymentIntentId"], "pi_test1");
    assert_eq!(submitted["paymentMethod"], "card");
    assert_eq!(submitted["total"], json!(57.75));
    assert_eq!(submitted["shipping"], json!(0.0));
    assert_eq!(submitted["address"]["city"], "Lima");
    assert_eq!(submitted["items"].as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn test_stock_conflict_adjusts_cart_and_keeps_review() {
    let harness = Harness::start().await;
    let mut store = harness.store();
    let bread = harness.product("1").await;
    let cake = harness.product("2").await;
    store.add_item(&bread, 4);
    store.add_item(&cake, 2);

    {
        let mut backend = harness.server.state();
        backend.set_stock(1, 2);
        backend.set_stock(2, 0);
        backend.order_response = OrderResponse::Reject {
            status: 409,
            body: json!({
                "message": "Stock insuficiente para: Torta de chocolate",
                "code": "INSUFFICIENT_STOCK",
            }),
        };
    }

    let mut checkout = harness.sequencer(&mut store);
    checkout.submit_address(&address_form()).unwrap();
    checkout
        .authorize_payment(PaymentMethod::Card, SecretString::from(CARD_TOKEN))
        .await
        .unwrap();

    let outcome = checkout.confirm_order().await.unwrap();
    let CheckoutOutcome::CartAdjusted(report) = outcome else {
        panic!("expected an adjusted cart");
    };
    assert!(report.is_complete());
    assert_eq!(report.adjustments.len(), 2);
    assert_eq!(report.removed().count(), 1);
    assert_eq!(checkout.step(), CheckoutStep::Review);

    assert_eq!(store.cart().get(&ProductId::new("1")).unwrap().quantity, 2);
    assert!(store.cart().get(&ProductId::new("2")).is_none());
    assert_eq!(store.item_count(), 2);

    // Reconciliation bypasses the catalog cache
    let backend = harness.server.state();
    assert_eq!(backend.fetches(1), 2);
    assert_eq!(backend.fetches(2), 2);
}

#[tokio::test]
async fn test_declined_card_stays_on_payment() {
    let harness = Harness::start().await;
    harness.server.state().card_response =
        CardResponse::Decline("Tu tarjeta no tiene fondos suficientes.".to_string());
    let mut store = filled_store(&harness).await;

    let mut checkout = harness.sequencer(&mut store);
    checkout.submit_address(&address_form()).unwrap();
    let err = checkout
        .authorize_payment(PaymentMethod::Card, SecretString::from(CARD_TOKEN))
        .await
        .unwrap_err();

    assert!(matches!(err, CheckoutError::Payment(PaymentError::Declined(_))));
    assert_eq!(err.user_message(), "Tu tarjeta no tiene fondos suficientes.");
    assert_eq!(checkout.step(), CheckoutStep::Payment);

    assert_eq!(checkout.back(), CheckoutStep::Address);
    let form = checkout.session().address_form();
    assert_eq!(form.street, "Av. Larco 345");
    assert_eq!(form.zip_code, "15074");
    assert_eq!(store.item_count(), 3);
    assert!(harness.server.state().submitted_orders.is_empty());
}

#[tokio::test]
async fn test_unfinished_intent_is_declined_with_default_message() {
    let harness = Harness::start().await;
    harness.server.state().card_response = CardResponse::Pending("requires_action".to_string());
    let mut store = filled_store(&harness).await;

    let mut checkout = harness.sequencer(&mut store);
    checkout.submit_address(&address_form()).unwrap();
    let err = checkout
        .authorize_payment(PaymentMethod::Card, SecretString::from(CARD_TOKEN))
        .await
        .unwrap_err();

    assert_eq!(err.user_message(), "Error en el pago");
    assert_eq!(checkout.step(), CheckoutStep::Payment);
}

#[tokio::test]
async fn test_intent_creation_failure_is_unavailable() {
    let harness = Harness::start().await;
    harness.server.state().intent_failure = Some(json!({ "error": "Stripe key missing" }));
    let mut store = filled_store(&harness).await;

    let mut checkout = harness.sequencer(&mut store);
    checkout.submit_address(&address_form()).unwrap();
    let err = checkout
        .authorize_payment(PaymentMethod::Card, SecretString::from(CARD_TOKEN))
        .await
        .unwrap_err();

    assert!(matches!(err, CheckoutError::Payment(PaymentError::Unavailable(_))));
    assert_eq!(
        err.user_message(),
        "No se pudo iniciar el pago. Intenta más tarde."
    );
    assert!(harness.server.state().confirmations.is_empty());
}

#[tokio::test]
async fn test_rejected_order_keeps_cart_and_shows_backend_message() {
    let harness = Harness::start().await;
    harness.server.state().order_response = OrderResponse::Reject {
        status: 422,
        body: json!({ "error": "No repartimos a esa dirección" }),
    };
    let mut store = filled_store(&harness).await;

    let mut checkout = harness.sequencer(&mut store);
    checkout.submit_address(&address_form()).unwrap();
    checkout
        .authorize_payment(PaymentMethod::Card, SecretString::from(CARD_TOKEN))
        .await
        .unwrap();
    let err = checkout.confirm_order().await.unwrap_err();

    assert_eq!(err.user_message(), "No repartimos a esa dirección");
    assert_eq!(checkout.step(), CheckoutStep::Review);
    assert_eq!(store.item_count(), 3);
}

#[tokio::test]
async fn test_server_total_outside_tolerance_is_flagged() {
    let harness = Harness::start().await;
    harness.server.state().order_response = OrderResponse::AcceptWithTotal(60.0);
    let mut store = filled_store(&harness).await;

    let mut checkout = harness.sequencer(&mut store);
    checkout.submit_address(&address_form()).unwrap();
    checkout
        .authorize_payment(PaymentMethod::Card, SecretString::from(CARD_TOKEN))
        .await
        .unwrap();
    let CheckoutOutcome::Placed(order) = checkout.confirm_order().await.unwrap() else {
        panic!("expected a placed order");
    };

    assert!(order.total_mismatch);
    assert_eq!(order.total, Money::from_minor_units(5_775));
}

#[tokio::test]
async fn test_card_checkout_requires_publishable_key() {
    let harness = Harness::start().await;
    let mut payments = harness.config.payments.clone();
    payments.publishable_key = None;
    let processor = HostedCardProcessor::new(&payments, harness.api.clone());
    let mut store = filled_store(&harness).await;

    let mut checkout = CheckoutSequencer::new(
        &mut store,
        &harness.api,
        &processor,
        harness.config.pricing,
        harness.config.delivery_area.clone(),
    );
    checkout.submit_address(&address_form()).unwrap();
    let err = checkout
        .authorize_payment(PaymentMethod::Card, SecretString::from(CARD_TOKEN))
        .await
        .unwrap_err();

    assert!(matches!(err, CheckoutError::Payment(PaymentError::NotConfigured)));
    assert!(harness.server.state().intent_amounts.is_empty());
}
