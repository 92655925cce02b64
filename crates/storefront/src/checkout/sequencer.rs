//! Drives a checkout session against the cart, backend and processor.

use bakery_core::{
    Address, AddressForm, DeliveryArea, Money, OrderReceipt, PaymentMethod, PriceQuote,
    PricingPolicy, TotalCheck,
};
use secrecy::SecretString;
use tracing::instrument;

use super::reconcile::{ReconciliationReport, reconcile_stock};
use super::session::{CheckoutSession, CheckoutStep};
use super::CheckoutError;
use crate::api::{OrderBackend, OrderRejection};
use crate::cart::{CartStorage, CartStore};
use crate::error::add_breadcrumb;
use crate::payment::{PaymentAuthorization, PaymentProcessor, PaymentRequest};

/// A placed order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlacedOrder {
    pub receipt: OrderReceipt,
    /// Total to show: the backend's when it agrees, the client's otherwise.
    pub total: Money,
    /// The backend echoed a total that disagrees with the client's.
    pub total_mismatch: bool,
}

/// Result of confirming an order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CheckoutOutcome {
    /// The order was accepted and the cart cleared.
    Placed(PlacedOrder),
    /// Stock changed under the shopper; the cart was adjusted and the
    /// session is still on review.
    CartAdjusted(ReconciliationReport),
}

/// Checkout over one cart.
pub struct CheckoutSequencer<'a, S, B: ?Sized, P: ?Sized> {
    store: &'a mut CartStore<S>,
    backend: &'a B,
    processor: &'a P,
    policy: PricingPolicy,
    area: DeliveryArea,
    session: CheckoutSession,
}

impl<'a, S, B, P> CheckoutSequencer<'a, S, B, P>
where
    S: CartStorage,
    B: OrderBackend + ?Sized,
    P: PaymentProcessor + ?Sized,
{
    pub fn new(
        store: &'a mut CartStore<S>,
        backend: &'a B,
        processor: &'a P,
        policy: PricingPolicy,
        area: DeliveryArea,
    ) -> Self {
        Self {
            store,
            backend,
            processor,
            policy,
            area,
            session: CheckoutSession::new(),
        }
    }

    #[must_use]
    pub const fn session(&self) -> &CheckoutSession {
        &self.session
    }

    #[must_use]
    pub const fn step(&self) -> CheckoutStep {
        self.session.step()
    }

    /// The cart being checked out.
    #[must_use]
    pub fn store(&self) -> &CartStore<S> {
        self.store
    }

    /// Price breakdown of the current cart.
    #[must_use]
    pub fn quote(&self) -> PriceQuote {
        self.policy.quote(self.store.total())
    }

    /// Validate the address form and move to payment.
    ///
    /// # Errors
    ///
    /// Returns `CheckoutError::Address` if the form is invalid, or
    /// `CheckoutError::InvalidStep` unless on the address step.
    pub fn submit_address(&mut self, form: &AddressForm) -> Result<&Address, CheckoutError> {
        let address = self.area.address(form)?;
        self.session.submit_address(address)?;
        add_breadcrumb("checkout", "Address submitted", None);
        tracing::debug!("Checkout moved to payment");
        self.session.address().ok_or(CheckoutError::InvalidStep {
            expected: CheckoutStep::Payment,
            actual: self.session.step(),
        })
    }

    /// Step back one step.
    pub fn back(&mut self) -> CheckoutStep {
        let step = self.session.back();
        let name = step.to_string();
        add_breadcrumb("checkout", "Stepped back", Some(&[("step", name.as_str())]));
        step
    }

    /// Authorize the current total and move to review.
    ///
    /// # Errors
    ///
    /// Returns `CheckoutError::Payment` carrying the processor's message if
    /// authorization fails; the session stays on payment.
    #[instrument(skip(self, payment_method_token), fields(method = %method))]
    pub async fn authorize_payment(
        &mut self,
        method: PaymentMethod,
        payment_method_token: SecretString,
    ) -> Result<&PaymentAuthorization, CheckoutError> {
        if self.session.step() != CheckoutStep::Payment {
            return Err(CheckoutError::InvalidStep {
                expected: CheckoutStep::Payment,
                actual: self.session.step(),
            });
        }
        if self.store.is_empty() {
            return Err(CheckoutError::EmptyCart);
        }

        let request = PaymentRequest {
            amount: self.quote().total,
            method,
            payment_method_token,
        };
        let authorization = self.processor.authorize(&request).await.map_err(|e| {
            tracing::warn!(error = %e, "Payment authorization failed");
            add_breadcrumb("checkout", "Payment failed", None);
            CheckoutError::Payment(e)
        })?;

        self.session.record_authorization(method, authorization)?;
        add_breadcrumb("checkout", "Payment authorized", None);
        self.session.authorization().ok_or(CheckoutError::InvalidStep {
            expected: CheckoutStep::Review,
            actual: self.session.step(),
        })
    }

    /// Submit the order.
    ///
    /// # Errors
    ///
    /// Returns `CheckoutError::OrderRejected` with the backend's message for
    /// anything other than a stock conflict; cart and session are untouched.
    #[instrument(skip(self))]
    pub async fn confirm_order(&mut self) -> Result<CheckoutOutcome, CheckoutError> {
        let request = self.session.order_request(self.store.cart(), &self.policy)?;
        let quote = self.quote();

        let total = request.total.to_string();
        add_breadcrumb("checkout", "Order submitted", Some(&[("total", total.as_str())]));

        match self.backend.submit_order(&request).await {
            Ok(receipt) => {
                self.store.clear();
                self.session = CheckoutSession::new();

                let check = receipt
                    .total
                    .map_or(TotalCheck::Agreed(quote.total), |server| {
                        quote.reconcile_total(server)
                    });
                if let TotalCheck::Mismatch { client, server } = check {
                    tracing::warn!(
                        order_id = %receipt.id,
                        client = %client,
                        server = %server,
                        "Backend total disagrees with client total"
                    );
                }
                tracing::info!(order_id = %receipt.id, "Order placed");

                Ok(CheckoutOutcome::Placed(PlacedOrder {
                    receipt,
                    total: check.total(),
                    total_mismatch: matches!(check, TotalCheck::Mismatch { .. }),
                }))
            }
            Err(e) if e.rejection() == OrderRejection::InsufficientStock => {
                tracing::warn!(error = %e, "Order refused for stock, reconciling cart");
                let report = reconcile_stock(self.store, self.backend).await;
                add_breadcrumb("checkout", "Cart adjusted to stock", None);
                Ok(CheckoutOutcome::CartAdjusted(report))
            }
            Err(e) => {
                tracing::warn!(error = %e, "Order rejected");
                Err(CheckoutError::OrderRejected(e.message()))
            }
        }
    }
}
