//! Checkout command.
//!
//! Runs the whole wizard in one go: address, payment authorization with the
//! token from the card widget, then order confirmation. Ctrl-C aborts the
//! in-flight request; the cart is only cleared once the order is accepted.

use std::io::Write;

use bakery_core::{AddressForm, PaymentMethod};
use bakery_storefront::checkout::{CheckoutError, CheckoutOutcome, CheckoutSequencer};
use bakery_storefront::state::AppState;
use secrecy::SecretString;

use super::CommandError;
use crate::render;

/// Checkout input.
pub struct CheckoutRequest {
    pub street: String,
    pub zip_code: String,
    pub phone: String,
    pub method: PaymentMethod,
    pub payment_token: String,
}

pub async fn run(
    state: &AppState,
    request: CheckoutRequest,
    out: &mut impl Write,
) -> Result<(), CommandError> {
    let config = state.config();
    let mut store = state.open_cart();
    if store.is_empty() {
        writeln!(out, "Tu carrito está vacío.")?;
        return Ok(());
    }

    let mut checkout = CheckoutSequencer::new(
        &mut store,
        state.api(),
        state.payments(),
        config.pricing,
        config.delivery_area.clone(),
    );

    let form = AddressForm {
        street: request.street,
        zip_code: request.zip_code,
        phone: request.phone,
    };
    let address = checkout.submit_address(&form)?;
    writeln!(out, "Entrega: {}", address.one_line())?;
    writeln!(out, "Total a pagar: {}", checkout.quote().total)?;

    let token = SecretString::from(request.payment_token);
    let outcome = tokio::select! {
        result = pay_and_confirm(&mut checkout, request.method, token) => Some(result),
        _ = tokio::signal::ctrl_c() => None,
    };

    let Some(outcome) = outcome else {
        tracing::info!("Checkout cancelled by user");
        writeln!(out, "Checkout cancelado.")?;
        return Ok(());
    };

    match outcome? {
        CheckoutOutcome::Placed(order) => render::placed(out, &order)?,
        CheckoutOutcome::CartAdjusted(report) => {
            render::adjusted(out, &report)?;
            writeln!(out, "Revisa tu carrito con `bakery cart show` y vuelve a confirmar.")?;
        }
    }
    Ok(())
}

async fn pay_and_confirm<S, B, P>(
    checkout: &mut CheckoutSequencer<'_, S, B, P>,
    method: PaymentMethod,
    token: SecretString,
) -> Result<CheckoutOutcome, CheckoutError>
where
    S: bakery_storefront::cart::CartStorage,
    B: bakery_storefront::api::OrderBackend + ?Sized,
    P: bakery_storefront::payment::PaymentProcessor + ?Sized,
{
    checkout.authorize_payment(method, token).await?;
    checkout.confirm_order().await
}
