//! Checkout: address, then payment, then review and submission.
//!
//! The wizard is strictly linear. Payment must be authorized before the order
//! is submitted, and the address comes first because shipping changes the
//! amount authorized.
//!
//! ```rust,ignore
//! let mut checkout = CheckoutSequencer::new(&mut store, &api, &processor, policy, area);
//! checkout.submit_address(&form)?;
//! checkout.authorize_payment(PaymentMethod::Card, token).await?;
//! match checkout.confirm_order().await? {
//!     CheckoutOutcome::Placed(order) => println!("{}", order.receipt.id),
//!     CheckoutOutcome::CartAdjusted(report) => println!("{}", report.notice()),
//! }
//! ```

mod reconcile;
mod sequencer;
mod session;

pub use reconcile::{ReconciliationReport, reconcile_stock};
pub use sequencer::{CheckoutOutcome, CheckoutSequencer, PlacedOrder};
pub use session::{CheckoutSession, CheckoutStep};

use bakery_core::AddressError;
use thiserror::Error;

use crate::payment::PaymentError;

/// Errors that can occur during checkout.
///
/// Payment and order messages come from the processor and the backend and are
/// displayed unchanged.
#[derive(Debug, Error)]
pub enum CheckoutError {
    #[error("Checkout is on the {actual} step, expected {expected}")]
    InvalidStep {
        expected: CheckoutStep,
        actual: CheckoutStep,
    },

    #[error("The cart is empty")]
    EmptyCart,

    #[error(transparent)]
    Address(#[from] AddressError),

    #[error(transparent)]
    Payment(#[from] PaymentError),

    #[error("{0}")]
    OrderRejected(String),
}

impl CheckoutError {
    /// Message to show the shopper.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::Payment(e) => e.user_message(),
            Self::EmptyCart => "Tu carrito está vacío.".to_string(),
            other => other.to_string(),
        }
    }
}
