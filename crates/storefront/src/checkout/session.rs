//! Checkout wizard state.

use std::fmt;

use bakery_core::{Address, AddressForm, Cart, OrderRequest, PaymentMethod, PricingPolicy};

use super::CheckoutError;
use crate::payment::PaymentAuthorization;

/// Checkout steps, in order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CheckoutStep {
    Address,
    Payment,
    Review,
}

impl fmt::Display for CheckoutStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Address => "address",
            Self::Payment => "payment",
            Self::Review => "review",
        })
    }
}

#[derive(Debug, Clone)]
enum State {
    Address,
    Payment {
        address: Address,
    },
    Review {
        address: Address,
        method: PaymentMethod,
        authorization: PaymentAuthorization,
    },
}

/// One pass through checkout.
///
/// The review step carries the address and the payment authorization by
/// construction, so an order can never be assembled without them.
#[derive(Debug, Clone)]
pub struct CheckoutSession {
    state: State,
    /// Last submitted address; survives going back.
    last_address: Option<Address>,
}

impl Default for CheckoutSession {
    fn default() -> Self {
        Self::new()
    }
}

impl CheckoutSession {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            state: State::Address,
            last_address: None,
        }
    }

    #[must_use]
    pub const fn step(&self) -> CheckoutStep {
        match self.state {
            State::Address => CheckoutStep::Address,
            State::Payment { .. } => CheckoutStep::Payment,
            State::Review { .. } => CheckoutStep::Review,
        }
    }

    /// The captured address, or the last one submitted when back on the
    /// address step.
    #[must_use]
    pub const fn address(&self) -> Option<&Address> {
        match &self.state {
            State::Payment { address } | State::Review { address, .. } => Some(address),
            State::Address => self.last_address.as_ref(),
        }
    }

    /// Pre-filled address form.
    #[must_use]
    pub fn address_form(&self) -> AddressForm {
        self.address().map(AddressForm::from).unwrap_or_default()
    }

    /// Authorization, present only on review.
    #[must_use]
    pub const fn authorization(&self) -> Option<&PaymentAuthorization> {
        match &self.state {
            State::Review { authorization, .. } => Some(authorization),
            _ => None,
        }
    }

    #[must_use]
    pub const fn payment_method(&self) -> Option<PaymentMethod> {
        match &self.state {
            State::Review { method, .. } => Some(*method),
            _ => None,
        }
    }

    fn expect_step(&self, expected: CheckoutStep) -> Result<(), CheckoutError> {
        let actual = self.step();
        if actual == expected {
            Ok(())
        } else {
            Err(CheckoutError::InvalidStep { expected, actual })
        }
    }

    /// Address → Payment.
    ///
    /// # Errors
    ///
    /// Returns `CheckoutError::InvalidStep` unless on the address step.
    pub fn submit_address(&mut self, address: Address) -> Result<(), CheckoutError> {
        self.expect_step(CheckoutStep::Address)?;
        self.last_address = Some(address.clone());
        self.state = State::Payment { address };
        Ok(())
    }

    /// Payment → Review, after a successful authorization.
    ///
    /// # Errors
    ///
    /// Returns `CheckoutError::InvalidStep` unless on the payment step.
    pub fn record_authorization(
        &mut self,
        method: PaymentMethod,
        authorization: PaymentAuthorization,
    ) -> Result<(), CheckoutError> {
        let State::Payment { address } = &self.state else {
            return Err(CheckoutError::InvalidStep {
                expected: CheckoutStep::Payment,
                actual: self.step(),
            });
        };
        self.state = State::Review {
            address: address.clone(),
            method,
            authorization,
        };
        Ok(())
    }

    /// Step back. Leaving review discards the authorization; the address is
    /// always kept. Returns the new step.
    pub fn back(&mut self) -> CheckoutStep {
        self.state = match std::mem::replace(&mut self.state, State::Address) {
            State::Address | State::Payment { .. } => State::Address,
            State::Review { address, .. } => State::Payment { address },
        };
        self.step()
    }

    /// Assemble the order payload.
    ///
    /// # Errors
    ///
    /// Returns `CheckoutError::InvalidStep` unless on review, or
    /// `CheckoutError::EmptyCart`.
    pub fn order_request(
        &self,
        cart: &Cart,
        policy: &PricingPolicy,
    ) -> Result<OrderRequest, CheckoutError> {
        let State::Review {
            address,
            method,
            authorization,
        } = &self.state
        else {
            return Err(CheckoutError::InvalidStep {
                expected: CheckoutStep::Review,
                actual: self.step(),
            });
        };
        if cart.is_empty() {
            return Err(CheckoutError::EmptyCart);
        }

        let quote = policy.quote(cart.total());
        Ok(OrderRequest {
            items: cart.line_items(),
            address: address.clone(),
            payment_method: *method,
            subtotal: quote.subtotal,
            shipping: quote.shipping,
            tax: quote.tax,
            total: quote.total,
            payment_intent_id: authorization.reference.clone(),
        })
    }
}
