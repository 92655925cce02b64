//! Shipping and tax policy.
//!
//! The backend applies the same policy when it prices an order, so the
//! values here must match the server's. [`PricingPolicy`] is the one place
//! those values live on the client side; every view and the checkout read it
//! from configuration instead of repeating constants.

use rust_decimal::Decimal;

use crate::types::Money;

/// Largest difference at which the server's total is accepted as-is.
pub const TOTAL_TOLERANCE: Money = Money::new(Decimal::from_parts(1, 0, 0, false, 2));

/// Shipping and tax constants.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PricingPolicy {
    /// Subtotal at or above which shipping is free.
    pub free_shipping_threshold: Money,
    /// Shipping charged below the threshold.
    pub flat_shipping_fee: Money,
    /// Tax rate applied to the subtotal (0.10 = 10%).
    pub tax_rate: Decimal,
}

impl Default for PricingPolicy {
    fn default() -> Self {
        Self {
            free_shipping_threshold: Money::from_major_units(50),
            flat_shipping_fee: Money::from_major_units(5),
            tax_rate: Decimal::new(10, 2),
        }
    }
}

/// Price breakdown for a subtotal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PriceQuote {
    pub subtotal: Money,
    pub shipping: Money,
    pub tax: Money,
    pub total: Money,
}

/// Outcome of comparing the server's total against the client's.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TotalCheck {
    /// Within tolerance; the server's figure is authoritative.
    Agreed(Money),
    /// Outside tolerance; the client's figure is kept.
    Mismatch { client: Money, server: Money },
}

impl TotalCheck {
    /// The total to show the shopper.
    #[must_use]
    pub const fn total(&self) -> Money {
        match self {
            Self::Agreed(total) | Self::Mismatch { client: total, .. } => *total,
        }
    }
}

impl PricingPolicy {
    /// Shipping for a subtotal.
    #[must_use]
    pub fn shipping(&self, subtotal: Money) -> Money {
        if subtotal >= self.free_shipping_threshold {
            Money::ZERO
        } else {
            self.flat_shipping_fee
        }
    }

    /// Tax for a subtotal, rounded to cents.
    #[must_use]
    pub fn tax(&self, subtotal: Money) -> Money {
        (subtotal * self.tax_rate).round_cents()
    }

    /// Full breakdown for a subtotal.
    #[must_use]
    pub fn quote(&self, subtotal: Money) -> PriceQuote {
        let shipping = self.shipping(subtotal);
        let tax = self.tax(subtotal);
        PriceQuote {
            subtotal,
            shipping,
            tax,
            total: subtotal + shipping + tax,
        }
    }

    /// How much more the shopper must add to get free shipping.
    ///
    /// Returns `None` once the threshold is reached.
    #[must_use]
    pub fn amount_to_free_shipping(&self, subtotal: Money) -> Option<Money> {
        (subtotal < self.free_shipping_threshold).then(|| self.free_shipping_threshold - subtotal)
    }
}

impl PriceQuote {
    /// Compare an echoed server total against this quote.
    #[must_use]
    pub fn reconcile_total(&self, server_total: Money) -> TotalCheck {
        if self.total.abs_diff(server_total) <= TOTAL_TOLERANCE {
            TotalCheck::Agreed(server_total)
        } else {
            TotalCheck::Mismatch {
                client: self.total,
                server: server_total,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quote_below_threshold() {
        // subtotal 40, threshold 50, fee 5, rate 0.10
        let quote = PricingPolicy::default().quote(Money::from_major_units(40));

        assert_eq!(quote.shipping, Money::from_major_units(5));
        assert_eq!(quote.tax, Money::from_minor_units(400));
        assert_eq!(quote.total, Money::from_minor_units(4_900));
    }

    #[test]
    fn test_free_shipping_at_threshold() {
        let policy = PricingPolicy::default();
        assert_eq!(policy.shipping(Money::from_major_units(50)), Money::ZERO);
        assert_eq!(
            policy.shipping(Money::from_minor_units(4_999)),
            Money::from_major_units(5)
        );
    }

    #[test]
    fn test_tax_rounds_to_cents() {
        let policy = PricingPolicy::default();
        // 12.35 * 0.10 = 1.235 -> 1.24
        assert_eq!(
            policy.tax(Money::from_minor_units(1_235)),
            Money::from_minor_units(124)
        );
    }

    #[test]
    fn test_total_is_sum_of_parts() {
        let policy = PricingPolicy::default();
        for cents in [0_i64, 1, 999, 4_999, 5_000, 12_345] {
            let quote = policy.quote(Money::from_minor_units(cents));
            assert_eq!(quote.total, quote.subtotal + quote.shipping + quote.tax);
        }
    }

    #[test]
    fn test_amount_to_free_shipping() {
        let policy = PricingPolicy::default();
        assert_eq!(
            policy.amount_to_free_shipping(Money::from_major_units(35)),
            Some(Money::from_major_units(15))
        );
        assert_eq!(policy.amount_to_free_shipping(Money::from_major_units(50)), None);
    }

    #[test]
    fn test_reconcile_total() {
        let quote = PricingPolicy::default().quote(Money::from_major_units(40));

        let agreed = quote.reconcile_total(Money::from_minor_units(4_901));
        assert_eq!(agreed, TotalCheck::Agreed(Money::from_minor_units(4_901)));

        let mismatch = quote.reconcile_total(Money::from_major_units(55));
        assert_eq!(mismatch.total(), Money::from_minor_units(4_900));
        assert!(matches!(mismatch, TotalCheck::Mismatch { .. }));
    }
}
