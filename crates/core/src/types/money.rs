//! Monetary amounts using decimal arithmetic.
//!
//! The storefront sells in Peruvian soles. Amounts travel over the wire as
//! plain JSON numbers (`"price": 2.5`), so `Money` serializes as a number and
//! accepts either a number or a numeric string when deserializing.

use core::fmt;
use core::iter::Sum;
use core::ops::{Add, Mul, Sub};
use core::str::FromStr;

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

/// ISO 4217 code of the store currency.
pub const CURRENCY_CODE: &str = "PEN";

/// Display symbol of the store currency.
pub const CURRENCY_SYMBOL: &str = "S/";

/// A non-currency-tagged amount in the store currency.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Money(Decimal);

impl Money {
    /// Zero soles.
    pub const ZERO: Self = Self(Decimal::ZERO);

    /// Wrap a decimal amount.
    #[must_use]
    pub const fn new(amount: Decimal) -> Self {
        Self(amount)
    }

    /// Build an amount from minor units (céntimos).
    #[must_use]
    pub fn from_minor_units(cents: i64) -> Self {
        Self(Decimal::new(cents, 2))
    }

    /// Build an amount from a whole number of soles.
    #[must_use]
    pub fn from_major_units(units: i64) -> Self {
        Self(Decimal::from(units))
    }

    /// The underlying decimal amount.
    #[must_use]
    pub const fn amount(&self) -> Decimal {
        self.0
    }

    /// Round to two decimal places, midpoint away from zero.
    #[must_use]
    pub fn round_cents(self) -> Self {
        Self(
            self.0
                .round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero),
        )
    }

    /// Amount in minor units, as payment processors expect it.
    ///
    /// Returns `None` if the amount does not fit in an `i64`.
    #[must_use]
    pub fn to_minor_units(self) -> Option<i64> {
        (self.round_cents().0 * Decimal::ONE_HUNDRED).to_i64()
    }

    /// Whether the amount is strictly below zero.
    #[must_use]
    pub const fn is_negative(&self) -> bool {
        self.0.is_sign_negative() && !self.0.is_zero()
    }

    /// Absolute difference between two amounts.
    #[must_use]
    pub fn abs_diff(self, other: Self) -> Self {
        Self((self.0 - other.0).abs())
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{CURRENCY_SYMBOL} {:.2}", self.round_cents().0)
    }
}

impl From<Decimal> for Money {
    fn from(amount: Decimal) -> Self {
        Self(amount)
    }
}

impl Add for Money {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self(self.0 + rhs.0)
    }
}

impl Sub for Money {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self {
        Self(self.0 - rhs.0)
    }
}

impl Mul<u32> for Money {
    type Output = Self;

    fn mul(self, rhs: u32) -> Self {
        Self(self.0 * Decimal::from(rhs))
    }
}

impl Mul<Decimal> for Money {
    type Output = Self;

    fn mul(self, rhs: Decimal) -> Self {
        Self(self.0 * rhs)
    }
}

impl Sum for Money {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::ZERO, Add::add)
    }
}

impl Serialize for Money {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self.0.to_f64() {
            Some(value) => serializer.serialize_f64(value),
            None => Err(serde::ser::Error::custom(format!(
                "amount {} is not representable as a JSON number",
                self.0
            ))),
        }
    }
}

impl<'de> Deserialize<'de> for Money {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum RawAmount {
            Integer(i64),
            Float(f64),
            Text(String),
        }

        let text = match RawAmount::deserialize(deserializer)? {
            RawAmount::Integer(n) => return Ok(Self(Decimal::from(n))),
            // f64's Display is the shortest round-trip form, so 2.5 stays 2.5
            RawAmount::Float(f) => f.to_string(),
            RawAmount::Text(s) => s,
        };

        Decimal::from_str(text.trim())
            .map(Self)
            .map_err(|e| serde::de::Error::custom(format!("invalid amount {text:?}: {e}")))
    }
}
