//! Status enums for orders and payments.

use core::fmt;
use core::str::FromStr;

use serde::{Deserialize, Serialize};

/// Order status as tracked by the backend.
///
/// The backend and older clients disagree on spelling (`"en_preparacion"`,
/// `"En preparación"`, `"processing"`), so parsing is lenient and anything
/// unrecognized is kept verbatim in `Unknown`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub enum OrderStatus {
    #[default]
    Pending,
    InPreparation,
    OnTheWay,
    Delivered,
    Cancelled,
    Unknown(String),
}

impl OrderStatus {
    /// Parse a status leniently. Never fails; unknown values are preserved.
    #[must_use]
    pub fn parse_lenient(raw: &str) -> Self {
        match normalize_status(raw).as_str() {
            "pendiente" | "pending" => Self::Pending,
            "enpreparacion" | "processing" | "preparing" => Self::InPreparation,
            "encamino" | "shipped" | "ontheway" => Self::OnTheWay,
            "entregado" | "delivered" => Self::Delivered,
            "cancelado" | "canceled" | "cancelled" => Self::Cancelled,
            _ => Self::Unknown(raw.trim().to_string()),
        }
    }

    /// Wire value expected by the backend.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Pending => "pendiente",
            Self::InPreparation => "en_preparacion",
            Self::OnTheWay => "en_camino",
            Self::Delivered => "entregado",
            Self::Cancelled => "cancelado",
            Self::Unknown(raw) => raw,
        }
    }

    /// Human-readable label.
    #[must_use]
    pub fn label(&self) -> &str {
        match self {
            Self::Pending => "Pendiente",
            Self::InPreparation => "En preparación",
            Self::OnTheWay => "En camino",
            Self::Delivered => "Entregado",
            Self::Cancelled => "Cancelado",
            Self::Unknown(raw) => raw,
        }
    }

    /// Whether the order can no longer change.
    #[must_use]
    pub const fn is_final(&self) -> bool {
        matches!(self, Self::Delivered | Self::Cancelled)
    }
}

/// Lowercase, strip Spanish accents and drop separators.
fn normalize_status(raw: &str) -> String {
    raw.trim()
        .chars()
        .filter(|c| !matches!(c, ' ' | '_' | '-'))
        .map(|c| match c.to_lowercase().next().unwrap_or(c) {
            'á' => 'a',
            'é' => 'e',
            'í' => 'i',
            'ó' => 'o',
            'ú' | 'ü' => 'u',
            other => other,
        })
        .collect()
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for OrderStatus {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for OrderStatus {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Ok(Self::parse_lenient(&raw))
    }
}

/// Channel through which an order was placed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SalesChannel {
    /// Placed through the storefront.
    #[default]
    Online,
    /// Rung up at the shop counter.
    #[serde(rename = "mostrador")]
    Counter,
}

/// Payment method chosen at checkout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum PaymentMethod {
    /// Credit or debit card.
    #[default]
    Card,
    /// Card through the hosted payment widget.
    Stripe,
    /// `PayPal` account.
    PayPal,
    /// Cash on delivery.
    Cash,
}

impl PaymentMethod {
    /// Wire value expected by the backend.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Card => "card",
            Self::Stripe => "stripe",
            Self::PayPal => "paypal",
            Self::Cash => "cash",
        }
    }

    /// Label shown when reviewing an order.
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Card => "Tarjeta de Crédito/Débito",
            Self::Stripe => "Tarjeta (Stripe)",
            Self::PayPal => "PayPal",
            Self::Cash => "Efectivo al recibir",
        }
    }

    /// Whether the method is settled through the card processor.
    #[must_use]
    pub const fn is_card(&self) -> bool {
        matches!(self, Self::Card | Self::Stripe)
    }
}

impl fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PaymentMethod {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "card" => Ok(Self::Card),
            "stripe" => Ok(Self::Stripe),
            "paypal" => Ok(Self::PayPal),
            "cash" => Ok(Self::Cash),
            _ => Err(format!("invalid payment method: {s}")),
        }
    }
}
