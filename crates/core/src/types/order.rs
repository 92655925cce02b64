//! Order request and response shapes.
//!
//! Orders are owned by the backend; the storefront only builds the creation
//! payload and reads back receipts and order history.

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

use super::address::Address;
use super::id::{OrderId, ProductId};
use super::money::Money;
use super::status::{OrderStatus, PaymentMethod, SalesChannel};

/// One line of an order creation payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderLine {
    pub product_id: ProductId,
    pub quantity: u32,
}

/// Body of `POST /orders`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderRequest {
    pub items: Vec<OrderLine>,
    pub address: Address,
    pub payment_method: PaymentMethod,
    pub subtotal: Money,
    pub shipping: Money,
    pub tax: Money,
    pub total: Money,
    pub payment_intent_id: String,
}

/// Response of `POST /orders`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderReceipt {
    pub id: OrderId,
    /// Total as computed by the backend, when echoed.
    #[serde(default)]
    pub total: Option<Money>,
    #[serde(default)]
    pub status: Option<OrderStatus>,
}

/// An item of a placed order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderItem {
    #[serde(alias = "productId")]
    pub id: ProductId,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub price: Option<Money>,
    pub quantity: u32,
}

/// An order as listed in the shopper's order history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderSummary {
    pub id: OrderId,
    #[serde(default)]
    pub status: OrderStatus,
    pub total: Money,
    #[serde(default)]
    pub items: Vec<OrderItem>,
    #[serde(default)]
    pub address: Option<Address>,
    #[serde(default)]
    pub payment_method: Option<String>,
    #[serde(default, deserialize_with = "deserialize_timestamp")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, alias = "canal")]
    pub channel: Option<SalesChannel>,
}

impl OrderSummary {
    /// Total number of units across all items.
    #[must_use]
    pub fn unit_count(&self) -> u32 {
        self.items.iter().map(|item| item.quantity).sum()
    }
}

/// Accept RFC 3339 timestamps as well as offset-less ones (assumed UTC).
fn deserialize_timestamp<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    let Some(raw) = Option::<String>::deserialize(deserializer)? else {
        return Ok(None);
    };

    if let Ok(parsed) = DateTime::parse_from_rfc3339(&raw) {
        return Ok(Some(parsed.with_timezone(&Utc)));
    }

    NaiveDateTime::parse_from_str(&raw, "%Y-%m-%dT%H:%M:%S%.f")
        .map(|naive| Some(naive.and_utc()))
        .map_err(|e| serde::de::Error::custom(format!("invalid timestamp {raw:?}: {e}")))
}
