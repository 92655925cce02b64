//! Catalog product as served by the backend.

use serde::{Deserialize, Serialize};

use super::id::ProductId;
use super::money::Money;

/// A product from the catalog.
///
/// This is also the snapshot stored inside each cart entry, so its JSON shape
/// is part of the persisted cart layout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    /// Product identifier.
    pub id: ProductId,
    /// Display name.
    pub name: String,
    /// Long description.
    #[serde(default)]
    pub description: String,
    /// Unit price.
    pub price: Money,
    /// Category slug (e.g. `panes`, `pasteles`).
    #[serde(default)]
    pub category: String,
    /// Image reference.
    #[serde(default)]
    pub image: String,
    /// Units currently in stock.
    #[serde(default)]
    pub stock: u32,
    /// Whether the product is offered at all.
    #[serde(default = "default_available")]
    pub available: bool,
}

const fn default_available() -> bool {
    true
}

impl Product {
    /// Whether at least one unit can be bought right now.
    #[must_use]
    pub const fn is_purchasable(&self) -> bool {
        self.available && self.stock > 0
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_product_deserializes_backend_shape() {
        let json = r#"{
            "id": 1,
            "name": "Pan Francés",
            "description": "Pan crujiente",
            "price": 2.5,
            "category": "panes",
            "image": "/french-bread.png",
            "stock": 20,
            "available": true
        }"#;

        let product: Product = serde_json::from_str(json).unwrap();
        assert_eq!(product.id.as_str(), "1");
        assert_eq!(product.price, Money::from_minor_units(250));
        assert_eq!(product.stock, 20);
        assert!(product.is_purchasable());
    }

    #[test]
    fn test_product_optional_fields_default() {
        let json = r#"{"id": "7", "name": "Croissant", "price": 3}"#;
        let product: Product = serde_json::from_str(json).unwrap();
        assert_eq!(product.stock, 0);
        assert!(product.available);
        assert!(!product.is_purchasable());
        assert!(product.description.is_empty());
    }
}
