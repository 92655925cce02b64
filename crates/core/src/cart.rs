//! Shopping cart and its quantity rules.
//!
//! A [`Cart`] is an ordered list of [`CartEntry`] values keyed by product id.
//! Quantities are silently clamped to the stock recorded in each entry's
//! product snapshot, so every entry satisfies `0 < quantity <= stock` after
//! any mutation. Driving a quantity to zero removes the entry.
//!
//! The serialized form is a JSON array of entries with the product fields
//! flattened next to `quantity`, which is the layout kept in durable storage.

use serde::{Deserialize, Serialize};

use crate::types::{Money, OrderLine, Product, ProductId};

/// A product snapshot plus the quantity the shopper intends to buy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartEntry {
    #[serde(flatten)]
    pub product: Product,
    pub quantity: u32,
}

impl CartEntry {
    /// Product id of this entry.
    #[must_use]
    pub const fn id(&self) -> &ProductId {
        &self.product.id
    }

    /// Stock ceiling recorded in the snapshot.
    #[must_use]
    pub const fn stock(&self) -> u32 {
        self.product.stock
    }

    /// `price * quantity`.
    #[must_use]
    pub fn line_total(&self) -> Money {
        self.product.price * self.quantity
    }
}

/// A change made to an entry while syncing against authoritative stock.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StockAdjustment {
    pub product_id: ProductId,
    pub name: String,
    /// Quantity before the adjustment.
    pub previous: u32,
    /// Quantity after the adjustment; zero means the entry was removed.
    pub current: u32,
}

impl StockAdjustment {
    /// Whether the entry was dropped from the cart.
    #[must_use]
    pub const fn is_removal(&self) -> bool {
        self.current == 0
    }
}

/// The shopper's cart.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Cart {
    entries: Vec<CartEntry>,
}

impl Cart {
    /// An empty cart.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Add `quantity` units of `product`.
    ///
    /// An existing entry grows to `min(existing + quantity, product.stock)` and
    /// takes the fresh product snapshot; a new entry starts at
    /// `quantity` clamped to `[1, product.stock]`. Adding a product with no
    /// stock leaves the cart unchanged.
    ///
    /// Returns the resulting quantity for the product (zero if absent).
    pub fn add_item(&mut self, product: &Product, quantity: u32) -> u32 {
        if product.stock == 0 {
            return self.get(&product.id).map_or(0, |entry| entry.quantity);
        }

        if let Some(entry) = self.entry_mut(&product.id) {
            entry.quantity = entry.quantity.saturating_add(quantity).min(product.stock);
            entry.product = product.clone();
            return entry.quantity;
        }

        let quantity = quantity.clamp(1, product.stock);
        self.entries.push(CartEntry {
            product: product.clone(),
            quantity,
        });
        quantity
    }

    /// Set the quantity of an entry.
    ///
    /// A quantity of zero or less removes the entry; anything else is clamped
    /// to the entry's stock. Unknown products are ignored.
    pub fn update_quantity(&mut self, product_id: &ProductId, quantity: i64) {
        if quantity <= 0 {
            self.remove_item(product_id);
            return;
        }

        if let Some(entry) = self.entry_mut(product_id) {
            let requested = u32::try_from(quantity).unwrap_or(u32::MAX);
            entry.quantity = requested.min(entry.product.stock);
        }
    }

    /// Remove an entry. Removing an absent product is a no-op.
    pub fn remove_item(&mut self, product_id: &ProductId) {
        self.entries.retain(|entry| entry.id() != product_id);
    }

    /// Remove every entry.
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Sync one entry against authoritative stock.
    ///
    /// Zero stock removes the entry; stock below the requested quantity
    /// clamps it down. Otherwise only the snapshot's stock ceiling is
    /// refreshed. Returns the adjustment made, if any.
    pub fn apply_stock(&mut self, product_id: &ProductId, stock: u32) -> Option<StockAdjustment> {
        let entry = self.entry_mut(product_id)?;
        let previous = entry.quantity;
        let name = entry.product.name.clone();
        entry.product.stock = stock;

        if stock == 0 {
            self.remove_item(product_id);
        } else if stock < previous {
            entry.quantity = stock;
        } else {
            return None;
        }

        Some(StockAdjustment {
            product_id: product_id.clone(),
            name,
            previous,
            current: stock.min(previous),
        })
    }

    /// Sum of `price * quantity` over all entries. Excludes shipping and tax.
    #[must_use]
    pub fn total(&self) -> Money {
        self.entries.iter().map(CartEntry::line_total).sum()
    }

    /// Sum of quantities over all entries.
    #[must_use]
    pub fn item_count(&self) -> u32 {
        self.entries
            .iter()
            .fold(0_u32, |count, entry| count.saturating_add(entry.quantity))
    }

    /// Look up an entry by product id.
    #[must_use]
    pub fn get(&self, product_id: &ProductId) -> Option<&CartEntry> {
        self.entries.iter().find(|entry| entry.id() == product_id)
    }

    /// Entries in insertion order.
    #[must_use]
    pub fn entries(&self) -> &[CartEntry] {
        &self.entries
    }

    /// Number of distinct products.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the cart has no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Product id / quantity pairs for an order payload.
    #[must_use]
    pub fn line_items(&self) -> Vec<OrderLine> {
        self.entries
            .iter()
            .map(|entry| OrderLine {
                product_id: entry.id().clone(),
                quantity: entry.quantity,
            })
            .collect()
    }

    /// Re-establish the cart invariants on data written by someone else.
    ///
    /// Duplicate ids are merged into the first occurrence, quantities are
    /// clamped to stock, and empty or sold-out entries are dropped.
    #[must_use]
    pub fn normalized(self) -> Self {
        let mut merged: Vec<CartEntry> = Vec::with_capacity(self.entries.len());
        for entry in self.entries {
            if let Some(existing) = merged.iter_mut().find(|e| e.id() == entry.id()) {
                existing.quantity = existing.quantity.saturating_add(entry.quantity);
            } else {
                merged.push(entry);
            }
        }

        merged.retain_mut(|entry| {
            entry.quantity = entry.quantity.min(entry.product.stock);
            entry.quantity > 0
        });

        Self { entries: merged }
    }

    fn entry_mut(&mut self, product_id: &ProductId) -> Option<&mut CartEntry> {
        self.entries.iter_mut().find(|entry| entry.id() == product_id)
    }
}

impl From<Vec<CartEntry>> for Cart {
    fn from(entries: Vec<CartEntry>) -> Self {
        Self { entries }
    }
}
