//! Cart stock reconciliation after a stock conflict.

use bakery_core::{ProductId, StockAdjustment};

use crate::api::{ApiError, OrderBackend};
use crate::cart::{CartStorage, CartStore};

/// Shown once after the cart was brought in line with live stock.
const ADJUSTED_NOTICE: &str = "Algunos productos de tu carrito ya no tienen stock suficiente. \
     Ajustamos las cantidades; revisa tu pedido antes de confirmar.";

const PARTIAL_NOTICE: &str = "Algunos productos de tu carrito ya no tienen stock suficiente. \
     Ajustamos las cantidades que pudimos verificar, pero no pudimos revisar todos los \
     productos; revisa tu pedido antes de confirmar.";

const UNCHECKED_NOTICE: &str = "No pudimos verificar el stock de algunos productos de tu \
     carrito. Intenta confirmar nuevamente en unos minutos.";

/// Every entry checked and nothing needed a change.
const UNCHANGED_NOTICE: &str = "Tu carrito ya coincide con el stock disponible. \
     Intenta confirmar nuevamente.";

/// What a reconciliation pass changed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReconciliationReport {
    /// Entries removed or clamped.
    pub adjustments: Vec<StockAdjustment>,
    /// Entries whose product could not be fetched; left untouched.
    pub unchecked: Vec<ProductId>,
}

impl ReconciliationReport {
    /// The single aggregate message for the shopper.
    #[must_use]
    pub fn notice(&self) -> &'static str {
        match (self.adjustments.is_empty(), self.is_complete()) {
            (false, true) => ADJUSTED_NOTICE,
            (false, false) => PARTIAL_NOTICE,
            (true, false) => UNCHECKED_NOTICE,
            (true, true) => UNCHANGED_NOTICE,
        }
    }

    /// Entries removed from the cart.
    pub fn removed(&self) -> impl Iterator<Item = &StockAdjustment> {
        self.adjustments.iter().filter(|a| a.is_removal())
    }

    /// Whether every entry was checked.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.unchecked.is_empty()
    }
}

/// Re-fetch each entry's product, one at a time, and apply live stock.
///
/// Best effort: a failed fetch is logged and skipped. A product the backend
/// no longer has, or no longer offers, counts as out of stock.
pub async fn reconcile_stock<S, B>(store: &mut CartStore<S>, backend: &B) -> ReconciliationReport
where
    S: CartStorage,
    B: OrderBackend + ?Sized,
{
    let ids: Vec<ProductId> = store.cart().entries().iter().map(|e| e.id().clone()).collect();
    let mut report = ReconciliationReport::default();

    for id in ids {
        let stock = match backend.fetch_product(&id).await {
            Ok(product) if product.available => product.stock,
            Ok(_) | Err(ApiError::NotFound(_)) => 0,
            Err(e) => {
                tracing::warn!(product_id = %id, error = %e, "Stock re-fetch failed, skipping");
                report.unchecked.push(id);
                continue;
            }
        };

        if let Some(adjustment) = store.apply_stock(&id, stock) {
            tracing::info!(
                product_id = %id,
                previous = adjustment.previous,
                current = adjustment.current,
                "Cart entry adjusted to live stock"
            );
            report.adjustments.push(adjustment);
        }
    }

    report
}

#[cfg(test)]
mod tests {
    use super::*;

    fn clamped(id: &str) -> StockAdjustment {
        StockAdjustment {
            product_id: id.into(),
            name: format!("Producto {id}"),
            previous: 4,
            current: 2,
        }
    }

    #[test]
    fn test_notice_for_complete_adjustment() {
        let report = ReconciliationReport {
            adjustments: vec![clamped("1")],
            unchecked: Vec::new(),
        };
        assert_eq!(report.notice(), ADJUSTED_NOTICE);
    }

    #[test]
    fn test_notice_mentions_skipped_products() {
        let report = ReconciliationReport {
            adjustments: vec![clamped("1")],
            unchecked: vec![ProductId::new("2")],
        };
        assert_eq!(report.notice(), PARTIAL_NOTICE);
        assert!(report.notice().contains("no pudimos revisar"));
    }

    #[test]
    fn test_notice_when_nothing_could_be_checked() {
        let report = ReconciliationReport {
            adjustments: Vec::new(),
            unchecked: vec![ProductId::new("1"), ProductId::new("2")],
        };
        assert_eq!(report.notice(), UNCHECKED_NOTICE);
        assert!(!report.notice().contains("Ajustamos"));
    }

    #[test]
    fn test_notice_when_stock_already_matches() {
        let report = ReconciliationReport::default();
        assert!(report.is_complete());
        assert_eq!(report.notice(), UNCHANGED_NOTICE);
        assert!(!report.notice().contains("Ajustamos"));
    }
}
