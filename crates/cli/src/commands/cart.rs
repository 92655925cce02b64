//! Cart commands.
//!
//! # Usage
//!
//! ```bash
//! bakery cart add 12 -q 3
//! bakery cart set 12 1
//! bakery cart remove 12
//! bakery cart show
//! ```

use std::io::Write;

use bakery_core::ProductId;
use bakery_storefront::error::add_breadcrumb;
use bakery_storefront::state::AppState;

use super::CommandError;
use crate::render;

pub fn show(state: &AppState, out: &mut impl Write) -> Result<(), CommandError> {
    let store = state.open_cart();
    render::cart(out, store.cart(), &state.config().pricing)?;
    Ok(())
}

/// Add a product, clamped to its stock.
pub async fn add(
    state: &AppState,
    id: &str,
    quantity: u32,
    out: &mut impl Write,
) -> Result<(), CommandError> {
    let id = ProductId::parse(id)?;
    let product = state.api().get_product(&id).await?;

    let mut store = state.open_cart();
    let before = store.cart().get(&id).map_or(0, |entry| entry.quantity);
    let after = store.add_item(&product, quantity);
    add_breadcrumb("cart", "Added product", Some(&[("product_id", id.as_str())]));

    if after == 0 {
        writeln!(out, "{} está agotado.", product.name)?;
    } else if after.saturating_sub(before) < quantity {
        writeln!(
            out,
            "{}: {after} en el carrito (máximo disponible: {}).",
            product.name, product.stock
        )?;
    } else {
        writeln!(out, "{}: {after} en el carrito.", product.name)?;
    }
    writeln!(out, "Carrito: {} productos", store.item_count())?;
    Ok(())
}

/// Set a quantity; zero or less removes the product.
pub fn set(
    state: &AppState,
    id: &str,
    quantity: i64,
    out: &mut impl Write,
) -> Result<(), CommandError> {
    let id = ProductId::parse(id)?;
    let mut store = state.open_cart();

    if store.cart().get(&id).is_none() {
        writeln!(out, "El producto {id} no está en el carrito.")?;
        return Ok(());
    }

    store.update_quantity(&id, quantity);
    match store.cart().get(&id) {
        Some(entry) => writeln!(out, "{}: {} en el carrito.", entry.product.name, entry.quantity)?,
        None => writeln!(out, "Producto {id} eliminado del carrito.")?,
    }
    writeln!(out, "Carrito: {} productos", store.item_count())?;
    Ok(())
}

pub fn remove(state: &AppState, id: &str, out: &mut impl Write) -> Result<(), CommandError> {
    let id = ProductId::parse(id)?;
    let mut store = state.open_cart();
    store.remove_item(&id);
    writeln!(out, "Producto {id} eliminado del carrito.")?;
    writeln!(out, "Carrito: {} productos", store.item_count())?;
    Ok(())
}

pub fn clear(state: &AppState, out: &mut impl Write) -> Result<(), CommandError> {
    let mut store = state.open_cart();
    store.clear();
    writeln!(out, "Carrito vaciado.")?;
    Ok(())
}
