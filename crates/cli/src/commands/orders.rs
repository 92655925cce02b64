//! Order history commands.

use std::io::Write;

use bakery_core::OrderId;
use bakery_storefront::state::AppState;

use super::CommandError;
use crate::render;

pub async fn list(state: &AppState, out: &mut impl Write) -> Result<(), CommandError> {
    let page = state.api().list_orders().await?;
    if page.items.is_empty() {
        writeln!(out, "No tienes pedidos.")?;
        return Ok(());
    }
    for order in &page.items {
        render::order_row(out, order)?;
    }
    Ok(())
}

pub async fn show(state: &AppState, id: &str, out: &mut impl Write) -> Result<(), CommandError> {
    let id = OrderId::parse(id)?;
    let order = state.api().get_order(&id).await?;
    render::order_detail(out, &order)?;
    Ok(())
}
