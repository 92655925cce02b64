//! Catalog browsing commands.

use std::io::Write;

use bakery_core::ProductId;
use bakery_storefront::api::ProductQuery;
use bakery_storefront::state::AppState;

use super::CommandError;
use crate::render;

/// List one page of the catalog.
pub async fn list(
    state: &AppState,
    query: &ProductQuery,
    out: &mut impl Write,
) -> Result<(), CommandError> {
    let page = state.api().list_products(query).await?;
    render::catalog_page(out, &page)?;
    Ok(())
}

/// Show one product.
pub async fn show(state: &AppState, id: &str, out: &mut impl Write) -> Result<(), CommandError> {
    let id = ProductId::parse(id)?;
    let product = state.api().get_product(&id).await?;
    render::product_detail(out, &product)?;
    Ok(())
}
