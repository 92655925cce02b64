//! Plain-text rendering for terminal output.

use std::io::{self, Write};

use bakery_core::{Cart, Money, OrderSummary, PaymentMethod, PricingPolicy, Product, SalesChannel};
use bakery_storefront::api::Page;
use bakery_storefront::checkout::{PlacedOrder, ReconciliationReport};

pub fn product_row(out: &mut impl Write, product: &Product) -> io::Result<()> {
    let availability = if product.is_purchasable() {
        format!("stock {}", product.stock)
    } else {
        "agotado".to_string()
    };
    writeln!(
        out,
        "{:>6}  {:<32} {:>10}  {availability}",
        product.id.as_str(),
        product.name,
        product.price.to_string(),
    )
}

pub fn catalog_page(out: &mut impl Write, page: &Page<Product>) -> io::Result<()> {
    if page.items.is_empty() {
        return writeln!(out, "No hay productos.");
    }
    for product in &page.items {
        product_row(out, product)?;
    }
    writeln!(
        out,
        "Página {} de {} ({} productos)",
        page.page, page.total_pages, page.total
    )
}

pub fn product_detail(out: &mut impl Write, product: &Product) -> io::Result<()> {
    writeln!(out, "{} (#{})", product.name, product.id)?;
    writeln!(out, "Precio:    {}", product.price)?;
    if !product.category.is_empty() {
        writeln!(out, "Categoría: {}", product.category)?;
    }
    if product.is_purchasable() {
        writeln!(out, "Stock:     {}", product.stock)?;
    } else {
        writeln!(out, "Stock:     agotado")?;
    }
    if !product.description.is_empty() {
        writeln!(out)?;
        writeln!(out, "{}", product.description)?;
    }
    Ok(())
}

/// Cart lines, price breakdown and the free-shipping hint.
pub fn cart(out: &mut impl Write, cart: &Cart, policy: &PricingPolicy) -> io::Result<()> {
    if cart.is_empty() {
        return writeln!(out, "Tu carrito está vacío.");
    }

    for entry in cart.entries() {
        writeln!(
            out,
            "{:>3} x {:<32} {:>10}  {:>10}",
            entry.quantity,
            entry.product.name,
            entry.product.price.to_string(),
            entry.line_total().to_string(),
        )?;
    }

    let quote = policy.quote(cart.total());
    let shipping = if quote.shipping == Money::ZERO {
        "Gratis".to_string()
    } else {
        quote.shipping.to_string()
    };

    writeln!(out)?;
    writeln!(out, "Productos: {}", cart.item_count())?;
    writeln!(out, "Subtotal:  {}", quote.subtotal)?;
    writeln!(out, "Envío:     {shipping}")?;
    writeln!(out, "Impuestos: {}", quote.tax)?;
    writeln!(out, "Total:     {}", quote.total)?;

    if let Some(missing) = policy.amount_to_free_shipping(quote.subtotal) {
        writeln!(out, "Agrega {missing} más para obtener envío gratis.")?;
    }
    Ok(())
}

pub fn order_row(out: &mut impl Write, order: &OrderSummary) -> io::Result<()> {
    let date = order
        .created_at
        .map(|at| at.format("%Y-%m-%d %H:%M").to_string())
        .unwrap_or_default();
    writeln!(
        out,
        "{:>8}  {:<16} {:>10}  {:>3} u.  {date}",
        order.id.as_str(),
        order.status.label(),
        order.total.to_string(),
        order.unit_count(),
    )
}

pub fn order_detail(out: &mut impl Write, order: &OrderSummary) -> io::Result<()> {
    writeln!(out, "Pedido #{}", order.id)?;
    writeln!(out, "Estado:  {}", order.status.label())?;
    if let Some(at) = order.created_at {
        writeln!(out, "Fecha:   {}", at.format("%Y-%m-%d %H:%M"))?;
    }
    if let Some(method) = &order.payment_method {
        let label = method
            .parse::<PaymentMethod>()
            .map_or_else(|_| method.clone(), |m| m.label().to_string());
        writeln!(out, "Pago:    {label}")?;
    }
    if order.channel == Some(SalesChannel::Counter) {
        writeln!(out, "Canal:   mostrador")?;
    }
    if let Some(address) = &order.address {
        writeln!(out, "Entrega: {}", address.one_line())?;
    }
    writeln!(out)?;
    for item in &order.items {
        let price = item.price.map(|p| p.to_string()).unwrap_or_default();
        let name = if item.name.is_empty() {
            format!("Producto #{}", item.id)
        } else {
            item.name.clone()
        };
        writeln!(out, "{:>3} x {name:<32} {price:>10}", item.quantity)?;
    }
    writeln!(out, "Total:   {}", order.total)
}

pub fn placed(out: &mut impl Write, order: &PlacedOrder) -> io::Result<()> {
    writeln!(out, "¡Pedido confirmado! Número de pedido: {}", order.receipt.id)?;
    writeln!(out, "Total: {}", order.total)?;
    if order.total_mismatch {
        writeln!(
            out,
            "El total registrado por la tienda difiere del calculado; revisa el detalle del pedido."
        )?;
    }
    Ok(())
}

pub fn adjusted(out: &mut impl Write, report: &ReconciliationReport) -> io::Result<()> {
    writeln!(out, "{}", report.notice())?;
    for adjustment in &report.adjustments {
        if adjustment.is_removal() {
            writeln!(out, "  - {}: eliminado (sin stock)", adjustment.name)?;
        } else {
            writeln!(
                out,
                "  - {}: {} → {}",
                adjustment.name, adjustment.previous, adjustment.current
            )?;
        }
    }
    for id in &report.unchecked {
        writeln!(out, "  - Producto #{id}: no se pudo verificar")?;
    }
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use bakery_core::{OrderItem, OrderStatus, StockAdjustment};

    use super::*;

    fn product(id: &str, cents: i64, stock: u32) -> Product {
        Product {
            id: id.into(),
            name: format!("Producto {id}"),
            description: String::new(),
            price: Money::from_minor_units(cents),
            category: String::new(),
            image: String::new(),
            stock,
            available: true,
        }
    }

    fn render(f: impl FnOnce(&mut Vec<u8>) -> io::Result<()>) -> String {
        let mut out = Vec::new();
        f(&mut out).unwrap();
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn test_cart_shows_breakdown_and_hint() {
        let mut items = Cart::new();
        items.add_item(&product("1", 2_000, 5), 2);

        let text = render(|out| cart(out, &items, &PricingPolicy::default()));

        assert!(text.contains("Subtotal:  S/ 40.00"));
        assert!(text.contains("Envío:     S/ 5.00"));
        assert!(text.contains("Total:     S/ 49.00"));
        assert!(text.contains("Agrega S/ 10.00 más"));
    }

    #[test]
    fn test_cart_free_shipping() {
        let mut items = Cart::new();
        items.add_item(&product("1", 2_500, 5), 2);

        let text = render(|out| cart(out, &items, &PricingPolicy::default()));

        assert!(text.contains("Envío:     Gratis"));
        assert!(!text.contains("Agrega"));
    }

    #[test]
    fn test_empty_cart() {
        let text = render(|out| cart(out, &Cart::new(), &PricingPolicy::default()));
        assert_eq!(text, "Tu carrito está vacío.\n");
    }

    #[test]
    fn test_sold_out_product_row() {
        let text = render(|out| product_row(out, &product("3", 500, 0)));
        assert!(text.contains("agotado"));
    }

    #[test]
    fn test_order_detail() {
        let order = OrderSummary {
            id: "41".into(),
            status: OrderStatus::OnTheWay,
            total: Money::from_minor_units(4_900),
            items: vec![
                OrderItem {
                    id: "1".into(),
                    name: "Pan de molde".to_string(),
                    price: Some(Money::from_minor_units(2_000)),
                    quantity: 2,
                },
                OrderItem {
                    id: "9".into(),
                    name: String::new(),
                    price: None,
                    quantity: 1,
                },
            ],
            address: None,
            payment_method: Some("stripe".to_string()),
            created_at: None,
            channel: Some(SalesChannel::Counter),
        };

        let text = render(|out| order_detail(out, &order));

        assert!(text.starts_with("Pedido #41\n"));
        assert!(text.contains("Estado:  En camino"));
        assert!(text.contains("Canal:   mostrador"));
        assert!(text.contains("Producto #9"));
        assert!(text.ends_with("Total:   S/ 49.00\n"));
    }

    #[test]
    fn test_adjusted_lists_changes() {
        let report = ReconciliationReport {
            adjustments: vec![
                StockAdjustment {
                    product_id: "1".into(),
                    name: "Pan de molde".to_string(),
                    previous: 4,
                    current: 2,
                },
                StockAdjustment {
                    product_id: "2".into(),
                    name: "Torta".to_string(),
                    previous: 1,
                    current: 0,
                },
            ],
            unchecked: Vec::new(),
        };

        let text = render(|out| adjusted(out, &report));

        assert!(text.contains("Pan de molde: 4 → 2"));
        assert!(text.contains("Torta: eliminado (sin stock)"));
        assert!(!text.contains("no se pudo verificar"));
    }

    #[test]
    fn test_adjusted_lists_unchecked_products() {
        let report = ReconciliationReport {
            adjustments: vec![StockAdjustment {
                product_id: "1".into(),
                name: "Pan de molde".to_string(),
                previous: 4,
                current: 2,
            }],
            unchecked: vec!["7".into()],
        };

        let text = render(|out| adjusted(out, &report));

        assert!(text.starts_with(report.notice()));
        assert!(text.contains("Pan de molde: 4 → 2"));
        assert!(text.ends_with("  - Producto #7: no se pudo verificar\n"));
    }
}
