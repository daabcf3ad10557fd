use kasa::money::format_minor;
use kasa_app::domain::{carts::records::CartLineRecord, orders::records::OrderRecord};
use rusty_money::iso::Currency;

fn money(amount: u64, currency: &'static Currency) -> Result<String, String> {
    format_minor(amount, currency).map_err(|error| format!("failed to format amount: {error}"))
}

pub(crate) fn order(order: &OrderRecord, currency: &'static Currency) -> Result<(), String> {
    println!("order_uuid: {}", order.uuid);
    println!("order_number: {}", order.order_number);
    println!("status: {}", order.status);
    println!("payment_status: {}", order.payment_status);
    println!("created_at: {}", order.created_at);

    for line in &order.lines {
        let name = match &line.variant_name {
            Some(variant) => format!("{} ({variant})", line.product_name),
            None => line.product_name.clone(),
        };

        println!(
            "  {}. {name} x{} @ {} = {}",
            line.position,
            line.quantity,
            money(line.unit_price, currency)?,
            money(line.line_subtotal, currency)?,
        );

        for addon in &line.addons {
            println!(
                "       + {} x{} @ {}",
                addon.name,
                addon.quantity,
                money(addon.unit_price, currency)?,
            );
        }
    }

    println!("subtotal: {}", money(order.subtotal, currency)?);
    println!("tax: {}", money(order.tax, currency)?);
    println!("shipping: {}", money(order.shipping, currency)?);
    println!("discount: {}", money(order.discount, currency)?);
    println!("total: {}", money(order.total, currency)?);

    Ok(())
}

pub(crate) fn cart_line(line: &CartLineRecord, currency: &'static Currency) -> Result<(), String> {
    let marker = if line.selected { "*" } else { " " };

    println!(
        "{marker} {} product={} quantity={} unit_price={} addons={}",
        line.uuid,
        line.product_uuid,
        line.quantity,
        money(line.unit_price, currency)?,
        line.addons.len(),
    );

    Ok(())
}
