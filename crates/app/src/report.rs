//! Plain-text overview of a restaurant.

use std::fmt::Write;

use domain::{Order, RestaurantService};
use snapshot_store::SnapshotStore;

/// Renders menu, stock alerts, active orders and the summary as text.
pub async fn render<S: SnapshotStore>(
    service: &RestaurantService<S>,
) -> Result<String, std::fmt::Error> {
    let mut out = String::new();
    write_report(service, &mut out).await?;
    Ok(out)
}

async fn write_report<S: SnapshotStore>(
    service: &RestaurantService<S>,
    out: &mut String,
) -> std::fmt::Result {
    writeln!(out, "== Menu ==")?;
    for (category, items) in service.items_by_category().await {
        writeln!(out, "{category}")?;
        for item in items {
            let marker = if item.available { "" } else { " (unavailable)" };
            writeln!(out, "  {:<20} {:>8}{marker}", item.name, item.price.to_string())?;
        }
    }

    writeln!(out, "\n== Low stock ==")?;
    let alerts = service.low_stock_alerts().await;
    if alerts.is_empty() {
        writeln!(out, "  none")?;
    }
    for stock in alerts {
        writeln!(
            out,
            "  {:<12} {:>8.2} {} (reorder at {}, suggest +{:.2})",
            stock.name,
            stock.quantity,
            stock.unit,
            stock.reorder_level,
            stock.suggested_restock()
        )?;
    }

    writeln!(out, "\n== Active orders ==")?;
    let active = service.active_orders().await;
    if active.is_empty() {
        writeln!(out, "  none")?;
    }
    for order in &active {
        write_order(out, order)?;
    }

    let summary = service.summary().await;
    writeln!(out, "\n== Summary ==")?;
    writeln!(out, "  menu items:       {}", summary.menu_items)?;
    writeln!(out, "  available now:    {}", service.available_items().await.len())?;
    writeln!(out, "  ingredients:      {}", summary.ingredients)?;
    writeln!(out, "  low stock:        {}", summary.low_stock)?;
    writeln!(out, "  active orders:    {}", summary.active_orders)?;
    writeln!(out, "  completed orders: {}", summary.completed_orders)?;

    let popular = service.popular_items(3).await;
    if !popular.is_empty() {
        writeln!(out, "\n== Popular ==")?;
        for item in popular {
            writeln!(out, "  {:<20} {}", item.name, item.quantity)?;
        }
    }
    Ok(())
}

fn write_order(out: &mut String, order: &Order) -> std::fmt::Result {
    writeln!(
        out,
        "  #{} table {} {} [{}] {}",
        order.id().short(),
        order.table_number(),
        order.customer_name(),
        order.status(),
        order.total()
    )?;
    for line in order.lines() {
        writeln!(out, "      {} x {}", line.quantity, line.item.name)?;
    }
    Ok(())
}
