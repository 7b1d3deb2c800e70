//! Demo data for an empty restaurant.

use domain::{DomainError, Money, NewMenuItem, Recipe, RestaurantService};
use snapshot_store::SnapshotStore;

const INGREDIENTS: &[(&str, f64, &str, f64)] = &[
    ("flour", 10.0, "kg", 2.0),
    ("tomato", 6.0, "kg", 2.0),
    ("mozzarella", 3.0, "kg", 1.0),
    ("basil", 0.2, "kg", 0.1),
    ("chocolate", 1.5, "kg", 0.5),
    ("cream", 2.0, "l", 0.5),
    ("coffee", 1.0, "kg", 0.25),
];

fn menu() -> Vec<NewMenuItem> {
    vec![
        NewMenuItem::new(
            "Bruschetta",
            Money::from_cents(650),
            "Appetizer",
            Recipe::new().with("flour", 0.1).with("tomato", 0.15).with("basil", 0.01),
        ),
        NewMenuItem::new(
            "Margherita",
            Money::from_cents(1200),
            "Main Course",
            Recipe::new()
                .with("flour", 0.25)
                .with("tomato", 0.2)
                .with("mozzarella", 0.15)
                .with("basil", 0.01),
        ),
        NewMenuItem::new(
            "Chocolate Mousse",
            Money::from_cents(750),
            "Dessert",
            Recipe::new().with("chocolate", 0.08).with("cream", 0.1),
        ),
        NewMenuItem::new(
            "Espresso",
            Money::from_cents(300),
            "Beverage",
            Recipe::new().with("coffee", 0.018),
        ),
    ]
}

/// Returns true when the restaurant has neither ingredients nor menu items.
pub async fn is_empty<S: SnapshotStore>(service: &RestaurantService<S>) -> bool {
    let summary = service.summary().await;
    summary.ingredients == 0 && summary.menu_items == 0
}

/// Registers the demo ingredients and menu, then runs one order through.
#[tracing::instrument(skip(service))]
pub async fn seed_demo<S: SnapshotStore>(service: &RestaurantService<S>) -> Result<(), DomainError> {
    for &(name, quantity, unit, reorder_level) in INGREDIENTS {
        service
            .register_ingredient(name, quantity, unit, reorder_level)
            .await?;
    }

    let mut ids = Vec::new();
    for item in menu() {
        ids.push(service.add_menu_item(item).await?);
    }

    let order_id = service.create_order("Grace", 4).await?;
    for (id, quantity) in ids.iter().zip([1, 2, 2, 2]) {
        service.add_order_line(order_id, *id, quantity).await?;
    }
    service.place_order(order_id).await?;

    let pending = service.create_order("", 7).await?;
    if let Some(espresso) = ids.last() {
        service.add_order_line(pending, *espresso, 1).await?;
    }

    tracing::info!(
        ingredients = INGREDIENTS.len(),
        menu_items = ids.len(),
        "demo data seeded"
    );
    Ok(())
}
