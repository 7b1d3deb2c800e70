//! Restaurant aggregate root: the only place cross-entity transitions happen.

use std::collections::BTreeMap;

use common::{MenuItemId, OrderId};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::catalog::{Catalog, CatalogError, MenuItem, MenuItemUpdate, NewMenuItem};
use crate::ledger::{IngredientStock, Ledger, LedgerError};
use crate::order::{Order, OrderError, OrderStatus};

/// Errors returned by restaurant operations.
///
/// Every error is returned before any state is mutated.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RestaurantError {
    #[error(transparent)]
    Ledger(#[from] LedgerError),

    #[error(transparent)]
    Catalog(#[from] CatalogError),

    #[error(transparent)]
    Order(#[from] OrderError),

    /// No order with this id exists.
    #[error("Unknown order: {0}")]
    UnknownOrder(OrderId),

    /// The order has no lines to place.
    #[error("Order {0} has no items")]
    EmptyOrder(OrderId),

    /// Placing the order would need more of an ingredient than is stocked.
    #[error("Insufficient {ingredient}: required {required}, available {available}")]
    InsufficientIngredients {
        ingredient: String,
        required: f64,
        available: f64,
    },
}

/// Ledger, catalog and orders of one restaurant.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Restaurant {
    ledger: Ledger,
    catalog: Catalog,
    orders: BTreeMap<OrderId, Order>,
}

// Queries
impl Restaurant {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn ledger(&self) -> &Ledger {
        &self.ledger
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn order(&self, id: OrderId) -> Option<&Order> {
        self.orders.get(&id)
    }

    pub fn orders(&self) -> impl Iterator<Item = &Order> {
        self.orders.values()
    }

    /// Ingredients at or below their reorder level.
    pub fn low_stock_alerts(&self) -> Vec<&IngredientStock> {
        self.ledger.list_low_stock()
    }

    /// Menu grouped by category, categories in first-seen order.
    pub fn items_by_category(&self) -> Vec<(&str, Vec<&MenuItem>)> {
        self.catalog.items_by_category()
    }

    /// Unpaid orders, oldest first.
    pub fn active_orders(&self) -> Vec<&Order> {
        let mut active: Vec<&Order> = self
            .orders
            .values()
            .filter(|o| o.status().is_active())
            .collect();
        active.sort_by_key(|o| o.created_at());
        active
    }

    /// Paid orders, most recent first.
    pub fn order_history(&self) -> Vec<&Order> {
        let mut paid: Vec<&Order> = self
            .orders
            .values()
            .filter(|o| o.status().is_terminal())
            .collect();
        paid.sort_by(|a, b| b.created_at().cmp(&a.created_at()));
        paid
    }
}

// Inventory and menu commands
impl Restaurant {
    /// Registers a new ingredient and refreshes menu availability.
    pub fn register_ingredient(
        &mut self,
        name: &str,
        quantity: f64,
        unit: &str,
        reorder_level: f64,
    ) -> Result<(), RestaurantError> {
        self.ledger.register(name, quantity, unit, reorder_level)?;
        self.refresh_availability();
        Ok(())
    }

    /// Adds stock of an existing ingredient. The amount must be positive.
    pub fn restock(&mut self, name: &str, amount: f64) -> Result<f64, RestaurantError> {
        if !(amount.is_finite() && amount > 0.0) {
            return Err(LedgerError::InvalidAmount(amount).into());
        }
        let quantity = self.ledger.adjust(name, amount)?;
        self.refresh_availability();
        Ok(quantity)
    }

    pub fn add_menu_item(&mut self, item: NewMenuItem) -> Result<MenuItemId, RestaurantError> {
        let id = self.catalog.add_item(item)?;
        self.refresh_availability();
        Ok(id)
    }

    pub fn update_menu_item(
        &mut self,
        id: MenuItemId,
        update: MenuItemUpdate,
    ) -> Result<(), RestaurantError> {
        self.catalog.update_item(id, update)?;
        self.refresh_availability();
        Ok(())
    }

    /// Removes a menu item.
    ///
    /// Never blocked by open orders: their lines carry their own copy of the
    /// item, so they stay consistent and placeable.
    pub fn remove_menu_item(&mut self, id: MenuItemId) -> Result<MenuItem, RestaurantError> {
        Ok(self.catalog.remove_item(id)?)
    }

    /// Recomputes every menu item's cached availability from the ledger.
    pub fn refresh_availability(&mut self) {
        self.catalog.recompute_availability(&self.ledger);
    }
}

// Order commands
impl Restaurant {
    /// Opens a new pending order.
    pub fn create_order(
        &mut self,
        customer_name: &str,
        table_number: u32,
    ) -> Result<OrderId, RestaurantError> {
        let order = Order::new(customer_name, table_number)?;
        let id = order.id();
        self.orders.insert(id, order);
        Ok(id)
    }

    /// Adds a catalog item to a pending order. The item must exist now.
    pub fn add_order_line(
        &mut self,
        order_id: OrderId,
        menu_item_id: MenuItemId,
        quantity: u32,
    ) -> Result<(), RestaurantError> {
        let order = self
            .orders
            .get_mut(&order_id)
            .ok_or(RestaurantError::UnknownOrder(order_id))?;
        let item = self.catalog.snapshot(menu_item_id)?;
        order.add_line(item, quantity)?;
        Ok(())
    }

    pub fn remove_order_line(
        &mut self,
        order_id: OrderId,
        menu_item_id: MenuItemId,
    ) -> Result<(), RestaurantError> {
        self.order_mut(order_id)?.remove_line(menu_item_id)?;
        Ok(())
    }

    /// Places a pending order: consumes its ingredients and starts preparing.
    ///
    /// Runs in two phases. The pre-check verifies every required ingredient
    /// against the ledger and fails without touching anything. The commit
    /// phase then applies each consumption; should one fail, the ones already
    /// applied are reverted.
    pub fn place_order(&mut self, order_id: OrderId) -> Result<(), RestaurantError> {
        let order = self
            .orders
            .get_mut(&order_id)
            .ok_or(RestaurantError::UnknownOrder(order_id))?;
        order.check_transition(OrderStatus::Preparing)?;
        if order.is_empty() {
            return Err(RestaurantError::EmptyOrder(order_id));
        }

        let required = order.required_ingredients();

        for (ingredient, &amount) in &required {
            if !self.ledger.can_supply(ingredient, amount) {
                return Err(RestaurantError::InsufficientIngredients {
                    ingredient: ingredient.clone(),
                    required: amount,
                    available: self.ledger.quantity(ingredient).unwrap_or(0.0),
                });
            }
        }

        let consumed = commit_consumption(&mut self.ledger, &required)?;

        if let Err(e) = order.start_preparing() {
            revert_consumption(&mut self.ledger, &consumed);
            return Err(e.into());
        }

        self.catalog.recompute_availability(&self.ledger);
        Ok(())
    }

    /// Moves an order to `target`.
    ///
    /// Reaching `preparing` always goes through [`Restaurant::place_order`],
    /// so an order can never start without its ingredients being consumed.
    pub fn advance_order_status(
        &mut self,
        order_id: OrderId,
        target: OrderStatus,
    ) -> Result<(), RestaurantError> {
        if target == OrderStatus::Preparing {
            return self.place_order(order_id);
        }
        self.order_mut(order_id)?.advance_to(target)?;
        Ok(())
    }

    fn order_mut(&mut self, order_id: OrderId) -> Result<&mut Order, RestaurantError> {
        self.orders
            .get_mut(&order_id)
            .ok_or(RestaurantError::UnknownOrder(order_id))
    }
}

/// Applies every consumption, reverting the applied ones on the first failure.
fn commit_consumption(
    ledger: &mut Ledger,
    required: &BTreeMap<String, f64>,
) -> Result<Vec<(String, f64)>, LedgerError> {
    let mut applied = Vec::with_capacity(required.len());
    for (ingredient, &amount) in required {
        if let Err(e) = ledger.adjust(ingredient, -amount) {
            tracing::error!(%ingredient, amount, error = %e, "consumption failed after pre-check, rolling back");
            revert_consumption(ledger, &applied);
            return Err(e);
        }
        applied.push((ingredient.clone(), amount));
    }
    Ok(applied)
}

fn revert_consumption(ledger: &mut Ledger, applied: &[(String, f64)]) {
    for (ingredient, amount) in applied.iter().rev() {
        if let Err(e) = ledger.adjust(ingredient, *amount) {
            tracing::error!(%ingredient, amount, error = %e, "failed to revert consumption");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::Recipe;
    use crate::money::Money;

    fn bakery() -> (Restaurant, MenuItemId) {
        let mut restaurant = Restaurant::new();
        restaurant
            .register_ingredient("flour", 2.0, "kg", 1.0)
            .unwrap();
        let bread = restaurant
            .add_menu_item(NewMenuItem::new(
                "Bread",
                Money::from_cents(350),
                "Bakery",
                Recipe::new().with("flour", 1.0),
            ))
            .unwrap();
        (restaurant, bread)
    }

    fn order_of(restaurant: &mut Restaurant, item: MenuItemId, quantity: u32) -> OrderId {
        let order = restaurant.create_order("Ada", 1).unwrap();
        restaurant.add_order_line(order, item, quantity).unwrap();
        order
    }

    #[test]
    fn test_new_item_availability_is_computed() {
        let (restaurant, bread) = bakery();
        assert!(restaurant.catalog().get(bread).unwrap().available);
    }

    #[test]
    fn test_registering_ingredient_makes_item_available() {
        let mut restaurant = Restaurant::new();
        let tea = restaurant
            .add_menu_item(NewMenuItem::new(
                "Tea",
                Money::from_cents(250),
                "Beverage",
                Recipe::new().with("tea leaves", 0.005),
            ))
            .unwrap();
        assert!(!restaurant.catalog().get(tea).unwrap().available);

        restaurant
            .register_ingredient("tea leaves", 0.5, "kg", 0.1)
            .unwrap();
        assert!(restaurant.catalog().get(tea).unwrap().available);
    }

    #[test]
    fn test_recipe_update_recomputes_availability() {
        let (mut restaurant, bread) = bakery();
        assert!(restaurant.catalog().get(bread).unwrap().available);

        restaurant
            .update_menu_item(bread, MenuItemUpdate::recipe(Recipe::new().with("flour", 3.0)))
            .unwrap();
        assert!(!restaurant.catalog().get(bread).unwrap().available);

        restaurant
            .update_menu_item(bread, MenuItemUpdate::recipe(Recipe::new().with("flour", 0.5)))
            .unwrap();
        assert!(restaurant.catalog().get(bread).unwrap().available);
        assert_eq!(restaurant.ledger().quantity("flour"), Some(2.0));
    }

    #[test]
    fn test_fractional_recipes_use_all_stock() {
        let mut restaurant = Restaurant::new();
        restaurant
            .register_ingredient("basil", 0.3, "kg", 0.0)
            .unwrap();
        let pesto = restaurant
            .add_menu_item(NewMenuItem::new(
                "Pesto",
                Money::from_cents(900),
                "Main Course",
                Recipe::new().with("basil", 0.1),
            ))
            .unwrap();

        for _ in 0..3 {
            let order = order_of(&mut restaurant, pesto, 1);
            restaurant.place_order(order).unwrap();
        }
        assert_eq!(restaurant.ledger().quantity("basil"), Some(0.0));
        assert!(!restaurant.catalog().get(pesto).unwrap().available);

        restaurant.restock("basil", 0.3).unwrap();
        let triple = order_of(&mut restaurant, pesto, 3);
        restaurant.place_order(triple).unwrap();
        assert_eq!(restaurant.ledger().quantity("basil"), Some(0.0));
    }

    #[test]
    fn test_place_order_consumes_and_starts_preparing() {
        let (mut restaurant, bread) = bakery();
        let order = order_of(&mut restaurant, bread, 2);

        restaurant.place_order(order).unwrap();

        assert_eq!(restaurant.ledger().quantity("flour"), Some(0.0));
        assert_eq!(
            restaurant.order(order).unwrap().status(),
            OrderStatus::Preparing
        );
        assert!(!restaurant.catalog().get(bread).unwrap().available);
    }

    #[test]
    fn test_place_order_insufficient_leaves_everything_unchanged() {
        let (mut restaurant, bread) = bakery();
        let order = order_of(&mut restaurant, bread, 3);
        let before = restaurant.clone();

        let err = restaurant.place_order(order).unwrap_err();

        assert_eq!(
            err,
            RestaurantError::InsufficientIngredients {
                ingredient: "flour".to_string(),
                required: 3.0,
                available: 2.0,
            }
        );
        assert_eq!(restaurant, before);
    }

    #[test]
    fn test_missing_ingredient_counts_as_zero() {
        let (mut restaurant, _) = bakery();
        let cake = restaurant
            .add_menu_item(NewMenuItem::new(
                "Cake",
                Money::from_cents(600),
                "Dessert",
                Recipe::new().with("cocoa", 0.1),
            ))
            .unwrap();
        let order = order_of(&mut restaurant, cake, 1);

        let err = restaurant.place_order(order).unwrap_err();
        assert!(matches!(
            err,
            RestaurantError::InsufficientIngredients { available, .. } if available == 0.0
        ));
    }

    #[test]
    fn test_place_empty_order_fails() {
        let (mut restaurant, _) = bakery();
        let order = restaurant.create_order("Ada", 1).unwrap();
        assert_eq!(
            restaurant.place_order(order),
            Err(RestaurantError::EmptyOrder(order))
        );
    }

    #[test]
    fn test_place_order_twice_consumes_once() {
        let (mut restaurant, bread) = bakery();
        let order = order_of(&mut restaurant, bread, 1);
        restaurant.place_order(order).unwrap();

        let err = restaurant.place_order(order).unwrap_err();
        assert!(matches!(
            err,
            RestaurantError::Order(OrderError::InvalidTransition { .. })
        ));
        assert_eq!(restaurant.ledger().quantity("flour"), Some(1.0));
    }

    #[test]
    fn test_advance_to_preparing_goes_through_placement() {
        let (mut restaurant, bread) = bakery();
        let order = order_of(&mut restaurant, bread, 1);

        restaurant
            .advance_order_status(order, OrderStatus::Preparing)
            .unwrap();
        assert_eq!(restaurant.ledger().quantity("flour"), Some(1.0));

        restaurant
            .advance_order_status(order, OrderStatus::Served)
            .unwrap();
        restaurant
            .advance_order_status(order, OrderStatus::Paid)
            .unwrap();
        assert_eq!(restaurant.order(order).unwrap().status(), OrderStatus::Paid);
    }

    #[test]
    fn test_restock_refreshes_availability() {
        let (mut restaurant, bread) = bakery();
        let order = order_of(&mut restaurant, bread, 2);
        restaurant.place_order(order).unwrap();
        assert!(!restaurant.catalog().get(bread).unwrap().available);

        assert_eq!(restaurant.restock("flour", 1.0).unwrap(), 1.0);
        assert!(restaurant.catalog().get(bread).unwrap().available);
    }

    #[test]
    fn test_restock_requires_positive_amount() {
        let (mut restaurant, _) = bakery();
        assert!(matches!(
            restaurant.restock("flour", -1.0),
            Err(RestaurantError::Ledger(LedgerError::InvalidAmount(_)))
        ));
        assert!(matches!(
            restaurant.restock("sugar", 1.0),
            Err(RestaurantError::Ledger(LedgerError::UnknownIngredient(_)))
        ));
    }

    #[test]
    fn test_add_line_for_unknown_item_fails() {
        let (mut restaurant, _) = bakery();
        let order = restaurant.create_order("Ada", 1).unwrap();
        let missing = MenuItemId::new();
        assert_eq!(
            restaurant.add_order_line(order, missing, 1),
            Err(RestaurantError::Catalog(CatalogError::UnknownMenuItem(
                missing
            )))
        );
    }

    #[test]
    fn test_unknown_order() {
        let (mut restaurant, bread) = bakery();
        let missing = OrderId::new();
        assert_eq!(
            restaurant.add_order_line(missing, bread, 1),
            Err(RestaurantError::UnknownOrder(missing))
        );
        assert_eq!(
            restaurant.place_order(missing),
            Err(RestaurantError::UnknownOrder(missing))
        );
    }

    #[test]
    fn test_removed_item_keeps_order_consistent() {
        let (mut restaurant, bread) = bakery();
        let order = order_of(&mut restaurant, bread, 1);

        restaurant.remove_menu_item(bread).unwrap();

        let stored = restaurant.order(order).unwrap();
        assert_eq!(stored.total(), Money::from_cents(350));
        assert_eq!(stored.lines()[0].item.name, "Bread");

        restaurant.place_order(order).unwrap();
        assert_eq!(restaurant.ledger().quantity("flour"), Some(1.0));
    }

    #[test]
    fn test_price_change_does_not_reprice_open_orders() {
        let (mut restaurant, bread) = bakery();
        let order = order_of(&mut restaurant, bread, 1);

        restaurant
            .update_menu_item(bread, MenuItemUpdate::price(Money::from_cents(500)))
            .unwrap();

        assert_eq!(
            restaurant.order(order).unwrap().total(),
            Money::from_cents(350)
        );
    }

    #[test]
    fn test_commit_consumption_rolls_back_on_failure() {
        let mut ledger = Ledger::new();
        ledger.register("flour", 5.0, "kg", 1.0).unwrap();
        ledger.register("milk", 1.0, "l", 0.5).unwrap();

        let mut required = BTreeMap::new();
        required.insert("flour".to_string(), 2.0);
        required.insert("milk".to_string(), 3.0);

        let err = commit_consumption(&mut ledger, &required).unwrap_err();
        assert!(matches!(err, LedgerError::InsufficientStock { .. }));
        assert_eq!(ledger.quantity("flour"), Some(5.0));
        assert_eq!(ledger.quantity("milk"), Some(1.0));
    }

    #[test]
    fn test_active_orders_and_history() {
        let (mut restaurant, bread) = bakery();
        let first = order_of(&mut restaurant, bread, 1);
        let second = order_of(&mut restaurant, bread, 1);

        restaurant.place_order(first).unwrap();
        restaurant
            .advance_order_status(first, OrderStatus::Served)
            .unwrap();
        restaurant
            .advance_order_status(first, OrderStatus::Paid)
            .unwrap();

        let active: Vec<OrderId> = restaurant.active_orders().iter().map(|o| o.id()).collect();
        assert_eq!(active, vec![second]);

        let history: Vec<OrderId> = restaurant.order_history().iter().map(|o| o.id()).collect();
        assert_eq!(history, vec![first]);
    }
}
