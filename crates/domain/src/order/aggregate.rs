//! Order aggregate implementation.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use common::{MenuItemId, OrderId};
use serde::{Deserialize, Serialize};

use crate::catalog::MenuItemSnapshot;
use crate::money::Money;

use super::{OrderError, OrderLine, OrderStatus};

/// Customer name used when none is given.
pub const DEFAULT_CUSTOMER: &str = "Guest";

/// A table's order.
///
/// `total` is recomputed from the lines after every line mutation, so it
/// always equals the sum of `price * quantity` over the current lines.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    id: OrderId,
    customer_name: String,
    table_number: u32,
    created_at: DateTime<Utc>,
    status: OrderStatus,
    lines: Vec<OrderLine>,
    total: Money,
    #[serde(default)]
    placed_at: Option<DateTime<Utc>>,
    #[serde(default)]
    paid_at: Option<DateTime<Utc>>,
}

// Query methods
impl Order {
    pub fn id(&self) -> OrderId {
        self.id
    }

    pub fn customer_name(&self) -> &str {
        &self.customer_name
    }

    pub fn table_number(&self) -> u32 {
        self.table_number
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// When the order left `pending`, if it has.
    pub fn placed_at(&self) -> Option<DateTime<Utc>> {
        self.placed_at
    }

    /// When the order was paid, if it has been.
    pub fn paid_at(&self) -> Option<DateTime<Utc>> {
        self.paid_at
    }

    pub fn status(&self) -> OrderStatus {
        self.status
    }

    /// Lines in the order they were first added.
    pub fn lines(&self) -> &[OrderLine] {
        &self.lines
    }

    pub fn line(&self, menu_item_id: MenuItemId) -> Option<&OrderLine> {
        self.lines.iter().find(|l| l.item.id == menu_item_id)
    }

    pub fn item_count(&self) -> usize {
        self.lines.len()
    }

    /// Returns the total quantity of all lines.
    pub fn total_quantity(&self) -> u64 {
        self.lines.iter().map(|l| u64::from(l.quantity)).sum()
    }

    pub fn total(&self) -> Money {
        self.total
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Ingredient consumption for the whole order, summed across lines.
    pub fn required_ingredients(&self) -> BTreeMap<String, f64> {
        let mut required = BTreeMap::new();
        for line in &self.lines {
            for (ingredient, per_unit) in line.item.recipe.iter() {
                *required.entry(ingredient.to_string()).or_insert(0.0) +=
                    per_unit * f64::from(line.quantity);
            }
        }
        required
    }
}

// Command methods
impl Order {
    /// Opens a new pending order. A blank customer name becomes "Guest".
    pub fn new(customer_name: impl Into<String>, table_number: u32) -> Result<Self, OrderError> {
        if table_number == 0 {
            return Err(OrderError::InvalidTable {
                table: table_number,
            });
        }

        let customer_name = customer_name.into().trim().to_string();
        let customer_name = if customer_name.is_empty() {
            DEFAULT_CUSTOMER.to_string()
        } else {
            customer_name
        };

        Ok(Self {
            id: OrderId::new(),
            customer_name,
            table_number,
            created_at: Utc::now(),
            status: OrderStatus::Pending,
            lines: Vec::new(),
            total: Money::zero(),
            placed_at: None,
            paid_at: None,
        })
    }

    /// Adds a line, merging into an existing line for the same menu item.
    ///
    /// A merged line keeps the price captured when it was first added.
    /// If the merged quantity or the new total would overflow, the order is
    /// left unchanged.
    pub fn add_line(&mut self, item: MenuItemSnapshot, quantity: u32) -> Result<(), OrderError> {
        self.ensure_pending("add line")?;

        if quantity == 0 {
            return Err(OrderError::InvalidQuantity { quantity });
        }

        let mut lines = self.lines.clone();
        match lines.iter_mut().find(|l| l.item.id == item.id) {
            Some(existing) => {
                existing.quantity = existing
                    .quantity
                    .checked_add(quantity)
                    .ok_or(OrderError::QuantityOverflow { quantity })?;
            }
            None => lines.push(OrderLine::new(item, quantity)),
        }

        self.total = total_of(&lines).ok_or(OrderError::QuantityOverflow { quantity })?;
        self.lines = lines;
        Ok(())
    }

    /// Removes the line for a menu item. Removing an absent item is a no-op.
    pub fn remove_line(&mut self, menu_item_id: MenuItemId) -> Result<(), OrderError> {
        self.ensure_pending("remove line")?;

        let lines: Vec<OrderLine> = self
            .lines
            .iter()
            .filter(|l| l.item.id != menu_item_id)
            .cloned()
            .collect();
        // Dropping a line from a total that fit cannot overflow.
        self.total = total_of(&lines).unwrap_or(self.total);
        self.lines = lines;
        Ok(())
    }

    /// Pending → Preparing.
    pub fn start_preparing(&mut self) -> Result<(), OrderError> {
        self.transition(OrderStatus::Preparing)?;
        self.placed_at = Some(Utc::now());
        Ok(())
    }

    /// Preparing → Served.
    pub fn mark_served(&mut self) -> Result<(), OrderError> {
        self.transition(OrderStatus::Served)
    }

    /// Served → Paid.
    pub fn complete(&mut self) -> Result<(), OrderError> {
        self.transition(OrderStatus::Paid)?;
        self.paid_at = Some(Utc::now());
        Ok(())
    }

    /// Applies whichever single forward transition reaches `target`.
    pub fn advance_to(&mut self, target: OrderStatus) -> Result<(), OrderError> {
        match target {
            OrderStatus::Preparing => self.start_preparing(),
            OrderStatus::Served => self.mark_served(),
            OrderStatus::Paid => self.complete(),
            OrderStatus::Pending => Err(OrderError::InvalidTransition {
                current_state: self.status,
                action: target.entering_action(),
            }),
        }
    }

    /// Fails unless `target` is the forward successor of the current status.
    pub fn check_transition(&self, target: OrderStatus) -> Result<(), OrderError> {
        if self.status.next() == Some(target) {
            Ok(())
        } else {
            Err(OrderError::InvalidTransition {
                current_state: self.status,
                action: target.entering_action(),
            })
        }
    }

    fn transition(&mut self, target: OrderStatus) -> Result<(), OrderError> {
        self.check_transition(target)?;
        self.status = target;
        Ok(())
    }

    fn ensure_pending(&self, action: &'static str) -> Result<(), OrderError> {
        if self.status.can_modify_lines() {
            Ok(())
        } else {
            Err(OrderError::InvalidTransition {
                current_state: self.status,
                action,
            })
        }
    }
}

/// Sum of line totals, `None` if any step overflows.
fn total_of(lines: &[OrderLine]) -> Option<Money> {
    lines.iter().try_fold(Money::zero(), |total, line| {
        total.checked_add(line.total_price()?)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::Recipe;

    fn snapshot(name: &str, cents: i64) -> MenuItemSnapshot {
        MenuItemSnapshot {
            id: MenuItemId::new(),
            name: name.to_string(),
            price: Money::from_cents(cents),
            recipe: Recipe::new().with("flour", 1.0),
        }
    }

    fn pending_order() -> Order {
        Order::new("Ada", 4).unwrap()
    }

    fn assert_total_matches_lines(order: &Order) {
        let expected: Money = order
            .lines()
            .iter()
            .map(|l| l.total_price().unwrap())
            .sum();
        assert_eq!(order.total(), expected);
    }

    #[test]
    fn test_new_order() {
        let order = pending_order();
        assert_eq!(order.status(), OrderStatus::Pending);
        assert_eq!(order.customer_name(), "Ada");
        assert_eq!(order.table_number(), 4);
        assert!(order.is_empty());
        assert!(order.total().is_zero());
        assert!(order.placed_at().is_none());
    }

    #[test]
    fn test_blank_customer_becomes_guest() {
        let order = Order::new("  ", 1).unwrap();
        assert_eq!(order.customer_name(), DEFAULT_CUSTOMER);
    }

    #[test]
    fn test_table_zero_rejected() {
        assert_eq!(
            Order::new("Ada", 0).unwrap_err(),
            OrderError::InvalidTable { table: 0 }
        );
    }

    #[test]
    fn test_add_line_updates_total() {
        let mut order = pending_order();
        order.add_line(snapshot("Bread", 350), 2).unwrap();
        order.add_line(snapshot("Soup", 500), 1).unwrap();

        assert_eq!(order.item_count(), 2);
        assert_eq!(order.total(), Money::from_cents(1200));
        assert_total_matches_lines(&order);
    }

    #[test]
    fn test_add_same_item_merges_lines() {
        let mut order = pending_order();
        let bread = snapshot("Bread", 350);
        order.add_line(bread.clone(), 1).unwrap();
        order.add_line(bread.clone(), 1).unwrap();

        assert_eq!(order.item_count(), 1);
        assert_eq!(order.line(bread.id).unwrap().quantity, 2);
        assert_eq!(order.total(), bread.price.checked_multiply(2).unwrap());
    }

    #[test]
    fn test_add_line_zero_quantity_fails() {
        let mut order = pending_order();
        let result = order.add_line(snapshot("Bread", 350), 0);
        assert_eq!(result, Err(OrderError::InvalidQuantity { quantity: 0 }));
        assert!(order.is_empty());
    }

    #[test]
    fn test_merge_past_u32_max_leaves_order_unchanged() {
        let mut order = pending_order();
        let water = snapshot("Water", 100);
        order.add_line(water.clone(), u32::MAX).unwrap();
        let total = order.total();

        let result = order.add_line(water.clone(), 1);
        assert_eq!(result, Err(OrderError::QuantityOverflow { quantity: 1 }));
        assert_eq!(order.line(water.id).unwrap().quantity, u32::MAX);
        assert_eq!(order.total(), total);
        assert_eq!(order.total_quantity(), u64::from(u32::MAX));
    }

    #[test]
    fn test_total_overflow_rejected() {
        let mut order = pending_order();
        order.add_line(snapshot("Caviar", i64::MAX / 2), 1).unwrap();

        let result = order.add_line(snapshot("Truffle", i64::MAX / 2), 3);
        assert_eq!(result, Err(OrderError::QuantityOverflow { quantity: 3 }));
        assert_eq!(order.item_count(), 1);
        assert_eq!(order.total(), Money::from_cents(i64::MAX / 2));
    }

    #[test]
    fn test_total_quantity_sums_lines() {
        let mut order = pending_order();
        order.add_line(snapshot("Bread", 350), u32::MAX).unwrap();
        order.add_line(snapshot("Soup", 500), 2).unwrap();
        assert_eq!(order.total_quantity(), u64::from(u32::MAX) + 2);
    }

    #[test]
    fn test_remove_line() {
        let mut order = pending_order();
        let bread = snapshot("Bread", 350);
        order.add_line(bread.clone(), 2).unwrap();
        order.add_line(snapshot("Soup", 500), 1).unwrap();

        order.remove_line(bread.id).unwrap();
        assert_eq!(order.item_count(), 1);
        assert_eq!(order.total(), Money::from_cents(500));
        assert_total_matches_lines(&order);
    }

    #[test]
    fn test_remove_absent_line_is_noop() {
        let mut order = pending_order();
        order.add_line(snapshot("Bread", 350), 1).unwrap();
        order.remove_line(MenuItemId::new()).unwrap();
        assert_eq!(order.item_count(), 1);
        assert_eq!(order.total(), Money::from_cents(350));
    }

    #[test]
    fn test_lines_frozen_after_pending() {
        let mut order = pending_order();
        let bread = snapshot("Bread", 350);
        order.add_line(bread.clone(), 1).unwrap();
        order.start_preparing().unwrap();

        assert!(matches!(
            order.add_line(bread.clone(), 1),
            Err(OrderError::InvalidTransition { .. })
        ));
        assert!(matches!(
            order.remove_line(bread.id),
            Err(OrderError::InvalidTransition { .. })
        ));
        assert_eq!(order.total(), Money::from_cents(350));
    }

    #[test]
    fn test_full_lifecycle() {
        let mut order = pending_order();
        order.start_preparing().unwrap();
        assert_eq!(order.status(), OrderStatus::Preparing);
        assert!(order.placed_at().is_some());

        order.mark_served().unwrap();
        assert_eq!(order.status(), OrderStatus::Served);

        order.complete().unwrap();
        assert_eq!(order.status(), OrderStatus::Paid);
        assert!(order.paid_at().is_some());
    }

    #[test]
    fn test_pending_only_allows_start_preparing() {
        let mut order = pending_order();
        assert!(matches!(
            order.mark_served(),
            Err(OrderError::InvalidTransition { .. })
        ));
        assert!(matches!(
            order.complete(),
            Err(OrderError::InvalidTransition { .. })
        ));
        assert_eq!(order.status(), OrderStatus::Pending);
        assert!(order.start_preparing().is_ok());
    }

    #[test]
    fn test_start_preparing_twice_fails() {
        let mut order = pending_order();
        order.start_preparing().unwrap();
        let err = order.start_preparing().unwrap_err();
        assert_eq!(
            err,
            OrderError::InvalidTransition {
                current_state: OrderStatus::Preparing,
                action: "start preparing",
            }
        );
    }

    #[test]
    fn test_paid_is_terminal() {
        let mut order = pending_order();
        order.start_preparing().unwrap();
        order.mark_served().unwrap();
        order.complete().unwrap();

        for target in [
            OrderStatus::Pending,
            OrderStatus::Preparing,
            OrderStatus::Served,
            OrderStatus::Paid,
        ] {
            assert!(order.advance_to(target).is_err());
        }
        assert_eq!(order.status(), OrderStatus::Paid);
    }

    #[test]
    fn test_advance_to_rejects_skipping() {
        let mut order = pending_order();
        assert!(order.advance_to(OrderStatus::Paid).is_err());
        order.advance_to(OrderStatus::Preparing).unwrap();
        assert!(order.advance_to(OrderStatus::Pending).is_err());
        order.advance_to(OrderStatus::Served).unwrap();
        assert_eq!(order.status(), OrderStatus::Served);
    }

    #[test]
    fn test_required_ingredients_sums_across_lines() {
        let mut order = pending_order();
        let mut bread = snapshot("Bread", 350);
        bread.recipe = Recipe::new().with("flour", 1.0);
        let mut pizza = snapshot("Pizza", 900);
        pizza.recipe = Recipe::new().with("flour", 0.5).with("cheese", 0.25);

        order.add_line(bread, 2).unwrap();
        order.add_line(pizza, 4).unwrap();

        let required = order.required_ingredients();
        assert_eq!(required.get("flour"), Some(&4.0));
        assert_eq!(required.get("cheese"), Some(&1.0));
    }

    #[test]
    fn test_serialization() {
        let mut order = pending_order();
        order.add_line(snapshot("Bread", 350), 2).unwrap();

        let json = serde_json::to_string(&order).unwrap();
        let restored: Order = serde_json::from_str(&json).unwrap();
        assert_eq!(restored, order);
    }
}
