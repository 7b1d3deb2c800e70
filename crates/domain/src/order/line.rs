use serde::{Deserialize, Serialize};

use crate::catalog::MenuItemSnapshot;
use crate::money::Money;

/// One line of an order: a priced copy of a menu item and how many were ordered.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderLine {
    pub item: MenuItemSnapshot,
    pub quantity: u32,
}

impl OrderLine {
    pub fn new(item: MenuItemSnapshot, quantity: u32) -> Self {
        Self { item, quantity }
    }

    /// Returns the line total (quantity * unit price), or `None` on overflow.
    pub fn total_price(&self) -> Option<Money> {
        self.item.price.checked_multiply(self.quantity)
    }
}
