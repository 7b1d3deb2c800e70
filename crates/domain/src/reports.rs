//! Sales and inventory reporting over a restaurant's state.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::Serialize;

use crate::money::Money;
use crate::restaurant::Restaurant;

/// Headline counts for the reports view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Summary {
    pub menu_items: usize,
    pub ingredients: usize,
    pub low_stock: usize,
    pub active_orders: usize,
    pub completed_orders: usize,
}

/// A menu item ranked by units sold.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PopularItem {
    pub name: String,
    pub quantity: u64,
}

impl Restaurant {
    pub fn summary(&self) -> Summary {
        let (completed, active) = self
            .orders()
            .fold((0, 0), |(done, open), o| {
                if o.status().is_terminal() {
                    (done + 1, open)
                } else {
                    (done, open + 1)
                }
            });

        Summary {
            menu_items: self.catalog().len(),
            ingredients: self.ledger().len(),
            low_stock: self.low_stock_alerts().len(),
            active_orders: active,
            completed_orders: completed,
        }
    }

    /// Revenue from orders paid on `date` (UTC).
    pub fn sales_on(&self, date: NaiveDate) -> Money {
        self.orders()
            .filter(|o| o.paid_at().is_some_and(|t| t.date_naive() == date))
            .map(|o| o.total())
            .sum()
    }

    /// Best sellers across paid orders, most units first, ties by name.
    pub fn popular_items(&self, limit: usize) -> Vec<PopularItem> {
        let mut counts: BTreeMap<&str, u64> = BTreeMap::new();
        for order in self.orders().filter(|o| o.status().is_terminal()) {
            for line in order.lines() {
                *counts.entry(line.item.name.as_str()).or_default() += u64::from(line.quantity);
            }
        }

        let mut ranked: Vec<PopularItem> = counts
            .into_iter()
            .map(|(name, quantity)| PopularItem {
                name: name.to_string(),
                quantity,
            })
            .collect();
        ranked.sort_by(|a, b| b.quantity.cmp(&a.quantity).then_with(|| a.name.cmp(&b.name)));
        ranked.truncate(limit);
        ranked
    }
}
