//! Menu catalog with cached per-item availability.

use std::collections::BTreeMap;

use common::MenuItemId;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::ledger::Ledger;
use crate::money::Money;

/// Errors raised by the menu catalog.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CatalogError {
    /// No menu item with this id exists.
    #[error("Unknown menu item: {0}")]
    UnknownMenuItem(MenuItemId),

    /// Prices must not be negative.
    #[error("Invalid price: {0} (must not be negative)")]
    InvalidPrice(Money),

    /// Recipe quantities must be finite and greater than zero.
    #[error("Invalid recipe quantity for {ingredient}: {quantity}")]
    InvalidRecipeQuantity { ingredient: String, quantity: f64 },

    /// Menu item names must not be blank.
    #[error("Menu item name is required")]
    EmptyName,
}

/// Ingredient name → quantity consumed per unit sold.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Recipe(BTreeMap<String, f64>);

impl Recipe {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insertion, replacing any previous quantity.
    pub fn with(mut self, ingredient: impl Into<String>, quantity: f64) -> Self {
        self.0.insert(ingredient.into(), quantity);
        self
    }

    pub fn get(&self, ingredient: &str) -> Option<f64> {
        self.0.get(ingredient).copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.0.iter().map(|(name, qty)| (name.as_str(), *qty))
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// True iff every ingredient exists in the ledger in sufficient quantity.
    pub fn can_be_made_from(&self, ledger: &Ledger) -> bool {
        self.iter().all(|(name, qty)| ledger.can_supply(name, qty))
    }

    fn validate(&self) -> Result<(), CatalogError> {
        match self.iter().find(|(_, qty)| !qty.is_finite() || *qty <= 0.0) {
            Some((name, quantity)) => Err(CatalogError::InvalidRecipeQuantity {
                ingredient: name.to_string(),
                quantity,
            }),
            None => Ok(()),
        }
    }
}

impl<S: Into<String>> FromIterator<(S, f64)> for Recipe {
    fn from_iter<I: IntoIterator<Item = (S, f64)>>(iter: I) -> Self {
        Self(iter.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }
}

/// A dish on the menu.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MenuItem {
    pub id: MenuItemId,
    pub name: String,
    pub price: Money,
    pub category: String,
    pub recipe: Recipe,
    /// Cached result of the last availability recomputation.
    pub available: bool,
}

impl MenuItem {
    /// Recomputes and caches availability against the ledger.
    pub fn check_availability(&mut self, ledger: &Ledger) -> bool {
        self.available = self.recipe.can_be_made_from(ledger);
        self.available
    }

    /// Value copy of the priced item, as captured by order lines.
    pub fn snapshot(&self) -> MenuItemSnapshot {
        MenuItemSnapshot {
            id: self.id,
            name: self.name.clone(),
            price: self.price,
            recipe: self.recipe.clone(),
        }
    }
}

/// Immutable copy of a menu item at the moment it was added to an order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MenuItemSnapshot {
    pub id: MenuItemId,
    pub name: String,
    pub price: Money,
    pub recipe: Recipe,
}

/// Parameters for registering a menu item.
#[derive(Debug, Clone)]
pub struct NewMenuItem {
    pub name: String,
    pub price: Money,
    pub category: String,
    pub recipe: Recipe,
}

impl NewMenuItem {
    pub fn new(
        name: impl Into<String>,
        price: Money,
        category: impl Into<String>,
        recipe: Recipe,
    ) -> Self {
        Self {
            name: name.into(),
            price,
            category: category.into(),
            recipe,
        }
    }
}

/// Partial update of a menu item; `None` fields are left untouched.
#[derive(Debug, Clone, Default)]
pub struct MenuItemUpdate {
    pub name: Option<String>,
    pub price: Option<Money>,
    pub category: Option<String>,
    pub recipe: Option<Recipe>,
}

impl MenuItemUpdate {
    pub fn price(price: Money) -> Self {
        Self {
            price: Some(price),
            ..Self::default()
        }
    }

    pub fn recipe(recipe: Recipe) -> Self {
        Self {
            recipe: Some(recipe),
            ..Self::default()
        }
    }
}

fn check_name(name: &str) -> Result<String, CatalogError> {
    let name = name.trim();
    if name.is_empty() {
        Err(CatalogError::EmptyName)
    } else {
        Ok(name.to_string())
    }
}

fn check_price(price: Money) -> Result<Money, CatalogError> {
    if price.is_negative() {
        Err(CatalogError::InvalidPrice(price))
    } else {
        Ok(price)
    }
}

/// The set of menu items, kept in registration order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Catalog {
    items: Vec<MenuItem>,
}

impl Catalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a menu item. Its availability starts false until the next
    /// recomputation.
    ///
    /// Recipe ingredients need not exist in the ledger yet; such an item is
    /// simply never available.
    pub fn add_item(&mut self, item: NewMenuItem) -> Result<MenuItemId, CatalogError> {
        let name = check_name(&item.name)?;
        let price = check_price(item.price)?;
        item.recipe.validate()?;

        let id = MenuItemId::new();
        self.items.push(MenuItem {
            id,
            name,
            price,
            category: item.category,
            recipe: item.recipe,
            available: false,
        });
        Ok(id)
    }

    /// Applies a partial update. All fields are validated before any is applied.
    pub fn update_item(&mut self, id: MenuItemId, update: MenuItemUpdate) -> Result<(), CatalogError> {
        let index = self.position(id)?;

        let name = update.name.as_deref().map(check_name).transpose()?;
        let price = update.price.map(check_price).transpose()?;
        if let Some(recipe) = &update.recipe {
            recipe.validate()?;
        }

        let item = &mut self.items[index];
        if let Some(name) = name {
            item.name = name;
        }
        if let Some(price) = price {
            item.price = price;
        }
        if let Some(category) = update.category {
            item.category = category;
        }
        if let Some(recipe) = update.recipe {
            item.recipe = recipe;
        }
        Ok(())
    }

    /// Removes a menu item, returning it.
    pub fn remove_item(&mut self, id: MenuItemId) -> Result<MenuItem, CatalogError> {
        let index = self.position(id)?;
        Ok(self.items.remove(index))
    }

    /// Recomputes the cached `available` flag of every item.
    ///
    /// This is the only way availability changes.
    pub fn recompute_availability(&mut self, ledger: &Ledger) {
        for item in &mut self.items {
            item.check_availability(ledger);
        }
    }

    /// Items grouped by category, categories in first-seen order.
    pub fn items_by_category(&self) -> Vec<(&str, Vec<&MenuItem>)> {
        let mut groups: Vec<(&str, Vec<&MenuItem>)> = Vec::new();
        for item in &self.items {
            match groups.iter_mut().find(|(c, _)| *c == item.category) {
                Some((_, members)) => members.push(item),
                None => groups.push((item.category.as_str(), vec![item])),
            }
        }
        groups
    }

    pub fn get(&self, id: MenuItemId) -> Option<&MenuItem> {
        self.items.iter().find(|item| item.id == id)
    }

    /// Snapshot of an item for use in an order line.
    pub fn snapshot(&self, id: MenuItemId) -> Result<MenuItemSnapshot, CatalogError> {
        self.get(id)
            .map(MenuItem::snapshot)
            .ok_or(CatalogError::UnknownMenuItem(id))
    }

    pub fn iter(&self) -> impl Iterator<Item = &MenuItem> {
        self.items.iter()
    }

    pub fn available_items(&self) -> impl Iterator<Item = &MenuItem> {
        self.items.iter().filter(|item| item.available)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    fn position(&self, id: MenuItemId) -> Result<usize, CatalogError> {
        self.items
            .iter()
            .position(|item| item.id == id)
            .ok_or(CatalogError::UnknownMenuItem(id))
    }
}
