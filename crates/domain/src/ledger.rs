//! Ingredient ledger: named inventory quantities with reorder thresholds.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Absolute slack when comparing quantities, absorbing `f64` rounding such
/// as `0.3 - 0.1 - 0.1 - 0.1`.
pub const QUANTITY_TOLERANCE: f64 = 1e-9;

/// Errors raised by the ingredient ledger.
///
/// Every failing ledger operation leaves the ledger unmodified.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum LedgerError {
    /// An ingredient with this name is already registered.
    #[error("Ingredient already registered: {0}")]
    DuplicateIngredient(String),

    /// No ingredient with this name is registered.
    #[error("Unknown ingredient: {0}")]
    UnknownIngredient(String),

    /// Consumption would drive the quantity below zero.
    #[error("Insufficient stock of {name}: requested {requested}, available {available}")]
    InsufficientStock {
        name: String,
        requested: f64,
        available: f64,
    },

    /// A quantity, reorder level or delta was negative or not finite.
    #[error("Invalid amount: {0}")]
    InvalidAmount(f64),

    /// Ingredient names must not be blank.
    #[error("Ingredient name is required")]
    EmptyName,
}

/// Inventory record for one raw ingredient.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IngredientStock {
    pub name: String,
    pub quantity: f64,
    pub unit: String,
    pub reorder_level: f64,
}

impl IngredientStock {
    /// True when the quantity is at or below the reorder level.
    pub fn needs_reorder(&self) -> bool {
        self.quantity <= self.reorder_level
    }

    /// Amount that brings the stock back to twice the reorder level.
    pub fn suggested_restock(&self) -> f64 {
        (self.reorder_level * 2.0 - self.quantity).max(0.0)
    }
}

fn check_amount(value: f64) -> Result<f64, LedgerError> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(LedgerError::InvalidAmount(value))
    }
}

fn check_non_negative(value: f64) -> Result<f64, LedgerError> {
    match check_amount(value)? {
        v if v < 0.0 => Err(LedgerError::InvalidAmount(v)),
        v => Ok(v),
    }
}

/// The restaurant's ingredient inventory, keyed by ingredient name.
///
/// Iteration is in name order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Ledger {
    stock: BTreeMap<String, IngredientStock>,
}

impl Ledger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a new ingredient.
    pub fn register(
        &mut self,
        name: impl Into<String>,
        quantity: f64,
        unit: impl Into<String>,
        reorder_level: f64,
    ) -> Result<&IngredientStock, LedgerError> {
        let name = name.into().trim().to_string();
        if name.is_empty() {
            return Err(LedgerError::EmptyName);
        }
        if self.stock.contains_key(&name) {
            return Err(LedgerError::DuplicateIngredient(name));
        }
        let quantity = check_non_negative(quantity)?;
        let reorder_level = check_non_negative(reorder_level)?;

        let entry = self.stock.entry(name.clone()).or_insert(IngredientStock {
            name,
            quantity,
            unit: unit.into(),
            reorder_level,
        });
        Ok(entry)
    }

    /// Applies a restock (positive) or consumption (negative) delta.
    ///
    /// Returns the new quantity. Rejects, rather than clamps, any delta that
    /// would take the quantity below zero; a result within
    /// [`QUANTITY_TOLERANCE`] of zero is stored as zero.
    pub fn adjust(&mut self, name: &str, delta: f64) -> Result<f64, LedgerError> {
        let delta = check_amount(delta)?;
        let stock = self
            .stock
            .get_mut(name)
            .ok_or_else(|| LedgerError::UnknownIngredient(name.to_string()))?;

        let updated = stock.quantity + delta;
        if updated < -QUANTITY_TOLERANCE {
            return Err(LedgerError::InsufficientStock {
                name: name.to_string(),
                requested: -delta,
                available: stock.quantity,
            });
        }

        stock.quantity = updated.max(0.0);
        Ok(stock.quantity)
    }

    /// True iff the ingredient's quantity is at or below its reorder level.
    pub fn needs_reorder(&self, name: &str) -> Result<bool, LedgerError> {
        self.get(name)
            .map(IngredientStock::needs_reorder)
            .ok_or_else(|| LedgerError::UnknownIngredient(name.to_string()))
    }

    /// All ingredients currently needing reorder, in name order.
    pub fn list_low_stock(&self) -> Vec<&IngredientStock> {
        self.stock.values().filter(|s| s.needs_reorder()).collect()
    }

    /// True iff the ingredient exists and holds at least `required`, up to
    /// [`QUANTITY_TOLERANCE`].
    pub fn can_supply(&self, name: &str, required: f64) -> bool {
        self.quantity(name)
            .is_some_and(|q| q + QUANTITY_TOLERANCE >= required)
    }

    pub fn get(&self, name: &str) -> Option<&IngredientStock> {
        self.stock.get(name)
    }

    pub fn quantity(&self, name: &str) -> Option<f64> {
        self.stock.get(name).map(|s| s.quantity)
    }

    pub fn iter(&self) -> impl Iterator<Item = &IngredientStock> {
        self.stock.values()
    }

    pub fn len(&self) -> usize {
        self.stock.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stock.is_empty()
    }
}
