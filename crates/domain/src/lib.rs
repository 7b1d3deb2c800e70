//! Order, inventory and menu consistency engine for a restaurant.
//!
//! This crate provides:
//! - `Ledger`: ingredient stock with reorder thresholds
//! - `Catalog`: menu items with recipes and cached availability
//! - `Order`: line items, totals and the pending → preparing → served → paid state machine
//! - `Restaurant`: the aggregate root performing cross-entity transitions
//! - `RestaurantService`: serialized access plus snapshot persistence

pub mod catalog;
pub mod error;
pub mod ledger;
pub mod money;
pub mod order;
pub mod reports;
pub mod restaurant;
pub mod service;

pub use catalog::{Catalog, CatalogError, MenuItem, MenuItemSnapshot, MenuItemUpdate, NewMenuItem, Recipe};
pub use error::DomainError;
pub use ledger::{IngredientStock, Ledger, LedgerError};
pub use money::Money;
pub use order::{Order, OrderError, OrderLine, OrderStatus};
pub use reports::{PopularItem, Summary};
pub use restaurant::{Restaurant, RestaurantError};
pub use service::RestaurantService;
