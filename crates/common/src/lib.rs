//! Shared identifier types for the restaurant workspace.

pub mod types;

pub use types::{MenuItemId, OrderId};
