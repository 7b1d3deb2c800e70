//! Order aggregate and related types.

mod aggregate;
mod line;
mod state;

pub use aggregate::Order;
pub use line::OrderLine;
pub use state::OrderStatus;

use thiserror::Error;

/// Errors that can occur during order operations.
///
/// A failing operation leaves the order unmodified.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum OrderError {
    /// The order's status does not allow the requested action.
    #[error("Invalid state transition: cannot {action} from {current_state} state")]
    InvalidTransition {
        current_state: OrderStatus,
        action: &'static str,
    },

    /// Line quantities must be positive.
    #[error("Invalid quantity: {quantity} (must be greater than 0)")]
    InvalidQuantity { quantity: u32 },

    /// The merged quantity or the order total no longer fits.
    #[error("Quantity {quantity} would overflow the order")]
    QuantityOverflow { quantity: u32 },

    /// Table numbers start at 1.
    #[error("Invalid table number: {table} (must be at least 1)")]
    InvalidTable { table: u32 },
}
