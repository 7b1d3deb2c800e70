//! Order status state machine.

use serde::{Deserialize, Serialize};

/// The status of an order in its lifecycle.
///
/// State transitions:
/// ```text
/// Pending ──► Preparing ──► Served ──► Paid
/// ```
/// Each state has exactly one forward transition; `Paid` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    /// Lines can be added and removed; nothing has been consumed yet.
    #[default]
    Pending,

    /// Ingredients have been consumed and the kitchen is working on it.
    Preparing,

    /// Food is on the table, awaiting payment.
    Served,

    /// Settled (terminal state).
    Paid,
}

impl OrderStatus {
    /// Returns the state reached by the single forward transition, if any.
    pub fn next(&self) -> Option<OrderStatus> {
        match self {
            OrderStatus::Pending => Some(OrderStatus::Preparing),
            OrderStatus::Preparing => Some(OrderStatus::Served),
            OrderStatus::Served => Some(OrderStatus::Paid),
            OrderStatus::Paid => None,
        }
    }

    /// Returns true if lines can be modified in this state.
    pub fn can_modify_lines(&self) -> bool {
        matches!(self, OrderStatus::Pending)
    }

    /// Returns true if this is a terminal state.
    pub fn is_terminal(&self) -> bool {
        matches!(self, OrderStatus::Paid)
    }

    /// Returns true for orders still being handled by the floor.
    pub fn is_active(&self) -> bool {
        !self.is_terminal()
    }

    /// Name of the transition that enters this state.
    pub fn entering_action(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "reopen",
            OrderStatus::Preparing => "start preparing",
            OrderStatus::Served => "mark served",
            OrderStatus::Paid => "complete",
        }
    }

    /// Returns the state name as a string.
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "pending",
            OrderStatus::Preparing => "preparing",
            OrderStatus::Served => "served",
            OrderStatus::Paid => "paid",
        }
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
