//! Allocation error types.

use thiserror::Error;

/// Result type alias for allocation operations.
pub type PoolResult<T> = Result<T, PoolError>;

/// The pool does not hold what the solver assumed it holds.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PoolError {
    #[error(
        "insufficient {resource}: requested {requested}, {unmet} left unmet (roles: {})",
        describe_roles(.available)
    )]
    Deficit {
        resource: String,
        requested: f64,
        unmet: f64,
        /// Every role examined, in allocation order, with what it held.
        available: Vec<(String, f64)>,
    },

    #[error("port {port} is not offered under any role")]
    PortNotOffered { port: u64 },
}

fn describe_roles(available: &[(String, f64)]) -> String {
    if available.is_empty() {
        return "none offered".to_string();
    }
    available
        .iter()
        .map(|(role, amount)| format!("{role}={amount}"))
        .collect::<Vec<_>>()
        .join(", ")
}
