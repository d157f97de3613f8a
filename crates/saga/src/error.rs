//! Saga error types.

use inventory::InventoryError;
use thiserror::Error;

use crate::state::SagaState;

/// Errors that can occur during saga operations.
#[derive(Debug, Error)]
pub enum SagaError {
    /// A step's inventory operation failed. Nothing was applied by it.
    #[error("Inventory error: {0}")]
    Inventory(#[from] InventoryError),

    /// The transaction is in an invalid state for the requested operation.
    #[error("Invalid saga state: expected {expected}, actual {actual}")]
    InvalidState { expected: String, actual: SagaState },

    /// A step failed for a reason outside the inventory service.
    #[error("Saga step '{step}' failed: {reason}")]
    StepFailed { step: String, reason: String },

    /// A compensation failed. Automated recovery stopped and `pending`
    /// names the compensations that never ran.
    #[error("Compensation step '{step}' failed: {reason} (pending: {pending:?})")]
    CompensationFailed {
        step: String,
        reason: String,
        pending: Vec<String>,
    },
}

impl SagaError {
    /// Returns true when the ledger may be left partially compensated.
    pub fn is_fatal(&self) -> bool {
        matches!(self, SagaError::CompensationFailed { .. })
    }
}

/// Convenience type alias for saga results.
pub type Result<T> = std::result::Result<T, SagaError>;
