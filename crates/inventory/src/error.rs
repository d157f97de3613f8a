//! Inventory service error types.

use ledger_store::{ItemId, LedgerStoreError, LocationId};
use thiserror::Error;

/// Errors returned by inventory operations.
#[derive(Debug, Error)]
pub enum InventoryError {
    /// The referenced record does not exist.
    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },

    /// A reservation asked for more than the level has available.
    #[error(
        "Insufficient inventory for item {item_id} at location {location_id}: available {available}, requested {requested}"
    )]
    InsufficientInventory {
        item_id: ItemId,
        location_id: LocationId,
        available: i64,
        requested: i64,
    },

    /// The input is malformed or would break a quantity invariant.
    #[error("Validation error: {0}")]
    Validation(String),

    /// A uniqueness rule or active reservation blocks the operation.
    #[error("Conflict: {0}")]
    Conflict(String),

    /// The ledger store failed.
    #[error("Store error: {0}")]
    Store(LedgerStoreError),
}

impl InventoryError {
    pub(crate) fn not_found(entity: &'static str, id: impl ToString) -> Self {
        InventoryError::NotFound {
            entity,
            id: id.to_string(),
        }
    }

    /// Returns true for errors caused by the caller rather than the system.
    pub fn is_client_error(&self) -> bool {
        !matches!(self, InventoryError::Store(_))
    }
}

impl From<LedgerStoreError> for InventoryError {
    fn from(e: LedgerStoreError) -> Self {
        match e {
            LedgerStoreError::NotFound { entity, id } => InventoryError::NotFound { entity, id },
            LedgerStoreError::InsufficientInventory {
                item_id,
                location_id,
                available,
                requested,
            } => InventoryError::InsufficientInventory {
                item_id,
                location_id,
                available,
                requested,
            },
            LedgerStoreError::InvariantViolation(msg) => InventoryError::Validation(msg),
            LedgerStoreError::Conflict(msg) => InventoryError::Conflict(msg),
            other => InventoryError::Store(other),
        }
    }
}

/// Result type for inventory operations.
pub type Result<T> = std::result::Result<T, InventoryError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn store_errors_map_to_service_taxonomy() {
        let err: InventoryError = LedgerStoreError::InvariantViolation("bad".into()).into();
        assert!(matches!(err, InventoryError::Validation(_)));

        let err: InventoryError = LedgerStoreError::Conflict("dup".into()).into();
        assert!(matches!(err, InventoryError::Conflict(_)));

        let err: InventoryError = LedgerStoreError::InvalidRecord("garbled".into()).into();
        assert!(matches!(err, InventoryError::Store(_)));
        assert!(!err.is_client_error());
    }

    #[test]
    fn insufficient_message_names_both_quantities() {
        let err = InventoryError::InsufficientInventory {
            item_id: ItemId::new(),
            location_id: LocationId::new(),
            available: 0,
            requested: 1,
        };
        let message = err.to_string();
        assert!(message.contains("available 0"));
        assert!(message.contains("requested 1"));
    }
}
