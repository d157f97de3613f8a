use thiserror::Error;

use crate::{ItemId, LocationId};

/// Errors that can occur when interacting with the ledger store.
#[derive(Debug, Error)]
pub enum LedgerStoreError {
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

    /// A write would break the level invariant or a quantity rule.
    #[error("Invariant violation: {0}")]
    InvariantViolation(String),

    /// A uniqueness or reference constraint rejected the write.
    #[error("Conflict: {0}")]
    Conflict(String),

    /// A stored row could not be decoded into a record.
    #[error("Invalid record: {0}")]
    InvalidRecord(String),

    /// A database error occurred.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// A database migration error occurred.
    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    /// A serialization/deserialization error occurred.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl LedgerStoreError {
    pub(crate) fn not_found(entity: &'static str, id: impl ToString) -> Self {
        LedgerStoreError::NotFound {
            entity,
            id: id.to_string(),
        }
    }
}

/// Result type for ledger store operations.
pub type Result<T> = std::result::Result<T, LedgerStoreError>;
