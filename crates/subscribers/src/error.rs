//! Subscriber error types.

use inventory::InventoryError;
use saga::SagaError;
use thiserror::Error;

/// Errors that abort handling of a whole event.
///
/// Failures of individual order lines are recorded in the
/// [`HandlerReport`](crate::HandlerReport) instead.
#[derive(Debug, Error)]
pub enum SubscriberError {
    #[error("Inventory error: {0}")]
    Inventory(#[from] InventoryError),

    #[error("Saga error: {0}")]
    Saga(#[from] SagaError),

    /// The event payload did not match any known lifecycle event.
    #[error("Event deserialization error: {0}")]
    Deserialization(#[from] serde_json::Error),
}

/// Result type for subscriber operations.
pub type Result<T> = std::result::Result<T, SubscriberError>;
