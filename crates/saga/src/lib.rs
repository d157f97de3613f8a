//! Undoable inventory workflows.
//!
//! An [`InventoryTransaction`] wraps inventory service calls that must be
//! reversible if a later step of a larger business transaction fails.
//! Every completed step registers a compensation in the transaction's
//! journal; on failure the compensations run in reverse order.
//!
//! The reservation saga runs two steps:
//! 1. Confirm inventory (read-only)
//! 2. Create reservation (compensated by releasing it)

pub mod aggregate;
pub mod error;
pub mod events;
pub mod reservation;
pub mod state;
pub mod transaction;

pub use aggregate::{CompletedStep, SagaInstance};
pub use error::{Result, SagaError};
pub use events::{Compensation, SagaEvent};
pub use reservation::reserve_inventory;
pub use state::SagaState;
pub use transaction::{BulkAdjustment, InventoryTransaction};
