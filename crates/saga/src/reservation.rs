//! Reservation saga.

use std::sync::Arc;

use inventory::{CreateReservation, InventoryService};
use ledger_store::{LedgerStore, ReservationItem};

use crate::error::Result;
use crate::transaction::InventoryTransaction;

/// The saga type identifier for reservation creation.
pub const SAGA_TYPE: &str = "reserve_inventory";

/// Step name: read-only availability check.
pub const STEP_CONFIRM_INVENTORY: &str = "confirm_inventory";

/// Step name: place the hold.
pub const STEP_CREATE_RESERVATION: &str = "create_reservation";

/// Runs the reservation saga and completes it immediately.
pub async fn reserve_inventory<S: LedgerStore>(
    service: Arc<InventoryService<S>>,
    input: CreateReservation,
) -> Result<ReservationItem> {
    let mut transaction = InventoryTransaction::new(service, SAGA_TYPE);
    let reservation = transaction.reserve(input).await?;
    transaction.complete()?;
    Ok(reservation)
}
