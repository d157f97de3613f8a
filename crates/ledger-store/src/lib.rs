//! Durable storage for the inventory ledger.
//!
//! The store owns every persisted record: items, locations, per-location
//! quantity levels, active reservations and the append-only movement log.
//! Quantity transitions go through [`InventoryLevel::apply`], so both
//! backends enforce the same invariant:
//! `available = stocked - reserved` with `0 <= reserved <= stocked`.

pub mod error;
pub mod memory;
pub mod movement;
pub mod postgres;
pub mod query;
pub mod record;
pub mod store;

pub use common::{ItemId, LevelId, LineItemId, LocationId, MovementId, OrderId, ReservationId, VariantId};
pub use error::{LedgerStoreError, Result};
pub use memory::InMemoryLedgerStore;
pub use movement::{Movement, MovementKind};
pub use postgres::PostgresLedgerStore;
pub use query::{ItemQuery, LevelQuery, MovementQuery, ReservationQuery};
pub use record::{
    InventoryItem, InventoryLevel, InventoryLocation, ItemUpdate, LevelUpdate, LocationUpdate,
    ReservationItem, StockMovement,
};
pub use store::{AppliedMovement, LedgerStore, LedgerStoreExt, Resolution};
