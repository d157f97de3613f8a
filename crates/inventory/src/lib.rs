//! Inventory service for the ledger.
//!
//! This crate provides the operations callers use to manage stock:
//! - Item and location CRUD
//! - Level creation, partial updates and signed adjustments
//! - Reservations: create, release (delete) and confirm
//! - Idempotent catalog variant sync
//!
//! All writes go through [`ledger_store::LedgerStore`]; the service never
//! mutates a level outside a store transaction.

pub mod error;
pub mod input;
pub mod service;
pub mod summary;

pub use error::{InventoryError, Result};
pub use input::{
    AdjustInventory, CreateInventoryItem, CreateInventoryLevel, CreateLocation, CreateReservation,
    UpdateInventoryLevel,
};
pub use service::{DEFAULT_LOCATION_CODE, InventoryService};
pub use summary::{InventoryItemSummary, ResolvedReservation};
