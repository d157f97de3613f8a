//! Identifier types shared by every layer of the inventory ledger.

pub mod types;

pub use types::{
    ItemId, LevelId, LineItemId, LocationId, MovementId, OrderId, ReservationId, SagaId, VariantId,
};
