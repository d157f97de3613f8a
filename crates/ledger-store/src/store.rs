use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::movement::Movement;
use crate::query::{ItemQuery, LevelQuery, MovementQuery, ReservationQuery};
use crate::record::{
    InventoryItem, InventoryLevel, InventoryLocation, ItemUpdate, LevelUpdate, LocationUpdate,
    ReservationItem, StockMovement,
};
use crate::{ItemId, LedgerStoreError, LocationId, ReservationId, Result, VariantId};

/// How an active reservation is resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Resolution {
    /// Abandon the hold and return its quantity to available stock.
    Release,
    /// Convert the hold into a permanent reduction of stocked quantity.
    Confirm,
}

impl Resolution {
    /// The level transition this resolution performs.
    pub fn movement(&self, quantity: i64) -> Movement {
        match self {
            Resolution::Release => Movement::Released(quantity),
            Resolution::Confirm => Movement::Out(quantity),
        }
    }
}

/// Outcome of [`LedgerStore::apply_movement`].
#[derive(Debug, Clone, PartialEq)]
pub struct AppliedMovement {
    /// The level as written.
    pub level: InventoryLevel,
    /// The log entry appended for the transition.
    pub entry: StockMovement,
    /// Whether the unit created the level because it was missing.
    pub created_level: bool,
}

/// Core trait for ledger store implementations.
///
/// Every method that reads level quantities to decide on a write
/// (`update_level`, `apply_movement`, `create_reservation`,
/// `resolve_reservation`) runs as one atomic unit holding the level's
/// lock, and appends the matching [`StockMovement`] in the same unit.
/// All implementations must be thread-safe (Send + Sync).
#[async_trait]
pub trait LedgerStore: Send + Sync {
    /// Inserts a new item. Fails with `Conflict` when another item is
    /// already linked to the same variant.
    async fn insert_item(&self, item: InventoryItem) -> Result<InventoryItem>;

    async fn get_item(&self, id: ItemId) -> Result<Option<InventoryItem>>;

    async fn find_item_by_variant(&self, variant_id: &VariantId) -> Result<Option<InventoryItem>>;

    /// Lists items ordered by creation time.
    async fn list_items(&self, query: ItemQuery) -> Result<Vec<InventoryItem>>;

    /// Counts items matching the query, ignoring pagination.
    async fn count_items(&self, query: ItemQuery) -> Result<usize>;

    async fn update_item(&self, id: ItemId, update: ItemUpdate) -> Result<InventoryItem>;

    /// Deletes an item together with its levels. Fails with `Conflict`
    /// while the item has active reservations.
    async fn delete_item(&self, id: ItemId) -> Result<()>;

    /// Inserts a new location. Fails with `Conflict` on a duplicate code.
    async fn insert_location(&self, location: InventoryLocation) -> Result<InventoryLocation>;

    async fn get_location(&self, id: LocationId) -> Result<Option<InventoryLocation>>;

    async fn find_location_by_code(&self, code: &str) -> Result<Option<InventoryLocation>>;

    async fn list_locations(&self) -> Result<Vec<InventoryLocation>>;

    async fn update_location(
        &self,
        id: LocationId,
        update: LocationUpdate,
    ) -> Result<InventoryLocation>;

    /// Inserts a level for a pair that has none yet. Fails with `Conflict`
    /// when the pair already has a level. Initial stock is logged as `In`.
    async fn insert_level(&self, level: InventoryLevel) -> Result<InventoryLevel>;

    async fn get_level(
        &self,
        item_id: ItemId,
        location_id: LocationId,
    ) -> Result<Option<InventoryLevel>>;

    async fn list_levels(&self, query: LevelQuery) -> Result<Vec<InventoryLevel>>;

    /// Atomically merges a partial quantity update into the level.
    async fn update_level(
        &self,
        item_id: ItemId,
        location_id: LocationId,
        update: LevelUpdate,
    ) -> Result<InventoryLevel>;

    /// Atomically applies a movement to the level and returns the written
    /// level with its log entry.
    ///
    /// When the level is missing and `create_missing` is set, an empty
    /// level is created first; otherwise `NotFound` is returned.
    async fn apply_movement(
        &self,
        item_id: ItemId,
        location_id: LocationId,
        movement: Movement,
        create_missing: bool,
    ) -> Result<AppliedMovement>;

    /// Deletes a level. Fails with `Conflict` while it holds reserved units.
    async fn delete_level(&self, item_id: ItemId, location_id: LocationId) -> Result<()>;

    /// Atomically checks availability, inserts the reservation and
    /// increments the level's reserved quantity.
    async fn create_reservation(
        &self,
        reservation: ReservationItem,
    ) -> Result<(ReservationItem, InventoryLevel)>;

    /// Atomically deletes the reservation and applies its resolution to
    /// the level. Returns the deleted reservation and the updated level.
    async fn resolve_reservation(
        &self,
        id: ReservationId,
        resolution: Resolution,
    ) -> Result<(ReservationItem, InventoryLevel)>;

    async fn get_reservation(&self, id: ReservationId) -> Result<Option<ReservationItem>>;

    /// Lists active reservations ordered by creation time.
    async fn list_reservations(&self, query: ReservationQuery) -> Result<Vec<ReservationItem>>;

    /// Reads the movement log in the order entries were written.
    async fn list_movements(&self, query: MovementQuery) -> Result<Vec<StockMovement>>;
}

/// Extension trait providing convenience methods for ledger stores.
#[async_trait]
pub trait LedgerStoreExt: LedgerStore {
    /// Loads an item, failing with `NotFound` when it does not exist.
    async fn require_item(&self, id: ItemId) -> Result<InventoryItem> {
        self.get_item(id)
            .await?
            .ok_or_else(|| LedgerStoreError::not_found("inventory item", id))
    }

    /// Loads a location, failing with `NotFound` when it does not exist.
    async fn require_location(&self, id: LocationId) -> Result<InventoryLocation> {
        self.get_location(id)
            .await?
            .ok_or_else(|| LedgerStoreError::not_found("inventory location", id))
    }

    /// Loads a level, failing with `NotFound` when the pair has none.
    async fn require_level(
        &self,
        item_id: ItemId,
        location_id: LocationId,
    ) -> Result<InventoryLevel> {
        self.get_level(item_id, location_id)
            .await?
            .ok_or_else(|| level_not_found(item_id, location_id))
    }

    /// Loads a reservation, failing with `NotFound` when it does not exist.
    async fn require_reservation(&self, id: ReservationId) -> Result<ReservationItem> {
        self.get_reservation(id)
            .await?
            .ok_or_else(|| LedgerStoreError::not_found("reservation", id))
    }
}

// Blanket implementation for all LedgerStore implementations
impl<T: LedgerStore + ?Sized> LedgerStoreExt for T {}

pub(crate) fn level_not_found(item_id: ItemId, location_id: LocationId) -> LedgerStoreError {
    LedgerStoreError::not_found("inventory level", format!("{item_id}@{location_id}"))
}
