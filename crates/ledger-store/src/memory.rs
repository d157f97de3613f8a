use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::movement::Movement;
use crate::query::{ItemQuery, LevelQuery, MovementQuery, ReservationQuery};
use crate::record::{
    InventoryItem, InventoryLevel, InventoryLocation, ItemUpdate, LevelUpdate, LocationUpdate,
    ReservationItem, StockMovement,
};
use crate::store::{AppliedMovement, LedgerStore, Resolution, level_not_found};
use crate::{ItemId, LedgerStoreError, LocationId, ReservationId, Result, VariantId};

#[derive(Default)]
struct LedgerTables {
    items: HashMap<ItemId, InventoryItem>,
    locations: HashMap<LocationId, InventoryLocation>,
    levels: HashMap<(ItemId, LocationId), InventoryLevel>,
    reservations: HashMap<ReservationId, ReservationItem>,
    movements: Vec<StockMovement>,
}

impl LedgerTables {
    fn variant_taken(&self, variant_id: &VariantId, except: Option<ItemId>) -> bool {
        self.items
            .values()
            .any(|i| i.variant_id.as_ref() == Some(variant_id) && Some(i.id) != except)
    }

    fn item_has_level_at(&self, item_id: ItemId, location_id: LocationId) -> bool {
        self.levels.contains_key(&(item_id, location_id))
    }

    fn filtered_items(&self, query: &ItemQuery) -> Vec<InventoryItem> {
        let mut items: Vec<_> = self
            .items
            .values()
            .filter(|item| query.matches(item))
            .filter(|item| match query.location_id {
                Some(location_id) => self.item_has_level_at(item.id, location_id),
                None => true,
            })
            .cloned()
            .collect();
        items.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
        items
    }

    /// Writes a transitioned level and its movement entry together.
    fn commit_level(&mut self, level: InventoryLevel, movement: StockMovement) {
        self.levels
            .insert((level.inventory_item_id, level.location_id), level);
        self.movements.push(movement);
    }
}

/// In-memory ledger store implementation for testing and single-process
/// deployments.
///
/// A single write guard covers every read-decide-write unit, which is at
/// least as strict as locking the affected level row.
#[derive(Clone, Default)]
pub struct InMemoryLedgerStore {
    tables: Arc<RwLock<LedgerTables>>,
}

impl InMemoryLedgerStore {
    /// Creates a new empty in-memory store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of entries in the movement log.
    pub async fn movement_count(&self) -> usize {
        self.tables.read().await.movements.len()
    }

    /// Returns the number of active reservations.
    pub async fn reservation_count(&self) -> usize {
        self.tables.read().await.reservations.len()
    }

    /// Clears every table.
    pub async fn clear(&self) {
        *self.tables.write().await = LedgerTables::default();
    }
}

#[async_trait]
impl LedgerStore for InMemoryLedgerStore {
    async fn insert_item(&self, item: InventoryItem) -> Result<InventoryItem> {
        let mut tables = self.tables.write().await;

        if tables.items.contains_key(&item.id) {
            return Err(LedgerStoreError::Conflict(format!(
                "inventory item {} already exists",
                item.id
            )));
        }
        if let Some(ref variant_id) = item.variant_id
            && tables.variant_taken(variant_id, None)
        {
            return Err(LedgerStoreError::Conflict(format!(
                "variant {variant_id} is already linked to an inventory item"
            )));
        }

        tables.items.insert(item.id, item.clone());
        Ok(item)
    }

    async fn get_item(&self, id: ItemId) -> Result<Option<InventoryItem>> {
        Ok(self.tables.read().await.items.get(&id).cloned())
    }

    async fn find_item_by_variant(&self, variant_id: &VariantId) -> Result<Option<InventoryItem>> {
        let tables = self.tables.read().await;
        Ok(tables
            .items
            .values()
            .find(|i| i.variant_id.as_ref() == Some(variant_id))
            .cloned())
    }

    async fn list_items(&self, query: ItemQuery) -> Result<Vec<InventoryItem>> {
        let tables = self.tables.read().await;
        let items = tables.filtered_items(&query);

        let offset = query.offset.unwrap_or(0);
        let items = items.into_iter().skip(offset);
        let items = match query.limit {
            Some(limit) => items.take(limit).collect(),
            None => items.collect(),
        };
        Ok(items)
    }

    async fn count_items(&self, query: ItemQuery) -> Result<usize> {
        let tables = self.tables.read().await;
        Ok(tables.filtered_items(&query.unpaginated()).len())
    }

    async fn update_item(&self, id: ItemId, update: ItemUpdate) -> Result<InventoryItem> {
        let mut tables = self.tables.write().await;

        if let Some(Some(ref variant_id)) = update.variant_id
            && tables.variant_taken(variant_id, Some(id))
        {
            return Err(LedgerStoreError::Conflict(format!(
                "variant {variant_id} is already linked to an inventory item"
            )));
        }

        let current = tables
            .items
            .get(&id)
            .cloned()
            .ok_or_else(|| LedgerStoreError::not_found("inventory item", id))?;
        let updated = current.merged(update);
        tables.items.insert(id, updated.clone());
        Ok(updated)
    }

    async fn delete_item(&self, id: ItemId) -> Result<()> {
        let mut tables = self.tables.write().await;

        if !tables.items.contains_key(&id) {
            return Err(LedgerStoreError::not_found("inventory item", id));
        }
        if tables
            .reservations
            .values()
            .any(|r| r.inventory_item_id == id)
        {
            return Err(LedgerStoreError::Conflict(format!(
                "inventory item {id} has active reservations"
            )));
        }

        tables.levels.retain(|(item_id, _), _| *item_id != id);
        tables.items.remove(&id);
        Ok(())
    }

    async fn insert_location(&self, location: InventoryLocation) -> Result<InventoryLocation> {
        let mut tables = self.tables.write().await;

        if tables.locations.values().any(|l| l.code == location.code) {
            return Err(LedgerStoreError::Conflict(format!(
                "location code '{}' is already in use",
                location.code
            )));
        }

        tables.locations.insert(location.id, location.clone());
        Ok(location)
    }

    async fn get_location(&self, id: LocationId) -> Result<Option<InventoryLocation>> {
        Ok(self.tables.read().await.locations.get(&id).cloned())
    }

    async fn find_location_by_code(&self, code: &str) -> Result<Option<InventoryLocation>> {
        let tables = self.tables.read().await;
        Ok(tables.locations.values().find(|l| l.code == code).cloned())
    }

    async fn list_locations(&self) -> Result<Vec<InventoryLocation>> {
        let tables = self.tables.read().await;
        let mut locations: Vec<_> = tables.locations.values().cloned().collect();
        locations.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
        Ok(locations)
    }

    async fn update_location(
        &self,
        id: LocationId,
        update: LocationUpdate,
    ) -> Result<InventoryLocation> {
        let mut tables = self.tables.write().await;
        let current = tables
            .locations
            .get(&id)
            .cloned()
            .ok_or_else(|| LedgerStoreError::not_found("inventory location", id))?;
        let updated = current.merged(update);
        tables.locations.insert(id, updated.clone());
        Ok(updated)
    }

    async fn insert_level(&self, level: InventoryLevel) -> Result<InventoryLevel> {
        level.check_invariant()?;
        let mut tables = self.tables.write().await;

        if !tables.items.contains_key(&level.inventory_item_id) {
            return Err(LedgerStoreError::not_found(
                "inventory item",
                level.inventory_item_id,
            ));
        }
        if !tables.locations.contains_key(&level.location_id) {
            return Err(LedgerStoreError::not_found(
                "inventory location",
                level.location_id,
            ));
        }
        let key = (level.inventory_item_id, level.location_id);
        if tables.levels.contains_key(&key) {
            return Err(LedgerStoreError::Conflict(format!(
                "inventory level already exists for item {} at location {}",
                level.inventory_item_id, level.location_id
            )));
        }

        tables.levels.insert(key, level.clone());
        if level.stocked_quantity > 0 {
            let empty = InventoryLevel::empty(level.inventory_item_id, level.location_id);
            let entry =
                StockMovement::between(&empty, &level, Movement::In(level.stocked_quantity));
            tables.movements.push(entry);
        }
        Ok(level)
    }

    async fn get_level(
        &self,
        item_id: ItemId,
        location_id: LocationId,
    ) -> Result<Option<InventoryLevel>> {
        let tables = self.tables.read().await;
        Ok(tables.levels.get(&(item_id, location_id)).cloned())
    }

    async fn list_levels(&self, query: LevelQuery) -> Result<Vec<InventoryLevel>> {
        let tables = self.tables.read().await;
        let mut levels: Vec<_> = tables
            .levels
            .values()
            .filter(|level| query.matches(level))
            .cloned()
            .collect();
        levels.sort_by(|a, b| {
            a.inventory_item_id
                .cmp(&b.inventory_item_id)
                .then(a.location_id.cmp(&b.location_id))
        });
        Ok(levels)
    }

    async fn update_level(
        &self,
        item_id: ItemId,
        location_id: LocationId,
        update: LevelUpdate,
    ) -> Result<InventoryLevel> {
        let mut tables = self.tables.write().await;
        let current = tables
            .levels
            .get(&(item_id, location_id))
            .cloned()
            .ok_or_else(|| level_not_found(item_id, location_id))?;

        let updated = current.with_update(&update)?;
        let delta = updated.stocked_quantity - current.stocked_quantity;
        if delta != 0 {
            let entry = StockMovement::between(&current, &updated, Movement::Adjustment(delta));
            tables.movements.push(entry);
        }
        tables.levels.insert((item_id, location_id), updated.clone());
        Ok(updated)
    }

    async fn apply_movement(
        &self,
        item_id: ItemId,
        location_id: LocationId,
        movement: Movement,
        create_missing: bool,
    ) -> Result<AppliedMovement> {
        let mut tables = self.tables.write().await;

        let existing = tables.levels.get(&(item_id, location_id)).cloned();
        let created_level = existing.is_none();
        let current = match existing {
            Some(level) => level,
            None if create_missing => {
                if !tables.items.contains_key(&item_id) {
                    return Err(LedgerStoreError::not_found("inventory item", item_id));
                }
                if !tables.locations.contains_key(&location_id) {
                    return Err(LedgerStoreError::not_found(
                        "inventory location",
                        location_id,
                    ));
                }
                InventoryLevel::empty(item_id, location_id)
            }
            None => return Err(level_not_found(item_id, location_id)),
        };

        let updated = current.apply(movement)?;
        let entry = StockMovement::between(&current, &updated, movement);
        tables.commit_level(updated.clone(), entry.clone());
        Ok(AppliedMovement {
            level: updated,
            entry,
            created_level,
        })
    }

    async fn delete_level(&self, item_id: ItemId, location_id: LocationId) -> Result<()> {
        let mut tables = self.tables.write().await;
        let level = tables
            .levels
            .get(&(item_id, location_id))
            .ok_or_else(|| level_not_found(item_id, location_id))?;

        if level.reserved_quantity > 0 {
            return Err(LedgerStoreError::Conflict(format!(
                "inventory level for item {item_id} at location {location_id} holds {} reserved units",
                level.reserved_quantity
            )));
        }

        tables.levels.remove(&(item_id, location_id));
        Ok(())
    }

    async fn create_reservation(
        &self,
        reservation: ReservationItem,
    ) -> Result<(ReservationItem, InventoryLevel)> {
        let mut tables = self.tables.write().await;
        let key = (reservation.inventory_item_id, reservation.location_id);
        let current = tables
            .levels
            .get(&key)
            .cloned()
            .ok_or_else(|| level_not_found(key.0, key.1))?;

        let movement = Movement::Reserved(reservation.quantity);
        let updated = current.apply(movement)?;
        let entry =
            StockMovement::between(&current, &updated, movement).for_reservation(&reservation);

        tables
            .reservations
            .insert(reservation.id, reservation.clone());
        tables.commit_level(updated.clone(), entry);
        Ok((reservation, updated))
    }

    async fn resolve_reservation(
        &self,
        id: ReservationId,
        resolution: Resolution,
    ) -> Result<(ReservationItem, InventoryLevel)> {
        let mut tables = self.tables.write().await;
        let reservation = tables
            .reservations
            .get(&id)
            .cloned()
            .ok_or_else(|| LedgerStoreError::not_found("reservation", id))?;

        let key = (reservation.inventory_item_id, reservation.location_id);
        let current = tables
            .levels
            .get(&key)
            .cloned()
            .ok_or_else(|| level_not_found(key.0, key.1))?;

        let movement = resolution.movement(reservation.quantity);
        let updated = current.apply(movement)?;
        let entry =
            StockMovement::between(&current, &updated, movement).for_reservation(&reservation);

        tables.reservations.remove(&id);
        tables.commit_level(updated.clone(), entry);
        Ok((reservation, updated))
    }

    async fn get_reservation(&self, id: ReservationId) -> Result<Option<ReservationItem>> {
        Ok(self.tables.read().await.reservations.get(&id).cloned())
    }

    async fn list_reservations(&self, query: ReservationQuery) -> Result<Vec<ReservationItem>> {
        let tables = self.tables.read().await;
        let mut reservations: Vec<_> = tables
            .reservations
            .values()
            .filter(|r| query.matches(r))
            .cloned()
            .collect();
        reservations.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
        if let Some(limit) = query.limit {
            reservations.truncate(limit);
        }
        Ok(reservations)
    }

    async fn list_movements(&self, query: MovementQuery) -> Result<Vec<StockMovement>> {
        let tables = self.tables.read().await;
        let movements = tables.movements.iter().filter(|m| query.matches(m)).cloned();
        let movements = match query.limit {
            Some(limit) => movements.take(limit).collect(),
            None => movements.collect(),
        };
        Ok(movements)
    }
}
