//! Inventory service providing the public API over the ledger store.

use ledger_store::{
    AppliedMovement, InventoryItem, InventoryLevel, InventoryLocation, ItemId, ItemQuery, ItemUpdate,
    LedgerStore, LedgerStoreError, LedgerStoreExt, LevelQuery, LocationId, LocationUpdate,
    Movement, MovementQuery, OrderId, ReservationId, ReservationItem, ReservationQuery,
    Resolution, StockMovement, VariantId,
};

use crate::error::{InventoryError, Result};
use crate::input::{
    AdjustInventory, CreateInventoryItem, CreateInventoryLevel, CreateLocation, CreateReservation,
    UpdateInventoryLevel,
};
use crate::summary::{InventoryItemSummary, ResolvedReservation, total};

/// Location code used when a caller does not name one.
pub const DEFAULT_LOCATION_CODE: &str = "default";

/// Service for managing inventory.
///
/// The only writer of inventory levels. Every quantity mutation is handed
/// to the store as one atomic unit, so concurrent callers can never drive
/// a level below zero available.
pub struct InventoryService<S: LedgerStore> {
    store: S,
}

impl<S: LedgerStore> InventoryService<S> {
    /// Creates a new inventory service over the given store.
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Returns a reference to the underlying store.
    pub fn store(&self) -> &S {
        &self.store
    }

    // Items

    #[tracing::instrument(skip(self, input), fields(sku = %input.sku))]
    pub async fn create_item(&self, input: CreateInventoryItem) -> Result<InventoryItem> {
        let sku = input.sku.trim();
        if sku.is_empty() {
            return Err(InventoryError::Validation("sku is required".to_string()));
        }

        let mut item = InventoryItem::new(sku);
        item.variant_id = input.variant_id;
        item.title = input.title;
        item.thumbnail = input.thumbnail;
        if let Some(requires_shipping) = input.requires_shipping {
            item.requires_shipping = requires_shipping;
        }
        if let Some(metadata) = input.metadata {
            item.metadata = metadata;
        }

        let item = self.store.insert_item(item).await?;
        tracing::info!(item_id = %item.id, "inventory item created");
        Ok(item)
    }

    #[tracing::instrument(skip(self))]
    pub async fn retrieve_item(&self, id: ItemId) -> Result<InventoryItem> {
        Ok(self.store.require_item(id).await?)
    }

    #[tracing::instrument(skip(self))]
    pub async fn list_items(&self, query: ItemQuery) -> Result<Vec<InventoryItem>> {
        Ok(self.store.list_items(query).await?)
    }

    /// Counts the items a query matches, ignoring its pagination.
    #[tracing::instrument(skip(self))]
    pub async fn count_items(&self, query: ItemQuery) -> Result<usize> {
        Ok(self.store.count_items(query).await?)
    }

    /// Lists items with their levels and quantity totals.
    ///
    /// A `location_id` filter restricts both the items returned and the
    /// levels aggregated into the totals.
    #[tracing::instrument(skip(self))]
    pub async fn list_items_with_levels(
        &self,
        query: ItemQuery,
    ) -> Result<Vec<InventoryItemSummary>> {
        let location_id = query.location_id;
        let items = self.store.list_items(query).await?;
        if items.is_empty() {
            return Ok(Vec::new());
        }

        let mut level_query = LevelQuery::new();
        for item in &items {
            level_query = level_query.inventory_item_id(item.id);
        }
        if let Some(location_id) = location_id {
            level_query = level_query.location_id(location_id);
        }
        let levels = self.store.list_levels(level_query).await?;

        items
            .into_iter()
            .map(|item| {
                let item_levels = levels
                    .iter()
                    .filter(|l| l.inventory_item_id == item.id)
                    .cloned()
                    .collect();
                InventoryItemSummary::new(item, item_levels)
            })
            .collect()
    }

    #[tracing::instrument(skip(self, update))]
    pub async fn update_item(&self, id: ItemId, update: ItemUpdate) -> Result<InventoryItem> {
        if let Some(ref sku) = update.sku
            && sku.trim().is_empty()
        {
            return Err(InventoryError::Validation("sku must not be blank".to_string()));
        }
        Ok(self.store.update_item(id, update).await?)
    }

    /// Deletes an item and its levels. Refused while reservations hold it.
    #[tracing::instrument(skip(self))]
    pub async fn delete_item(&self, id: ItemId) -> Result<()> {
        self.store.delete_item(id).await?;
        tracing::info!(item_id = %id, "inventory item deleted");
        Ok(())
    }

    // Locations

    #[tracing::instrument(skip(self, input), fields(code = %input.code))]
    pub async fn create_location(&self, input: CreateLocation) -> Result<InventoryLocation> {
        let code = input.code.trim();
        if code.is_empty() {
            return Err(InventoryError::Validation(
                "location code is required".to_string(),
            ));
        }
        let name = input.name.trim();
        let name = if name.is_empty() { code } else { name };

        let mut location = InventoryLocation::new(name, code);
        location.address = input.address;
        Ok(self.store.insert_location(location).await?)
    }

    #[tracing::instrument(skip(self))]
    pub async fn retrieve_location(&self, id: LocationId) -> Result<InventoryLocation> {
        Ok(self.store.require_location(id).await?)
    }

    #[tracing::instrument(skip(self))]
    pub async fn location_by_code(&self, code: &str) -> Result<InventoryLocation> {
        self.store
            .find_location_by_code(code)
            .await?
            .ok_or_else(|| InventoryError::not_found("inventory location", code))
    }

    #[tracing::instrument(skip(self))]
    pub async fn list_locations(&self) -> Result<Vec<InventoryLocation>> {
        Ok(self.store.list_locations().await?)
    }

    #[tracing::instrument(skip(self, update))]
    pub async fn update_location(
        &self,
        id: LocationId,
        update: LocationUpdate,
    ) -> Result<InventoryLocation> {
        Ok(self.store.update_location(id, update).await?)
    }

    // Levels

    #[tracing::instrument(skip(self))]
    pub async fn create_level(&self, input: CreateInventoryLevel) -> Result<InventoryLevel> {
        for (field, value) in [
            ("stocked_quantity", input.stocked_quantity),
            ("reserved_quantity", input.reserved_quantity),
            ("incoming_quantity", input.incoming_quantity),
        ] {
            if value < 0 {
                return Err(InventoryError::Validation(format!(
                    "{field} must not be negative, got {value}"
                )));
            }
        }

        self.store.require_item(input.inventory_item_id).await?;
        self.store.require_location(input.location_id).await?;

        let level = InventoryLevel::new(
            input.inventory_item_id,
            input.location_id,
            input.stocked_quantity,
            input.reserved_quantity,
            input.incoming_quantity,
        )?;
        Ok(self.store.insert_level(level).await?)
    }

    /// Overwrites the supplied quantities of an existing level.
    #[tracing::instrument(skip(self))]
    pub async fn update_level(&self, input: UpdateInventoryLevel) -> Result<InventoryLevel> {
        let update = input.quantities();
        if update.is_empty() {
            return self
                .retrieve_level(input.inventory_item_id, input.location_id)
                .await;
        }
        Ok(self
            .store
            .update_level(input.inventory_item_id, input.location_id, update)
            .await?)
    }

    #[tracing::instrument(skip(self))]
    pub async fn retrieve_level(
        &self,
        item_id: ItemId,
        location_id: LocationId,
    ) -> Result<InventoryLevel> {
        Ok(self.store.require_level(item_id, location_id).await?)
    }

    #[tracing::instrument(skip(self))]
    pub async fn list_levels(&self, query: LevelQuery) -> Result<Vec<InventoryLevel>> {
        Ok(self.store.list_levels(query).await?)
    }

    /// Deletes a level. Refused while it holds reserved units.
    #[tracing::instrument(skip(self))]
    pub async fn delete_level(&self, item_id: ItemId, location_id: LocationId) -> Result<()> {
        Ok(self.store.delete_level(item_id, location_id).await?)
    }

    /// Adds a signed delta to stocked quantity.
    ///
    /// Shrinking adjustments clamp at the reserved quantity instead of
    /// failing. A missing level is created for a positive delta only.
    pub async fn adjust_inventory(
        &self,
        item_id: ItemId,
        location_id: LocationId,
        delta: i64,
    ) -> Result<InventoryLevel> {
        let applied = self
            .apply_adjustment(AdjustInventory::new(item_id, location_id, delta))
            .await?;
        Ok(applied.level)
    }

    /// Like [`adjust_inventory`](Self::adjust_inventory), also returning
    /// the movement entry that records the change actually applied and
    /// whether the level was created by it.
    #[tracing::instrument(skip(self))]
    pub async fn apply_adjustment(&self, adjustment: AdjustInventory) -> Result<AppliedMovement> {
        let AdjustInventory {
            inventory_item_id,
            location_id,
            delta,
        } = adjustment;

        let applied = self
            .store
            .apply_movement(
                inventory_item_id,
                location_id,
                Movement::for_delta(delta),
                delta > 0,
            )
            .await?;

        metrics::counter!("inventory_adjustments_total").increment(1);
        if applied.entry.quantity != delta {
            tracing::debug!(
                requested = delta,
                applied = applied.entry.quantity,
                "adjustment clamped"
            );
        }
        Ok(applied)
    }

    // Quantities

    async fn sum_levels(
        &self,
        item_id: ItemId,
        location_ids: Option<&[LocationId]>,
        quantity: fn(&InventoryLevel) -> i64,
    ) -> Result<i64> {
        self.store.require_item(item_id).await?;

        let mut query = LevelQuery::for_item(item_id);
        if let Some(location_ids) = location_ids {
            query = query.location_ids(location_ids.to_vec());
        }
        let levels = self.store.list_levels(query).await?;
        total(&levels, quantity)
    }

    /// Sums available quantity across the given locations, or all of them.
    #[tracing::instrument(skip(self))]
    pub async fn get_available_quantity(
        &self,
        item_id: ItemId,
        location_ids: Option<&[LocationId]>,
    ) -> Result<i64> {
        self.sum_levels(item_id, location_ids, |l| l.available_quantity)
            .await
    }

    #[tracing::instrument(skip(self))]
    pub async fn get_stocked_quantity(
        &self,
        item_id: ItemId,
        location_ids: Option<&[LocationId]>,
    ) -> Result<i64> {
        self.sum_levels(item_id, location_ids, |l| l.stocked_quantity)
            .await
    }

    #[tracing::instrument(skip(self))]
    pub async fn get_reserved_quantity(
        &self,
        item_id: ItemId,
        location_ids: Option<&[LocationId]>,
    ) -> Result<i64> {
        self.sum_levels(item_id, location_ids, |l| l.reserved_quantity)
            .await
    }

    /// Reports whether `quantity` units are available. Reads only.
    #[tracing::instrument(skip(self))]
    pub async fn confirm_inventory(
        &self,
        item_id: ItemId,
        location_ids: &[LocationId],
        quantity: i64,
    ) -> Result<bool> {
        let available = self
            .get_available_quantity(item_id, Some(location_ids))
            .await?;
        Ok(available >= quantity)
    }

    // Reservations

    /// Places a hold of `quantity` units on a level.
    ///
    /// The availability check, the reservation insert and the reserved
    /// increment happen in one store transaction.
    #[tracing::instrument(
        skip(self, input),
        fields(
            item_id = %input.inventory_item_id,
            location_id = %input.location_id,
            quantity = input.quantity
        )
    )]
    pub async fn create_reservation(&self, input: CreateReservation) -> Result<ReservationItem> {
        if input.quantity <= 0 {
            return Err(InventoryError::Validation(format!(
                "reservation quantity must be positive, got {}",
                input.quantity
            )));
        }

        let location = self.store.require_location(input.location_id).await?;
        if !location.is_active {
            return Err(InventoryError::Validation(format!(
                "location '{}' is inactive",
                location.code
            )));
        }

        let mut reservation =
            ReservationItem::new(input.inventory_item_id, input.location_id, input.quantity);
        reservation.line_item_id = input.line_item_id;
        reservation.external_id = input.external_id;
        reservation.description = input.description;
        reservation.created_by = input.created_by;
        reservation.expires_at = input.expires_at;
        if let Some(metadata) = input.metadata {
            reservation.metadata = metadata;
        }

        match self.store.create_reservation(reservation).await {
            Ok((reservation, level)) => {
                metrics::counter!("inventory_reservations_created_total").increment(1);
                tracing::info!(
                    reservation_id = %reservation.id,
                    available = level.available_quantity,
                    "reservation created"
                );
                Ok(reservation)
            }
            Err(e @ LedgerStoreError::InsufficientInventory { .. }) => {
                metrics::counter!("inventory_insufficient_total").increment(1);
                tracing::warn!(error = %e, "reservation refused");
                Err(e.into())
            }
            Err(e) => Err(e.into()),
        }
    }

    #[tracing::instrument(skip(self))]
    pub async fn retrieve_reservation(&self, id: ReservationId) -> Result<ReservationItem> {
        Ok(self.store.require_reservation(id).await?)
    }

    #[tracing::instrument(skip(self))]
    pub async fn list_reservations(&self, query: ReservationQuery) -> Result<Vec<ReservationItem>> {
        Ok(self.store.list_reservations(query).await?)
    }

    #[tracing::instrument(skip(self))]
    pub async fn list_reservations_by_external_id(
        &self,
        external_id: &OrderId,
    ) -> Result<Vec<ReservationItem>> {
        Ok(self
            .store
            .list_reservations(ReservationQuery::for_external_id(external_id.clone()))
            .await?)
    }

    /// Releases a hold, returning its quantity to available.
    #[tracing::instrument(skip(self))]
    pub async fn delete_reservation(&self, id: ReservationId) -> Result<ResolvedReservation> {
        let (reservation, inventory_level) =
            self.store.resolve_reservation(id, Resolution::Release).await?;
        metrics::counter!("inventory_reservations_released_total").increment(1);
        tracing::info!(reservation_id = %id, "reservation released");
        Ok(ResolvedReservation {
            reservation,
            inventory_level,
        })
    }

    /// Converts a hold into a permanent reduction of stocked quantity.
    #[tracing::instrument(skip(self))]
    pub async fn confirm_reservation(&self, id: ReservationId) -> Result<ResolvedReservation> {
        let (reservation, inventory_level) =
            self.store.resolve_reservation(id, Resolution::Confirm).await?;
        metrics::counter!("inventory_reservations_confirmed_total").increment(1);
        tracing::info!(reservation_id = %id, "reservation confirmed");
        Ok(ResolvedReservation {
            reservation,
            inventory_level,
        })
    }

    // Catalog sync

    /// Idempotently ensures an item for the variant with a level at the
    /// named location whose stocked quantity is `stock_quantity`.
    ///
    /// A create that loses a uniqueness race to a concurrent sync re-reads
    /// the winner's row.
    #[tracing::instrument(skip(self))]
    pub async fn sync_with_variant(
        &self,
        variant_id: &VariantId,
        sku: &str,
        stock_quantity: i64,
        location_code: Option<&str>,
    ) -> Result<InventoryLevel> {
        if stock_quantity < 0 {
            return Err(InventoryError::Validation(format!(
                "stock quantity must not be negative, got {stock_quantity}"
            )));
        }

        let item = self.find_or_create_item(variant_id, sku).await?;
        let code = location_code.unwrap_or(DEFAULT_LOCATION_CODE);
        let location = self.find_or_create_location(code).await?;

        match self.store.get_level(item.id, location.id).await? {
            Some(level) if level.stocked_quantity == stock_quantity => Ok(level),
            Some(_) => self.set_stocked(item.id, location.id, stock_quantity).await,
            None => {
                let level = InventoryLevel::new(item.id, location.id, stock_quantity, 0, 0)?;
                match self.store.insert_level(level).await {
                    Ok(level) => Ok(level),
                    Err(LedgerStoreError::Conflict(_)) => {
                        self.set_stocked(item.id, location.id, stock_quantity).await
                    }
                    Err(e) => Err(e.into()),
                }
            }
        }
    }

    async fn set_stocked(
        &self,
        item_id: ItemId,
        location_id: LocationId,
        quantity: i64,
    ) -> Result<InventoryLevel> {
        self.update_level(UpdateInventoryLevel::stocked(item_id, location_id, quantity))
            .await
    }

    async fn find_or_create_item(&self, variant_id: &VariantId, sku: &str) -> Result<InventoryItem> {
        if let Some(item) = self.store.find_item_by_variant(variant_id).await? {
            return Ok(item);
        }

        let input = CreateInventoryItem::new(sku).with_variant(variant_id.clone());
        match self.create_item(input).await {
            Err(InventoryError::Conflict(_)) => self
                .store
                .find_item_by_variant(variant_id)
                .await?
                .ok_or_else(|| InventoryError::not_found("inventory item", variant_id)),
            other => other,
        }
    }

    async fn find_or_create_location(&self, code: &str) -> Result<InventoryLocation> {
        if let Some(location) = self.store.find_location_by_code(code).await? {
            return Ok(location);
        }

        match self.create_location(CreateLocation::new(code, code)).await {
            Err(InventoryError::Conflict(_)) => self.location_by_code(code).await,
            other => other,
        }
    }

    // Movements

    #[tracing::instrument(skip(self))]
    pub async fn list_movements(&self, query: MovementQuery) -> Result<Vec<StockMovement>> {
        Ok(self.store.list_movements(query).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ledger_store::{InMemoryLedgerStore, MovementKind};

    fn service() -> InventoryService<InMemoryLedgerStore> {
        InventoryService::new(InMemoryLedgerStore::new())
    }

    async fn seeded(
        service: &InventoryService<InMemoryLedgerStore>,
        stocked: i64,
    ) -> (ItemId, LocationId) {
        let item = service
            .create_item(CreateInventoryItem::new("SKU-1"))
            .await
            .unwrap();
        let location = service
            .create_location(CreateLocation::new("Main", "main"))
            .await
            .unwrap();
        service
            .create_level(CreateInventoryLevel::new(item.id, location.id, stocked))
            .await
            .unwrap();
        (item.id, location.id)
    }

    #[tokio::test]
    async fn create_item_requires_sku() {
        let service = service();
        let result = service.create_item(CreateInventoryItem::new("  ")).await;
        assert!(matches!(result, Err(InventoryError::Validation(_))));
    }

    #[tokio::test]
    async fn create_level_validates_quantities() {
        let service = service();
        let (item_id, location_id) = seeded(&service, 1).await;
        let other = service
            .create_location(CreateLocation::new("Other", "other"))
            .await
            .unwrap();

        let negative = CreateInventoryLevel::new(item_id, other.id, -1);
        assert!(matches!(
            service.create_level(negative).await,
            Err(InventoryError::Validation(_))
        ));

        let mut over_reserved = CreateInventoryLevel::new(item_id, other.id, 2);
        over_reserved.reserved_quantity = 3;
        assert!(matches!(
            service.create_level(over_reserved).await,
            Err(InventoryError::Validation(_))
        ));

        let missing_item = CreateInventoryLevel::new(ItemId::new(), location_id, 1);
        assert!(matches!(
            service.create_level(missing_item).await,
            Err(InventoryError::NotFound { .. })
        ));

        let duplicate = CreateInventoryLevel::new(item_id, location_id, 1);
        assert!(matches!(
            service.create_level(duplicate).await,
            Err(InventoryError::Conflict(_))
        ));
    }

    #[tokio::test]
    async fn update_level_missing_pair_is_not_found() {
        let service = service();
        let result = service
            .update_level(UpdateInventoryLevel::stocked(
                ItemId::new(),
                LocationId::new(),
                5,
            ))
            .await;
        assert!(matches!(result, Err(InventoryError::NotFound { .. })));
    }

    #[tokio::test]
    async fn adjust_past_the_quantity_range_is_refused() {
        let service = service();
        let (item_id, location_id) = seeded(&service, i64::MAX).await;

        let result = service.adjust_inventory(item_id, location_id, 1).await;
        assert!(matches!(result, Err(InventoryError::Validation(_))));
        assert_eq!(
            service.get_stocked_quantity(item_id, None).await.unwrap(),
            i64::MAX
        );

        let backup = service
            .create_location(CreateLocation::new("Backup", "backup"))
            .await
            .unwrap();
        service
            .create_level(CreateInventoryLevel::new(item_id, backup.id, 1))
            .await
            .unwrap();
        assert!(matches!(
            service.get_available_quantity(item_id, None).await,
            Err(InventoryError::Validation(_))
        ));
    }

    #[tokio::test]
    async fn adjust_creates_level_only_for_positive_delta() {
        let service = service();
        let item = service
            .create_item(CreateInventoryItem::new("SKU"))
            .await
            .unwrap();
        let location = service
            .create_location(CreateLocation::new("Main", "main"))
            .await
            .unwrap();

        let shrink = service.adjust_inventory(item.id, location.id, -1).await;
        assert!(matches!(shrink, Err(InventoryError::NotFound { .. })));

        let level = service
            .adjust_inventory(item.id, location.id, 8)
            .await
            .unwrap();
        assert_eq!(level.stocked_quantity, 8);
        assert_eq!(level.available_quantity, 8);
    }

    #[tokio::test]
    async fn adjustment_reports_applied_change() {
        let service = service();
        let (item_id, location_id) = seeded(&service, 5).await;

        let applied = service
            .apply_adjustment(AdjustInventory::new(item_id, location_id, -9))
            .await
            .unwrap();
        assert!(!applied.created_level);
        assert_eq!(applied.level.stocked_quantity, 0);
        assert_eq!(applied.entry.kind, MovementKind::Adjustment);
        assert_eq!(applied.entry.quantity, -5);
    }

    #[tokio::test]
    async fn reservation_rejects_non_positive_quantity() {
        let service = service();
        let (item_id, location_id) = seeded(&service, 5).await;

        let result = service
            .create_reservation(CreateReservation::new(item_id, location_id, 0))
            .await;
        assert!(matches!(result, Err(InventoryError::Validation(_))));
    }

    #[tokio::test]
    async fn reservation_rejects_inactive_location() {
        let service = service();
        let (item_id, location_id) = seeded(&service, 5).await;
        service
            .update_location(
                location_id,
                LocationUpdate {
                    is_active: Some(false),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        let result = service
            .create_reservation(CreateReservation::new(item_id, location_id, 1))
            .await;
        assert!(matches!(result, Err(InventoryError::Validation(_))));
    }

    #[tokio::test]
    async fn quantities_sum_across_locations() {
        let service = service();
        let (item_id, main) = seeded(&service, 10).await;
        let backup = service
            .create_location(CreateLocation::new("Backup", "backup"))
            .await
            .unwrap();
        service
            .create_level(CreateInventoryLevel::new(item_id, backup.id, 5))
            .await
            .unwrap();
        service
            .create_reservation(CreateReservation::new(item_id, main, 3))
            .await
            .unwrap();

        assert_eq!(
            service.get_available_quantity(item_id, None).await.unwrap(),
            12
        );
        assert_eq!(
            service
                .get_available_quantity(item_id, Some(&[main][..]))
                .await
                .unwrap(),
            7
        );
        assert_eq!(service.get_stocked_quantity(item_id, None).await.unwrap(), 15);
        assert_eq!(service.get_reserved_quantity(item_id, None).await.unwrap(), 3);
        assert!(service.confirm_inventory(item_id, &[main], 7).await.unwrap());
        assert!(!service.confirm_inventory(item_id, &[main], 8).await.unwrap());
    }

    #[tokio::test]
    async fn summaries_total_matching_levels() {
        let service = service();
        let (item_id, main) = seeded(&service, 10).await;
        let backup = service
            .create_location(CreateLocation::new("Backup", "backup"))
            .await
            .unwrap();
        service
            .create_level(CreateInventoryLevel::new(item_id, backup.id, 4))
            .await
            .unwrap();

        let all = service
            .list_items_with_levels(ItemQuery::new())
            .await
            .unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].total_stocked, 14);
        assert_eq!(all[0].levels.len(), 2);

        let at_main = service
            .list_items_with_levels(ItemQuery::new().location_id(main))
            .await
            .unwrap();
        assert_eq!(at_main[0].total_available, 10);
        assert_eq!(at_main[0].levels.len(), 1);
    }

    #[tokio::test]
    async fn sync_with_variant_is_idempotent() {
        let service = service();
        let variant = VariantId::new("variant_1");

        service
            .sync_with_variant(&variant, "SKU-V1", 50, None)
            .await
            .unwrap();
        let level = service
            .sync_with_variant(&variant, "SKU-V1", 50, None)
            .await
            .unwrap();

        assert_eq!(level.stocked_quantity, 50);
        assert_eq!(service.count_items(ItemQuery::new()).await.unwrap(), 1);
        assert_eq!(service.list_levels(LevelQuery::new()).await.unwrap().len(), 1);
        let location = service.location_by_code(DEFAULT_LOCATION_CODE).await.unwrap();
        assert_eq!(location.name, DEFAULT_LOCATION_CODE);
    }

    #[tokio::test]
    async fn sync_with_variant_updates_stock() {
        let service = service();
        let variant = VariantId::new("variant_1");

        service
            .sync_with_variant(&variant, "SKU-V1", 50, Some("main"))
            .await
            .unwrap();
        let level = service
            .sync_with_variant(&variant, "SKU-V1", 20, Some("main"))
            .await
            .unwrap();
        assert_eq!(level.stocked_quantity, 20);
    }
}
