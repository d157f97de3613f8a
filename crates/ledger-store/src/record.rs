//! Records persisted by the ledger store.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::movement::{Movement, MovementKind};
use crate::{
    ItemId, LedgerStoreError, LevelId, LineItemId, LocationId, MovementId, OrderId, ReservationId,
    Result, VariantId,
};

fn empty_metadata() -> Value {
    Value::Object(serde_json::Map::new())
}

/// A stock-trackable unit, optionally linked to a catalog variant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InventoryItem {
    pub id: ItemId,
    pub sku: String,
    pub variant_id: Option<VariantId>,
    pub title: Option<String>,
    pub thumbnail: Option<String>,
    pub requires_shipping: bool,
    pub metadata: Value,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl InventoryItem {
    /// Creates a new item for the given SKU.
    pub fn new(sku: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: ItemId::new(),
            sku: sku.into(),
            variant_id: None,
            title: None,
            thumbnail: None,
            requires_shipping: true,
            metadata: empty_metadata(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Links the item to a catalog variant.
    pub fn with_variant(mut self, variant_id: VariantId) -> Self {
        self.variant_id = Some(variant_id);
        self
    }

    /// Sets the display title.
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    /// Applies a partial update, bumping `updated_at`.
    pub fn merged(mut self, update: ItemUpdate) -> Self {
        if let Some(sku) = update.sku {
            self.sku = sku;
        }
        if let Some(variant_id) = update.variant_id {
            self.variant_id = variant_id;
        }
        if let Some(title) = update.title {
            self.title = Some(title);
        }
        if let Some(thumbnail) = update.thumbnail {
            self.thumbnail = Some(thumbnail);
        }
        if let Some(requires_shipping) = update.requires_shipping {
            self.requires_shipping = requires_shipping;
        }
        if let Some(metadata) = update.metadata {
            self.metadata = metadata;
        }
        self.updated_at = Utc::now();
        self
    }
}

/// Partial update of an inventory item. `None` leaves a field unchanged.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ItemUpdate {
    pub sku: Option<String>,
    /// `Some(None)` unlinks the variant.
    pub variant_id: Option<Option<VariantId>>,
    pub title: Option<String>,
    pub thumbnail: Option<String>,
    pub requires_shipping: Option<bool>,
    pub metadata: Option<Value>,
}

impl ItemUpdate {
    pub fn is_empty(&self) -> bool {
        self.sku.is_none()
            && self.variant_id.is_none()
            && self.title.is_none()
            && self.thumbnail.is_none()
            && self.requires_shipping.is_none()
            && self.metadata.is_none()
    }
}

/// A named, coded place where stock resides.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InventoryLocation {
    pub id: LocationId,
    pub name: String,
    pub code: String,
    pub address: Option<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

impl InventoryLocation {
    /// Creates a new active location.
    pub fn new(name: impl Into<String>, code: impl Into<String>) -> Self {
        Self {
            id: LocationId::new(),
            name: name.into(),
            code: code.into(),
            address: None,
            is_active: true,
            created_at: Utc::now(),
        }
    }

    pub fn with_address(mut self, address: impl Into<String>) -> Self {
        self.address = Some(address.into());
        self
    }

    pub fn merged(mut self, update: LocationUpdate) -> Self {
        if let Some(name) = update.name {
            self.name = name;
        }
        if let Some(address) = update.address {
            self.address = Some(address);
        }
        if let Some(is_active) = update.is_active {
            self.is_active = is_active;
        }
        self
    }
}

/// Partial update of a location. The code is immutable.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LocationUpdate {
    pub name: Option<String>,
    pub address: Option<String>,
    pub is_active: Option<bool>,
}

/// The quantity ledger row for one (item, location) pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InventoryLevel {
    pub id: LevelId,
    pub inventory_item_id: ItemId,
    pub location_id: LocationId,
    pub stocked_quantity: i64,
    pub reserved_quantity: i64,
    pub incoming_quantity: i64,
    pub available_quantity: i64,
    pub updated_at: DateTime<Utc>,
}

impl InventoryLevel {
    /// Builds a level with the given quantities, rejecting any that break
    /// the invariant.
    pub fn new(
        inventory_item_id: ItemId,
        location_id: LocationId,
        stocked_quantity: i64,
        reserved_quantity: i64,
        incoming_quantity: i64,
    ) -> Result<Self> {
        let level = Self {
            id: LevelId::new(),
            inventory_item_id,
            location_id,
            stocked_quantity,
            reserved_quantity,
            incoming_quantity,
            available_quantity: stocked_quantity - reserved_quantity,
            updated_at: Utc::now(),
        };
        level.check_invariant()?;
        Ok(level)
    }

    /// A level with every quantity at zero.
    pub fn empty(inventory_item_id: ItemId, location_id: LocationId) -> Self {
        Self {
            id: LevelId::new(),
            inventory_item_id,
            location_id,
            stocked_quantity: 0,
            reserved_quantity: 0,
            incoming_quantity: 0,
            available_quantity: 0,
            updated_at: Utc::now(),
        }
    }

    /// Verifies `available = stocked - reserved`, `0 <= reserved <= stocked`
    /// and `incoming >= 0`.
    pub fn check_invariant(&self) -> Result<()> {
        if self.reserved_quantity < 0 {
            return Err(LedgerStoreError::InvariantViolation(format!(
                "reserved_quantity must not be negative, got {}",
                self.reserved_quantity
            )));
        }
        if self.reserved_quantity > self.stocked_quantity {
            return Err(LedgerStoreError::InvariantViolation(format!(
                "reserved_quantity {} exceeds stocked_quantity {}",
                self.reserved_quantity, self.stocked_quantity
            )));
        }
        if self.incoming_quantity < 0 {
            return Err(LedgerStoreError::InvariantViolation(format!(
                "incoming_quantity must not be negative, got {}",
                self.incoming_quantity
            )));
        }
        if self.available_quantity != self.stocked_quantity - self.reserved_quantity {
            return Err(LedgerStoreError::InvariantViolation(format!(
                "available_quantity {} does not equal stocked {} minus reserved {}",
                self.available_quantity, self.stocked_quantity, self.reserved_quantity
            )));
        }
        Ok(())
    }

    /// Overwrites the supplied quantities, keeping the prior value of any
    /// field the update leaves out, and recomputes availability.
    pub fn with_update(&self, update: &LevelUpdate) -> Result<Self> {
        let mut next = self.clone();
        if let Some(stocked) = update.stocked_quantity {
            next.stocked_quantity = stocked;
        }
        if let Some(reserved) = update.reserved_quantity {
            next.reserved_quantity = reserved;
        }
        if let Some(incoming) = update.incoming_quantity {
            next.incoming_quantity = incoming;
        }
        next.available_quantity = next.stocked_quantity - next.reserved_quantity;
        next.updated_at = Utc::now();
        next.check_invariant()?;
        Ok(next)
    }
}

/// Partial update of a level's quantities.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LevelUpdate {
    pub stocked_quantity: Option<i64>,
    pub reserved_quantity: Option<i64>,
    pub incoming_quantity: Option<i64>,
}

impl LevelUpdate {
    pub fn stocked(quantity: i64) -> Self {
        Self {
            stocked_quantity: Some(quantity),
            ..Default::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        self.stocked_quantity.is_none()
            && self.reserved_quantity.is_none()
            && self.incoming_quantity.is_none()
    }
}

/// A temporary hold against a level's available quantity.
///
/// A reservation has no status: while the row exists the hold is active,
/// and releasing or confirming it deletes the row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReservationItem {
    pub id: ReservationId,
    pub inventory_item_id: ItemId,
    pub location_id: LocationId,
    pub quantity: i64,
    pub line_item_id: Option<LineItemId>,
    pub external_id: Option<OrderId>,
    pub description: Option<String>,
    pub created_by: Option<String>,
    pub expires_at: Option<DateTime<Utc>>,
    pub metadata: Value,
    pub created_at: DateTime<Utc>,
}

impl ReservationItem {
    /// Creates a hold of `quantity` units at the given level.
    pub fn new(inventory_item_id: ItemId, location_id: LocationId, quantity: i64) -> Self {
        Self {
            id: ReservationId::new(),
            inventory_item_id,
            location_id,
            quantity,
            line_item_id: None,
            external_id: None,
            description: None,
            created_by: None,
            expires_at: None,
            metadata: empty_metadata(),
            created_at: Utc::now(),
        }
    }

    pub fn with_external_id(mut self, external_id: OrderId) -> Self {
        self.external_id = Some(external_id);
        self
    }

    pub fn with_line_item(mut self, line_item_id: LineItemId) -> Self {
        self.line_item_id = Some(line_item_id);
        self
    }
}

/// Append-only audit entry for one quantity transition of a level.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StockMovement {
    pub id: MovementId,
    pub inventory_item_id: ItemId,
    pub location_id: LocationId,
    pub kind: MovementKind,
    /// Signed change of stocked (In, Out, Adjustment) or reserved
    /// (Reserved, Released) quantity actually applied.
    pub quantity: i64,
    pub stocked_after: i64,
    pub reserved_after: i64,
    pub reservation_id: Option<ReservationId>,
    pub reference: Option<String>,
    pub occurred_at: DateTime<Utc>,
}

impl StockMovement {
    /// Records the transition from `before` to `after` caused by `movement`.
    pub fn between(before: &InventoryLevel, after: &InventoryLevel, movement: Movement) -> Self {
        let kind = movement.kind();
        let quantity = match kind {
            MovementKind::In | MovementKind::Out | MovementKind::Adjustment => {
                after.stocked_quantity - before.stocked_quantity
            }
            MovementKind::Reserved | MovementKind::Released => {
                after.reserved_quantity - before.reserved_quantity
            }
        };
        Self {
            id: MovementId::new(),
            inventory_item_id: after.inventory_item_id,
            location_id: after.location_id,
            kind,
            quantity,
            stocked_after: after.stocked_quantity,
            reserved_after: after.reserved_quantity,
            reservation_id: None,
            reference: None,
            occurred_at: after.updated_at,
        }
    }

    /// Ties the entry to the reservation that caused it.
    pub fn for_reservation(mut self, reservation: &ReservationItem) -> Self {
        self.reservation_id = Some(reservation.id);
        self.reference = reservation.external_id.as_ref().map(|id| id.to_string());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_level_computes_available() {
        let level = InventoryLevel::new(ItemId::new(), LocationId::new(), 10, 3, 5).unwrap();
        assert_eq!(level.available_quantity, 7);
    }

    #[test]
    fn new_level_rejects_reserved_above_stocked() {
        let result = InventoryLevel::new(ItemId::new(), LocationId::new(), 2, 3, 0);
        assert!(matches!(result, Err(LedgerStoreError::InvariantViolation(_))));
    }

    #[test]
    fn new_level_rejects_negative_quantities() {
        assert!(InventoryLevel::new(ItemId::new(), LocationId::new(), -1, 0, 0).is_err());
        assert!(InventoryLevel::new(ItemId::new(), LocationId::new(), 5, 0, -2).is_err());
    }

    #[test]
    fn update_keeps_prior_value_of_missing_field() {
        let level = InventoryLevel::new(ItemId::new(), LocationId::new(), 10, 4, 0).unwrap();

        let updated = level.with_update(&LevelUpdate::stocked(20)).unwrap();
        assert_eq!(updated.reserved_quantity, 4);
        assert_eq!(updated.available_quantity, 16);

        let updated = level
            .with_update(&LevelUpdate {
                reserved_quantity: Some(1),
                ..Default::default()
            })
            .unwrap();
        assert_eq!(updated.stocked_quantity, 10);
        assert_eq!(updated.available_quantity, 9);
    }

    #[test]
    fn update_rejects_stock_below_reserved() {
        let level = InventoryLevel::new(ItemId::new(), LocationId::new(), 10, 4, 0).unwrap();
        assert!(level.with_update(&LevelUpdate::stocked(3)).is_err());
    }

    #[test]
    fn item_merge_can_unlink_variant() {
        let item = InventoryItem::new("SKU-1").with_variant(VariantId::new("variant_1"));
        let merged = item.merged(ItemUpdate {
            variant_id: Some(None),
            title: Some("Shirt".to_string()),
            ..Default::default()
        });
        assert!(merged.variant_id.is_none());
        assert_eq!(merged.title.as_deref(), Some("Shirt"));
        assert_eq!(merged.sku, "SKU-1");
    }

    #[test]
    fn movement_quantity_reflects_applied_change() {
        let before = InventoryLevel::new(ItemId::new(), LocationId::new(), 5, 3, 0).unwrap();
        let after = before.apply(Movement::Adjustment(-10)).unwrap();
        let entry = StockMovement::between(&before, &after, Movement::Adjustment(-10));
        assert_eq!(entry.kind, MovementKind::Adjustment);
        assert_eq!(entry.quantity, -2);
        assert_eq!(entry.stocked_after, 3);
    }
}
