use chrono::{DateTime, Utc};

use crate::record::{InventoryItem, InventoryLevel, ReservationItem, StockMovement};
use crate::{ItemId, LineItemId, LocationId, OrderId, ReservationId, VariantId};

/// Filter for listing inventory items.
#[derive(Debug, Clone, Default)]
pub struct ItemQuery {
    /// Restrict to these item IDs.
    pub ids: Option<Vec<ItemId>>,

    /// Filter by linked catalog variant.
    pub variant_id: Option<VariantId>,

    /// Filter by exact SKU.
    pub sku: Option<String>,

    /// Only items that have a level at this location.
    pub location_id: Option<LocationId>,

    /// Maximum number of items to return.
    pub limit: Option<usize>,

    /// Number of items to skip.
    pub offset: Option<usize>,
}

impl ItemQuery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn ids(mut self, ids: Vec<ItemId>) -> Self {
        self.ids = Some(ids);
        self
    }

    pub fn variant_id(mut self, variant_id: VariantId) -> Self {
        self.variant_id = Some(variant_id);
        self
    }

    pub fn sku(mut self, sku: impl Into<String>) -> Self {
        self.sku = Some(sku.into());
        self
    }

    pub fn location_id(mut self, location_id: LocationId) -> Self {
        self.location_id = Some(location_id);
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn offset(mut self, offset: usize) -> Self {
        self.offset = Some(offset);
        self
    }

    /// The same filter without pagination, used for counting.
    pub fn unpaginated(&self) -> Self {
        Self {
            limit: None,
            offset: None,
            ..self.clone()
        }
    }

    /// Checks the item-local filters. `location_id` needs the level table
    /// and is evaluated by the store.
    pub fn matches(&self, item: &InventoryItem) -> bool {
        if let Some(ref ids) = self.ids
            && !ids.contains(&item.id)
        {
            return false;
        }
        if let Some(ref variant_id) = self.variant_id
            && item.variant_id.as_ref() != Some(variant_id)
        {
            return false;
        }
        if let Some(ref sku) = self.sku
            && &item.sku != sku
        {
            return false;
        }
        true
    }
}

/// Filter for listing inventory levels.
#[derive(Debug, Clone, Default)]
pub struct LevelQuery {
    pub inventory_item_ids: Option<Vec<ItemId>>,
    pub location_ids: Option<Vec<LocationId>>,
}

impl LevelQuery {
    pub fn new() -> Self {
        Self::default()
    }

    /// Levels of a single item.
    pub fn for_item(item_id: ItemId) -> Self {
        Self {
            inventory_item_ids: Some(vec![item_id]),
            ..Default::default()
        }
    }

    pub fn inventory_item_id(mut self, item_id: ItemId) -> Self {
        self.inventory_item_ids
            .get_or_insert_with(Vec::new)
            .push(item_id);
        self
    }

    pub fn location_id(mut self, location_id: LocationId) -> Self {
        self.location_ids.get_or_insert_with(Vec::new).push(location_id);
        self
    }

    pub fn location_ids(mut self, location_ids: Vec<LocationId>) -> Self {
        self.location_ids = Some(location_ids);
        self
    }

    pub fn matches(&self, level: &InventoryLevel) -> bool {
        if let Some(ref ids) = self.inventory_item_ids
            && !ids.contains(&level.inventory_item_id)
        {
            return false;
        }
        if let Some(ref ids) = self.location_ids
            && !ids.contains(&level.location_id)
        {
            return false;
        }
        true
    }
}

/// Filter for listing active reservations.
#[derive(Debug, Clone, Default)]
pub struct ReservationQuery {
    pub external_id: Option<OrderId>,
    pub inventory_item_id: Option<ItemId>,
    pub location_id: Option<LocationId>,
    pub line_item_id: Option<LineItemId>,

    /// Only reservations whose `expires_at` is strictly before this instant.
    pub expires_before: Option<DateTime<Utc>>,

    pub limit: Option<usize>,
}

impl ReservationQuery {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reservations correlated to an external order.
    pub fn for_external_id(external_id: OrderId) -> Self {
        Self {
            external_id: Some(external_id),
            ..Default::default()
        }
    }

    pub fn inventory_item_id(mut self, item_id: ItemId) -> Self {
        self.inventory_item_id = Some(item_id);
        self
    }

    pub fn location_id(mut self, location_id: LocationId) -> Self {
        self.location_id = Some(location_id);
        self
    }

    pub fn line_item_id(mut self, line_item_id: LineItemId) -> Self {
        self.line_item_id = Some(line_item_id);
        self
    }

    pub fn expires_before(mut self, instant: DateTime<Utc>) -> Self {
        self.expires_before = Some(instant);
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn matches(&self, reservation: &ReservationItem) -> bool {
        if let Some(ref external_id) = self.external_id
            && reservation.external_id.as_ref() != Some(external_id)
        {
            return false;
        }
        if let Some(item_id) = self.inventory_item_id
            && reservation.inventory_item_id != item_id
        {
            return false;
        }
        if let Some(location_id) = self.location_id
            && reservation.location_id != location_id
        {
            return false;
        }
        if let Some(ref line_item_id) = self.line_item_id
            && reservation.line_item_id.as_ref() != Some(line_item_id)
        {
            return false;
        }
        if let Some(instant) = self.expires_before {
            match reservation.expires_at {
                Some(expires_at) if expires_at < instant => {}
                _ => return false,
            }
        }
        true
    }
}

/// Filter for reading the movement log.
#[derive(Debug, Clone, Default)]
pub struct MovementQuery {
    pub inventory_item_id: Option<ItemId>,
    pub location_id: Option<LocationId>,
    pub reservation_id: Option<ReservationId>,
    pub limit: Option<usize>,
}

impl MovementQuery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn inventory_item_id(mut self, item_id: ItemId) -> Self {
        self.inventory_item_id = Some(item_id);
        self
    }

    pub fn location_id(mut self, location_id: LocationId) -> Self {
        self.location_id = Some(location_id);
        self
    }

    pub fn reservation_id(mut self, reservation_id: ReservationId) -> Self {
        self.reservation_id = Some(reservation_id);
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn matches(&self, movement: &StockMovement) -> bool {
        if let Some(item_id) = self.inventory_item_id
            && movement.inventory_item_id != item_id
        {
            return false;
        }
        if let Some(location_id) = self.location_id
            && movement.location_id != location_id
        {
            return false;
        }
        if let Some(reservation_id) = self.reservation_id
            && movement.reservation_id != Some(reservation_id)
        {
            return false;
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn item_query_filters_by_sku_and_variant() {
        let item = InventoryItem::new("SKU-1").with_variant(VariantId::new("v1"));

        assert!(ItemQuery::new().matches(&item));
        assert!(ItemQuery::new().sku("SKU-1").matches(&item));
        assert!(!ItemQuery::new().sku("SKU-2").matches(&item));
        assert!(ItemQuery::new().variant_id(VariantId::new("v1")).matches(&item));
        assert!(!ItemQuery::new().variant_id(VariantId::new("v2")).matches(&item));
    }

    #[test]
    fn unpaginated_drops_limit_and_offset() {
        let query = ItemQuery::new().sku("A").limit(10).offset(20).unpaginated();
        assert_eq!(query.limit, None);
        assert_eq!(query.offset, None);
        assert_eq!(query.sku.as_deref(), Some("A"));
    }

    #[test]
    fn reservation_query_expiry_excludes_open_ended_holds() {
        let now = Utc::now();
        let mut reservation = ReservationItem::new(ItemId::new(), LocationId::new(), 1);
        let query = ReservationQuery::new().expires_before(now);

        assert!(!query.matches(&reservation));

        reservation.expires_at = Some(now - chrono::Duration::minutes(5));
        assert!(query.matches(&reservation));

        reservation.expires_at = Some(now + chrono::Duration::minutes(5));
        assert!(!query.matches(&reservation));
    }

    #[test]
    fn level_query_accumulates_locations() {
        let a = LocationId::new();
        let b = LocationId::new();
        let query = LevelQuery::new().location_id(a).location_id(b);
        assert_eq!(query.location_ids, Some(vec![a, b]));
    }
}
