//! Inputs accepted by the inventory service.

use chrono::{DateTime, Utc};
use ledger_store::{ItemId, LevelUpdate, LineItemId, LocationId, OrderId, VariantId};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Input for creating an inventory item.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CreateInventoryItem {
    /// Required; a missing or blank SKU is rejected.
    #[serde(default)]
    pub sku: String,

    #[serde(default)]
    pub variant_id: Option<VariantId>,

    #[serde(default)]
    pub title: Option<String>,

    #[serde(default)]
    pub thumbnail: Option<String>,

    #[serde(default)]
    pub requires_shipping: Option<bool>,

    #[serde(default)]
    pub metadata: Option<Value>,
}

impl CreateInventoryItem {
    pub fn new(sku: impl Into<String>) -> Self {
        Self {
            sku: sku.into(),
            ..Default::default()
        }
    }

    pub fn with_variant(mut self, variant_id: VariantId) -> Self {
        self.variant_id = Some(variant_id);
        self
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }
}

/// Input for creating a location.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateLocation {
    pub name: String,
    pub code: String,
    #[serde(default)]
    pub address: Option<String>,
}

impl CreateLocation {
    pub fn new(name: impl Into<String>, code: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            code: code.into(),
            address: None,
        }
    }
}

/// Input for creating the level of an (item, location) pair.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct CreateInventoryLevel {
    pub inventory_item_id: ItemId,
    pub location_id: LocationId,
    pub stocked_quantity: i64,
    #[serde(default)]
    pub reserved_quantity: i64,
    #[serde(default)]
    pub incoming_quantity: i64,
}

impl CreateInventoryLevel {
    pub fn new(inventory_item_id: ItemId, location_id: LocationId, stocked_quantity: i64) -> Self {
        Self {
            inventory_item_id,
            location_id,
            stocked_quantity,
            reserved_quantity: 0,
            incoming_quantity: 0,
        }
    }
}

/// Partial quantity update of an existing level.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct UpdateInventoryLevel {
    pub inventory_item_id: ItemId,
    pub location_id: LocationId,
    #[serde(default)]
    pub stocked_quantity: Option<i64>,
    #[serde(default)]
    pub reserved_quantity: Option<i64>,
    #[serde(default)]
    pub incoming_quantity: Option<i64>,
}

impl UpdateInventoryLevel {
    pub fn stocked(inventory_item_id: ItemId, location_id: LocationId, quantity: i64) -> Self {
        Self {
            inventory_item_id,
            location_id,
            stocked_quantity: Some(quantity),
            reserved_quantity: None,
            incoming_quantity: None,
        }
    }

    pub fn quantities(&self) -> LevelUpdate {
        LevelUpdate {
            stocked_quantity: self.stocked_quantity,
            reserved_quantity: self.reserved_quantity,
            incoming_quantity: self.incoming_quantity,
        }
    }
}

/// A signed stock adjustment of one level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdjustInventory {
    pub inventory_item_id: ItemId,
    pub location_id: LocationId,
    pub delta: i64,
}

impl AdjustInventory {
    pub fn new(inventory_item_id: ItemId, location_id: LocationId, delta: i64) -> Self {
        Self {
            inventory_item_id,
            location_id,
            delta,
        }
    }
}

/// Input for placing a hold on a level.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateReservation {
    pub inventory_item_id: ItemId,
    pub location_id: LocationId,
    pub quantity: i64,

    #[serde(default)]
    pub line_item_id: Option<LineItemId>,

    /// Correlates the hold with an external order.
    #[serde(default)]
    pub external_id: Option<OrderId>,

    #[serde(default)]
    pub description: Option<String>,

    #[serde(default)]
    pub created_by: Option<String>,

    /// Informational; holds never expire on their own.
    #[serde(default)]
    pub expires_at: Option<DateTime<Utc>>,

    #[serde(default)]
    pub metadata: Option<Value>,
}

impl CreateReservation {
    pub fn new(inventory_item_id: ItemId, location_id: LocationId, quantity: i64) -> Self {
        Self {
            inventory_item_id,
            location_id,
            quantity,
            line_item_id: None,
            external_id: None,
            description: None,
            created_by: None,
            expires_at: None,
            metadata: None,
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

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn expires_at(mut self, instant: DateTime<Utc>) -> Self {
        self.expires_at = Some(instant);
        self
    }
}
