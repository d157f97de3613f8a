//! Lifecycle events produced by the order and catalog systems.

use common::{LineItemId, OrderId, VariantId};
use serde::{Deserialize, Serialize};

/// An event this subsystem consumes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum LifecycleEvent {
    /// An order was placed and its lines need holds.
    OrderPlaced(PlacedOrder),

    /// An order was canceled; its holds are released.
    OrderCanceled { order_id: OrderId },

    /// An order shipped; its holds are consumed.
    OrderFulfilled { order_id: OrderId },

    /// A catalog variant was created or edited.
    VariantUpdated(CatalogVariant),
}

impl LifecycleEvent {
    pub fn event_type(&self) -> &'static str {
        match self {
            LifecycleEvent::OrderPlaced(_) => "OrderPlaced",
            LifecycleEvent::OrderCanceled { .. } => "OrderCanceled",
            LifecycleEvent::OrderFulfilled { .. } => "OrderFulfilled",
            LifecycleEvent::VariantUpdated(_) => "VariantUpdated",
        }
    }

    pub fn order_canceled(order_id: OrderId) -> Self {
        LifecycleEvent::OrderCanceled { order_id }
    }

    pub fn order_fulfilled(order_id: OrderId) -> Self {
        LifecycleEvent::OrderFulfilled { order_id }
    }
}

/// A placed order with its resolvable line items.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlacedOrder {
    pub id: OrderId,
    #[serde(default)]
    pub items: Vec<LineItem>,
}

impl PlacedOrder {
    pub fn new(id: OrderId) -> Self {
        Self {
            id,
            items: Vec::new(),
        }
    }

    pub fn with_item(mut self, item: LineItem) -> Self {
        self.items.push(item);
        self
    }
}

/// One order line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineItem {
    pub id: LineItemId,
    /// Lines without a variant (e.g. custom items) are not stock-tracked.
    #[serde(default)]
    pub variant_id: Option<VariantId>,
    #[serde(default)]
    pub title: String,
    pub quantity: i64,
}

impl LineItem {
    pub fn new(id: LineItemId, variant_id: Option<VariantId>, quantity: i64) -> Self {
        Self {
            id,
            variant_id,
            title: String::new(),
            quantity,
        }
    }
}

/// A catalog variant as published by the catalog.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogVariant {
    pub id: VariantId,
    pub sku: String,
    #[serde(default)]
    pub title: Option<String>,
}
