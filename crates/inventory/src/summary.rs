//! Read models assembled by the service.

use ledger_store::{InventoryItem, InventoryLevel, ReservationItem};
use serde::{Deserialize, Serialize};

use crate::error::{InventoryError, Result};

/// An item annotated with its levels and quantity totals across them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InventoryItemSummary {
    #[serde(flatten)]
    pub item: InventoryItem,
    pub levels: Vec<InventoryLevel>,
    pub total_stocked: i64,
    pub total_reserved: i64,
    pub total_available: i64,
}

impl InventoryItemSummary {
    pub fn new(item: InventoryItem, levels: Vec<InventoryLevel>) -> Result<Self> {
        let total_stocked = total(&levels, |l| l.stocked_quantity)?;
        let total_reserved = total(&levels, |l| l.reserved_quantity)?;
        let total_available = total(&levels, |l| l.available_quantity)?;
        Ok(Self {
            item,
            levels,
            total_stocked,
            total_reserved,
            total_available,
        })
    }
}

/// Sums one quantity across levels, refusing totals outside the `i64` range.
pub(crate) fn total(levels: &[InventoryLevel], quantity: fn(&InventoryLevel) -> i64) -> Result<i64> {
    levels.iter().map(quantity).try_fold(0i64, |sum, q| {
        sum.checked_add(q).ok_or_else(|| {
            InventoryError::Validation("quantity total exceeds the supported range".to_string())
        })
    })
}

/// A reservation that was released or confirmed, with the level it left.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResolvedReservation {
    pub reservation: ReservationItem,
    pub inventory_level: InventoryLevel,
}
