//! Quantity transitions of an inventory level.

use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::record::InventoryLevel;
use crate::{LedgerStoreError, Result};

/// Kind of a recorded stock movement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MovementKind {
    /// Stock received.
    In,
    /// Reserved stock consumed by fulfillment.
    Out,
    /// Signed count correction.
    Adjustment,
    /// Quantity put on hold.
    Reserved,
    /// Hold abandoned.
    Released,
}

impl MovementKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            MovementKind::In => "in",
            MovementKind::Out => "out",
            MovementKind::Adjustment => "adjustment",
            MovementKind::Reserved => "reserved",
            MovementKind::Released => "released",
        }
    }
}

impl std::fmt::Display for MovementKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for MovementKind {
    type Err = LedgerStoreError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "in" => Ok(MovementKind::In),
            "out" => Ok(MovementKind::Out),
            "adjustment" => Ok(MovementKind::Adjustment),
            "reserved" => Ok(MovementKind::Reserved),
            "released" => Ok(MovementKind::Released),
            other => Err(LedgerStoreError::InvalidRecord(format!(
                "unknown movement kind '{other}'"
            ))),
        }
    }
}

/// A requested quantity transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "quantity")]
pub enum Movement {
    /// `stocked += q`.
    In(i64),
    /// `stocked -= q` and `reserved -= q`, each floored at zero.
    Out(i64),
    /// `stocked += delta`, never dropping below the reserved quantity.
    Adjustment(i64),
    /// `reserved += q` when at least `q` units are available.
    Reserved(i64),
    /// `reserved -= q`, floored at zero.
    Released(i64),
}

impl Movement {
    pub fn kind(&self) -> MovementKind {
        match self {
            Movement::In(_) => MovementKind::In,
            Movement::Out(_) => MovementKind::Out,
            Movement::Adjustment(_) => MovementKind::Adjustment,
            Movement::Reserved(_) => MovementKind::Reserved,
            Movement::Released(_) => MovementKind::Released,
        }
    }

    /// Picks `In` for a positive delta and `Adjustment` otherwise.
    pub fn for_delta(delta: i64) -> Self {
        if delta > 0 {
            Movement::In(delta)
        } else {
            Movement::Adjustment(delta)
        }
    }
}

impl InventoryLevel {
    /// The single transition function for level quantities.
    ///
    /// Returns the level after the movement. Only `Reserved` can be refused
    /// for lack of stock; shrinking movements clamp instead of failing.
    pub fn apply(&self, movement: Movement) -> Result<InventoryLevel> {
        let mut next = self.clone();
        match movement {
            Movement::In(quantity) => {
                non_negative(movement, quantity)?;
                next.stocked_quantity = checked_stocked(self, quantity)?;
            }
            Movement::Out(quantity) => {
                non_negative(movement, quantity)?;
                next.stocked_quantity = (next.stocked_quantity - quantity).max(0);
                next.reserved_quantity = (next.reserved_quantity - quantity).max(0);
            }
            Movement::Adjustment(delta) => {
                let floor = next.reserved_quantity.max(0);
                next.stocked_quantity = checked_stocked(self, delta)?.max(floor);
            }
            Movement::Reserved(quantity) => {
                if quantity <= 0 {
                    return Err(LedgerStoreError::InvariantViolation(format!(
                        "reservation quantity must be positive, got {quantity}"
                    )));
                }
                if self.available_quantity < quantity {
                    return Err(LedgerStoreError::InsufficientInventory {
                        item_id: self.inventory_item_id,
                        location_id: self.location_id,
                        available: self.available_quantity,
                        requested: quantity,
                    });
                }
                next.reserved_quantity += quantity;
            }
            Movement::Released(quantity) => {
                non_negative(movement, quantity)?;
                next.reserved_quantity = (next.reserved_quantity - quantity).max(0);
            }
        }
        next.available_quantity = next.stocked_quantity - next.reserved_quantity;
        next.updated_at = Utc::now();
        next.check_invariant()?;
        Ok(next)
    }
}

fn checked_stocked(level: &InventoryLevel, delta: i64) -> Result<i64> {
    level.stocked_quantity.checked_add(delta).ok_or_else(|| {
        LedgerStoreError::InvariantViolation(format!(
            "stocked quantity {} cannot grow by {delta}",
            level.stocked_quantity
        ))
    })
}

fn non_negative(movement: Movement, quantity: i64) -> Result<()> {
    if quantity < 0 {
        return Err(LedgerStoreError::InvariantViolation(format!(
            "{} movement quantity must not be negative, got {quantity}",
            movement.kind()
        )));
    }
    Ok(())
}
