use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Declares a UUID-backed identifier for a record owned by the ledger.
macro_rules! uuid_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(Uuid);

        impl $name {
            /// Creates a new random identifier.
            pub fn new() -> Self {
                Self(Uuid::new_v4())
            }

            /// Creates an identifier from an existing UUID.
            pub fn from_uuid(uuid: Uuid) -> Self {
                Self(uuid)
            }

            /// Returns the underlying UUID.
            pub fn as_uuid(&self) -> Uuid {
                self.0
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl std::str::FromStr for $name {
            type Err = uuid::Error;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Uuid::parse_str(s).map(Self)
            }
        }

        impl From<Uuid> for $name {
            fn from(uuid: Uuid) -> Self {
                Self(uuid)
            }
        }

        impl From<$name> for Uuid {
            fn from(id: $name) -> Self {
                id.0
            }
        }
    };
}

/// Declares an opaque identifier issued by a system outside the ledger.
macro_rules! external_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Wraps an externally issued identifier.
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            /// Returns the identifier as a string slice.
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<String> for $name {
            fn from(s: String) -> Self {
                Self(s)
            }
        }

        impl From<&str> for $name {
            fn from(s: &str) -> Self {
                Self(s.to_string())
            }
        }
    };
}

uuid_id!(
    /// Identifier of an inventory item.
    ItemId
);
uuid_id!(
    /// Identifier of an inventory location.
    LocationId
);
uuid_id!(
    /// Identifier of an inventory level row.
    LevelId
);
uuid_id!(
    /// Identifier of a reservation (an active hold).
    ReservationId
);
uuid_id!(
    /// Identifier of a stock movement log entry.
    MovementId
);
uuid_id!(
    /// Identifier of a compensable inventory transaction.
    SagaId
);

external_id!(
    /// Catalog variant identifier, owned by the product catalog.
    VariantId
);
external_id!(
    /// Order identifier, owned by the order lifecycle.
    OrderId
);
external_id!(
    /// Order line item identifier.
    LineItemId
);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn uuid_ids_are_unique() {
        assert_ne!(ItemId::new(), ItemId::new());
        assert_ne!(ReservationId::new(), ReservationId::new());
    }

    #[test]
    fn from_uuid_preserves_value() {
        let uuid = Uuid::new_v4();
        assert_eq!(LocationId::from_uuid(uuid).as_uuid(), uuid);
    }

    #[test]
    fn parse_from_str() {
        let id = ItemId::new();
        let parsed: ItemId = id.to_string().parse().unwrap();
        assert_eq!(parsed, id);
        assert!("not-a-uuid".parse::<ItemId>().is_err());
    }

    #[test]
    fn ids_serialize_transparently() {
        let id = ReservationId::new();
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, format!("\"{id}\""));

        let order = OrderId::new("order_01");
        assert_eq!(serde_json::to_string(&order).unwrap(), "\"order_01\"");
        let back: OrderId = serde_json::from_str("\"order_01\"").unwrap();
        assert_eq!(back, order);
    }
}
