//! Type-safe identifiers.
//!
//! Runtime entities (factories, contracts, production units, journal
//! entries) get UUID v7 newtypes so they can never be mixed up at compile
//! time. Catalog entries are addressed by compact index ids assigned in
//! registration order when the catalog is built.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Generates a newtype wrapper around [`Uuid`] with standard derives.
macro_rules! define_id {
    (
        $(#[$meta:meta])*
        $name:ident
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        pub struct $name(pub Uuid);

        impl $name {
            /// Create a new identifier using UUID v7 (time-ordered).
            pub fn new() -> Self {
                Self(Uuid::now_v7())
            }

            /// Return the inner [`Uuid`] value.
            pub const fn into_inner(self) -> Uuid {
                self.0
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl core::fmt::Display for $name {
            fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<Uuid> for $name {
            fn from(id: Uuid) -> Self {
                Self(id)
            }
        }

        impl From<$name> for Uuid {
            fn from(id: $name) -> Self {
                id.0
            }
        }
    };
}

define_id! {
    /// Unique identifier for a player's factory.
    FactoryId
}

define_id! {
    /// Unique identifier for a contract between two factories.
    ContractId
}

define_id! {
    /// Unique identifier for a purchased production unit.
    UnitId
}

define_id! {
    /// Unique identifier for a journal entry (resource movement record).
    JournalEntryId
}

/// Index of a resource kind in the catalog. Id 0 is always the
/// `NullResource` sentinel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ResourceId(pub u16);

impl ResourceId {
    /// The placeholder output of non-producing slots.
    pub const NULL: Self = Self(0);

    /// Whether this is the `NullResource` sentinel.
    pub const fn is_null(self) -> bool {
        self.0 == 0
    }
}

impl core::fmt::Display for ResourceId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "resource#{}", self.0)
    }
}

/// Index of a building type in the catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct BuildingId(pub u16);

impl core::fmt::Display for BuildingId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "building#{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn uuid_ids_are_unique() {
        let a = FactoryId::new();
        let b = FactoryId::new();
        assert_ne!(a, b);
        assert_ne!(a.into_inner(), Uuid::nil());
    }

    #[test]
    fn id_roundtrip_serde() {
        let original = ContractId::new();
        let json = serde_json::to_string(&original).ok();
        assert!(json.is_some());
        let restored: Result<ContractId, _> =
            serde_json::from_str(json.as_deref().unwrap_or(""));
        assert_eq!(restored.ok(), Some(original));
    }

    #[test]
    fn null_resource_is_index_zero() {
        assert!(ResourceId::NULL.is_null());
        assert!(!ResourceId(1).is_null());
    }

    #[test]
    fn id_display_matches_uuid() {
        let id = UnitId::new();
        assert_eq!(id.to_string(), id.into_inner().to_string());
    }
}
