//! Error types for the `tycoon-catalog` crate.

use rust_decimal::Decimal;
use tycoon_types::{BuildingId, ResourceId};

/// Errors raised while building or querying the catalog.
#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    /// No building type is registered under this id.
    #[error("unknown building type: {0}")]
    UnknownBuildingType(BuildingId),

    /// No building type is registered under this name.
    #[error("unknown building type name: {0}")]
    UnknownBuildingName(String),

    /// No resource kind is registered under this name.
    #[error("unknown resource: {0}")]
    UnknownResourceName(String),

    /// A building references a resource id that was never registered.
    #[error("building {building} references unknown {resource}")]
    InvalidResourceRef {
        /// The offending building.
        building: String,
        /// The unregistered resource id.
        resource: ResourceId,
    },

    /// A resource or building name was registered twice.
    #[error("duplicate catalog name: {0}")]
    DuplicateName(String),

    /// A building has a negative production rate.
    #[error("building {building} has negative production rate {rate}")]
    NegativeRate {
        /// The offending building.
        building: String,
        /// The rejected rate.
        rate: Decimal,
    },

    /// A cost line has a zero or negative quantity.
    #[error("building {building} has non-positive cost quantity {quantity}")]
    NonPositiveCost {
        /// The offending building.
        building: String,
        /// The rejected quantity.
        quantity: Decimal,
    },

    /// A rate or cost quantity is finer than the settlement precision.
    #[error("building {building} uses {quantity}, finer than the settlement precision")]
    ExcessPrecision {
        /// The offending building.
        building: String,
        /// The rejected rate or cost quantity.
        quantity: Decimal,
    },

    /// A building costs `NullResource`, which can never be held.
    #[error("building {building} lists NullResource as a cost")]
    NullCost {
        /// The offending building.
        building: String,
    },

    /// A building outputs `NullResource` at a non-zero rate.
    #[error("building {building} produces NullResource at a non-zero rate")]
    NullOutputRate {
        /// The offending building.
        building: String,
    },

    /// More than `u16::MAX` entries of one kind were registered.
    #[error("catalog entry limit exceeded")]
    TooManyEntries,

    /// Catalog data could not be parsed.
    #[error("failed to parse catalog YAML: {source}")]
    Yaml {
        /// The underlying YAML parse error.
        #[from]
        source: serde_yml::Error,
    },
}
