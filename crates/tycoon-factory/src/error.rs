//! Error types for the `tycoon-factory` crate.

use rust_decimal::Decimal;
use tycoon_ledger::LedgerError;
use tycoon_types::{BuildingId, ResourceId};

/// Errors raised by factory operations.
#[derive(Debug, thiserror::Error)]
pub enum FactoryError {
    /// The factory is serving a blocking penalty.
    #[error("factory is blocked for {turns} more turn(s)")]
    FactoryBlocked {
        /// Remaining penalty turns.
        turns: u32,
    },

    /// The building id is not in the catalog.
    #[error("unknown building type: {0}")]
    UnknownBuildingType(BuildingId),

    /// The building type exists but players may not buy it.
    #[error("building type {name} cannot be purchased")]
    NotPurchasable {
        /// Name of the building type.
        name: String,
    },

    /// Every slot is occupied.
    #[error("factory is at capacity ({capacity} units)")]
    CapacityExceeded {
        /// The factory's unit capacity.
        capacity: usize,
    },

    /// A cost line is not covered by the balance sheet.
    #[error("insufficient {resource}: need {required}, have {available}")]
    InsufficientResources {
        /// The resource that is short.
        resource: ResourceId,
        /// Total required of that resource.
        required: Decimal,
        /// Balance held.
        available: Decimal,
    },

    /// A balance operation failed.
    #[error("ledger error: {0}")]
    Ledger(#[from] LedgerError),

    /// Checked arithmetic overflowed.
    #[error("arithmetic overflow: {context}")]
    ArithmeticOverflow {
        /// What was being computed.
        context: &'static str,
    },
}
