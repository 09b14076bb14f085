//! Factory balance sheets and the resource movement journal.
//!
//! # Architecture
//!
//! - [`balances`] -- [`Balances`]: one spendable balance per resource kind.
//! - [`journal`] -- [`Journal`]: append-only record of every movement, built
//!   through the validating [`EntryBuilder`].
//! - [`conservation`] -- per-turn check that factory-to-factory transfers
//!   balance.
//!
//! # Movement types
//!
//! | Type | From (debit) | To (credit) |
//! |------|-------------|-------------|
//! | Grant | World | Factory |
//! | Collection | World | Factory |
//! | Purchase | Factory | Void |
//! | `ContractTransfer` | Factory | Factory |
//!
//! Only `ContractTransfer` is an internal movement. For every turn T and
//! resource R, the sum debited from factories by contract transfers equals
//! the sum credited to factories.

pub mod balances;
pub mod conservation;
pub mod journal;

pub use balances::{Balances, Shortfall};
pub use conservation::{ConservationResult, verify_conservation};
pub use journal::{Account, EntryBuilder, EntryType, Journal, JournalEntry};

use std::collections::BTreeMap;

use rust_decimal::Decimal;
use tycoon_types::ResourceId;

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// Errors raised by balance and journal operations.
#[derive(Debug, thiserror::Error)]
pub enum LedgerError {
    /// Quantity must be strictly positive.
    #[error("ledger quantity must be non-zero")]
    ZeroQuantity,

    /// Quantity must not be negative.
    #[error("ledger quantity must be positive, got {quantity}")]
    NegativeQuantity {
        /// The invalid quantity.
        quantity: Decimal,
    },

    /// A required builder field was not set.
    #[error("missing required field: {0}")]
    MissingField(&'static str),

    /// The accounts do not match the expected kinds for the entry type.
    #[error("invalid account for {entry_type:?} {side}: expected {expected}, got {actual}")]
    InvalidAccount {
        /// The entry type being validated.
        entry_type: EntryType,
        /// Which side of the entry ("from" or "to").
        side: &'static str,
        /// The expected account kind.
        expected: &'static str,
        /// The actual account kind.
        actual: &'static str,
    },

    /// The balance sheet has no entry for this resource.
    #[error("no balance entry for {0}")]
    UnknownResource(ResourceId),

    /// A debit exceeds the available balance.
    #[error("insufficient {resource}: requested {requested}, available {available}")]
    Insufficient {
        /// The resource being debited.
        resource: ResourceId,
        /// The requested quantity.
        requested: Decimal,
        /// The balance at the time of the request.
        available: Decimal,
    },

    /// Checked arithmetic overflowed.
    #[error("arithmetic overflow: {context}")]
    ArithmeticOverflow {
        /// What was being computed.
        context: &'static str,
    },

    /// An internal error that should not occur in normal operation.
    #[error("internal ledger error: {0}")]
    InternalError(&'static str),
}

// ---------------------------------------------------------------------------
// Anomaly type
// ---------------------------------------------------------------------------

/// A conservation violation found by [`verify_conservation`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LedgerAnomaly {
    /// The turn that failed the check.
    pub turn: u64,
    /// Per-resource `(debit_total, credit_total)` for every imbalance.
    pub imbalances: BTreeMap<ResourceId, (Decimal, Decimal)>,
    /// Human-readable description.
    pub message: String,
}

impl core::fmt::Display for LedgerAnomaly {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}", self.message)
    }
}
