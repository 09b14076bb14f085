//! Enumeration types shared across the workspace.

use serde::{Deserialize, Serialize};

/// Lifecycle of a contract.
///
/// `Draft` and `Pending` are negotiation states held by the negotiation
/// desk; `Active` and `Settled` are held in the authoritative contract list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum ContractStatus {
    /// Being edited by the proposer; invisible to the counterparty.
    Draft,
    /// Sitting in the recipient's inbox awaiting accept or reject.
    Pending,
    /// Accepted; the deadline is enforced.
    Active,
    /// Terminal. Settlement has run exactly once.
    Settled,
}

impl ContractStatus {
    /// Whether a contract in this state is shown to its parties.
    pub const fn is_visible(self) -> bool {
        matches!(self, Self::Pending | Self::Active)
    }
}

/// One side of a contract. Party A is the proposer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Party {
    /// The proposing factory.
    A,
    /// The receiving factory.
    B,
}

impl Party {
    /// The opposite party.
    pub const fn other(self) -> Self {
        match self {
            Self::A => Self::B,
            Self::B => Self::A,
        }
    }
}
