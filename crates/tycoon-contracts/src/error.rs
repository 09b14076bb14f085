//! Error types for the `tycoon-contracts` crate.

use rust_decimal::Decimal;
use tycoon_factory::FactoryError;
use tycoon_ledger::LedgerError;
use tycoon_types::{ContractId, ContractStatus, FactoryId};

/// Errors raised while drafting, sending, accepting or rejecting.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum NegotiationError {
    /// A draft or proposal already occupies the slot this request needs.
    #[error("negotiation already in progress for {factory}")]
    NegotiationInProgress {
        /// Factory whose slot is occupied.
        factory: FactoryId,
    },

    /// Both parties are the same factory.
    #[error("a factory cannot contract with itself ({0})")]
    InvalidCounterparty(FactoryId),

    /// There is no draft to edit, send or cancel.
    #[error("no contract draft in progress")]
    NoDraft,

    /// The factory has no proposal waiting in its inbox.
    #[error("no pending proposal for {0}")]
    NoPendingProposal(FactoryId),

    /// The deadline is not after the current turn.
    #[error("deadline {deadline} is not after current turn {turn}")]
    DeadlineElapsed {
        /// Proposed deadline.
        deadline: u64,
        /// Current turn.
        turn: u64,
    },

    /// Neither party owes anything.
    #[error("proposal has no terms")]
    EmptyProposal,

    /// A term quantity is zero or negative.
    #[error("term quantity must be positive, got {quantity}")]
    InvalidQuantity {
        /// The offending quantity.
        quantity: Decimal,
    },

    /// A term quantity is finer than the settlement precision.
    #[error("term quantity {quantity} is finer than the settlement precision")]
    ExcessPrecision {
        /// The offending quantity.
        quantity: Decimal,
    },

    /// The factory has no proposal outstanding in anyone's inbox.
    #[error("no outgoing proposal from {0}")]
    NoOutgoingProposal(FactoryId),

    /// Checked arithmetic overflowed.
    #[error("arithmetic overflow: {context}")]
    ArithmeticOverflow {
        /// What was being computed.
        context: &'static str,
    },
}

/// Errors raised while settling a contract.
#[derive(Debug, thiserror::Error)]
pub enum SettlementError {
    /// A party is not in the factory map.
    #[error("unknown factory: {0}")]
    UnknownFactory(FactoryId),

    /// Only active contracts can be settled.
    #[error("contract {contract} is {status:?}, not active")]
    NotActive {
        /// The contract.
        contract: ContractId,
        /// Its current status.
        status: ContractStatus,
    },

    /// Settlement was requested on a turn other than the deadline.
    #[error("contract {contract} is due on turn {deadline}, not {turn}")]
    NotDue {
        /// The contract.
        contract: ContractId,
        /// Its deadline.
        deadline: u64,
        /// The turn settlement was requested on.
        turn: u64,
    },

    /// A balance movement failed.
    #[error("factory error: {0}")]
    Factory(#[from] FactoryError),

    /// Journaling a transfer failed.
    #[error("ledger error: {0}")]
    Ledger(#[from] LedgerError),
}
