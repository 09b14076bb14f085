//! Bilateral contracts between factories.
//!
//! # Lifecycle
//!
//! ```text
//! Draft --send--> Pending --accept--> Active --deadline--> Settled
//!   |                |
//!   cancel           reject, withdraw, expire
//! ```
//!
//! - [`negotiation`] -- the [`NegotiationDesk`]: one session-wide draft slot
//!   and one inbox slot per recipient. Competing proposals are rejected,
//!   never queued or overwritten.
//! - [`book`] -- the [`ContractBook`]: every accepted contract, kept after
//!   settlement.
//! - [`settlement`] -- [`settle`]: the one-shot exchange at the deadline,
//!   with blocking penalties for defaults.
//! - [`contract`] -- the [`Contract`] record and its read-only
//!   [`ContractView`] projection.

pub mod book;
pub mod contract;
pub mod error;
pub mod negotiation;
pub mod settlement;

pub use book::{ContractBook, DueSettlements};
pub use contract::{Contract, ContractView};
pub use error::{NegotiationError, SettlementError};
pub use negotiation::NegotiationDesk;
pub use settlement::{ContractDefaulted, SettlementReport, Transfer, settle};
