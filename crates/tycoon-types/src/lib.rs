//! Shared type definitions for the Tycoon factory economy.
//!
//! # Modules
//!
//! - [`ids`] -- UUID newtypes for runtime entities and index ids for catalog
//!   entries
//! - [`enums`] -- Contract lifecycle and party tags
//! - [`quantity`] -- Decimal terms and the settlement rounding rule

pub mod enums;
pub mod ids;
pub mod quantity;

pub use enums::{ContractStatus, Party};
pub use ids::{BuildingId, ContractId, FactoryId, JournalEntryId, ResourceId, UnitId};
pub use quantity::{SETTLEMENT_PRECISION, Term, covers, within_precision};
