//! Player factories for the Tycoon economy.
//!
//! A [`Factory`] owns a bounded list of production units and a balance
//! sheet with one entry per resource kind. It exposes the purchase,
//! production tick and collection operations, and carries the blocking
//! penalty counter that stops it from producing or purchasing after a
//! contract default.
//!
//! Factories take the [`Catalog`](tycoon_catalog::Catalog) explicitly on
//! every operation that needs building data; they never hold a reference
//! to it.

pub mod error;
pub mod factory;
pub mod report;

pub use error::FactoryError;
pub use factory::{Factory, PurchaseReceipt};
pub use report::{FactoryReport, UnitRow};
