//! Error types for the `tycoon-core` crate.
//!
//! Setup failures are [`GameError`]; failures of a player command are
//! [`CommandError`]. Every command failure leaves the game unchanged.

use tycoon_catalog::CatalogError;
use tycoon_contracts::{NegotiationError, SettlementError};
use tycoon_factory::FactoryError;
use tycoon_ledger::LedgerError;
use tycoon_types::{FactoryId, ResourceId};

/// Errors raised while loading or validating configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to read the configuration file from disk.
    #[error("failed to read config file: {source}")]
    Io {
        /// The underlying I/O error.
        #[from]
        source: std::io::Error,
    },

    /// Failed to parse YAML content.
    #[error("failed to parse config YAML: {source}")]
    Yaml {
        /// The underlying YAML parse error.
        source: serde_yml::Error,
    },

    /// The inline catalog is invalid.
    #[error("invalid catalog: {0}")]
    Catalog(#[from] CatalogError),

    /// A value is out of range or a name does not resolve.
    #[error("invalid configuration: {reason}")]
    Invalid {
        /// What is wrong.
        reason: String,
    },
}

impl From<serde_yml::Error> for ConfigError {
    fn from(source: serde_yml::Error) -> Self {
        Self::Yaml { source }
    }
}

/// Errors raised by turn bookkeeping.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TurnError {
    /// A game needs at least one seat.
    #[error("turn order has no players")]
    NoPlayers,

    /// The turn counter would overflow.
    #[error("turn counter overflow")]
    TurnOverflow,
}

/// Errors raised while setting up a game.
#[derive(Debug, thiserror::Error)]
pub enum GameError {
    /// Configuration is invalid.
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Turn state could not be created.
    #[error("turn error: {0}")]
    Turn(#[from] TurnError),

    /// A starting grant or fixture failed.
    #[error("factory setup error: {0}")]
    Factory(#[from] FactoryError),

    /// Journaling a starting grant failed.
    #[error("ledger error: {0}")]
    Ledger(#[from] LedgerError),
}

/// Errors returned by the command surface.
#[derive(Debug, thiserror::Error)]
pub enum CommandError {
    /// The factory id is not part of this game.
    #[error("unknown factory: {0}")]
    UnknownFactory(FactoryId),

    /// The resource id is unknown or the null resource.
    #[error("unknown resource: {0}")]
    UnknownResource(ResourceId),

    /// The request came from a factory whose seat is not current.
    #[error("not {factory}'s turn; current seat belongs to {current}")]
    NotYourTurn {
        /// The requesting factory.
        factory: FactoryId,
        /// The factory whose turn it is.
        current: FactoryId,
    },

    /// A factory operation was rejected. Covers blocked factories, unknown
    /// or unbuyable building types, full factories and unaffordable costs.
    #[error(transparent)]
    Factory(#[from] FactoryError),

    /// A negotiation step was rejected.
    #[error(transparent)]
    Negotiation(#[from] NegotiationError),

    /// Settlement failed during a turn advance.
    #[error(transparent)]
    Settlement(#[from] SettlementError),

    /// Turn bookkeeping failed.
    #[error(transparent)]
    Turn(#[from] TurnError),

    /// Journaling failed.
    #[error(transparent)]
    Ledger(#[from] LedgerError),
}
