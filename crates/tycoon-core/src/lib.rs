//! Turn controller and game surface for the Tycoon economy.
//!
//! # Modules
//!
//! - [`config`] -- typed YAML configuration (`tycoon-config.yaml`).
//! - [`turn`] -- [`TurnState`]: turn counter, round-robin seat, completed
//!   rounds.
//! - [`game`] -- [`Game`]: the single object every command and query goes
//!   through. It owns the factories, the negotiation desk, the contract
//!   book and the journal.
//! - [`report`] -- [`TurnReport`]: what one turn advance did.
//! - [`error`] -- setup and command errors.
//!
//! # Turn cycle
//!
//! Each [`Game::request_advance_turn`] call:
//!
//! 1. Advances the turn and moves the seat to the next player.
//! 2. Discards any unsent draft.
//! 3. If the seat wrapped to 0 (a round completed): blocked factories serve
//!    one penalty turn and skip production; every other factory ticks and
//!    collects.
//! 4. Settles every active contract whose deadline is the new turn.
//! 5. Checks that the turn's contract transfers balance.

pub mod config;
pub mod error;
pub mod game;
pub mod report;
pub mod turn;

pub use config::GameConfig;
pub use error::{CommandError, ConfigError, GameError, TurnError};
pub use game::{BuildableEntry, Game};
pub use report::TurnReport;
pub use turn::{Advance, TurnState};
