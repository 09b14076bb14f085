//! Headless driver for the Tycoon economy.
//!
//! Loads a game configuration, seats the configured players, advances the
//! configured number of rounds and logs every turn report followed by the
//! final factory reports. It makes no moves on behalf of players; the
//! factories simply produce from their fixtures.
//!
//! # Usage
//!
//! ```bash
//! tycoon-engine [path/to/tycoon-config.yaml]
//! ```
//!
//! Without an argument, `tycoon-config.yaml` in the working directory is
//! used if present, otherwise built-in defaults.

mod error;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context as _;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;
use tycoon_core::{Game, GameConfig, TurnReport};

use crate::error::EngineError;

/// Default configuration file name.
const CONFIG_FILE: &str = "tycoon-config.yaml";

fn main() -> anyhow::Result<()> {
    let path = std::env::args().nth(1).map(PathBuf::from);
    let config = load_config(path.as_deref()).context("loading configuration")?;

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.logging.level)),
        )
        .with_target(true)
        .init();

    info!(game = %config.game.name, rounds = config.game.rounds, "tycoon-engine starting");
    run(&config).context("running game")?;
    info!("tycoon-engine shutdown complete");
    Ok(())
}

/// Load the configuration from `path`, or from [`CONFIG_FILE`] when it
/// exists, or fall back to defaults.
fn load_config(path: Option<&Path>) -> Result<GameConfig, EngineError> {
    match path {
        Some(path) => Ok(GameConfig::from_file(path)?),
        None => {
            let default_path = Path::new(CONFIG_FILE);
            if default_path.exists() {
                Ok(GameConfig::from_file(default_path)?)
            } else {
                Ok(GameConfig::default())
            }
        }
    }
}

fn run(config: &GameConfig) -> Result<(), EngineError> {
    let catalog = Arc::new(config.build_catalog()?);
    info!(
        resources = catalog.resource_count(),
        buildings = catalog.building_count(),
        "catalog loaded"
    );

    let mut game = Game::new(catalog, config)?;
    while game.rounds_completed() < config.game.rounds {
        let report = game.request_advance_turn()?;
        log_turn(&game, &report);
    }

    for report in game.reports()? {
        info!(factory = %report.factory, blocked_turns = report.blocked_turns, "final report\n{report}");
    }
    Ok(())
}

fn log_turn(game: &Game, report: &TurnReport) {
    if report.round_completed {
        for (factory, totals) in &report.collected {
            for (resource, quantity) in totals {
                info!(
                    turn = report.turn,
                    %factory,
                    resource = game.catalog().resource_name(*resource),
                    %quantity,
                    "collected"
                );
            }
        }
        for factory in &report.skipped {
            info!(turn = report.turn, %factory, "blocked, production skipped");
        }
    }
    for defaulted in &report.defaults {
        warn!(
            turn = report.turn,
            contract = %defaulted.contract,
            factory = %defaulted.factory,
            resource = game.catalog().resource_name(defaulted.term.resource),
            quantity = %defaulted.term.quantity,
            "contract line defaulted"
        );
    }
}
