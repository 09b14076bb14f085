//! Configuration loading and typed config structures.
//!
//! The canonical configuration lives in `tycoon-config.yaml` at the
//! project root. Every section and field has a default, so an empty file
//! (or no file at all) yields a playable four-player game on the standard
//! catalog.

use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

use rust_decimal::Decimal;
use serde::Deserialize;
use tycoon_catalog::standard::{COPPER, COPPER_MINE, IRON_MINE};
use tycoon_catalog::{Catalog, CatalogData, build_catalog, standard_catalog};
use tycoon_types::{ResourceId, within_precision};

use crate::error::ConfigError;

/// Top-level game configuration.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct GameConfig {
    /// Game name, length and players.
    #[serde(default)]
    pub game: GameSection,

    /// Factory defaults.
    #[serde(default)]
    pub factory: FactoryConfig,

    /// Contract rules.
    #[serde(default)]
    pub contracts: ContractsConfig,

    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Inline catalog. The standard catalog is used when absent.
    #[serde(default)]
    pub catalog: Option<CatalogData>,
}

impl GameConfig {
    /// Load configuration from a YAML file.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::parse(&contents)
    }

    /// Parse configuration from a YAML string.
    pub fn parse(yaml: &str) -> Result<Self, ConfigError> {
        Ok(serde_yml::from_str(yaml)?)
    }

    /// Build the catalog this configuration plays on.
    pub fn build_catalog(&self) -> Result<Catalog, ConfigError> {
        let catalog = match &self.catalog {
            Some(data) => build_catalog(data)?,
            None => standard_catalog()?,
        };
        Ok(catalog)
    }

    /// Check ranges and resolve every resource and building name against
    /// the catalog.
    pub fn validate(&self, catalog: &Catalog) -> Result<(), ConfigError> {
        if self.game.players.len() < 2 {
            return Err(invalid("at least two players are required"));
        }
        if self.factory.capacity == 0 {
            return Err(invalid("factory.capacity must be at least 1"));
        }
        if self.contracts.penalty_turns == 0 {
            return Err(invalid("contracts.penalty_turns must be at least 1"));
        }
        if self.contracts.default_time_limit == 0 {
            return Err(invalid("contracts.default_time_limit must be at least 1"));
        }

        resolve_balances(catalog, &self.factory.starting_balances, "factory.starting_balances")?;

        let mut names = BTreeSet::new();
        for player in &self.game.players {
            if !names.insert(player.name.as_str()) {
                return Err(invalid(format!("duplicate player name {}", player.name)));
            }
            if let Some(balances) = &player.balances {
                resolve_balances(catalog, balances, &player.name)?;
            }
            if player.fixtures.len() > self.factory.capacity {
                return Err(invalid(format!(
                    "player {} has {} fixtures but capacity is {}",
                    player.name,
                    player.fixtures.len(),
                    self.factory.capacity
                )));
            }
            for fixture in &player.fixtures {
                catalog.lookup_by_name(fixture)?;
            }
        }
        Ok(())
    }
}

/// Resolve a name-keyed balance map to resource ids.
pub(crate) fn resolve_balances(
    catalog: &Catalog,
    balances: &BTreeMap<String, Decimal>,
    owner: &str,
) -> Result<BTreeMap<ResourceId, Decimal>, ConfigError> {
    let mut resolved = BTreeMap::new();
    for (name, quantity) in balances {
        let kind = catalog.resource_by_name(name)?;
        if kind.id.is_null() {
            return Err(invalid(format!("{owner}: the null resource cannot hold a balance")));
        }
        if quantity.is_sign_negative() {
            return Err(invalid(format!("{owner}: negative starting balance for {name}")));
        }
        if !within_precision(*quantity) {
            return Err(invalid(format!(
                "{owner}: starting balance {quantity} for {name} is finer than the settlement precision"
            )));
        }
        resolved.insert(kind.id, *quantity);
    }
    Ok(resolved)
}

fn invalid(reason: impl Into<String>) -> ConfigError {
    ConfigError::Invalid {
        reason: reason.into(),
    }
}

/// Game-level configuration.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct GameSection {
    /// Human-readable game name.
    #[serde(default = "default_game_name")]
    pub name: String,

    /// Rounds the headless driver plays before printing final reports.
    #[serde(default = "default_rounds")]
    pub rounds: u64,

    /// Players in turn order.
    #[serde(default = "default_players")]
    pub players: Vec<PlayerConfig>,
}

impl Default for GameSection {
    fn default() -> Self {
        Self {
            name: default_game_name(),
            rounds: default_rounds(),
            players: default_players(),
        }
    }
}

/// One player's seat.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct PlayerConfig {
    /// Player name, unique within the game.
    pub name: String,

    /// Starting balances by resource name. Falls back to
    /// `factory.starting_balances` when absent.
    #[serde(default)]
    pub balances: Option<BTreeMap<String, Decimal>>,

    /// Building names installed at setup without cost.
    #[serde(default)]
    pub fixtures: Vec<String>,
}

/// Factory defaults.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct FactoryConfig {
    /// Maximum units per factory.
    #[serde(default = "default_capacity")]
    pub capacity: usize,

    /// Starting balances by resource name for players without their own.
    #[serde(default = "default_starting_balances")]
    pub starting_balances: BTreeMap<String, Decimal>,
}

impl Default for FactoryConfig {
    fn default() -> Self {
        Self {
            capacity: default_capacity(),
            starting_balances: default_starting_balances(),
        }
    }
}

/// Contract rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct ContractsConfig {
    /// Turns a defaulting factory is blocked for.
    #[serde(default = "default_penalty_turns")]
    pub penalty_turns: u32,

    /// Turns between starting a draft and its initial deadline.
    #[serde(default = "default_time_limit")]
    pub default_time_limit: u64,
}

impl Default for ContractsConfig {
    fn default() -> Self {
        Self {
            penalty_turns: default_penalty_turns(),
            default_time_limit: default_time_limit(),
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error). `RUST_LOG` wins when
    /// set.
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_game_name() -> String {
    "Tycoon".to_owned()
}

const fn default_rounds() -> u64 {
    10
}

fn default_players() -> Vec<PlayerConfig> {
    ["Red", "Yellow", "Green", "Blue"]
        .into_iter()
        .map(|name| PlayerConfig {
            name: name.to_owned(),
            balances: None,
            fixtures: vec![COPPER_MINE.to_owned(), IRON_MINE.to_owned(), COPPER_MINE.to_owned()],
        })
        .collect()
}

const fn default_capacity() -> usize {
    12
}

fn default_starting_balances() -> BTreeMap<String, Decimal> {
    BTreeMap::from([(COPPER.to_owned(), Decimal::new(5, 0))])
}

const fn default_penalty_turns() -> u32 {
    3
}

const fn default_time_limit() -> u64 {
    4
}

fn default_log_level() -> String {
    "info".to_owned()
}
