//! The outcome of one turn advance.

use std::collections::BTreeMap;

use rust_decimal::Decimal;
use tycoon_contracts::{ContractDefaulted, SettlementReport};
use tycoon_ledger::ConservationResult;
use tycoon_types::{ContractId, FactoryId, ResourceId};

/// Everything [`Game::request_advance_turn`](crate::Game::request_advance_turn)
/// did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TurnReport {
    /// The new turn number.
    pub turn: u64,
    /// The new current seat.
    pub seat: usize,
    /// Factory holding the new current seat.
    pub current_factory: FactoryId,
    /// Whether this advance completed a round and ran production.
    pub round_completed: bool,
    /// Per-factory collected totals. Empty unless a round completed.
    pub collected: BTreeMap<FactoryId, BTreeMap<ResourceId, Decimal>>,
    /// Factories that served a penalty turn instead of producing.
    pub skipped: Vec<FactoryId>,
    /// Contracts settled on this turn.
    pub settlements: Vec<SettlementReport>,
    /// Contracts due on this turn whose settlement failed. They remain
    /// active and are logged at error level.
    pub failed_settlements: Vec<ContractId>,
    /// Every default across this turn's settlements.
    pub defaults: Vec<ContractDefaulted>,
    /// Whether this turn's contract transfers balance.
    pub conservation: ConservationResult,
    /// Draft thrown away because the turn passed.
    pub discarded_draft: Option<ContractId>,
    /// Proposals dropped because their deadline arrived unanswered.
    pub expired_proposals: Vec<ContractId>,
}

impl TurnReport {
    /// Total collected of one resource across all factories.
    pub fn total_collected(&self, resource: ResourceId) -> Decimal {
        self.collected
            .values()
            .filter_map(|per_kind| per_kind.get(&resource))
            .fold(Decimal::ZERO, |acc, qty| acc.saturating_add(*qty))
    }
}
