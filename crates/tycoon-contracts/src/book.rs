//! The authoritative list of accepted contracts.

use std::collections::BTreeMap;

use tracing::error;
use tycoon_factory::Factory;
use tycoon_ledger::Journal;
use tycoon_types::{ContractId, ContractStatus, FactoryId};

use crate::contract::{Contract, ContractView};
use crate::error::SettlementError;
use crate::settlement::{SettlementReport, settle};

/// What settling the contracts due on one turn produced.
#[derive(Debug, Default)]
pub struct DueSettlements {
    /// Contracts that settled, in acceptance order.
    pub reports: Vec<SettlementReport>,
    /// Contracts whose settlement failed. They are left untouched and
    /// still `Active`.
    pub failed: Vec<(ContractId, SettlementError)>,
}

/// Every accepted contract, in acceptance order. Settled contracts stay.
#[derive(Debug, Default)]
pub struct ContractBook {
    contracts: Vec<Contract>,
}

impl ContractBook {
    /// Create an empty book.
    pub const fn new() -> Self {
        Self {
            contracts: Vec::new(),
        }
    }

    /// Store an accepted contract.
    pub fn insert(&mut self, contract: Contract) {
        self.contracts.push(contract);
    }

    /// Fetch a contract by id.
    pub fn get(&self, id: ContractId) -> Option<&Contract> {
        self.contracts.iter().find(|c| c.id() == id)
    }

    /// All contracts in acceptance order.
    pub fn iter(&self) -> impl Iterator<Item = &Contract> {
        self.contracts.iter()
    }

    /// Number of contracts, settled ones included.
    pub const fn len(&self) -> usize {
        self.contracts.len()
    }

    /// Whether no contract was ever accepted.
    pub const fn is_empty(&self) -> bool {
        self.contracts.is_empty()
    }

    /// Active contracts `factory` is party to, seen from its side.
    pub fn active_for(&self, factory: FactoryId) -> impl Iterator<Item = ContractView<'_>> {
        self.contracts
            .iter()
            .filter(|c| c.status() == ContractStatus::Active)
            .filter_map(move |c| c.view_for(factory))
    }

    /// Settle every active contract whose deadline is `turn`, in acceptance
    /// order. One contract failing does not stop the rest.
    pub fn settle_due(
        &mut self,
        turn: u64,
        factories: &mut BTreeMap<FactoryId, Factory>,
        penalty_turns: u32,
        journal: &mut Journal,
    ) -> DueSettlements {
        let mut due = DueSettlements::default();
        for contract in self.contracts.iter_mut().filter(|c| c.is_due(turn)) {
            match settle(contract, turn, factories, penalty_turns, journal) {
                Ok(report) => due.reports.push(report),
                Err(e) => {
                    error!(contract = %contract.id(), turn, error = %e, "contract settlement failed");
                    due.failed.push((contract.id(), e));
                }
            }
        }
        due
    }
}
