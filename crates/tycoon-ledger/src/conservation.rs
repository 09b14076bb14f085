//! Conservation check for contract transfers.
//!
//! Grants and collections create resources; purchases destroy them. Those
//! are source and sink flows and are excluded. Contract transfers only move
//! resources between factories, so for each turn and resource the total
//! debited from factories must equal the total credited to factories.
//!
//! Every well-formed transfer entry adds the same quantity to both sides,
//! so the check passes by construction. It exists to catch corrupted or
//! hand-assembled entries.

use std::collections::{BTreeMap, BTreeSet};

use rust_decimal::Decimal;
use tycoon_types::ResourceId;

use crate::LedgerAnomaly;
use crate::journal::{Account, EntryType, JournalEntry};

/// Outcome of a conservation check for one turn.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConservationResult {
    /// All contract transfers balance.
    Balanced,
    /// At least one resource does not balance.
    Anomaly(LedgerAnomaly),
}

impl ConservationResult {
    /// Whether the check passed.
    pub const fn is_balanced(&self) -> bool {
        matches!(self, Self::Balanced)
    }
}

/// Verify that contract transfers recorded on `turn` balance per resource.
pub fn verify_conservation(turn: u64, entries: &[JournalEntry]) -> ConservationResult {
    let mut debited: BTreeMap<ResourceId, Decimal> = BTreeMap::new();
    let mut credited: BTreeMap<ResourceId, Decimal> = BTreeMap::new();

    for entry in entries {
        if entry.turn != turn || entry.entry_type != EntryType::ContractTransfer {
            continue;
        }

        if matches!(entry.from, Account::Factory(_)) {
            let d = debited.entry(entry.resource).or_insert(Decimal::ZERO);
            *d = match d.checked_add(entry.quantity) {
                Some(val) => val,
                None => return overflow_anomaly(turn, entry.resource),
            };
        }
        if matches!(entry.to, Account::Factory(_)) {
            let c = credited.entry(entry.resource).or_insert(Decimal::ZERO);
            *c = match c.checked_add(entry.quantity) {
                Some(val) => val,
                None => return overflow_anomaly(turn, entry.resource),
            };
        }
    }

    let all_resources: BTreeSet<ResourceId> =
        debited.keys().chain(credited.keys()).copied().collect();

    let mut imbalances = BTreeMap::new();
    for resource in all_resources {
        let debit = debited.get(&resource).copied().unwrap_or(Decimal::ZERO);
        let credit = credited.get(&resource).copied().unwrap_or(Decimal::ZERO);
        if debit != credit {
            imbalances.insert(resource, (debit, credit));
        }
    }

    if imbalances.is_empty() {
        ConservationResult::Balanced
    } else {
        let count = imbalances.len();
        ConservationResult::Anomaly(LedgerAnomaly {
            turn,
            imbalances,
            message: format!(
                "LEDGER_ANOMALY at turn {turn}: contract transfers unbalanced for {count} resource(s)"
            ),
        })
    }
}

fn overflow_anomaly(turn: u64, resource: ResourceId) -> ConservationResult {
    let mut imbalances = BTreeMap::new();
    imbalances.insert(resource, (Decimal::ZERO, Decimal::ZERO));
    ConservationResult::Anomaly(LedgerAnomaly {
        turn,
        imbalances,
        message: format!("LEDGER_ANOMALY at turn {turn}: arithmetic overflow while summing {resource}"),
    })
}
