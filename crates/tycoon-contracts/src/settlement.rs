//! Contract settlement at the deadline.
//!
//! Settlement runs exactly once per contract, on the turn equal to its
//! deadline. Both directions are always evaluated:
//!
//! 1. Each party is judged against its own balances as they stood before
//!    settlement began. Lines are judged in order and cumulatively, so two
//!    lines of 3 Copper need 6 Copper. What the counterparty delivers in
//!    the same settlement cannot fund the party's own obligations.
//! 2. A covered line is transferred in full and journaled as a
//!    `ContractTransfer`. An uncovered line transfers nothing and is
//!    recorded as a [`ContractDefaulted`] outcome.
//! 3. A party with at least one default receives the blocking penalty.
//!
//! There are no partial transfers. The receiver is credited exactly what
//! left the debtor's balance, so settlement never creates resources.
//! Every movement is staged on copies of the two factories and committed
//! only once all of it has succeeded.

use std::collections::BTreeMap;

use rust_decimal::Decimal;
use serde::Serialize;
use tracing::{info, warn};
use tycoon_factory::Factory;
use tycoon_ledger::{Account, Balances, EntryBuilder, EntryType, Journal, LedgerError};
use tycoon_types::{ContractId, ContractStatus, FactoryId, Party, Term};

use crate::contract::Contract;
use crate::error::SettlementError;

/// A line delivered in full.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Transfer {
    /// The contract.
    pub contract: ContractId,
    /// Delivering factory.
    pub from: FactoryId,
    /// Receiving factory.
    pub to: FactoryId,
    /// The contract line.
    pub term: Term,
    /// Amount that left the debtor and reached the receiver.
    pub delivered: Decimal,
}

/// A line a party could not cover at settlement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ContractDefaulted {
    /// The contract.
    pub contract: ContractId,
    /// Which side defaulted.
    pub party: Party,
    /// The defaulting factory.
    pub factory: FactoryId,
    /// The line not delivered.
    pub term: Term,
}

/// Everything one settlement did.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SettlementReport {
    /// The contract.
    pub contract: ContractId,
    /// Settlement turn.
    pub turn: u64,
    /// Delivered lines, party A's first.
    pub transfers: Vec<Transfer>,
    /// Defaulted lines, party A's first.
    pub defaults: Vec<ContractDefaulted>,
}

impl SettlementReport {
    /// Whether both parties delivered every line.
    pub fn is_clean(&self) -> bool {
        self.defaults.is_empty()
    }
}

/// Settle a contract that is due on `turn`.
///
/// On success the contract is `Settled`. Factories that defaulted have had
/// `penalty_turns` applied.
pub fn settle(
    contract: &mut Contract,
    turn: u64,
    factories: &mut BTreeMap<FactoryId, Factory>,
    penalty_turns: u32,
    journal: &mut Journal,
) -> Result<SettlementReport, SettlementError> {
    if contract.status() != ContractStatus::Active {
        return Err(SettlementError::NotActive {
            contract: contract.id(),
            status: contract.status(),
        });
    }
    if contract.deadline() != turn {
        return Err(SettlementError::NotDue {
            contract: contract.id(),
            deadline: contract.deadline(),
            turn,
        });
    }

    // Judge both sides before anything moves.
    let mut owed = Vec::new();
    let mut defaults = Vec::new();
    for party in [Party::A, Party::B] {
        let debtor = contract.factory(party);
        let mut remaining = factories
            .get(&debtor)
            .ok_or(SettlementError::UnknownFactory(debtor))?
            .balances()
            .clone();
        for term in contract.terms(party) {
            if reserve(&mut remaining, term)? {
                owed.push((debtor, contract.factory(party.other()), *term));
            } else {
                defaults.push(ContractDefaulted {
                    contract: contract.id(),
                    party,
                    factory: debtor,
                    term: *term,
                });
            }
        }
    }

    let mut staged = BTreeMap::new();
    for id in [contract.factory(Party::A), contract.factory(Party::B)] {
        let factory = factories.get(&id).ok_or(SettlementError::UnknownFactory(id))?;
        staged.insert(id, factory.clone());
    }

    let mut transfers = Vec::with_capacity(owed.len());
    let mut entries = Vec::with_capacity(owed.len());
    for (from, to, term) in owed {
        let delivered = factory_mut(&mut staged, from)?.withdraw(term.resource, term.quantity)?;
        if delivered > Decimal::ZERO {
            factory_mut(&mut staged, to)?.credit(term.resource, delivered)?;
            entries.push(
                EntryBuilder::new(turn, EntryType::ContractTransfer, term.resource)
                    .from(Account::Factory(from))
                    .to(Account::Factory(to))
                    .quantity(delivered)
                    .reference(contract.id().into_inner()),
            );
        }
        transfers.push(Transfer {
            contract: contract.id(),
            from,
            to,
            term,
            delivered,
        });
    }

    for party in [Party::A, Party::B] {
        if defaults.iter().any(|d| d.party == party) {
            let factory = factory_mut(&mut staged, contract.factory(party))?;
            warn!(
                contract = %contract.id(),
                factory = %factory.id(),
                owner = %factory.owner(),
                penalty_turns,
                "contract defaulted"
            );
            factory.apply_block_penalty(penalty_turns);
        }
    }

    journal.record_all(entries)?;
    factories.extend(staged);
    contract.set_status(ContractStatus::Settled);
    info!(
        contract = %contract.id(),
        turn,
        transfers = transfers.len(),
        defaults = defaults.len(),
        "contract settled"
    );

    Ok(SettlementReport {
        contract: contract.id(),
        turn,
        transfers,
        defaults,
    })
}

/// Set aside a line from a scratch copy of a party's balances. Returns
/// `false` if the line is not covered.
fn reserve(remaining: &mut Balances, term: &Term) -> Result<bool, SettlementError> {
    match remaining.debit(term.resource, term.quantity) {
        Ok(_) => Ok(true),
        Err(LedgerError::Insufficient { .. }) => Ok(false),
        Err(e) => Err(e.into()),
    }
}

fn factory_mut(
    factories: &mut BTreeMap<FactoryId, Factory>,
    id: FactoryId,
) -> Result<&mut Factory, SettlementError> {
    factories.get_mut(&id).ok_or(SettlementError::UnknownFactory(id))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;
    use tycoon_catalog::standard::{COPPER, IRON};
    use tycoon_catalog::{Catalog, standard_catalog};
    use tycoon_types::ResourceId;

    use super::*;

    struct World {
        factories: BTreeMap<FactoryId, Factory>,
        journal: Journal,
        a: FactoryId,
        b: FactoryId,
        copper: ResourceId,
        iron: ResourceId,
    }

    fn world(a_copper: Decimal, b_copper: Decimal) -> World {
        let catalog: Catalog = standard_catalog().unwrap();
        let copper = catalog.resource_by_name(COPPER).unwrap().id;
        let iron = catalog.resource_by_name(IRON).unwrap().id;
        let mut fa = Factory::new("ada", 4, &catalog);
        let mut fb = Factory::new("bob", 4, &catalog);
        if !a_copper.is_zero() {
            fa.credit(copper, a_copper).unwrap();
        }
        if !b_copper.is_zero() {
            fb.credit(copper, b_copper).unwrap();
        }
        let (a, b) = (fa.id(), fb.id());
        let factories = [(a, fa), (b, fb)].into_iter().collect();
        World {
            factories,
            journal: Journal::new(),
            a,
            b,
            copper,
            iron,
        }
    }

    fn active(a: FactoryId, b: FactoryId, terms_a: Vec<Term>, terms_b: Vec<Term>, deadline: u64) -> Contract {
        let mut c = Contract::draft_with_terms(a, b, terms_a, terms_b, deadline, 0);
        c.set_status(ContractStatus::Active);
        c
    }

    fn copper_of(w: &World, f: FactoryId) -> Decimal {
        w.factories.get(&f).unwrap().balance(w.copper)
    }

    #[test]
    fn covered_line_transfers_in_full() {
        let mut w = world(dec!(3), dec!(1));
        let mut contract = active(w.a, w.b, vec![Term::new(dec!(3), w.copper)], Vec::new(), 4);

        let report = settle(&mut contract, 4, &mut w.factories, 3, &mut w.journal).unwrap();
        assert!(report.is_clean());
        assert_eq!(report.transfers.len(), 1);
        assert_eq!(copper_of(&w, w.a), Decimal::ZERO);
        assert_eq!(copper_of(&w, w.b), dec!(4));
        assert_eq!(contract.status(), ContractStatus::Settled);
        assert!(w.journal.verify_conservation(4).is_balanced());
    }

    #[test]
    fn uncovered_line_defaults_and_blocks() {
        let mut w = world(dec!(2), Decimal::ZERO);
        let term = Term::new(dec!(3), w.copper);
        let mut contract = active(w.a, w.b, vec![term], Vec::new(), 4);

        let report = settle(&mut contract, 4, &mut w.factories, 3, &mut w.journal).unwrap();
        assert_eq!(
            report.defaults,
            vec![ContractDefaulted {
                contract: contract.id(),
                party: Party::A,
                factory: w.a,
                term,
            }]
        );
        assert!(report.transfers.is_empty());
        assert_eq!(copper_of(&w, w.a), dec!(2));
        assert_eq!(w.factories.get(&w.a).unwrap().blocked_turns(), 3);
        assert!(w.journal.is_empty());
    }

    #[test]
    fn both_directions_evaluated_independently() {
        let mut w = world(dec!(5), Decimal::ZERO);
        let mut contract = active(
            w.a,
            w.b,
            vec![Term::new(dec!(2), w.copper)],
            vec![Term::new(dec!(1), w.iron)],
            2,
        );

        let report = settle(&mut contract, 2, &mut w.factories, 3, &mut w.journal).unwrap();
        assert_eq!(report.transfers.len(), 1);
        assert_eq!(report.defaults.len(), 1);
        assert_eq!(copper_of(&w, w.b), dec!(2));
        assert_eq!(w.factories.get(&w.a).unwrap().blocked_turns(), 0);
        assert_eq!(w.factories.get(&w.b).unwrap().blocked_turns(), 3);
    }

    #[test]
    fn receipts_cannot_fund_own_obligation() {
        // B owes 3 Copper but holds none; A's delivery of 3 Copper in the
        // same settlement must not cover it.
        let mut w = world(dec!(3), Decimal::ZERO);
        let mut contract = active(
            w.a,
            w.b,
            vec![Term::new(dec!(3), w.copper)],
            vec![Term::new(dec!(3), w.copper)],
            2,
        );

        let report = settle(&mut contract, 2, &mut w.factories, 3, &mut w.journal).unwrap();
        assert_eq!(report.transfers.len(), 1);
        assert_eq!(report.defaults.first().unwrap().party, Party::B);
        assert_eq!(copper_of(&w, w.b), dec!(3));
    }

    #[test]
    fn lines_are_judged_cumulatively() {
        let mut w = world(dec!(4), Decimal::ZERO);
        let mut contract = active(
            w.a,
            w.b,
            vec![Term::new(dec!(3), w.copper), Term::new(dec!(3), w.copper)],
            Vec::new(),
            2,
        );

        let report = settle(&mut contract, 2, &mut w.factories, 3, &mut w.journal).unwrap();
        assert_eq!(report.transfers.len(), 1);
        assert_eq!(report.defaults.len(), 1);
        assert_eq!(copper_of(&w, w.a), dec!(1));
    }

    #[test]
    fn sub_precision_shortfall_delivers_only_what_was_held() {
        let mut w = world(dec!(2.9995), Decimal::ZERO);
        let mut contract = active(w.a, w.b, vec![Term::new(dec!(3), w.copper)], Vec::new(), 2);

        let report = settle(&mut contract, 2, &mut w.factories, 3, &mut w.journal).unwrap();
        assert!(report.is_clean());
        assert_eq!(report.transfers.first().unwrap().delivered, dec!(2.9995));
        assert_eq!(copper_of(&w, w.a), Decimal::ZERO);
        assert_eq!(copper_of(&w, w.b), dec!(2.9995));
        assert_eq!(w.journal.entries().first().unwrap().quantity, dec!(2.9995));
        assert!(w.journal.verify_conservation(2).is_balanced());
    }

    #[test]
    fn empty_balance_delivers_nothing_for_sub_mil_line() {
        let mut w = world(Decimal::ZERO, Decimal::ZERO);
        let mut contract = active(w.a, w.b, vec![Term::new(dec!(0.0004), w.copper)], Vec::new(), 2);

        let report = settle(&mut contract, 2, &mut w.factories, 3, &mut w.journal).unwrap();
        assert_eq!(report.transfers.first().unwrap().delivered, Decimal::ZERO);
        assert_eq!(copper_of(&w, w.a), Decimal::ZERO);
        assert_eq!(copper_of(&w, w.b), Decimal::ZERO);
        assert!(w.journal.is_empty());
    }

    #[test]
    fn failed_settlement_leaves_factories_and_journal_untouched() {
        let mut w = world(dec!(3), Decimal::MAX);
        let mut contract = active(w.a, w.b, vec![Term::new(dec!(3), w.copper)], Vec::new(), 2);

        let result = settle(&mut contract, 2, &mut w.factories, 3, &mut w.journal);
        assert!(matches!(result, Err(SettlementError::Factory(_))));
        assert_eq!(copper_of(&w, w.a), dec!(3));
        assert_eq!(copper_of(&w, w.b), Decimal::MAX);
        assert!(w.journal.is_empty());
        assert_eq!(contract.status(), ContractStatus::Active);
    }

    #[test]
    fn settles_exactly_once() {
        let mut w = world(dec!(6), Decimal::ZERO);
        let mut contract = active(w.a, w.b, vec![Term::new(dec!(3), w.copper)], Vec::new(), 2);

        settle(&mut contract, 2, &mut w.factories, 3, &mut w.journal).unwrap();
        let again = settle(&mut contract, 2, &mut w.factories, 3, &mut w.journal);
        assert!(matches!(again, Err(SettlementError::NotActive { .. })));
        assert_eq!(copper_of(&w, w.a), dec!(3));
        assert_eq!(w.journal.len(), 1);
    }

    #[test]
    fn wrong_turn_is_not_due() {
        let mut w = world(dec!(3), Decimal::ZERO);
        let mut contract = active(w.a, w.b, vec![Term::new(dec!(3), w.copper)], Vec::new(), 5);
        let result = settle(&mut contract, 4, &mut w.factories, 3, &mut w.journal);
        assert!(matches!(result, Err(SettlementError::NotDue { deadline: 5, turn: 4, .. })));
        assert_eq!(contract.status(), ContractStatus::Active);
    }
}
