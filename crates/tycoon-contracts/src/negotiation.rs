//! Drafting, proposing, accepting and rejecting contracts.
//!
//! The desk has two kinds of exclusive slot:
//!
//! - one session-wide **draft** slot, holding the contract the current
//!   player is editing;
//! - one **inbox** slot per recipient, holding a proposal awaiting answer.
//!
//! A request that needs an occupied slot fails with
//! [`NegotiationError::NegotiationInProgress`]. A proposer may also have
//! at most one proposal outstanding across all inboxes. The proposer can
//! withdraw it at any time before it is accepted, and a proposal whose
//! deadline has arrived expires when the turn passes.

use std::collections::BTreeMap;

use rust_decimal::Decimal;
use tracing::{debug, info};
use tycoon_types::{ContractId, ContractStatus, FactoryId, Party, ResourceId, Term, within_precision};

use crate::contract::Contract;
use crate::error::NegotiationError;

/// Draft slot plus per-recipient inboxes.
#[derive(Debug, Default)]
pub struct NegotiationDesk {
    draft: Option<Contract>,
    inbox: BTreeMap<FactoryId, Contract>,
}

impl NegotiationDesk {
    /// Create an empty desk.
    pub const fn new() -> Self {
        Self {
            draft: None,
            inbox: BTreeMap::new(),
        }
    }

    /// The draft being edited, if any.
    pub const fn draft(&self) -> Option<&Contract> {
        self.draft.as_ref()
    }

    /// The proposal waiting for a recipient, if any.
    pub fn inbox(&self, recipient: FactoryId) -> Option<&Contract> {
        self.inbox.get(&recipient)
    }

    /// Every proposal awaiting an answer.
    pub fn pending(&self) -> impl Iterator<Item = &Contract> {
        self.inbox.values()
    }

    /// The proposal a factory has sent and is still waiting on.
    pub fn outgoing(&self, proposer: FactoryId) -> Option<&Contract> {
        self.inbox.values().find(|c| c.factory(Party::A) == proposer)
    }

    // -----------------------------------------------------------------------
    // Drafting
    // -----------------------------------------------------------------------

    /// Open an empty draft from `proposer` to `recipient`, due `time_limit`
    /// turns after `turn`.
    pub fn begin(
        &mut self,
        proposer: FactoryId,
        recipient: FactoryId,
        turn: u64,
        time_limit: u64,
    ) -> Result<&Contract, NegotiationError> {
        if let Some(existing) = &self.draft {
            return Err(NegotiationError::NegotiationInProgress {
                factory: existing.factory(Party::A),
            });
        }
        if proposer == recipient {
            return Err(NegotiationError::InvalidCounterparty(proposer));
        }
        let deadline = turn
            .checked_add(time_limit.max(1))
            .ok_or(NegotiationError::ArithmeticOverflow {
                context: "draft deadline",
            })?;
        debug!(%proposer, %recipient, deadline, "contract draft started");
        Ok(self
            .draft
            .insert(Contract::draft(proposer, recipient, deadline, turn)))
    }

    /// Change what one side of the draft owes of a resource. Returns the
    /// new quantity; zero means the line was removed.
    pub fn adjust_term(&mut self, party: Party, resource: ResourceId, delta: Decimal) -> Result<Decimal, NegotiationError> {
        let draft = self.draft.as_mut().ok_or(NegotiationError::NoDraft)?;
        draft.adjust_term(party, resource, delta)
    }

    /// Move the draft deadline by `delta` turns, never earlier than the
    /// turn after `turn`. Returns the new deadline.
    pub fn adjust_deadline(&mut self, delta: i64, turn: u64) -> Result<u64, NegotiationError> {
        let draft = self.draft.as_mut().ok_or(NegotiationError::NoDraft)?;
        let overflow = || NegotiationError::ArithmeticOverflow {
            context: "draft deadline adjustment",
        };
        let moved = if delta >= 0 {
            draft
                .deadline()
                .checked_add(delta.unsigned_abs())
                .ok_or_else(overflow)?
        } else {
            draft.deadline().saturating_sub(delta.unsigned_abs())
        };
        let earliest = turn.checked_add(1).ok_or_else(overflow)?;
        let deadline = moved.max(earliest);
        draft.set_deadline(deadline);
        Ok(deadline)
    }

    /// Throw the draft away.
    pub fn cancel(&mut self) -> Result<Contract, NegotiationError> {
        let draft = self.draft.take().ok_or(NegotiationError::NoDraft)?;
        debug!(contract = %draft.id(), "contract draft cancelled");
        Ok(draft)
    }

    /// Drop the draft without error if there is one. Called when the turn
    /// passes.
    pub fn discard_draft(&mut self) -> Option<Contract> {
        self.draft.take()
    }

    /// Move the draft into the recipient's inbox.
    ///
    /// On failure the draft stays in the slot so it can be edited or
    /// cancelled.
    pub fn send(&mut self, turn: u64) -> Result<ContractId, NegotiationError> {
        let draft = self.draft.as_ref().ok_or(NegotiationError::NoDraft)?;
        self.check_sendable(draft, turn)?;
        let mut contract = self.draft.take().ok_or(NegotiationError::NoDraft)?;
        contract.set_status(ContractStatus::Pending);
        Ok(self.deliver(contract))
    }

    /// Propose a fully specified contract in one step, bypassing the draft
    /// slot. Fails if a draft is being edited.
    pub fn propose(
        &mut self,
        proposer: FactoryId,
        recipient: FactoryId,
        terms_a: Vec<Term>,
        terms_b: Vec<Term>,
        deadline: u64,
        turn: u64,
    ) -> Result<ContractId, NegotiationError> {
        if let Some(existing) = &self.draft {
            return Err(NegotiationError::NegotiationInProgress {
                factory: existing.factory(Party::A),
            });
        }
        if proposer == recipient {
            return Err(NegotiationError::InvalidCounterparty(proposer));
        }
        for term in terms_a.iter().chain(&terms_b) {
            if term.quantity <= Decimal::ZERO {
                return Err(NegotiationError::InvalidQuantity {
                    quantity: term.quantity,
                });
            }
            if !within_precision(term.quantity) {
                return Err(NegotiationError::ExcessPrecision {
                    quantity: term.quantity,
                });
            }
        }
        let mut contract = Contract::draft_with_terms(proposer, recipient, terms_a, terms_b, deadline, turn);
        self.check_sendable(&contract, turn)?;
        contract.set_status(ContractStatus::Pending);
        Ok(self.deliver(contract))
    }

    fn check_sendable(&self, contract: &Contract, turn: u64) -> Result<(), NegotiationError> {
        if contract.is_empty() {
            return Err(NegotiationError::EmptyProposal);
        }
        if contract.deadline() <= turn {
            return Err(NegotiationError::DeadlineElapsed {
                deadline: contract.deadline(),
                turn,
            });
        }
        let recipient = contract.factory(Party::B);
        if self.inbox.contains_key(&recipient) {
            return Err(NegotiationError::NegotiationInProgress { factory: recipient });
        }
        let proposer = contract.factory(Party::A);
        if self.outgoing(proposer).is_some() {
            return Err(NegotiationError::NegotiationInProgress { factory: proposer });
        }
        Ok(())
    }

    fn deliver(&mut self, contract: Contract) -> ContractId {
        let id = contract.id();
        let recipient = contract.factory(Party::B);
        info!(
            contract = %id,
            proposer = %contract.factory(Party::A),
            %recipient,
            deadline = contract.deadline(),
            "contract proposed"
        );
        self.inbox.insert(recipient, contract);
        id
    }

    // -----------------------------------------------------------------------
    // Answering
    // -----------------------------------------------------------------------

    /// Accept the proposal in `recipient`'s inbox. The returned contract is
    /// `Active`; the caller stores it and records it on both factories.
    ///
    /// A proposal whose deadline is not after `turn` cannot be accepted.
    pub fn accept(&mut self, recipient: FactoryId, turn: u64) -> Result<Contract, NegotiationError> {
        let pending = self
            .inbox
            .get(&recipient)
            .ok_or(NegotiationError::NoPendingProposal(recipient))?;
        if pending.deadline() <= turn {
            return Err(NegotiationError::DeadlineElapsed {
                deadline: pending.deadline(),
                turn,
            });
        }
        let mut contract = self
            .inbox
            .remove(&recipient)
            .ok_or(NegotiationError::NoPendingProposal(recipient))?;
        contract.set_status(ContractStatus::Active);
        info!(contract = %contract.id(), %recipient, deadline = contract.deadline(), "contract accepted");
        Ok(contract)
    }

    /// Discard the proposal in `recipient`'s inbox.
    pub fn reject(&mut self, recipient: FactoryId) -> Result<Contract, NegotiationError> {
        let contract = self
            .inbox
            .remove(&recipient)
            .ok_or(NegotiationError::NoPendingProposal(recipient))?;
        info!(contract = %contract.id(), %recipient, "contract rejected");
        Ok(contract)
    }

    /// Take back the proposal `proposer` has outstanding.
    pub fn withdraw(&mut self, proposer: FactoryId) -> Result<Contract, NegotiationError> {
        let recipient = self
            .outgoing(proposer)
            .map(|c| c.factory(Party::B))
            .ok_or(NegotiationError::NoOutgoingProposal(proposer))?;
        let contract = self
            .inbox
            .remove(&recipient)
            .ok_or(NegotiationError::NoOutgoingProposal(proposer))?;
        info!(contract = %contract.id(), %proposer, %recipient, "contract withdrawn");
        Ok(contract)
    }

    /// Drop every proposal whose deadline is not after `turn`. Such a
    /// proposal can no longer be accepted. Returns what was dropped.
    pub fn expire(&mut self, turn: u64) -> Vec<Contract> {
        let stale: Vec<FactoryId> = self
            .inbox
            .iter()
            .filter(|(_, contract)| contract.deadline() <= turn)
            .map(|(recipient, _)| *recipient)
            .collect();
        let expired: Vec<Contract> = stale.iter().filter_map(|r| self.inbox.remove(r)).collect();
        for contract in &expired {
            info!(
                contract = %contract.id(),
                proposer = %contract.factory(Party::A),
                recipient = %contract.factory(Party::B),
                deadline = contract.deadline(),
                "contract proposal expired"
            );
        }
        expired
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use rust_decimal_macros::dec;

    use super::*;

    const COPPER: ResourceId = ResourceId(1);

    fn terms(qty: Decimal) -> Vec<Term> {
        vec![Term::new(qty, COPPER)]
    }

    #[test]
    fn draft_send_accept_flow() {
        let (a, b) = (FactoryId::new(), FactoryId::new());
        let mut desk = NegotiationDesk::new();
        desk.begin(a, b, 1, 3).unwrap();
        desk.adjust_term(Party::A, COPPER, dec!(3)).unwrap();
        let id = desk.send(1).unwrap();

        assert!(desk.draft().is_none());
        assert_eq!(desk.inbox(b).unwrap().status(), ContractStatus::Pending);

        let contract = desk.accept(b, 2).unwrap();
        assert_eq!(contract.id(), id);
        assert_eq!(contract.status(), ContractStatus::Active);
        assert_eq!(contract.deadline(), 4);
        assert!(desk.inbox(b).is_none());
    }

    #[test]
    fn second_draft_is_rejected() {
        let (a, b, c) = (FactoryId::new(), FactoryId::new(), FactoryId::new());
        let mut desk = NegotiationDesk::new();
        desk.begin(a, b, 1, 3).unwrap();
        assert_eq!(
            desk.begin(a, c, 1, 3).unwrap_err(),
            NegotiationError::NegotiationInProgress { factory: a }
        );
        assert_eq!(desk.draft().unwrap().factory(Party::B), b);
    }

    #[test]
    fn occupied_inbox_is_never_overwritten() {
        let (a, b, c) = (FactoryId::new(), FactoryId::new(), FactoryId::new());
        let mut desk = NegotiationDesk::new();
        let first = desk.propose(a, b, terms(dec!(1)), Vec::new(), 5, 1).unwrap();

        let result = desk.propose(c, b, terms(dec!(2)), Vec::new(), 5, 1);
        assert_eq!(result.unwrap_err(), NegotiationError::NegotiationInProgress { factory: b });
        assert_eq!(desk.inbox(b).unwrap().id(), first);
    }

    #[test]
    fn one_outgoing_proposal_per_proposer() {
        let (a, b, c) = (FactoryId::new(), FactoryId::new(), FactoryId::new());
        let mut desk = NegotiationDesk::new();
        desk.propose(a, b, terms(dec!(1)), Vec::new(), 5, 1).unwrap();
        let result = desk.propose(a, c, terms(dec!(1)), Vec::new(), 5, 1);
        assert_eq!(result.unwrap_err(), NegotiationError::NegotiationInProgress { factory: a });
    }

    #[test]
    fn failed_send_keeps_draft() {
        let (a, b) = (FactoryId::new(), FactoryId::new());
        let mut desk = NegotiationDesk::new();
        desk.begin(a, b, 1, 3).unwrap();
        assert_eq!(desk.send(1).unwrap_err(), NegotiationError::EmptyProposal);
        assert!(desk.draft().is_some());
    }

    #[test]
    fn self_contract_rejected() {
        let a = FactoryId::new();
        let mut desk = NegotiationDesk::new();
        assert_eq!(desk.begin(a, a, 1, 3).unwrap_err(), NegotiationError::InvalidCounterparty(a));
    }

    #[test]
    fn deadline_clamped_after_current_turn() {
        let (a, b) = (FactoryId::new(), FactoryId::new());
        let mut desk = NegotiationDesk::new();
        desk.begin(a, b, 4, 3).unwrap();
        assert_eq!(desk.adjust_deadline(2, 4).unwrap(), 9);
        assert_eq!(desk.adjust_deadline(-20, 4).unwrap(), 5);
    }

    #[test]
    fn reject_discards_proposal() {
        let (a, b) = (FactoryId::new(), FactoryId::new());
        let mut desk = NegotiationDesk::new();
        desk.propose(a, b, terms(dec!(1)), Vec::new(), 5, 1).unwrap();
        desk.reject(b).unwrap();
        assert!(desk.inbox(b).is_none());
        assert_eq!(desk.reject(b).unwrap_err(), NegotiationError::NoPendingProposal(b));
    }

    #[test]
    fn stale_proposal_cannot_be_accepted() {
        let (a, b) = (FactoryId::new(), FactoryId::new());
        let mut desk = NegotiationDesk::new();
        desk.propose(a, b, terms(dec!(1)), Vec::new(), 3, 1).unwrap();
        assert_eq!(
            desk.accept(b, 3).unwrap_err(),
            NegotiationError::DeadlineElapsed { deadline: 3, turn: 3 }
        );
        assert!(desk.inbox(b).is_some());
    }

    #[test]
    fn non_positive_terms_rejected() {
        let (a, b) = (FactoryId::new(), FactoryId::new());
        let mut desk = NegotiationDesk::new();
        let result = desk.propose(a, b, terms(Decimal::ZERO), Vec::new(), 5, 1);
        assert!(matches!(result, Err(NegotiationError::InvalidQuantity { .. })));
    }

    #[test]
    fn sub_mil_terms_rejected() {
        let (a, b) = (FactoryId::new(), FactoryId::new());
        let mut desk = NegotiationDesk::new();
        let result = desk.propose(a, b, Vec::new(), terms(dec!(0.0004)), 5, 1);
        assert_eq!(
            result.unwrap_err(),
            NegotiationError::ExcessPrecision { quantity: dec!(0.0004) }
        );
        assert!(desk.inbox(b).is_none());

        desk.begin(a, b, 1, 3).unwrap();
        assert!(matches!(
            desk.adjust_term(Party::A, COPPER, dec!(2.9995)),
            Err(NegotiationError::ExcessPrecision { .. })
        ));
        assert!(desk.draft().unwrap().is_empty());
    }

    #[test]
    fn proposer_can_withdraw_and_propose_again() {
        let (a, b, c) = (FactoryId::new(), FactoryId::new(), FactoryId::new());
        let mut desk = NegotiationDesk::new();
        let first = desk.propose(a, b, terms(dec!(1)), Vec::new(), 5, 1).unwrap();

        assert_eq!(desk.withdraw(a).unwrap().id(), first);
        assert!(desk.inbox(b).is_none());
        assert!(desk.outgoing(a).is_none());
        assert_eq!(desk.withdraw(a).unwrap_err(), NegotiationError::NoOutgoingProposal(a));

        desk.propose(a, c, terms(dec!(1)), Vec::new(), 5, 1).unwrap();
        assert!(desk.inbox(c).is_some());
    }

    #[test]
    fn recipient_cannot_withdraw_incoming() {
        let (a, b) = (FactoryId::new(), FactoryId::new());
        let mut desk = NegotiationDesk::new();
        desk.propose(a, b, terms(dec!(1)), Vec::new(), 5, 1).unwrap();
        assert_eq!(desk.withdraw(b).unwrap_err(), NegotiationError::NoOutgoingProposal(b));
        assert!(desk.inbox(b).is_some());
    }

    #[test]
    fn due_proposals_expire() {
        let (a, b, c, d) = (FactoryId::new(), FactoryId::new(), FactoryId::new(), FactoryId::new());
        let mut desk = NegotiationDesk::new();
        let due = desk.propose(a, b, terms(dec!(1)), Vec::new(), 3, 1).unwrap();
        desk.propose(c, d, terms(dec!(1)), Vec::new(), 4, 1).unwrap();

        assert!(desk.expire(2).is_empty());
        let expired = desk.expire(3);
        assert_eq!(expired.len(), 1);
        assert_eq!(expired.first().unwrap().id(), due);
        assert!(desk.inbox(b).is_none());
        assert!(desk.inbox(d).is_some());
        assert!(desk.outgoing(a).is_none());
    }
}
