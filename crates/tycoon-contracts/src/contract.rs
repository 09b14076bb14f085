//! The contract record and its perspective views.
//!
//! A [`Contract`] is stored once, from party A's point of view: A proposed
//! it, `terms(Party::A)` is what A owes B, and `terms(Party::B)` is what B
//! owes A. Callers that want to see a contract "from our side" ask for a
//! [`ContractView`], a borrowed projection with the sides swapped as needed.
//! No mirrored copy of a contract is ever stored.

use rust_decimal::Decimal;
use serde::Serialize;
use tycoon_types::{ContractId, ContractStatus, FactoryId, Party, ResourceId, Term, within_precision};

use crate::error::NegotiationError;

/// An agreement between two factories.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Contract {
    id: ContractId,
    party_a: FactoryId,
    party_b: FactoryId,
    terms_a: Vec<Term>,
    terms_b: Vec<Term>,
    deadline: u64,
    status: ContractStatus,
    proposed_on: u64,
}

impl Contract {
    /// Start a draft with no terms.
    pub(crate) fn draft(proposer: FactoryId, recipient: FactoryId, deadline: u64, turn: u64) -> Self {
        Self {
            id: ContractId::new(),
            party_a: proposer,
            party_b: recipient,
            terms_a: Vec::new(),
            terms_b: Vec::new(),
            deadline,
            status: ContractStatus::Draft,
            proposed_on: turn,
        }
    }

    /// Start a draft with the given terms.
    pub(crate) fn draft_with_terms(
        proposer: FactoryId,
        recipient: FactoryId,
        terms_a: Vec<Term>,
        terms_b: Vec<Term>,
        deadline: u64,
        turn: u64,
    ) -> Self {
        Self {
            terms_a,
            terms_b,
            ..Self::draft(proposer, recipient, deadline, turn)
        }
    }

    /// Contract identifier.
    pub const fn id(&self) -> ContractId {
        self.id
    }

    /// The factory on the given side.
    pub const fn factory(&self, party: Party) -> FactoryId {
        match party {
            Party::A => self.party_a,
            Party::B => self.party_b,
        }
    }

    /// What the given side owes the other.
    pub fn terms(&self, party: Party) -> &[Term] {
        match party {
            Party::A => &self.terms_a,
            Party::B => &self.terms_b,
        }
    }

    /// Turn on which settlement runs.
    pub const fn deadline(&self) -> u64 {
        self.deadline
    }

    /// Lifecycle state.
    pub const fn status(&self) -> ContractStatus {
        self.status
    }

    /// Turn on which the draft was started.
    pub const fn proposed_on(&self) -> u64 {
        self.proposed_on
    }

    /// Which side a factory is on, if any.
    pub fn party_of(&self, factory: FactoryId) -> Option<Party> {
        if factory == self.party_a {
            Some(Party::A)
        } else if factory == self.party_b {
            Some(Party::B)
        } else {
            None
        }
    }

    /// Whether the factory is a party.
    pub fn involves(&self, factory: FactoryId) -> bool {
        self.party_of(factory).is_some()
    }

    /// Whether neither side owes anything.
    pub fn is_empty(&self) -> bool {
        self.terms_a.is_empty() && self.terms_b.is_empty()
    }

    /// Whether an active contract settles on this turn.
    pub fn is_due(&self, turn: u64) -> bool {
        self.status == ContractStatus::Active && self.deadline == turn
    }

    // -----------------------------------------------------------------------
    // Views
    // -----------------------------------------------------------------------

    /// The contract as party A sees it.
    pub fn view(&self) -> ContractView<'_> {
        self.view_from(Party::A)
    }

    /// The contract as party B sees it: sides and terms swapped.
    pub fn mirrored(&self) -> ContractView<'_> {
        self.view_from(Party::B)
    }

    /// The contract as `factory` sees it, or `None` if it is not a party.
    pub fn view_for(&self, factory: FactoryId) -> Option<ContractView<'_>> {
        self.party_of(factory).map(|party| self.view_from(party))
    }

    fn view_from(&self, us: Party) -> ContractView<'_> {
        ContractView {
            contract: self.id,
            us: self.factory(us),
            them: self.factory(us.other()),
            we_owe: self.terms(us),
            they_owe: self.terms(us.other()),
            deadline: self.deadline,
            status: self.status,
        }
    }

    // -----------------------------------------------------------------------
    // Lifecycle (crate-internal)
    // -----------------------------------------------------------------------

    pub(crate) const fn set_status(&mut self, status: ContractStatus) {
        self.status = status;
    }

    pub(crate) const fn set_deadline(&mut self, deadline: u64) {
        self.deadline = deadline;
    }

    /// Change the quantity a side owes of one resource by `delta`.
    ///
    /// The result is clamped at zero and a line that reaches zero is
    /// removed. A negative delta on a resource the side does not owe is a
    /// no-op. A delta finer than the settlement precision is rejected.
    /// Returns the new quantity.
    pub(crate) fn adjust_term(
        &mut self,
        party: Party,
        resource: ResourceId,
        delta: Decimal,
    ) -> Result<Decimal, NegotiationError> {
        if !within_precision(delta) {
            return Err(NegotiationError::ExcessPrecision { quantity: delta });
        }
        let terms = match party {
            Party::A => &mut self.terms_a,
            Party::B => &mut self.terms_b,
        };
        let current = terms
            .iter()
            .find(|t| t.resource == resource)
            .map_or(Decimal::ZERO, |t| t.quantity);
        let updated = current
            .checked_add(delta)
            .ok_or(NegotiationError::ArithmeticOverflow {
                context: "draft term adjustment",
            })?
            .max(Decimal::ZERO);

        if updated.is_zero() {
            terms.retain(|t| t.resource != resource);
        } else if let Some(term) = terms.iter_mut().find(|t| t.resource == resource) {
            term.quantity = updated;
        } else {
            terms.push(Term::new(updated, resource));
        }
        Ok(updated)
    }
}

/// A contract seen from one party's side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ContractView<'a> {
    /// The contract.
    pub contract: ContractId,
    /// The viewing factory.
    pub us: FactoryId,
    /// The counterparty.
    pub them: FactoryId,
    /// What we owe them.
    pub we_owe: &'a [Term],
    /// What they owe us.
    pub they_owe: &'a [Term],
    /// Settlement turn.
    pub deadline: u64,
    /// Lifecycle state.
    pub status: ContractStatus,
}
