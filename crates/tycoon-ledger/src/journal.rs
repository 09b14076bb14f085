//! The append-only journal of resource movements.
//!
//! Every movement that changes a factory's balances (starting grants,
//! collections, purchases, contract transfers) is recorded as a
//! [`JournalEntry`]. Entries are built through [`EntryBuilder`], which
//! enforces a positive quantity and the correct account kinds for the
//! entry type. Entries are never modified or removed.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::debug;
use uuid::Uuid;

use tycoon_types::{FactoryId, JournalEntryId, ResourceId};

use crate::LedgerError;
use crate::conservation::{ConservationResult, verify_conservation};

/// Category of a journal entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum EntryType {
    /// Starting balance handed out at game setup.
    Grant,
    /// Production moved from unit accumulators into the ledger.
    Collection,
    /// Building cost paid.
    Purchase,
    /// Contract obligation delivered from one factory to another.
    ContractTransfer,
}

/// One side of a journal entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Account {
    /// The outside world: source of grants and production.
    World,
    /// Sink for spent resources.
    Void,
    /// A player's factory.
    Factory(FactoryId),
}

impl Account {
    const fn kind(self) -> &'static str {
        match self {
            Self::World => "world",
            Self::Void => "void",
            Self::Factory(_) => "factory",
        }
    }
}

impl EntryType {
    /// Expected `(from, to)` account kinds.
    const fn expected_accounts(self) -> (&'static str, &'static str) {
        match self {
            Self::Grant | Self::Collection => ("world", "factory"),
            Self::Purchase => ("factory", "void"),
            Self::ContractTransfer => ("factory", "factory"),
        }
    }
}

/// A recorded resource movement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JournalEntry {
    /// Entry identifier.
    pub id: JournalEntryId,
    /// Turn on which the movement happened.
    pub turn: u64,
    /// Movement category.
    pub entry_type: EntryType,
    /// Resource moved.
    pub resource: ResourceId,
    /// Quantity moved, always positive.
    pub quantity: Decimal,
    /// Debited account.
    pub from: Account,
    /// Credited account.
    pub to: Account,
    /// Related entity (contract id for transfers, unit id for purchases).
    pub reference: Option<Uuid>,
    /// Wall-clock time of recording.
    pub recorded_at: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// Builder
// ---------------------------------------------------------------------------

/// Builder for validated [`JournalEntry`] values.
#[derive(Debug)]
pub struct EntryBuilder {
    turn: u64,
    entry_type: EntryType,
    resource: ResourceId,
    from: Option<Account>,
    to: Option<Account>,
    quantity: Option<Decimal>,
    reference: Option<Uuid>,
}

impl EntryBuilder {
    /// Start an entry for the given turn, type, and resource.
    pub const fn new(turn: u64, entry_type: EntryType, resource: ResourceId) -> Self {
        Self {
            turn,
            entry_type,
            resource,
            from: None,
            to: None,
            quantity: None,
            reference: None,
        }
    }

    /// Set the debited account.
    #[must_use]
    pub const fn from(mut self, account: Account) -> Self {
        self.from = Some(account);
        self
    }

    /// Set the credited account.
    #[must_use]
    pub const fn to(mut self, account: Account) -> Self {
        self.to = Some(account);
        self
    }

    /// Set the quantity moved.
    #[must_use]
    pub const fn quantity(mut self, quantity: Decimal) -> Self {
        self.quantity = Some(quantity);
        self
    }

    /// Link the entry to a related entity.
    #[must_use]
    pub const fn reference(mut self, id: Uuid) -> Self {
        self.reference = Some(id);
        self
    }

    /// Validate and produce the entry.
    pub fn build(self) -> Result<JournalEntry, LedgerError> {
        let quantity = self.quantity.ok_or(LedgerError::MissingField("quantity"))?;
        if quantity.is_zero() {
            return Err(LedgerError::ZeroQuantity);
        }
        if quantity.is_sign_negative() {
            return Err(LedgerError::NegativeQuantity { quantity });
        }
        let from = self.from.ok_or(LedgerError::MissingField("from"))?;
        let to = self.to.ok_or(LedgerError::MissingField("to"))?;

        let (expected_from, expected_to) = self.entry_type.expected_accounts();
        if from.kind() != expected_from {
            return Err(LedgerError::InvalidAccount {
                entry_type: self.entry_type,
                side: "from",
                expected: expected_from,
                actual: from.kind(),
            });
        }
        if to.kind() != expected_to {
            return Err(LedgerError::InvalidAccount {
                entry_type: self.entry_type,
                side: "to",
                expected: expected_to,
                actual: to.kind(),
            });
        }

        Ok(JournalEntry {
            id: JournalEntryId::new(),
            turn: self.turn,
            entry_type: self.entry_type,
            resource: self.resource,
            quantity,
            from,
            to,
            reference: self.reference,
            recorded_at: Utc::now(),
        })
    }
}

// ---------------------------------------------------------------------------
// Journal
// ---------------------------------------------------------------------------

/// Append-only log of every resource movement in a game.
#[derive(Debug, Default)]
pub struct Journal {
    entries: Vec<JournalEntry>,
}

impl Journal {
    /// Create an empty journal.
    pub const fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Number of entries.
    pub const fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether no entries have been recorded.
    pub const fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// All entries in recording order.
    pub fn entries(&self) -> &[JournalEntry] {
        &self.entries
    }

    /// Entries recorded on a given turn.
    pub fn entries_for_turn(&self, turn: u64) -> impl Iterator<Item = &JournalEntry> {
        self.entries.iter().filter(move |entry| entry.turn == turn)
    }

    /// Entries touching a factory on either side.
    pub fn entries_for_factory(&self, factory: FactoryId) -> impl Iterator<Item = &JournalEntry> {
        let account = Account::Factory(factory);
        self.entries
            .iter()
            .filter(move |entry| entry.from == account || entry.to == account)
    }

    /// Validate and append an entry.
    pub fn record(&mut self, builder: EntryBuilder) -> Result<&JournalEntry, LedgerError> {
        let entry = builder.build()?;
        debug!(
            turn = entry.turn,
            entry_type = ?entry.entry_type,
            resource = %entry.resource,
            quantity = %entry.quantity,
            "journal entry recorded"
        );
        self.entries.push(entry);
        self.entries
            .last()
            .ok_or(LedgerError::InternalError("failed to retrieve entry after append"))
    }

    /// Validate a batch of entries, then append them all. Nothing is
    /// appended if any entry is invalid. Returns the number appended.
    pub fn record_all(&mut self, builders: impl IntoIterator<Item = EntryBuilder>) -> Result<usize, LedgerError> {
        let batch = builders
            .into_iter()
            .map(EntryBuilder::build)
            .collect::<Result<Vec<_>, _>>()?;
        let appended = batch.len();
        for entry in &batch {
            debug!(
                turn = entry.turn,
                entry_type = ?entry.entry_type,
                resource = %entry.resource,
                quantity = %entry.quantity,
                "journal entry recorded"
            );
        }
        self.entries.extend(batch);
        Ok(appended)
    }

    /// Record a starting grant (world to factory).
    pub fn record_grant(
        &mut self,
        turn: u64,
        factory: FactoryId,
        resource: ResourceId,
        quantity: Decimal,
    ) -> Result<&JournalEntry, LedgerError> {
        self.record(
            EntryBuilder::new(turn, EntryType::Grant, resource)
                .from(Account::World)
                .to(Account::Factory(factory))
                .quantity(quantity),
        )
    }

    /// Record collected production (world to factory).
    pub fn record_collection(
        &mut self,
        turn: u64,
        factory: FactoryId,
        resource: ResourceId,
        quantity: Decimal,
    ) -> Result<&JournalEntry, LedgerError> {
        self.record(
            EntryBuilder::new(turn, EntryType::Collection, resource)
                .from(Account::World)
                .to(Account::Factory(factory))
                .quantity(quantity),
        )
    }

    /// Record a paid building cost (factory to void).
    pub fn record_purchase(
        &mut self,
        turn: u64,
        factory: FactoryId,
        resource: ResourceId,
        quantity: Decimal,
        unit: Uuid,
    ) -> Result<&JournalEntry, LedgerError> {
        self.record(
            EntryBuilder::new(turn, EntryType::Purchase, resource)
                .from(Account::Factory(factory))
                .to(Account::Void)
                .quantity(quantity)
                .reference(unit),
        )
    }

    /// Record a delivered contract obligation (factory to factory).
    pub fn record_contract_transfer(
        &mut self,
        turn: u64,
        resource: ResourceId,
        quantity: Decimal,
        from: FactoryId,
        to: FactoryId,
        contract: Uuid,
    ) -> Result<&JournalEntry, LedgerError> {
        self.record(
            EntryBuilder::new(turn, EntryType::ContractTransfer, resource)
                .from(Account::Factory(from))
                .to(Account::Factory(to))
                .quantity(quantity)
                .reference(contract),
        )
    }

    /// Run the conservation check over one turn's entries.
    pub fn verify_conservation(&self, turn: u64) -> ConservationResult {
        verify_conservation(turn, &self.entries)
    }
}
