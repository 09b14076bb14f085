//! The game: one object holding all simulation state.
//!
//! Every player action is a `request_*` method returning
//! `Result<_, CommandError>`. A rejected command changes nothing. Queries
//! are plain `&self` methods. The game is single-threaded; it is `Send`, so
//! a host can hand it to another thread or wrap it in a `Mutex`.

use std::collections::BTreeMap;
use std::sync::Arc;

use rust_decimal::Decimal;
use tracing::{debug, error, info};
use tycoon_catalog::{BuildingType, Catalog, ProductionUnit};
use tycoon_contracts::{Contract, ContractBook, ContractView, NegotiationDesk};
use tycoon_factory::{Factory, FactoryError, FactoryReport, PurchaseReceipt};
use tycoon_ledger::{Account, ConservationResult, EntryBuilder, EntryType, Journal};
use tycoon_types::{BuildingId, ContractId, FactoryId, Party, ResourceId, Term};

use crate::config::{GameConfig, resolve_balances};
use crate::error::{CommandError, ConfigError, GameError, TurnError};
use crate::report::TurnReport;
use crate::turn::TurnState;

/// A building in the purchase menu, with live affordability.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BuildableEntry<'a> {
    /// The building type.
    pub building: &'a BuildingType,
    /// Whether the factory can pay for it right now.
    pub affordable: bool,
}

#[derive(Debug, Clone, Copy)]
struct Rules {
    penalty_turns: u32,
    default_time_limit: u64,
}

/// A running game.
#[derive(Debug)]
pub struct Game {
    name: String,
    catalog: Arc<Catalog>,
    factories: BTreeMap<FactoryId, Factory>,
    seats: Vec<FactoryId>,
    turn: TurnState,
    desk: NegotiationDesk,
    book: ContractBook,
    journal: Journal,
    rules: Rules,
}

impl Game {
    /// Set up a game: validate the config, create one factory per player in
    /// turn order, grant starting balances and install fixtures.
    pub fn new(catalog: Arc<Catalog>, config: &GameConfig) -> Result<Self, GameError> {
        config.validate(&catalog)?;

        let default_balances =
            resolve_balances(&catalog, &config.factory.starting_balances, "factory.starting_balances")?;
        let mut journal = Journal::new();
        let mut factories = BTreeMap::new();
        let mut seats = Vec::with_capacity(config.game.players.len());

        for player in &config.game.players {
            let mut factory = Factory::new(player.name.clone(), config.factory.capacity, &catalog);
            let balances = match &player.balances {
                Some(own) => resolve_balances(&catalog, own, &player.name)?,
                None => default_balances.clone(),
            };
            for (resource, quantity) in balances {
                if quantity.is_zero() {
                    continue;
                }
                factory.credit(resource, quantity)?;
                journal.record_grant(0, factory.id(), resource, quantity)?;
            }
            for fixture in &player.fixtures {
                let building = catalog
                    .lookup_by_name(fixture)
                    .map_err(ConfigError::from)?;
                factory.place_fixture(&catalog, building.id)?;
            }
            info!(
                factory = %factory.id(),
                owner = %factory.owner(),
                units = factory.units().len(),
                "factory created"
            );
            seats.push(factory.id());
            factories.insert(factory.id(), factory);
        }

        let turn = TurnState::new(seats.len())?;
        info!(game = %config.game.name, players = seats.len(), "game started");

        Ok(Self {
            name: config.game.name.clone(),
            catalog,
            factories,
            seats,
            turn,
            desk: NegotiationDesk::new(),
            book: ContractBook::new(),
            journal,
            rules: Rules {
                penalty_turns: config.contracts.penalty_turns,
                default_time_limit: config.contracts.default_time_limit,
            },
        })
    }

    // -----------------------------------------------------------------------
    // Queries
    // -----------------------------------------------------------------------

    /// Game name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The catalog this game plays on.
    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    /// Current turn number.
    pub const fn turn(&self) -> u64 {
        self.turn.turn()
    }

    /// Index of the current seat.
    pub const fn current_seat(&self) -> usize {
        self.turn.seat()
    }

    /// Rounds completed so far.
    pub const fn rounds_completed(&self) -> u64 {
        self.turn.rounds()
    }

    /// Factory ids in turn order.
    pub fn seats(&self) -> &[FactoryId] {
        &self.seats
    }

    /// The factory whose turn it is.
    pub fn current_factory(&self) -> Result<FactoryId, CommandError> {
        self.seats
            .get(self.turn.seat())
            .copied()
            .ok_or(CommandError::Turn(TurnError::NoPlayers))
    }

    /// Fetch a factory.
    pub fn factory(&self, id: FactoryId) -> Result<&Factory, CommandError> {
        self.factories.get(&id).ok_or(CommandError::UnknownFactory(id))
    }

    /// Find a factory by its owner's name.
    pub fn factory_by_owner(&self, owner: &str) -> Option<&Factory> {
        self.factories.values().find(|f| f.owner() == owner)
    }

    /// Balance snapshot of a factory.
    pub fn balances(&self, id: FactoryId) -> Result<BTreeMap<ResourceId, Decimal>, CommandError> {
        Ok(self.factory(id)?.balances().snapshot())
    }

    /// A factory's units with their uncollected output.
    pub fn units(&self, id: FactoryId) -> Result<&[ProductionUnit], CommandError> {
        Ok(self.factory(id)?.units())
    }

    /// Remaining penalty turns of a factory.
    pub fn blocked_turns(&self, id: FactoryId) -> Result<u32, CommandError> {
        Ok(self.factory(id)?.blocked_turns())
    }

    /// Buyable building types with affordability for a factory.
    pub fn buildable(&self, id: FactoryId) -> Result<Vec<BuildableEntry<'_>>, CommandError> {
        let factory = self.factory(id)?;
        Ok(self
            .catalog
            .buildable()
            .map(|building| BuildableEntry {
                building,
                affordable: factory.can_afford(&self.catalog, building.id),
            })
            .collect())
    }

    /// Pending and active contracts a factory is party to, seen from its
    /// side. Pending proposals come first.
    pub fn contracts_for(&self, id: FactoryId) -> Result<Vec<ContractView<'_>>, CommandError> {
        self.factory(id)?;
        let pending = self.desk.pending().filter_map(|c| c.view_for(id));
        Ok(pending
            .chain(self.book.active_for(id))
            .filter(|view| view.status.is_visible())
            .collect())
    }

    /// Every accepted contract, settled ones included.
    pub fn contract(&self, id: ContractId) -> Option<&Contract> {
        self.book.get(id)
    }

    /// The draft being edited, if any.
    pub const fn draft(&self) -> Option<&Contract> {
        self.desk.draft()
    }

    /// The proposal waiting for a factory's answer, if any.
    pub fn inbox(&self, id: FactoryId) -> Option<&Contract> {
        self.desk.inbox(id)
    }

    /// The journal of every resource movement.
    pub const fn journal(&self) -> &Journal {
        &self.journal
    }

    /// Production report for one factory.
    pub fn report(&self, id: FactoryId) -> Result<FactoryReport, CommandError> {
        Ok(self.factory(id)?.report(&self.catalog)?)
    }

    /// Production reports for every factory in turn order.
    pub fn reports(&self) -> Result<Vec<FactoryReport>, CommandError> {
        self.seats.iter().map(|id| self.report(*id)).collect()
    }

    // -----------------------------------------------------------------------
    // Gating
    // -----------------------------------------------------------------------

    fn ensure_turn(&self, id: FactoryId) -> Result<(), CommandError> {
        self.factory(id)?;
        let current = self.current_factory()?;
        if current != id {
            return Err(CommandError::NotYourTurn {
                factory: id,
                current,
            });
        }
        Ok(())
    }

    fn ensure_not_blocked(&self, id: FactoryId) -> Result<(), CommandError> {
        let factory = self.factory(id)?;
        if factory.is_blocked() {
            return Err(FactoryError::FactoryBlocked {
                turns: factory.blocked_turns(),
            }
            .into());
        }
        Ok(())
    }

    fn ensure_resource(&self, resource: ResourceId) -> Result<(), CommandError> {
        if resource.is_null() || self.catalog.resource(resource).is_none() {
            return Err(CommandError::UnknownResource(resource));
        }
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Commands: purchasing
    // -----------------------------------------------------------------------

    /// Buy a building for the current player's factory.
    pub fn request_purchase(&mut self, id: FactoryId, building: BuildingId) -> Result<PurchaseReceipt, CommandError> {
        self.ensure_turn(id)?;
        let turn = self.turn.turn();
        let factory = self.factories.get_mut(&id).ok_or(CommandError::UnknownFactory(id))?;
        let receipt = factory.purchase(&self.catalog, building)?;
        for cost in &receipt.costs {
            self.journal
                .record_purchase(turn, id, cost.resource, cost.quantity, receipt.unit.into_inner())?;
        }
        Ok(receipt)
    }

    // -----------------------------------------------------------------------
    // Commands: negotiation
    // -----------------------------------------------------------------------

    /// Propose a complete contract in one step. `terms_a` is what `from`
    /// owes `to`; `terms_b` is what `to` owes `from`.
    pub fn request_propose_contract(
        &mut self,
        from: FactoryId,
        to: FactoryId,
        terms_a: Vec<Term>,
        terms_b: Vec<Term>,
        deadline: u64,
    ) -> Result<ContractId, CommandError> {
        self.ensure_turn(from)?;
        self.ensure_not_blocked(from)?;
        self.factory(to)?;
        for term in terms_a.iter().chain(&terms_b) {
            self.ensure_resource(term.resource)?;
        }
        let turn = self.turn.turn();
        Ok(self.desk.propose(from, to, terms_a, terms_b, deadline, turn)?)
    }

    /// Open an empty draft from the current player to `to`.
    pub fn request_begin_draft(&mut self, from: FactoryId, to: FactoryId) -> Result<ContractId, CommandError> {
        self.ensure_turn(from)?;
        self.ensure_not_blocked(from)?;
        self.factory(to)?;
        let turn = self.turn.turn();
        let draft = self.desk.begin(from, to, turn, self.rules.default_time_limit)?;
        Ok(draft.id())
    }

    /// Change what one side of the draft owes. Returns the new quantity.
    pub fn request_adjust_draft_term(
        &mut self,
        side: Party,
        resource: ResourceId,
        delta: Decimal,
    ) -> Result<Decimal, CommandError> {
        self.ensure_resource(resource)?;
        Ok(self.desk.adjust_term(side, resource, delta)?)
    }

    /// Move the draft deadline. Returns the new deadline.
    pub fn request_adjust_draft_deadline(&mut self, delta: i64) -> Result<u64, CommandError> {
        let turn = self.turn.turn();
        Ok(self.desk.adjust_deadline(delta, turn)?)
    }

    /// Send the draft to its recipient.
    pub fn request_send_draft(&mut self) -> Result<ContractId, CommandError> {
        let turn = self.turn.turn();
        Ok(self.desk.send(turn)?)
    }

    /// Throw the draft away.
    pub fn request_cancel_draft(&mut self) -> Result<ContractId, CommandError> {
        Ok(self.desk.cancel()?.id())
    }

    /// Accept the proposal in a factory's inbox. Only the recipient may
    /// answer, and only on its turn; blocking does not prevent it.
    pub fn request_accept_contract(&mut self, id: FactoryId) -> Result<ContractId, CommandError> {
        self.ensure_turn(id)?;
        let turn = self.turn.turn();
        let contract = self.desk.accept(id, turn)?;
        let contract_id = contract.id();
        for party in [Party::A, Party::B] {
            if let Some(factory) = self.factories.get_mut(&contract.factory(party)) {
                factory.record_contract(contract_id);
            }
        }
        self.book.insert(contract);
        Ok(contract_id)
    }

    /// Reject the proposal in a factory's inbox.
    pub fn request_reject_contract(&mut self, id: FactoryId) -> Result<ContractId, CommandError> {
        self.ensure_turn(id)?;
        Ok(self.desk.reject(id)?.id())
    }

    /// Take back the proposal a factory has sent and is still waiting on.
    /// Only the proposer may withdraw, and only on its turn; blocking does
    /// not prevent it.
    pub fn request_withdraw_proposal(&mut self, id: FactoryId) -> Result<ContractId, CommandError> {
        self.ensure_turn(id)?;
        Ok(self.desk.withdraw(id)?.id())
    }

    // -----------------------------------------------------------------------
    // Commands: turn
    // -----------------------------------------------------------------------

    /// End the current player's turn.
    ///
    /// Production is staged on copies of the factories and its journal
    /// entries are validated before the turn moves. A failure there leaves
    /// the game exactly as it was. Settlement failures do not abort the
    /// advance; they are reported in [`TurnReport::failed_settlements`].
    pub fn request_advance_turn(&mut self) -> Result<TurnReport, CommandError> {
        let advance = self.turn.peek()?;
        let turn = advance.turn;
        let current_factory = *self
            .seats
            .get(advance.seat)
            .ok_or(CommandError::Turn(TurnError::NoPlayers))?;

        let mut produced = BTreeMap::new();
        let mut entries = Vec::new();
        let mut collected = BTreeMap::new();
        let mut skipped = Vec::new();
        if advance.round_completed {
            for id in &self.seats {
                let mut factory = self.factory(*id)?.clone();
                if factory.is_blocked() {
                    factory.decrement_block();
                    debug!(factory = %id, remaining = factory.blocked_turns(), "production skipped: blocked");
                    skipped.push(*id);
                } else {
                    factory.tick()?;
                    let totals = factory.collect()?;
                    for (resource, quantity) in &totals {
                        entries.push(
                            EntryBuilder::new(turn, EntryType::Collection, *resource)
                                .from(Account::World)
                                .to(Account::Factory(*id))
                                .quantity(*quantity),
                        );
                    }
                    collected.insert(*id, totals);
                }
                produced.insert(*id, factory);
            }
        }
        self.journal.record_all(entries)?;

        self.turn.commit(advance);
        self.factories.extend(produced);

        let discarded_draft = self.desk.discard_draft().map(|draft| {
            debug!(contract = %draft.id(), turn, "unsent draft discarded");
            draft.id()
        });
        let expired_proposals = self.desk.expire(turn).iter().map(Contract::id).collect();

        let due = self
            .book
            .settle_due(turn, &mut self.factories, self.rules.penalty_turns, &mut self.journal);
        let settlements = due.reports;
        let failed_settlements: Vec<ContractId> = due.failed.iter().map(|(id, _)| *id).collect();
        let defaults = settlements
            .iter()
            .flat_map(|s| s.defaults.iter().copied())
            .collect();

        let conservation = self.journal.verify_conservation(turn);
        if let ConservationResult::Anomaly(anomaly) = &conservation {
            error!(turn, %anomaly, "ledger conservation violated");
        }

        info!(
            turn,
            seat = advance.seat,
            round_completed = advance.round_completed,
            settlements = settlements.len(),
            failed = failed_settlements.len(),
            "turn advanced"
        );

        Ok(TurnReport {
            turn,
            seat: advance.seat,
            current_factory,
            round_completed: advance.round_completed,
            collected,
            skipped,
            settlements,
            failed_settlements,
            defaults,
            conservation,
            discarded_draft,
            expired_proposals,
        })
    }
}
