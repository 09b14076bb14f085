//! The factory aggregate.

use std::collections::BTreeMap;

use rust_decimal::Decimal;
use tracing::{debug, info, warn};
use tycoon_catalog::{BuildingType, Catalog, ProductionUnit};
use tycoon_ledger::Balances;
use tycoon_types::{BuildingId, ContractId, FactoryId, ResourceId, Term, UnitId};

use crate::error::FactoryError;

/// What a successful purchase paid and created.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PurchaseReceipt {
    /// The new unit.
    pub unit: UnitId,
    /// The building type bought.
    pub building: BuildingId,
    /// Cost lines debited, in catalog order.
    pub costs: Vec<Term>,
}

/// A player's factory: production units, balances and penalty state.
#[derive(Debug, Clone)]
pub struct Factory {
    id: FactoryId,
    owner: String,
    capacity: usize,
    units: Vec<ProductionUnit>,
    balances: Balances,
    blocked_turns: u32,
    contracts: Vec<ContractId>,
}

impl Factory {
    /// Create an empty factory with a zero balance for every resource kind
    /// in the catalog.
    pub fn new(owner: impl Into<String>, capacity: usize, catalog: &Catalog) -> Self {
        Self {
            id: FactoryId::new(),
            owner: owner.into(),
            capacity,
            units: Vec::with_capacity(capacity),
            balances: Balances::new(catalog.resource_ids()),
            blocked_turns: 0,
            contracts: Vec::new(),
        }
    }

    /// Factory identifier.
    pub const fn id(&self) -> FactoryId {
        self.id
    }

    /// Owning player's name.
    pub fn owner(&self) -> &str {
        &self.owner
    }

    /// Maximum number of units.
    pub const fn capacity(&self) -> usize {
        self.capacity
    }

    /// Units in purchase order.
    pub fn units(&self) -> &[ProductionUnit] {
        &self.units
    }

    /// Unoccupied slots.
    pub const fn free_slots(&self) -> usize {
        self.capacity.saturating_sub(self.units.len())
    }

    /// The balance sheet.
    pub const fn balances(&self) -> &Balances {
        &self.balances
    }

    /// Balance of one resource.
    pub fn balance(&self, resource: ResourceId) -> Decimal {
        self.balances.balance(resource)
    }

    /// Remaining penalty turns.
    pub const fn blocked_turns(&self) -> u32 {
        self.blocked_turns
    }

    /// Whether a penalty is being served.
    pub const fn is_blocked(&self) -> bool {
        self.blocked_turns > 0
    }

    /// Contracts this factory has accepted or proposed, oldest first.
    pub fn contracts(&self) -> &[ContractId] {
        &self.contracts
    }

    /// Remember a contract this factory is party to.
    pub fn record_contract(&mut self, contract: ContractId) {
        if !self.contracts.contains(&contract) {
            self.contracts.push(contract);
        }
    }

    // -----------------------------------------------------------------------
    // Balance movements
    // -----------------------------------------------------------------------

    /// Add to a balance. Used for starting grants and contract receipts.
    pub fn credit(&mut self, resource: ResourceId, quantity: Decimal) -> Result<Decimal, FactoryError> {
        Ok(self.balances.credit(resource, quantity)?)
    }

    /// Remove from a balance. Used for contract deliveries.
    pub fn debit(&mut self, resource: ResourceId, quantity: Decimal) -> Result<Decimal, FactoryError> {
        Ok(self.balances.debit(resource, quantity)?)
    }

    /// Remove a covered quantity and return the amount that actually left.
    /// See [`Balances::withdraw`].
    pub fn withdraw(&mut self, resource: ResourceId, quantity: Decimal) -> Result<Decimal, FactoryError> {
        Ok(self.balances.withdraw(resource, quantity)?)
    }

    // -----------------------------------------------------------------------
    // Purchasing
    // -----------------------------------------------------------------------

    /// Buy a building.
    ///
    /// Checks run in this order and the first failure wins: blocked,
    /// unknown type, not buyable, capacity, costs. Costs are checked as a
    /// whole before anything is debited, so a failed purchase leaves the
    /// factory untouched.
    pub fn purchase(&mut self, catalog: &Catalog, building: BuildingId) -> Result<PurchaseReceipt, FactoryError> {
        if self.is_blocked() {
            return Err(FactoryError::FactoryBlocked {
                turns: self.blocked_turns,
            });
        }
        let building_type = lookup(catalog, building)?;
        if !building_type.buyable {
            return Err(FactoryError::NotPurchasable {
                name: building_type.name.clone(),
            });
        }
        self.ensure_free_slot()?;

        if let Err(short) = self.balances.covers_all(&building_type.costs) {
            debug!(
                factory = %self.id,
                building = %building_type.name,
                resource = %short.resource,
                required = %short.required,
                available = %short.available,
                "purchase rejected: insufficient resources"
            );
            return Err(FactoryError::InsufficientResources {
                resource: short.resource,
                required: short.required,
                available: short.available,
            });
        }
        self.balances.debit_all(&building_type.costs)?;

        let unit = instantiate(catalog, building)?;
        let unit_id = unit.id();
        self.units.push(unit);

        info!(
            factory = %self.id,
            owner = %self.owner,
            building = %building_type.name,
            unit = %unit_id,
            slots_used = self.units.len(),
            "building purchased"
        );

        Ok(PurchaseReceipt {
            unit: unit_id,
            building,
            costs: building_type.costs.clone(),
        })
    }

    /// Install a unit at setup time without paying for it. Buyability is
    /// ignored; capacity is not.
    pub fn place_fixture(&mut self, catalog: &Catalog, building: BuildingId) -> Result<UnitId, FactoryError> {
        let building_type = lookup(catalog, building)?;
        self.ensure_free_slot()?;
        let unit = instantiate(catalog, building)?;
        let unit_id = unit.id();
        self.units.push(unit);
        debug!(
            factory = %self.id,
            building = %building_type.name,
            unit = %unit_id,
            "fixture placed"
        );
        Ok(unit_id)
    }

    /// Whether the balance sheet covers every cost line of a building.
    /// Unknown building ids are never affordable.
    pub fn can_afford(&self, catalog: &Catalog, building: BuildingId) -> bool {
        catalog
            .lookup(building)
            .is_ok_and(|b| self.balances.covers_all(&b.costs).is_ok())
    }

    const fn ensure_free_slot(&self) -> Result<(), FactoryError> {
        if self.units.len() >= self.capacity {
            return Err(FactoryError::CapacityExceeded {
                capacity: self.capacity,
            });
        }
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Production
    // -----------------------------------------------------------------------

    /// Advance every unit's accumulator by its rate. On overflow no unit
    /// advances.
    pub fn tick(&mut self) -> Result<(), FactoryError> {
        let mut staged = self.units.clone();
        for unit in &mut staged {
            unit.advance().ok_or(FactoryError::ArithmeticOverflow {
                context: "production tick",
            })?;
        }
        self.units = staged;
        Ok(())
    }

    /// Move every accumulator into the balance sheet and zero it.
    ///
    /// Returns the amount collected per resource. Units with nothing
    /// accumulated contribute nothing, so a second call in a row returns an
    /// empty map and changes no balance. Accumulators are drained only
    /// after every credit has succeeded.
    pub fn collect(&mut self) -> Result<BTreeMap<ResourceId, Decimal>, FactoryError> {
        let mut balances = self.balances.clone();
        let mut collected: BTreeMap<ResourceId, Decimal> = BTreeMap::new();
        for unit in &self.units {
            let amount = unit.accumulator();
            if amount.is_zero() {
                continue;
            }
            balances.credit(unit.output(), amount)?;
            let total = collected.entry(unit.output()).or_insert(Decimal::ZERO);
            *total = total.checked_add(amount).ok_or(FactoryError::ArithmeticOverflow {
                context: "collection total",
            })?;
        }
        self.balances = balances;
        for unit in &mut self.units {
            unit.take();
        }
        if !collected.is_empty() {
            debug!(factory = %self.id, kinds = collected.len(), "production collected");
        }
        Ok(collected)
    }

    // -----------------------------------------------------------------------
    // Blocking
    // -----------------------------------------------------------------------

    /// Impose a penalty. Repeated penalties do not stack: the counter
    /// becomes the larger of its current value and `turns`.
    pub fn apply_block_penalty(&mut self, turns: u32) {
        let previous = self.blocked_turns;
        self.blocked_turns = previous.max(turns);
        warn!(
            factory = %self.id,
            owner = %self.owner,
            previous,
            blocked_turns = self.blocked_turns,
            "blocking penalty applied"
        );
    }

    /// Serve one round of the penalty.
    pub const fn decrement_block(&mut self) {
        self.blocked_turns = self.blocked_turns.saturating_sub(1);
    }
}

fn lookup(catalog: &Catalog, building: BuildingId) -> Result<&BuildingType, FactoryError> {
    catalog
        .lookup(building)
        .or(Err(FactoryError::UnknownBuildingType(building)))
}

fn instantiate(catalog: &Catalog, building: BuildingId) -> Result<ProductionUnit, FactoryError> {
    catalog
        .instantiate(building)
        .or(Err(FactoryError::UnknownBuildingType(building)))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use rust_decimal_macros::dec;
    use tycoon_catalog::standard::{BLOCKED_SLOT, COPPER, COPPER_MINE, DEEP_COPPER_MINE, IRON};
    use tycoon_catalog::standard_catalog;

    use super::*;

    struct Fixture {
        catalog: Catalog,
        copper: ResourceId,
        iron: ResourceId,
        copper_mine: BuildingId,
    }

    fn setup() -> Fixture {
        let catalog = standard_catalog().unwrap();
        let copper = catalog.resource_by_name(COPPER).unwrap().id;
        let iron = catalog.resource_by_name(IRON).unwrap().id;
        let copper_mine = catalog.lookup_by_name(COPPER_MINE).unwrap().id;
        Fixture {
            catalog,
            copper,
            iron,
            copper_mine,
        }
    }

    #[test]
    fn new_factory_has_entry_for_every_kind() {
        let f = setup();
        let factory = Factory::new("ada", 4, &f.catalog);
        for kind in f.catalog.resource_ids() {
            assert!(factory.balances().contains(kind));
            assert_eq!(factory.balance(kind), Decimal::ZERO);
        }
    }

    #[test]
    fn purchase_with_insufficient_copper_changes_nothing() {
        let f = setup();
        let mut factory = Factory::new("ada", 4, &f.catalog);
        factory.credit(f.copper, dec!(2)).unwrap();

        let result = factory.purchase(&f.catalog, f.copper_mine);
        assert!(matches!(result, Err(FactoryError::InsufficientResources { .. })));
        assert_eq!(factory.balance(f.copper), dec!(2));
        assert!(factory.units().is_empty());
    }

    #[test]
    fn purchase_debits_costs_and_adds_unit() {
        let f = setup();
        let mut factory = Factory::new("ada", 4, &f.catalog);
        factory.credit(f.copper, dec!(5)).unwrap();

        let receipt = factory.purchase(&f.catalog, f.copper_mine).unwrap();
        assert_eq!(receipt.costs, vec![Term::new(dec!(3), f.copper)]);
        assert_eq!(factory.balance(f.copper), dec!(2));
        assert_eq!(factory.units().len(), 1);
        assert_eq!(factory.units().first().unwrap().accumulator(), Decimal::ZERO);
    }

    #[test]
    fn multi_line_cost_is_all_or_nothing() {
        let f = setup();
        let deep = f.catalog.lookup_by_name(DEEP_COPPER_MINE).unwrap().id;
        let mut factory = Factory::new("ada", 4, &f.catalog);
        factory.credit(f.copper, dec!(10)).unwrap();
        factory.credit(f.iron, dec!(1)).unwrap();

        let result = factory.purchase(&f.catalog, deep);
        assert!(matches!(
            result,
            Err(FactoryError::InsufficientResources { resource, .. }) if resource == f.iron
        ));
        assert_eq!(factory.balance(f.copper), dec!(10));
        assert_eq!(factory.balance(f.iron), dec!(1));
    }

    #[test]
    fn zero_balance_cost_line_is_insufficient() {
        let f = setup();
        let deep = f.catalog.lookup_by_name(DEEP_COPPER_MINE).unwrap().id;
        let mut factory = Factory::new("ada", 4, &f.catalog);
        factory.credit(f.copper, dec!(10)).unwrap();
        assert!(!factory.can_afford(&f.catalog, deep));
    }

    #[test]
    fn capacity_checked_before_costs() {
        let f = setup();
        let mut factory = Factory::new("ada", 1, &f.catalog);
        factory.place_fixture(&f.catalog, f.copper_mine).unwrap();

        // No copper at all: capacity must still be the reported failure.
        let result = factory.purchase(&f.catalog, f.copper_mine);
        assert!(matches!(result, Err(FactoryError::CapacityExceeded { capacity: 1 })));
        assert_eq!(factory.units().len(), 1);
    }

    #[test]
    fn blocked_factory_cannot_purchase() {
        let f = setup();
        let mut factory = Factory::new("ada", 4, &f.catalog);
        factory.credit(f.copper, dec!(5)).unwrap();
        factory.apply_block_penalty(2);

        let result = factory.purchase(&f.catalog, f.copper_mine);
        assert!(matches!(result, Err(FactoryError::FactoryBlocked { turns: 2 })));
        assert_eq!(factory.balance(f.copper), dec!(5));
    }

    #[test]
    fn unknown_and_unbuyable_buildings_rejected() {
        let f = setup();
        let slot = f.catalog.lookup_by_name(BLOCKED_SLOT).unwrap().id;
        let mut factory = Factory::new("ada", 4, &f.catalog);

        assert!(matches!(
            factory.purchase(&f.catalog, BuildingId(99)),
            Err(FactoryError::UnknownBuildingType(BuildingId(99)))
        ));
        assert!(matches!(
            factory.purchase(&f.catalog, slot),
            Err(FactoryError::NotPurchasable { .. })
        ));
        assert!(factory.place_fixture(&f.catalog, slot).is_ok());
    }

    #[test]
    fn ten_ticks_then_collect() {
        let f = setup();
        let mut factory = Factory::new("ada", 4, &f.catalog);
        factory.credit(f.copper, dec!(5)).unwrap();
        factory.place_fixture(&f.catalog, f.copper_mine).unwrap();

        for _ in 0..10 {
            factory.tick().unwrap();
        }
        assert_eq!(factory.units().first().unwrap().accumulator(), dec!(1.0));

        let collected = factory.collect().unwrap();
        assert_eq!(collected.get(&f.copper), Some(&dec!(1.0)));
        assert_eq!(factory.balance(f.copper), dec!(6.0));
        assert_eq!(factory.units().first().unwrap().accumulator(), Decimal::ZERO);
    }

    #[test]
    fn collect_twice_is_idempotent() {
        let f = setup();
        let mut factory = Factory::new("ada", 4, &f.catalog);
        factory.place_fixture(&f.catalog, f.copper_mine).unwrap();
        factory.tick().unwrap();
        factory.collect().unwrap();
        let before = factory.balances().snapshot();

        assert!(factory.collect().unwrap().is_empty());
        assert_eq!(factory.balances().snapshot(), before);
    }

    #[test]
    fn failed_collect_keeps_uncollected_output() {
        let f = setup();
        let mut factory = Factory::new("ada", 4, &f.catalog);
        factory.credit(f.copper, Decimal::MAX).unwrap();
        factory.place_fixture(&f.catalog, f.copper_mine).unwrap();
        factory.tick().unwrap();

        assert!(matches!(factory.collect(), Err(FactoryError::Ledger(_))));
        assert_eq!(factory.balance(f.copper), Decimal::MAX);
        assert_eq!(factory.units().first().unwrap().accumulator(), dec!(0.1));
    }

    #[test]
    fn penalty_uses_larger_value() {
        let f = setup();
        let mut factory = Factory::new("ada", 4, &f.catalog);
        factory.apply_block_penalty(3);
        factory.decrement_block();
        factory.apply_block_penalty(1);
        assert_eq!(factory.blocked_turns(), 2);
        factory.apply_block_penalty(3);
        assert_eq!(factory.blocked_turns(), 3);
    }

    #[test]
    fn decrement_stops_at_zero() {
        let f = setup();
        let mut factory = Factory::new("ada", 4, &f.catalog);
        factory.decrement_block();
        assert_eq!(factory.blocked_turns(), 0);
        assert!(!factory.is_blocked());
    }
}
