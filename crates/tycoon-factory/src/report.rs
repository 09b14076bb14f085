//! Human-readable production report for one factory.
//!
//! Lists every unit with its uncollected output, the uncollected totals
//! per resource, and the current balances. Names are resolved through the
//! catalog when the report is built, so the report is self-contained.

use std::collections::BTreeMap;
use std::fmt;

use rust_decimal::Decimal;
use serde::Serialize;
use tycoon_catalog::Catalog;
use tycoon_types::{FactoryId, UnitId};

use crate::error::FactoryError;
use crate::factory::Factory;

/// One unit's line in a [`FactoryReport`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UnitRow {
    /// Unit identifier.
    pub unit: UnitId,
    /// Building type name.
    pub building: String,
    /// Building abbreviation.
    pub display_name: String,
    /// Output resource name.
    pub output: String,
    /// Accumulated, uncollected output.
    pub uncollected: Decimal,
}

/// Snapshot of a factory's units and balances.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FactoryReport {
    /// Factory identifier.
    pub factory: FactoryId,
    /// Owning player.
    pub owner: String,
    /// Units in purchase order.
    pub units: Vec<UnitRow>,
    /// Uncollected output summed per resource name.
    pub uncollected: BTreeMap<String, Decimal>,
    /// Balances per resource name, the null resource excluded.
    pub balances: BTreeMap<String, Decimal>,
    /// Remaining penalty turns.
    pub blocked_turns: u32,
}

impl Factory {
    /// Build a report of this factory's current state.
    pub fn report(&self, catalog: &Catalog) -> Result<FactoryReport, FactoryError> {
        let mut units = Vec::with_capacity(self.units().len());
        let mut uncollected: BTreeMap<String, Decimal> = BTreeMap::new();

        for unit in self.units() {
            let building = catalog
                .lookup(unit.building())
                .or(Err(FactoryError::UnknownBuildingType(unit.building())))?;
            let output = catalog.resource_name(unit.output()).to_owned();

            if !unit.output().is_null() {
                let total = uncollected.entry(output.clone()).or_insert(Decimal::ZERO);
                *total = total
                    .checked_add(unit.accumulator())
                    .ok_or(FactoryError::ArithmeticOverflow {
                        context: "report totals",
                    })?;
            }

            units.push(UnitRow {
                unit: unit.id(),
                building: building.name.clone(),
                display_name: building.display_name.clone(),
                output,
                uncollected: unit.accumulator(),
            });
        }

        let balances = self
            .balances()
            .iter()
            .filter(|(kind, _)| !kind.is_null())
            .map(|(kind, qty)| (catalog.resource_name(kind).to_owned(), qty))
            .collect();

        Ok(FactoryReport {
            factory: self.id(),
            owner: self.owner().to_owned(),
            units,
            uncollected,
            balances,
            blocked_turns: self.blocked_turns(),
        })
    }
}

impl fmt::Display for FactoryReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{} ({} units)", self.owner, self.units.len())?;
        for row in &self.units {
            writeln!(f, "  {:<4} {:<20} {} {}", row.display_name, row.building, row.uncollected, row.output)?;
        }
        for (name, qty) in &self.uncollected {
            writeln!(f, "  uncollected {name}: {qty}")?;
        }
        for (name, qty) in &self.balances {
            writeln!(f, "  balance {name}: {qty}")?;
        }
        if self.blocked_turns > 0 {
            writeln!(f, "  blocked for {} turn(s)", self.blocked_turns)?;
        }
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use rust_decimal_macros::dec;
    use tycoon_catalog::standard::{BLOCKED_SLOT, COPPER, COPPER_MINE};
    use tycoon_catalog::standard_catalog;

    use super::*;

    #[test]
    fn report_totals_uncollected_per_kind() {
        let catalog = standard_catalog().unwrap();
        let mine = catalog.lookup_by_name(COPPER_MINE).unwrap().id;
        let slot = catalog.lookup_by_name(BLOCKED_SLOT).unwrap().id;
        let mut factory = Factory::new("ada", 4, &catalog);
        factory.place_fixture(&catalog, mine).unwrap();
        factory.place_fixture(&catalog, mine).unwrap();
        factory.place_fixture(&catalog, slot).unwrap();
        factory.tick().unwrap();

        let report = factory.report(&catalog).unwrap();
        assert_eq!(report.units.len(), 3);
        assert_eq!(report.uncollected.get(COPPER), Some(&dec!(0.2)));
        assert_eq!(report.uncollected.len(), 1);
        assert_eq!(report.balances.get(COPPER), Some(&Decimal::ZERO));
        assert_eq!(report.units.first().unwrap().display_name, "CM");
        assert!(report.to_string().contains("uncollected Copper: 0.2"));
    }
}
