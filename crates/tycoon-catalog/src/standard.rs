//! The built-in catalog used when no catalog data is configured.

use rust_decimal::Decimal;
use tycoon_types::{ResourceId, Term};

use crate::catalog::{BuildingSpec, Catalog, CatalogBuilder};
use crate::error::CatalogError;

/// Copper ore.
pub const COPPER: &str = "Copper";
/// Iron ore.
pub const IRON: &str = "Iron";

/// Cheap copper producer.
pub const COPPER_MINE: &str = "Copper Mine";
/// Cheap iron producer.
pub const IRON_MINE: &str = "Iron Mine";
/// Expensive, faster copper producer.
pub const DEEP_COPPER_MINE: &str = "Deep Copper Mine";
/// Non-buyable placeholder that permanently occupies a slot.
pub const BLOCKED_SLOT: &str = "Blocked Slot";

/// Build the standard two-ore catalog.
pub fn standard_catalog() -> Result<Catalog, CatalogError> {
    let mut b = CatalogBuilder::new();
    let copper = b.register_resource(COPPER)?;
    let iron = b.register_resource(IRON)?;

    b.register_building(BuildingSpec {
        name: COPPER_MINE.to_owned(),
        costs: vec![Term::new(Decimal::new(3, 0), copper)],
        output: copper,
        rate: Decimal::new(1, 1), // 0.1
        buyable: true,
    })?;
    b.register_building(BuildingSpec {
        name: IRON_MINE.to_owned(),
        costs: vec![Term::new(Decimal::new(5, 0), copper)],
        output: iron,
        rate: Decimal::new(1, 1), // 0.1
        buyable: true,
    })?;
    b.register_building(BuildingSpec {
        name: DEEP_COPPER_MINE.to_owned(),
        costs: vec![
            Term::new(Decimal::new(4, 0), copper),
            Term::new(Decimal::new(2, 0), iron),
        ],
        output: copper,
        rate: Decimal::new(3, 1), // 0.3
        buyable: true,
    })?;
    b.register_building(BuildingSpec {
        name: BLOCKED_SLOT.to_owned(),
        costs: Vec::new(),
        output: ResourceId::NULL,
        rate: Decimal::ZERO,
        buyable: false,
    })?;

    b.build()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn standard_catalog_builds() {
        let catalog = standard_catalog().unwrap();
        assert_eq!(catalog.resource_count(), 3);
        assert_eq!(catalog.building_count(), 4);
        assert_eq!(catalog.buildable().count(), 3);
    }

    #[test]
    fn every_buyable_building_has_costs() {
        let catalog = standard_catalog().unwrap();
        for building in catalog.buildable() {
            assert!(!building.costs.is_empty(), "{} is free", building.name);
        }
    }
}
