//! Production units: purchased building instances.
//!
//! A unit accumulates its building's output every production tick. The
//! accumulator is not spendable; it only reaches the factory ledger through
//! collection, which drains it back to zero.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tycoon_types::{BuildingId, ResourceId, UnitId};

/// A purchased building with an uncollected-output accumulator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductionUnit {
    id: UnitId,
    building: BuildingId,
    output: ResourceId,
    rate: Decimal,
    accumulator: Decimal,
}

impl ProductionUnit {
    /// Create a unit with an empty accumulator. Use
    /// [`Catalog::instantiate`](crate::Catalog::instantiate) rather than
    /// calling this directly.
    pub(crate) fn new(building: BuildingId, output: ResourceId, rate: Decimal) -> Self {
        Self {
            id: UnitId::new(),
            building,
            output,
            rate,
            accumulator: Decimal::ZERO,
        }
    }

    /// This unit's identifier.
    pub const fn id(&self) -> UnitId {
        self.id
    }

    /// The building type this unit was created from.
    pub const fn building(&self) -> BuildingId {
        self.building
    }

    /// The resource this unit produces.
    pub const fn output(&self) -> ResourceId {
        self.output
    }

    /// Units of output produced per tick.
    pub const fn rate(&self) -> Decimal {
        self.rate
    }

    /// Produced but not yet collected output.
    pub const fn accumulator(&self) -> Decimal {
        self.accumulator
    }

    /// Run one production tick. Returns the new accumulator value, or
    /// `None` on overflow (the accumulator is left unchanged).
    pub fn advance(&mut self) -> Option<Decimal> {
        let next = self.accumulator.checked_add(self.rate)?;
        self.accumulator = next;
        Some(next)
    }

    /// Drain the accumulator, returning what it held.
    pub const fn take(&mut self) -> Decimal {
        let taken = self.accumulator;
        self.accumulator = Decimal::ZERO;
        taken
    }
}

#[cfg(test)]
mod tests {
    use rust_decimal_macros::dec;

    use super::*;

    #[test]
    fn new_unit_starts_empty() {
        let unit = ProductionUnit::new(BuildingId(1), ResourceId(1), dec!(0.1));
        assert_eq!(unit.accumulator(), Decimal::ZERO);
    }

    #[test]
    fn ten_ticks_at_a_tenth_is_exactly_one() {
        let mut unit = ProductionUnit::new(BuildingId(1), ResourceId(1), dec!(0.1));
        for _ in 0..10 {
            assert!(unit.advance().is_some());
        }
        assert_eq!(unit.accumulator(), dec!(1.0));
    }

    #[test]
    fn take_zeroes_accumulator() {
        let mut unit = ProductionUnit::new(BuildingId(1), ResourceId(1), dec!(2));
        unit.advance();
        assert_eq!(unit.take(), dec!(2));
        assert_eq!(unit.take(), Decimal::ZERO);
    }

    #[test]
    fn overflow_leaves_accumulator_untouched() {
        let mut unit = ProductionUnit::new(BuildingId(1), ResourceId(1), Decimal::MAX);
        assert!(unit.advance().is_some());
        assert!(unit.advance().is_none());
        assert_eq!(unit.accumulator(), Decimal::MAX);
    }
}
