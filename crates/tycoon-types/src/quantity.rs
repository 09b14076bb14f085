//! Resource quantities and contract/cost terms.
//!
//! All quantities use [`Decimal`] so that rates such as `0.1` accumulate
//! exactly. Comparisons that decide affordability or contract default are
//! made at [`SETTLEMENT_PRECISION`] decimal places.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::ids::ResourceId;

/// Decimal places used when deciding whether a balance covers a quantity.
pub const SETTLEMENT_PRECISION: u32 = 3;

/// Whether `available` covers `required` at [`SETTLEMENT_PRECISION`].
pub fn covers(available: Decimal, required: Decimal) -> bool {
    available.round_dp(SETTLEMENT_PRECISION) >= required.round_dp(SETTLEMENT_PRECISION)
}

/// Whether a quantity is representable at [`SETTLEMENT_PRECISION`].
///
/// Terms, costs, rates and starting balances must all pass this, so every
/// balance stays on the settlement grid and [`covers`] is exact.
pub fn within_precision(quantity: Decimal) -> bool {
    quantity.round_dp(SETTLEMENT_PRECISION) == quantity
}

/// A `(quantity, resource)` line: a building cost or a contract obligation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Term {
    /// How much of the resource.
    pub quantity: Decimal,
    /// Which resource.
    pub resource: ResourceId,
}

impl Term {
    /// Build a term.
    pub const fn new(quantity: Decimal, resource: ResourceId) -> Self {
        Self { quantity, resource }
    }
}

impl core::fmt::Display for Term {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{} x {}", self.quantity, self.resource)
    }
}

#[cfg(test)]
mod tests {
    use rust_decimal_macros::dec;

    use super::*;

    #[test]
    fn exact_balance_covers() {
        assert!(covers(dec!(3), dec!(3)));
        assert!(!covers(dec!(2), dec!(3)));
    }

    #[test]
    fn rounding_absorbs_sub_precision_noise() {
        assert!(covers(dec!(2.9999), dec!(3)));
        assert!(!covers(dec!(2.998), dec!(3)));
    }

    #[test]
    fn precision_ignores_trailing_zeros() {
        assert!(within_precision(dec!(3)));
        assert!(within_precision(dec!(0.001)));
        assert!(within_precision(dec!(2.5000)));
        assert!(!within_precision(dec!(0.0004)));
        assert!(!within_precision(dec!(2.9995)));
    }

    #[test]
    fn zero_balance_never_covers_positive_quantity() {
        assert!(!covers(Decimal::ZERO, dec!(0.01)));
    }
}
