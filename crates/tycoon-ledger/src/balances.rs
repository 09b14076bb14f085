//! A factory's spendable balances.
//!
//! [`Balances`] holds exactly one entry per resource kind known to the
//! catalog, zero balances included. Debits are checked against
//! [`covers`](tycoon_types::covers) so a balance never goes negative after a
//! validated operation.

use std::collections::BTreeMap;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tycoon_types::{ResourceId, Term, covers};

use crate::LedgerError;

/// A line that a balance sheet cannot cover.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Shortfall {
    /// The resource that is short.
    pub resource: ResourceId,
    /// Total required of that resource across all lines checked.
    pub required: Decimal,
    /// Balance held.
    pub available: Decimal,
}

/// Spendable balances, one entry per resource kind.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Balances {
    entries: BTreeMap<ResourceId, Decimal>,
}

impl Balances {
    /// Create a sheet with a zero balance for every given kind.
    pub fn new(kinds: impl IntoIterator<Item = ResourceId>) -> Self {
        Self {
            entries: kinds.into_iter().map(|kind| (kind, Decimal::ZERO)).collect(),
        }
    }

    /// Current balance of a resource. A kind without an entry reads as zero.
    pub fn balance(&self, resource: ResourceId) -> Decimal {
        self.entries.get(&resource).copied().unwrap_or(Decimal::ZERO)
    }

    /// Whether the sheet has an entry for this kind.
    pub fn contains(&self, resource: ResourceId) -> bool {
        self.entries.contains_key(&resource)
    }

    /// Whether a single term is covered.
    pub fn covers(&self, term: &Term) -> bool {
        covers(self.balance(term.resource), term.quantity)
    }

    /// Check every line at once. Lines on the same resource are summed, so
    /// two lines of 3 Copper need 6 Copper.
    ///
    /// Returns the first shortfall in resource order, or `Ok(())` if
    /// everything is covered.
    pub fn covers_all(&self, terms: &[Term]) -> Result<(), Shortfall> {
        let mut required: BTreeMap<ResourceId, Decimal> = BTreeMap::new();
        for term in terms {
            let total = required.entry(term.resource).or_insert(Decimal::ZERO);
            // Saturate: a sum that overflows is unaffordable anyway.
            *total = total.checked_add(term.quantity).unwrap_or(Decimal::MAX);
        }
        for (resource, needed) in required {
            let available = self.balance(resource);
            if !covers(available, needed) {
                return Err(Shortfall {
                    resource,
                    required: needed,
                    available,
                });
            }
        }
        Ok(())
    }

    /// Add to a balance. Returns the new balance.
    pub fn credit(&mut self, resource: ResourceId, quantity: Decimal) -> Result<Decimal, LedgerError> {
        validate_quantity(quantity)?;
        let entry = self
            .entries
            .get_mut(&resource)
            .ok_or(LedgerError::UnknownResource(resource))?;
        *entry = entry
            .checked_add(quantity)
            .ok_or(LedgerError::ArithmeticOverflow { context: "balance credit" })?;
        Ok(*entry)
    }

    /// Remove from a balance. Returns the new balance.
    ///
    /// Fails with [`LedgerError::Insufficient`] unless the balance covers
    /// the quantity. A residue below the rounding precision clamps to zero.
    pub fn debit(&mut self, resource: ResourceId, quantity: Decimal) -> Result<Decimal, LedgerError> {
        validate_quantity(quantity)?;
        let entry = self
            .entries
            .get_mut(&resource)
            .ok_or(LedgerError::UnknownResource(resource))?;
        if !covers(*entry, quantity) {
            return Err(LedgerError::Insufficient {
                resource,
                requested: quantity,
                available: *entry,
            });
        }
        let remaining = entry
            .checked_sub(quantity)
            .ok_or(LedgerError::ArithmeticOverflow { context: "balance debit" })?;
        *entry = remaining.max(Decimal::ZERO);
        Ok(*entry)
    }

    /// Remove a covered quantity and return how much actually left the
    /// sheet.
    ///
    /// This equals `quantity` unless the balance sat within the rounding
    /// tolerance below it, in which case only the balance itself leaves.
    /// Credit the returned amount, never `quantity`, to keep totals exact.
    pub fn withdraw(&mut self, resource: ResourceId, quantity: Decimal) -> Result<Decimal, LedgerError> {
        let before = self.balance(resource);
        let after = self.debit(resource, quantity)?;
        before
            .checked_sub(after)
            .ok_or(LedgerError::ArithmeticOverflow { context: "balance withdraw" })
    }

    /// Debit every line, all-or-nothing. Nothing changes unless every line
    /// is covered.
    pub fn debit_all(&mut self, terms: &[Term]) -> Result<(), LedgerError> {
        if let Err(short) = self.covers_all(terms) {
            return Err(LedgerError::Insufficient {
                resource: short.resource,
                requested: short.required,
                available: short.available,
            });
        }
        for term in terms {
            self.debit(term.resource, term.quantity)?;
        }
        Ok(())
    }

    /// Iterate `(resource, balance)` pairs in resource order.
    pub fn iter(&self) -> impl Iterator<Item = (ResourceId, Decimal)> + '_ {
        self.entries.iter().map(|(kind, qty)| (*kind, *qty))
    }

    /// Copy of all balances.
    pub fn snapshot(&self) -> BTreeMap<ResourceId, Decimal> {
        self.entries.clone()
    }
}

fn validate_quantity(quantity: Decimal) -> Result<(), LedgerError> {
    if quantity.is_zero() {
        return Err(LedgerError::ZeroQuantity);
    }
    if quantity.is_sign_negative() {
        return Err(LedgerError::NegativeQuantity { quantity });
    }
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use rust_decimal_macros::dec;

    use super::*;

    const COPPER: ResourceId = ResourceId(1);
    const IRON: ResourceId = ResourceId(2);

    fn sheet() -> Balances {
        Balances::new([ResourceId::NULL, COPPER, IRON])
    }

    #[test]
    fn every_kind_starts_at_zero() {
        let b = sheet();
        assert_eq!(b.iter().count(), 3);
        assert!(b.iter().all(|(_, qty)| qty.is_zero()));
    }

    #[test]
    fn credit_then_debit() {
        let mut b = sheet();
        assert_eq!(b.credit(COPPER, dec!(5)).unwrap(), dec!(5));
        assert_eq!(b.debit(COPPER, dec!(3)).unwrap(), dec!(2));
    }

    #[test]
    fn debit_beyond_balance_fails_and_leaves_balance() {
        let mut b = sheet();
        b.credit(COPPER, dec!(2)).unwrap();
        let err = b.debit(COPPER, dec!(3)).unwrap_err();
        assert!(matches!(err, LedgerError::Insufficient { .. }));
        assert_eq!(b.balance(COPPER), dec!(2));
    }

    #[test]
    fn sub_precision_residue_clamps_to_zero() {
        let mut b = sheet();
        b.credit(COPPER, dec!(2.9999)).unwrap();
        assert_eq!(b.debit(COPPER, dec!(3)).unwrap(), Decimal::ZERO);
    }

    #[test]
    fn withdraw_reports_what_actually_left() {
        let mut b = sheet();
        b.credit(COPPER, dec!(2.9995)).unwrap();
        assert_eq!(b.withdraw(COPPER, dec!(3)).unwrap(), dec!(2.9995));
        assert_eq!(b.balance(COPPER), Decimal::ZERO);

        b.credit(COPPER, dec!(5)).unwrap();
        assert_eq!(b.withdraw(COPPER, dec!(3)).unwrap(), dec!(3));
        assert_eq!(b.balance(COPPER), dec!(2));
    }

    #[test]
    fn covers_all_sums_lines_on_same_resource() {
        let mut b = sheet();
        b.credit(COPPER, dec!(5)).unwrap();
        let terms = [Term::new(dec!(3), COPPER), Term::new(dec!(3), COPPER)];
        let short = b.covers_all(&terms).unwrap_err();
        assert_eq!(short.required, dec!(6));
        assert_eq!(short.available, dec!(5));
    }

    #[test]
    fn debit_all_is_all_or_nothing() {
        let mut b = sheet();
        b.credit(COPPER, dec!(10)).unwrap();
        let terms = [Term::new(dec!(4), COPPER), Term::new(dec!(2), IRON)];
        assert!(b.debit_all(&terms).is_err());
        assert_eq!(b.balance(COPPER), dec!(10));
        assert_eq!(b.balance(IRON), Decimal::ZERO);
    }

    #[test]
    fn unknown_kind_reads_zero_and_rejects_credit() {
        let mut b = sheet();
        assert_eq!(b.balance(ResourceId(9)), Decimal::ZERO);
        assert!(!b.covers(&Term::new(dec!(1), ResourceId(9))));
        assert!(matches!(
            b.credit(ResourceId(9), dec!(1)),
            Err(LedgerError::UnknownResource(_))
        ));
    }

    #[test]
    fn zero_and_negative_quantities_rejected() {
        let mut b = sheet();
        assert!(matches!(b.credit(COPPER, Decimal::ZERO), Err(LedgerError::ZeroQuantity)));
        assert!(matches!(
            b.credit(COPPER, dec!(-1)),
            Err(LedgerError::NegativeQuantity { .. })
        ));
    }
}
