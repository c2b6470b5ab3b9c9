//! Decimal money arithmetic for cart and order totals.
//!
//! All amounts are `rust_decimal::Decimal` in the currency's standard unit.
//! Nothing here rounds: `subtotal * rate` is kept exact so that totals
//! recomputed from the same lines are always bit-for-bit identical.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Errors constructing a [`TaxRate`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum TaxRateError {
    /// Rate outside `0..=1`.
    #[error("tax rate must be between 0 and 1 (got {0})")]
    OutOfRange(Decimal),
}

/// A fractional tax rate applied to the cart subtotal (e.g. `0.075` for 7.5%).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TaxRate(Decimal);

impl TaxRate {
    /// 7.5% VAT, the rate shown to customers at checkout.
    pub const DEFAULT: Self = Self(Decimal::from_parts(75, 0, 0, false, 3));

    /// Create a rate from a fraction.
    ///
    /// # Errors
    ///
    /// Returns [`TaxRateError::OutOfRange`] unless `0 <= rate <= 1`.
    pub fn new(rate: Decimal) -> Result<Self, TaxRateError> {
        if rate < Decimal::ZERO || rate > Decimal::ONE {
            return Err(TaxRateError::OutOfRange(rate));
        }
        Ok(Self(rate))
    }

    /// Create a rate from a whole-number percentage, e.g. `8` for 8%.
    ///
    /// # Errors
    ///
    /// Returns [`TaxRateError::OutOfRange`] unless `0 <= percent <= 100`.
    pub fn from_percent(percent: Decimal) -> Result<Self, TaxRateError> {
        Self::new(percent / Decimal::ONE_HUNDRED)
    }

    /// The rate as a fraction.
    #[must_use]
    pub const fn as_fraction(&self) -> Decimal {
        self.0
    }

    /// Tax owed on `amount`.
    #[must_use]
    pub fn apply(&self, amount: Decimal) -> Decimal {
        amount * self.0
    }
}

impl Default for TaxRate {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// Derived price summary shared by carts and orders.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Totals {
    /// Sum of `unit price * quantity` over every line.
    pub subtotal: Decimal,
    /// Flat delivery fee charged by the restaurant.
    pub delivery_fee: Decimal,
    /// `subtotal * tax rate`.
    pub tax: Decimal,
    /// `subtotal + delivery_fee + tax`.
    pub total: Decimal,
}

impl Totals {
    /// Compute totals from `(unit_price, quantity)` lines.
    #[must_use]
    pub fn compute<I>(lines: I, delivery_fee: Decimal, rate: TaxRate) -> Self
    where
        I: IntoIterator<Item = (Decimal, u32)>,
    {
        let subtotal = lines
            .into_iter()
            .map(|(price, quantity)| price * Decimal::from(quantity))
            .sum::<Decimal>();
        let tax = rate.apply(subtotal);
        Self {
            subtotal,
            delivery_fee,
            tax,
            total: subtotal + delivery_fee + tax,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_default_rate_is_seven_and_a_half_percent() {
        assert_eq!(TaxRate::DEFAULT.as_fraction(), Decimal::new(75, 3));
        assert_eq!(TaxRate::default(), TaxRate::DEFAULT);
    }

    #[test]
    fn test_rate_bounds() {
        assert!(TaxRate::new(Decimal::new(-1, 2)).is_err());
        assert!(TaxRate::new(Decimal::new(101, 2)).is_err());
        assert!(TaxRate::new(Decimal::ZERO).is_ok());
        assert_eq!(
            TaxRate::from_percent(Decimal::from(8)).unwrap().as_fraction(),
            Decimal::new(8, 2)
        );
    }

    #[test]
    fn test_totals_scenario() {
        let rate = TaxRate::from_percent(Decimal::from(8)).unwrap();
        let totals = Totals::compute([(Decimal::from(2000), 3)], Decimal::from(500), rate);
        assert_eq!(totals.subtotal, Decimal::from(6000));
        assert_eq!(totals.tax, Decimal::from(480));
        assert_eq!(totals.total, Decimal::from(6980));
    }

    #[test]
    fn test_totals_of_nothing_is_just_the_fee() {
        let totals = Totals::compute(std::iter::empty(), Decimal::from(500), TaxRate::DEFAULT);
        assert_eq!(totals.subtotal, Decimal::ZERO);
        assert_eq!(totals.tax, Decimal::ZERO);
        assert_eq!(totals.total, Decimal::from(500));
    }
}
