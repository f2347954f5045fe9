//! Fixed-point monetary amounts.
//!
//! Every amount in a schedule is an integer number of minor units (cents), so
//! sums over hundreds of installments never drift. `Decimal` is only used for
//! rates and for the single rounding step that turns `balance * rate` back
//! into cents.

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use std::iter::Sum;
use std::ops::{Add, AddAssign, Sub, SubAssign};

use crate::error::MoneyError;

/// A monetary amount held as a whole number of minor units.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(into = "Decimal", try_from = "Decimal")]
pub struct Money(i64);

impl Money {
    pub const ZERO: Money = Money(0);

    /// Number of decimal digits of one minor unit.
    pub const MINOR_UNIT_DIGITS: u32 = 2;

    pub const fn from_minor(minor: i64) -> Self {
        Money(minor)
    }

    pub const fn minor(self) -> i64 {
        self.0
    }

    /// Converts an amount in major units (e.g. `1062.74`).
    ///
    /// Amounts finer than one minor unit are rejected rather than rounded.
    pub fn from_major(amount: Decimal) -> Result<Self, MoneyError> {
        if amount.round_dp(Self::MINOR_UNIT_DIGITS) != amount {
            return Err(MoneyError::SubMinorPrecision(amount));
        }
        amount
            .checked_mul(Decimal::ONE_HUNDRED)
            .and_then(|minor| minor.to_i64())
            .map(Money)
            .ok_or(MoneyError::OutOfRange(amount))
    }

    /// Rounds an amount expressed in minor units to the nearest unit, half up.
    pub fn round_minor(minor: Decimal) -> Self {
        let rounded = minor.round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero);
        let saturated = if rounded.is_sign_negative() {
            i64::MIN
        } else {
            i64::MAX
        };
        Money(rounded.to_i64().unwrap_or(saturated))
    }

    /// Value in major units, always with two decimal places.
    pub fn to_major(self) -> Decimal {
        Decimal::new(self.0, Self::MINOR_UNIT_DIGITS)
    }

    pub fn to_minor_decimal(self) -> Decimal {
        Decimal::from(self.0)
    }

    /// Interest accrued on this balance over one period at `period_rate`.
    pub fn accrue(self, period_rate: Decimal) -> Money {
        Money::round_minor(self.to_minor_decimal() * period_rate)
    }

    /// Splits a non-negative amount into `parts` and returns the largest share.
    pub fn div_ceil(self, parts: u32) -> Money {
        let parts = i64::from(parts.max(1));
        Money((self.0 + parts - 1) / parts)
    }

    pub fn is_zero(self) -> bool {
        self.0 == 0
    }

    pub fn is_positive(self) -> bool {
        self.0 > 0
    }
}

impl From<Money> for Decimal {
    fn from(value: Money) -> Self {
        value.to_major()
    }
}

impl TryFrom<Decimal> for Money {
    type Error = MoneyError;

    fn try_from(value: Decimal) -> Result<Self, Self::Error> {
        Money::from_major(value)
    }
}

impl std::fmt::Display for Money {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.pad(&self.to_major().to_string())
    }
}

impl Add for Money {
    type Output = Money;

    fn add(self, rhs: Money) -> Money {
        Money(self.0 + rhs.0)
    }
}

impl AddAssign for Money {
    fn add_assign(&mut self, rhs: Money) {
        self.0 += rhs.0;
    }
}

impl Sub for Money {
    type Output = Money;

    fn sub(self, rhs: Money) -> Money {
        Money(self.0 - rhs.0)
    }
}

impl SubAssign for Money {
    fn sub_assign(&mut self, rhs: Money) {
        self.0 -= rhs.0;
    }
}

impl Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Money {
        iter.fold(Money::ZERO, Add::add)
    }
}

impl<'a> Sum<&'a Money> for Money {
    fn sum<I: Iterator<Item = &'a Money>>(iter: I) -> Money {
        iter.copied().sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use rust_decimal_macros::dec;

    #[rstest]
    #[case(dec!(1062.74), 106274)]
    #[case(dec!(100000), 10000000)]
    #[case(dec!(0.01), 1)]
    #[case(dec!(12.5), 1250)]
    fn test_from_major(#[case] major: Decimal, #[case] minor: i64) {
        assert_eq!(Money::from_major(major).unwrap(), Money::from_minor(minor));
    }

    #[test]
    fn test_from_major_rejects_fractions_of_a_cent() {
        assert_eq!(
            Money::from_major(dec!(10.005)),
            Err(MoneyError::SubMinorPrecision(dec!(10.005)))
        );
    }

    #[test]
    fn test_from_major_rejects_overflow() {
        assert!(matches!(
            Money::from_major(Decimal::MAX),
            Err(MoneyError::OutOfRange(_))
        ));
    }

    #[rstest]
    #[case(dec!(11386.5), 11387)]
    #[case(dec!(11386.49), 11386)]
    #[case(dec!(0.5), 1)]
    #[case(dec!(0), 0)]
    fn test_round_minor_is_half_up(#[case] minor: Decimal, #[case] expected: i64) {
        assert_eq!(Money::round_minor(minor).minor(), expected);
    }

    #[test]
    fn test_div_ceil_gives_remainder_to_first_share() {
        assert_eq!(Money::from_minor(100000).div_ceil(3).minor(), 33334);
        assert_eq!(Money::from_minor(99999).div_ceil(3).minor(), 33333);
        assert_eq!(Money::from_minor(5).div_ceil(1).minor(), 5);
    }

    #[test]
    fn test_accrue() {
        let balance = Money::from_minor(1200000);
        assert_eq!(balance.accrue(dec!(0.0094887929345829741263550692)).minor(), 11387);
        assert_eq!(balance.accrue(Decimal::ZERO), Money::ZERO);
    }

    #[test]
    fn test_serializes_in_major_units() {
        let json = serde_json::to_string(&Money::from_minor(106274)).unwrap();
        let back: Money = serde_json::from_str(&json).unwrap();
        assert_eq!(back, Money::from_minor(106274));
        assert_eq!(Money::from_minor(106274).to_string(), "1062.74");
    }

    #[test]
    fn test_display_respects_width() {
        assert_eq!(format!("{:>8}", Money::from_minor(150)), "    1.50");
    }
}
