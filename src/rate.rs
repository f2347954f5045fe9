//! Interest rate conversions and the annuity ("Price") installment formula.

use rust_decimal::{Decimal, MathematicalOps};

use crate::loan::PaymentFrequency;
use crate::money::Money;

/// Normalizes an annual interest rate percentage to a per-period decimal rate.
///
/// The conversion is compound, not divided: 12% per year becomes
/// `(1.12)^(1/12) - 1 ≈ 0.9489%` per month, so that compounding the period
/// rate over one year gives back exactly the stated annual rate.
pub fn normalize_annual_interest_rate(
    annual_rate_percent: Decimal,
    frequency: PaymentFrequency,
) -> Decimal {
    if annual_rate_percent.is_zero() {
        return Decimal::ZERO;
    }

    let base = Decimal::ONE + annual_rate_percent / Decimal::ONE_HUNDRED;
    let exponent = Decimal::ONE / Decimal::from(frequency.periods_per_year());

    base.powd(exponent) - Decimal::ONE
}

/// Annual rate, as a percentage, produced by compounding `period_rate` over one year.
///
/// Rounded to four decimal places.
pub fn effective_annual_rate(period_rate: Decimal, frequency: PaymentFrequency) -> Decimal {
    (Decimal::ONE + period_rate)
        .checked_powu(u64::from(frequency.periods_per_year()))
        .and_then(|growth| (growth - Decimal::ONE).checked_mul(Decimal::ONE_HUNDRED))
        .unwrap_or(Decimal::MAX)
        .round_dp(4)
}

/// Number of installments needed to cover `term_months` at the given frequency.
///
/// Non-monthly terms are rounded half up to a whole number of periods, with a
/// minimum of one: 12 months is 26 biweekly periods, 1 month is 2.
pub fn total_periods(term_months: u32, frequency: PaymentFrequency) -> u32 {
    match frequency {
        PaymentFrequency::Monthly => term_months,
        PaymentFrequency::Biweekly | PaymentFrequency::Weekly => {
            let doubled = u64::from(term_months) * u64::from(frequency.periods_per_year()) * 2;
            let periods = (doubled + 12) / 24;
            u32::try_from(periods).unwrap_or(u32::MAX).max(1)
        }
    }
}

/// Constant installment that repays `balance` in `periods` equal payments.
///
/// Price table formula: `PMT = P * i / (1 - (1 + i)^-n)`, or `P / n` for a zero
/// rate. The result is rounded half up to the nearest cent.
pub fn annuity_payment(balance: Money, period_rate: Decimal, periods: u32) -> Money {
    if periods == 0 {
        return balance;
    }

    let principal = balance.to_minor_decimal();
    let even_split = principal / Decimal::from(periods);

    if period_rate.is_zero() {
        return Money::round_minor(even_split);
    }

    // (1 + i)^n beyond Decimal range means the discount factor is effectively zero.
    let discount = match (Decimal::ONE + period_rate).checked_powu(u64::from(periods)) {
        Some(growth) => Decimal::ONE / growth,
        None => Decimal::ZERO,
    };

    let payment = (principal * period_rate)
        .checked_div(Decimal::ONE - discount)
        .unwrap_or(even_split);

    Money::round_minor(payment)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use rust_decimal_macros::dec;

    #[test]
    fn test_normalize_annual_interest_rate() {
        // (1.12)^(1/12) - 1 = 0.0094887929...
        let monthly_rate = normalize_annual_interest_rate(dec!(12), PaymentFrequency::Monthly);
        assert!(monthly_rate > dec!(0.0094887) && monthly_rate < dec!(0.0094888));
    }

    #[rstest]
    #[case(PaymentFrequency::Biweekly, dec!(0.0043683), dec!(0.0043684))]
    #[case(PaymentFrequency::Weekly, dec!(0.0021817), dec!(0.0021818))]
    fn test_normalize_other_frequencies(
        #[case] frequency: PaymentFrequency,
        #[case] low: Decimal,
        #[case] high: Decimal,
    ) {
        let rate = normalize_annual_interest_rate(dec!(12), frequency);
        assert!(rate > low && rate < high, "rate {rate} outside ({low}, {high})");
    }

    #[test]
    fn test_zero_rate_stays_zero() {
        let rate = normalize_annual_interest_rate(Decimal::ZERO, PaymentFrequency::Weekly);
        assert!(rate.is_zero());
    }

    #[rstest]
    #[case(PaymentFrequency::Monthly)]
    #[case(PaymentFrequency::Biweekly)]
    #[case(PaymentFrequency::Weekly)]
    fn test_effective_rate_recovers_annual_rate(#[case] frequency: PaymentFrequency) {
        let rate = normalize_annual_interest_rate(dec!(10.5), frequency);
        assert_eq!(effective_annual_rate(rate, frequency), dec!(10.5000));
    }

    #[rstest]
    #[case(12, PaymentFrequency::Monthly, 12)]
    #[case(12, PaymentFrequency::Biweekly, 26)]
    #[case(12, PaymentFrequency::Weekly, 52)]
    #[case(1, PaymentFrequency::Biweekly, 2)]
    #[case(1, PaymentFrequency::Weekly, 4)]
    #[case(6, PaymentFrequency::Biweekly, 13)]
    #[case(7, PaymentFrequency::Biweekly, 15)]
    fn test_total_periods(
        #[case] term_months: u32,
        #[case] frequency: PaymentFrequency,
        #[case] expected: u32,
    ) {
        assert_eq!(total_periods(term_months, frequency), expected);
    }

    #[test]
    fn test_annuity_payment_matches_price_table() {
        let rate = normalize_annual_interest_rate(dec!(12), PaymentFrequency::Monthly);
        assert_eq!(
            annuity_payment(Money::from_minor(1200000), rate, 12),
            Money::from_minor(106274)
        );
        assert_eq!(
            annuity_payment(Money::from_minor(10000000), rate, 12),
            Money::from_minor(885621)
        );
    }

    #[test]
    fn test_annuity_payment_zero_rate_splits_evenly() {
        assert_eq!(
            annuity_payment(Money::from_minor(100000), Decimal::ZERO, 3),
            Money::from_minor(33333)
        );
    }

    #[test]
    fn test_annuity_payment_single_period_repays_with_interest() {
        let rate = normalize_annual_interest_rate(dec!(12), PaymentFrequency::Monthly);
        assert_eq!(
            annuity_payment(Money::from_minor(10000000), rate, 1),
            Money::from_minor(10094888)
        );
    }
}
