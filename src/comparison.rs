//! Side-by-side Price and SAC simulation of the same loan.

use serde::Serialize;

use crate::config::EngineConfig;
use crate::loan::{LoanSpec, RateType};
use crate::money::Money;
use crate::schedule::{AmortizationResult, compute_schedule_with};

/// Contains the results for both Price and SAC table calculations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DebtTrajectoryResult {
    /// The initial total amount of the loan.
    pub initial_total_amount: Money,
    /// The loan amortized with the Price table.
    pub price_table: AmortizationResult,
    /// The loan amortized with SAC.
    pub sac_table: AmortizationResult,
    /// Interest saved by choosing SAC over Price. Negative when extra
    /// payments make the Price schedule cheaper.
    pub sac_interest_savings: Money,
}

/// Calculates and compares the debt trajectory under Price and SAC.
///
/// The rate type of `spec` is ignored; everything else, extra payments
/// included, applies to both schedules.
pub fn calculate_debt_trajectory(spec: &LoanSpec) -> DebtTrajectoryResult {
    calculate_debt_trajectory_with(spec, &EngineConfig::default())
}

pub fn calculate_debt_trajectory_with(
    spec: &LoanSpec,
    config: &EngineConfig,
) -> DebtTrajectoryResult {
    let price_table = compute_schedule_with(&spec.with_rate_type(RateType::PriceTable), config);
    let sac_table = compute_schedule_with(&spec.with_rate_type(RateType::Sac), config);

    DebtTrajectoryResult {
        initial_total_amount: spec.principal(),
        sac_interest_savings: price_table.total_interest_paid - sac_table.total_interest_paid,
        price_table,
        sac_table,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loan::{ExtraPayment, LoanTerms, PaymentFrequency};
    use rust_decimal_macros::dec;

    fn spec() -> LoanSpec {
        LoanSpec::new(LoanTerms {
            principal: dec!(12000),
            annual_rate_percent: dec!(12),
            term_months: 12,
            payment_frequency: PaymentFrequency::Monthly,
            rate_type: RateType::Fixed,
            extra_payments: vec![],
        })
        .unwrap()
    }

    #[test]
    fn test_calculate_debt_trajectory_happy_path() {
        let result = calculate_debt_trajectory(&spec());

        assert_eq!(result.initial_total_amount, Money::from_minor(1200000));

        // Assertions for SAC table
        assert_eq!(result.sac_table.rate_type, RateType::Sac);
        assert_eq!(result.sac_table.first_payment, Money::from_minor(111387));
        assert_eq!(result.sac_table.last_payment, Money::from_minor(100949));

        // Assertions for Price table
        assert_eq!(result.price_table.rate_type, RateType::PriceTable);
        assert_eq!(result.price_table.first_payment, Money::from_minor(106274));

        assert!(result.sac_interest_savings.is_positive());
        assert_eq!(
            result.sac_interest_savings,
            result.price_table.total_interest_paid - result.sac_table.total_interest_paid
        );
    }

    #[test]
    fn test_extra_payments_apply_to_both_tables() {
        let spec = LoanSpec::new(LoanTerms {
            principal: dec!(100000),
            annual_rate_percent: dec!(12),
            term_months: 12,
            payment_frequency: PaymentFrequency::Monthly,
            rate_type: RateType::Sac,
            extra_payments: vec![ExtraPayment {
                period_index: 6,
                amount: dec!(20000),
            }],
        })
        .unwrap();

        let result = calculate_debt_trajectory(&spec);
        assert_eq!(result.price_table.installments.len(), 10);
        assert_eq!(result.sac_table.installments.len(), 12);
        assert_eq!(result.price_table.total_extra_paid, Money::from_minor(2000000));
        assert_eq!(result.sac_table.total_extra_paid, Money::from_minor(2000000));
        // 5255.56 under Price against 5503.50 under SAC.
        assert_eq!(result.sac_interest_savings, Money::from_minor(-24794));
    }
}
