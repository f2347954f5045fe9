//! Payment schedule generation.
//!
//! All three methods share one accounting step per period: interest accrues on
//! the outstanding balance, the scheduled principal portion is repaid, and any
//! extra payment is applied on top. The methods differ only in how the
//! principal portion is chosen.

use rust_decimal::Decimal;
use serde::Serialize;
use tracing::{debug, trace};

use crate::config::EngineConfig;
use crate::error::ValidationError;
use crate::loan::{LoanRequest, LoanSpec, PaymentFrequency, RateType};
use crate::money::Money;
use crate::rate::{annuity_payment, effective_annual_rate, normalize_annual_interest_rate};

/// One row of the payment schedule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Installment {
    /// 1-based position in the schedule.
    pub period_index: u32,
    /// Scheduled payment: always `principal_portion + interest_portion`.
    pub payment_amount: Money,
    pub principal_portion: Money,
    pub interest_portion: Money,
    /// Extra principal paid with this installment, reported apart from
    /// `payment_amount`.
    pub extra_portion: Money,
    /// Balance left after the scheduled and the extra principal.
    pub remaining_balance: Money,
}

/// A complete schedule and its totals.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AmortizationResult {
    pub principal: Money,
    pub rate_type: RateType,
    pub payment_frequency: PaymentFrequency,
    /// Per-period rate as a decimal (not percentage).
    pub period_rate: Decimal,
    /// Installments the loan was contracted for.
    pub scheduled_periods: u32,
    pub installments: Vec<Installment>,
    pub total_interest_paid: Money,
    pub total_extra_paid: Money,
    /// Everything paid: installments plus extra payments.
    pub total_paid: Money,
    pub first_payment: Money,
    pub last_payment: Money,
    /// Annual percentage equivalent of `period_rate`.
    pub effective_annual_rate: Decimal,
}

impl AmortizationResult {
    fn new(spec: &LoanSpec, period_rate: Decimal, installments: Vec<Installment>) -> Self {
        let total_interest_paid = installments.iter().map(|i| i.interest_portion).sum();
        let total_extra_paid: Money = installments.iter().map(|i| i.extra_portion).sum();
        let scheduled_paid: Money = installments.iter().map(|i| i.payment_amount).sum();

        AmortizationResult {
            principal: spec.principal(),
            rate_type: spec.rate_type(),
            payment_frequency: spec.payment_frequency(),
            period_rate,
            scheduled_periods: spec.total_periods(),
            total_interest_paid,
            total_extra_paid,
            total_paid: scheduled_paid + total_extra_paid,
            first_payment: installments
                .first()
                .map(|i| i.payment_amount)
                .unwrap_or_default(),
            last_payment: installments
                .last()
                .map(|i| i.payment_amount)
                .unwrap_or_default(),
            effective_annual_rate: effective_annual_rate(period_rate, spec.payment_frequency()),
            installments,
        }
    }

    /// Installments skipped thanks to early payoff.
    pub fn periods_saved(&self) -> u32 {
        let paid = u32::try_from(self.installments.len()).unwrap_or(u32::MAX);
        self.scheduled_periods.saturating_sub(paid)
    }

    /// Balance left after the last installment; zero for every complete schedule.
    pub fn final_balance(&self) -> Money {
        self.installments
            .last()
            .map(|i| i.remaining_balance)
            .unwrap_or(self.principal)
    }
}

/// What an equal-installment schedule does after an extra payment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum AfterExtraPayment {
    /// Keep the installment, finish earlier.
    ReduceTerm,
    /// Keep the term, re-amortize the balance into a lower installment.
    ReduceInstallment,
}

/// Validates a request with the default limits and computes its schedule.
pub fn amortize(request: LoanRequest) -> Result<AmortizationResult, ValidationError> {
    let spec = LoanSpec::try_from(request)?;
    Ok(compute_schedule(&spec))
}

/// Computes the payment schedule of a validated loan with default settings.
pub fn compute_schedule(spec: &LoanSpec) -> AmortizationResult {
    compute_schedule_with(spec, &EngineConfig::default())
}

/// Computes the payment schedule of a validated loan.
///
/// The computation is pure: equal inputs always produce equal results.
pub fn compute_schedule_with(spec: &LoanSpec, config: &EngineConfig) -> AmortizationResult {
    let period_rate =
        normalize_annual_interest_rate(spec.annual_rate_percent(), spec.payment_frequency());
    let tolerance = config.payoff_tolerance();

    let installments = match spec.rate_type() {
        RateType::Fixed => equal_installments(
            spec,
            period_rate,
            tolerance,
            AfterExtraPayment::ReduceInstallment,
        ),
        RateType::PriceTable => {
            equal_installments(spec, period_rate, tolerance, AfterExtraPayment::ReduceTerm)
        }
        RateType::Sac => constant_amortization(spec, period_rate, tolerance),
    };

    let result = AmortizationResult::new(spec, period_rate, installments);
    debug!(
        rate_type = %result.rate_type,
        frequency = %result.payment_frequency,
        scheduled = result.scheduled_periods,
        installments = result.installments.len(),
        total_interest = %result.total_interest_paid,
        total_paid = %result.total_paid,
        "amortization schedule computed"
    );
    result
}

/// Price table and fixed installment schedules.
///
/// The installment is `PMT = P * i / (1 - (1 + i)^-n)`; each period repays
/// `PMT - interest` and the last period settles whatever is left, absorbing
/// the rounding drift.
fn equal_installments(
    spec: &LoanSpec,
    period_rate: Decimal,
    tolerance: Money,
    after_extra: AfterExtraPayment,
) -> Vec<Installment> {
    let periods = spec.total_periods();
    let mut balance = spec.principal();
    let mut installment = annuity_payment(balance, period_rate, periods);
    let mut installments = Vec::with_capacity(periods as usize);

    for period in 1..=periods {
        let interest = balance.accrue(period_rate);
        let principal = if period == periods {
            balance
        } else {
            (installment - interest).max(Money::ZERO).min(balance)
        };

        let row = settle_period(
            &mut balance,
            period,
            principal,
            interest,
            spec.extra_payment_at(period),
            tolerance,
        );
        let extra_paid = row.extra_portion.is_positive();
        installments.push(row);

        if balance.is_zero() {
            break;
        }
        if extra_paid && after_extra == AfterExtraPayment::ReduceInstallment {
            installment = annuity_payment(balance, period_rate, periods - period);
        }
    }

    installments
}

/// SAC schedule: the principal portion is the balance split evenly over the
/// periods still to go.
///
/// Splitting with a ceiling puts the indivisible cents in the earliest
/// periods, so principal portions and payments never increase. After an extra
/// payment the split is taken over a smaller balance, which lowers every later
/// installment.
///
/// The ceiling replaces half-up rounding with a last-period adjustment: that
/// adjustment could make the final payment larger than the one before it.
fn constant_amortization(
    spec: &LoanSpec,
    period_rate: Decimal,
    tolerance: Money,
) -> Vec<Installment> {
    let periods = spec.total_periods();
    let mut balance = spec.principal();
    let mut installments = Vec::with_capacity(periods as usize);

    for period in 1..=periods {
        let interest = balance.accrue(period_rate);
        let principal = balance.div_ceil(periods - period + 1);

        installments.push(settle_period(
            &mut balance,
            period,
            principal,
            interest,
            spec.extra_payment_at(period),
            tolerance,
        ));

        if balance.is_zero() {
            break;
        }
    }

    installments
}

/// Applies one period's principal and extra payment to `balance`.
fn settle_period(
    balance: &mut Money,
    period_index: u32,
    principal: Money,
    interest: Money,
    extra_requested: Money,
    tolerance: Money,
) -> Installment {
    *balance -= principal;

    let mut extra = extra_requested.min(*balance);
    *balance -= extra;

    if extra.is_positive() && *balance <= tolerance {
        extra += *balance;
        *balance = Money::ZERO;
    }

    if extra.is_positive() && balance.is_zero() {
        trace!(period = period_index, "loan paid off early");
    }

    Installment {
        period_index,
        payment_amount: principal + interest,
        principal_portion: principal,
        interest_portion: interest,
        extra_portion: extra,
        remaining_balance: *balance,
    }
}
