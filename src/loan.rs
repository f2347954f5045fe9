//! Loan parameters and their validation.
//!
//! A [`LoanSpec`] can only be obtained through a checked constructor, so the
//! schedule generator never sees a partially valid loan.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::str::FromStr;
use tracing::debug;

use crate::config::EngineConfig;
use crate::error::{FieldErrors, ValidationError};
use crate::money::Money;
use crate::rate::total_periods;

/// How often installments are due.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentFrequency {
    #[default]
    Monthly,
    Biweekly,
    Weekly,
}

impl PaymentFrequency {
    pub fn periods_per_year(self) -> u32 {
        match self {
            PaymentFrequency::Monthly => 12,
            PaymentFrequency::Biweekly => 26,
            PaymentFrequency::Weekly => 52,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            PaymentFrequency::Monthly => "MONTHLY",
            PaymentFrequency::Biweekly => "BIWEEKLY",
            PaymentFrequency::Weekly => "WEEKLY",
        }
    }
}

impl FromStr for PaymentFrequency {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "MONTHLY" => Ok(PaymentFrequency::Monthly),
            "BIWEEKLY" => Ok(PaymentFrequency::Biweekly),
            "WEEKLY" => Ok(PaymentFrequency::Weekly),
            _ => Err(format!(
                "unknown payment frequency '{s}', expected MONTHLY, BIWEEKLY or WEEKLY"
            )),
        }
    }
}

impl std::fmt::Display for PaymentFrequency {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Amortization method.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RateType {
    /// Equal installments; an extra payment lowers the remaining installments.
    Fixed,
    /// Price table (Sistema Francês): equal installments; an extra payment
    /// shortens the schedule.
    PriceTable,
    /// Sistema de Amortização Constante: equal principal portions, decreasing
    /// installments.
    Sac,
}

impl RateType {
    pub fn as_str(self) -> &'static str {
        match self {
            RateType::Fixed => "FIXED",
            RateType::PriceTable => "PRICE_TABLE",
            RateType::Sac => "SAC",
        }
    }
}

impl FromStr for RateType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "FIXED" => Ok(RateType::Fixed),
            "PRICE_TABLE" | "PRICE" => Ok(RateType::PriceTable),
            "SAC" => Ok(RateType::Sac),
            _ => Err(format!(
                "unknown rate type '{s}', expected FIXED, PRICE_TABLE or SAC"
            )),
        }
    }
}

impl std::fmt::Display for RateType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An additional principal payment made together with a scheduled installment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtraPayment {
    /// 1-based installment the payment is made with.
    pub period_index: u32,
    /// Amount in major units.
    pub amount: Decimal,
}

/// Typed loan parameters, before validation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoanTerms {
    /// The principal amount of the loan, in major units.
    pub principal: Decimal,
    /// The annual interest rate as a percentage (e.g., 10.5 for 10.5%).
    pub annual_rate_percent: Decimal,
    /// The loan term in months.
    pub term_months: u32,
    #[serde(default)]
    pub payment_frequency: PaymentFrequency,
    pub rate_type: RateType,
    #[serde(default)]
    pub extra_payments: Vec<ExtraPayment>,
}

/// Loan parameters as they arrive in a request body.
///
/// Enumerations are kept as strings so that unknown values are reported as
/// field errors together with every other violation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoanRequest {
    pub principal: Decimal,
    pub annual_rate_percent: Decimal,
    pub term_months: u32,
    #[serde(default = "default_frequency_name")]
    pub payment_frequency: String,
    pub rate_type: String,
    #[serde(default)]
    pub extra_payments: Vec<ExtraPayment>,
}

fn default_frequency_name() -> String {
    PaymentFrequency::Monthly.as_str().to_string()
}

impl LoanRequest {
    /// Checks the request against `config` limits and builds the loan.
    pub fn validate(&self, config: &EngineConfig) -> Result<LoanSpec, ValidationError> {
        let mut errors = FieldErrors::default();

        let frequency = self
            .payment_frequency
            .parse::<PaymentFrequency>()
            .map_err(|reason| errors.push("payment_frequency", reason))
            .ok();
        let rate_type = self
            .rate_type
            .parse::<RateType>()
            .map_err(|reason| errors.push("rate_type", reason))
            .ok();

        let checked = check_terms(
            self.principal,
            self.annual_rate_percent,
            self.term_months,
            frequency,
            &self.extra_payments,
            config,
            &mut errors,
        );

        let spec = match (checked, frequency, rate_type) {
            (Some(checked), Some(frequency), Some(rate_type)) => {
                Some(checked.into_spec(
                    self.annual_rate_percent,
                    self.term_months,
                    frequency,
                    rate_type,
                ))
            }
            _ => None,
        };
        finish(errors, spec)
    }
}

impl TryFrom<LoanRequest> for LoanSpec {
    type Error = ValidationError;

    fn try_from(request: LoanRequest) -> Result<Self, Self::Error> {
        request.validate(&EngineConfig::default())
    }
}

/// A validated loan, ready to be amortized.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LoanSpec {
    principal: Money,
    annual_rate_percent: Decimal,
    term_months: u32,
    payment_frequency: PaymentFrequency,
    rate_type: RateType,
    total_periods: u32,
    extra_payments: BTreeMap<u32, Money>,
}

impl LoanSpec {
    /// Validates `terms` against the default limits.
    pub fn new(terms: LoanTerms) -> Result<Self, ValidationError> {
        Self::with_config(terms, &EngineConfig::default())
    }

    pub fn with_config(terms: LoanTerms, config: &EngineConfig) -> Result<Self, ValidationError> {
        let mut errors = FieldErrors::default();
        let checked = check_terms(
            terms.principal,
            terms.annual_rate_percent,
            terms.term_months,
            Some(terms.payment_frequency),
            &terms.extra_payments,
            config,
            &mut errors,
        );

        let spec = checked.map(|checked| {
            checked.into_spec(
                terms.annual_rate_percent,
                terms.term_months,
                terms.payment_frequency,
                terms.rate_type,
            )
        });
        finish(errors, spec)
    }

    /// The same loan amortized with a different method.
    pub fn with_rate_type(&self, rate_type: RateType) -> LoanSpec {
        LoanSpec {
            rate_type,
            ..self.clone()
        }
    }

    pub fn principal(&self) -> Money {
        self.principal
    }

    pub fn annual_rate_percent(&self) -> Decimal {
        self.annual_rate_percent
    }

    pub fn term_months(&self) -> u32 {
        self.term_months
    }

    pub fn payment_frequency(&self) -> PaymentFrequency {
        self.payment_frequency
    }

    pub fn rate_type(&self) -> RateType {
        self.rate_type
    }

    /// Number of installments before any early payoff.
    pub fn total_periods(&self) -> u32 {
        self.total_periods
    }

    /// Extra payment due with installment `period_index`, zero if none.
    pub fn extra_payment_at(&self, period_index: u32) -> Money {
        self.extra_payments
            .get(&period_index)
            .copied()
            .unwrap_or(Money::ZERO)
    }

    pub fn extra_payments(&self) -> impl Iterator<Item = (u32, Money)> + '_ {
        self.extra_payments.iter().map(|(period, amount)| (*period, *amount))
    }
}

/// Values that passed validation, converted to their engine representation.
struct CheckedTerms {
    principal: Money,
    total_periods: u32,
    extra_payments: BTreeMap<u32, Money>,
}

impl CheckedTerms {
    fn into_spec(
        self,
        annual_rate_percent: Decimal,
        term_months: u32,
        payment_frequency: PaymentFrequency,
        rate_type: RateType,
    ) -> LoanSpec {
        LoanSpec {
            principal: self.principal,
            annual_rate_percent,
            term_months,
            payment_frequency,
            rate_type,
            total_periods: self.total_periods,
            extra_payments: self.extra_payments,
        }
    }
}

/// `spec` is only `None` when at least one field error was recorded.
fn finish(errors: FieldErrors, spec: Option<LoanSpec>) -> Result<LoanSpec, ValidationError> {
    match spec {
        Some(spec) if errors.is_empty() => Ok(spec),
        _ => {
            debug!(errors = errors.len(), "loan parameters rejected");
            Err(errors.into_error())
        }
    }
}

/// Records every violation in `errors`; returns the converted values only
/// when all checks passed.
fn check_terms(
    principal: Decimal,
    annual_rate_percent: Decimal,
    term_months: u32,
    frequency: Option<PaymentFrequency>,
    extra_payments: &[ExtraPayment],
    config: &EngineConfig,
    errors: &mut FieldErrors,
) -> Option<CheckedTerms> {
    let before = errors.len();

    let principal = if principal <= Decimal::ZERO {
        errors.push("principal", "must be greater than zero");
        None
    } else if principal > config.principal_limit() {
        errors.push(
            "principal",
            format!("must not exceed {}", config.principal_limit()),
        );
        None
    } else {
        Money::from_major(principal)
            .map_err(|e| errors.push("principal", e.to_string()))
            .ok()
    };

    if annual_rate_percent < Decimal::ZERO {
        errors.push("annual_rate_percent", "must not be negative");
    } else if annual_rate_percent > config.annual_rate_percent_limit() {
        errors.push(
            "annual_rate_percent",
            format!("must not exceed {}", config.annual_rate_percent_limit()),
        );
    }

    let term_valid = if term_months == 0 {
        errors.push("term_months", "must be at least 1");
        false
    } else if term_months > config.term_months_limit() {
        errors.push(
            "term_months",
            format!("must not exceed {}", config.term_months_limit()),
        );
        false
    } else {
        true
    };

    let periods = match frequency {
        Some(frequency) if term_valid => Some(total_periods(term_months, frequency)),
        _ => None,
    };

    let mut extras = BTreeMap::new();
    for (i, extra) in extra_payments.iter().enumerate() {
        let amount_field = format!("extra_payments[{i}].amount");
        let period_field = format!("extra_payments[{i}].period_index");

        let amount = if extra.amount <= Decimal::ZERO {
            errors.push(amount_field, "must be greater than zero");
            None
        } else {
            Money::from_major(extra.amount)
                .map_err(|e| errors.push(amount_field, e.to_string()))
                .ok()
        };

        if let Some(periods) = periods {
            if extra.period_index == 0 || extra.period_index > periods {
                errors.push(
                    period_field.clone(),
                    format!("must be between 1 and {periods}"),
                );
                continue;
            }
        }

        if extras.contains_key(&extra.period_index) {
            errors.push(
                period_field,
                format!("duplicates period {}", extra.period_index),
            );
        } else if let Some(amount) = amount {
            extras.insert(extra.period_index, amount);
        } else {
            // Keep the slot so later duplicates are still reported.
            extras.insert(extra.period_index, Money::ZERO);
        }
    }

    match (principal, periods) {
        (Some(principal), Some(total_periods)) if errors.len() == before => Some(CheckedTerms {
            principal,
            total_periods,
            extra_payments: extras,
        }),
        _ => None,
    }
}
