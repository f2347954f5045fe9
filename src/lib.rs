//! `br_amortization` is a Rust library for computing real estate financing schedules.
//!
//! It builds the full payment schedule of a loan under the amortization
//! systems used in Brazilian lending:
//! - **SAC (Sistema de Amortização Constante)**: Characterized by fixed amortization payments,
//!   leading to decreasing total payments over time.
//! - **Price (Sistema Francês de Amortização)**: Characterized by fixed total payments
//!   throughout the financing period. Extra payments shorten the schedule.
//! - **Fixed installment**: Like Price, but extra payments lower the remaining installments
//!   instead of the term.
//!
//! Installments can be monthly, biweekly or weekly. The annual rate is converted to a
//! per-period rate by compounding, and every amount is kept in whole cents so the final
//! installment always brings the balance to exactly zero.
//!
//! ## Usage
//!
//! ```rust
//! use br_amortization::{
//!     ExtraPayment, LoanSpec, LoanTerms, PaymentFrequency, RateType, compute_schedule,
//! };
//! use rust_decimal_macros::dec;
//!
//! let spec = LoanSpec::new(LoanTerms {
//!     principal: dec!(360_000),
//!     annual_rate_percent: dec!(10.5),
//!     term_months: 420,
//!     payment_frequency: PaymentFrequency::Monthly,
//!     rate_type: RateType::Sac,
//!     extra_payments: vec![ExtraPayment {
//!         period_index: 12,
//!         amount: dec!(20_000),
//!     }],
//! })
//! .expect("valid loan");
//!
//! let result = compute_schedule(&spec);
//! println!("First payment: {}", result.first_payment);
//! println!("Last payment:  {}", result.last_payment);
//! println!("Total paid:    {}", result.total_paid);
//! ```
//!
//! Loans arriving as JSON go through [`LoanRequest`], which reports every invalid field
//! at once in a [`ValidationError`].

pub mod comparison;
pub mod config;
pub mod error;
pub mod loan;
pub mod money;
pub mod rate;
pub mod schedule;

pub use comparison::{
    DebtTrajectoryResult, calculate_debt_trajectory, calculate_debt_trajectory_with,
};
pub use config::{EngineConfig, build_config};
pub use error::{ConfigError, FieldError, MoneyError, ValidationError};
pub use loan::{ExtraPayment, LoanRequest, LoanSpec, LoanTerms, PaymentFrequency, RateType};
pub use money::Money;
pub use rate::normalize_annual_interest_rate;
pub use schedule::{
    AmortizationResult, Installment, amortize, compute_schedule, compute_schedule_with,
};
