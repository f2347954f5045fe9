//! Engine configuration
//!
//! Validation limits and the payoff tolerance, loaded from defaults, a TOML
//! file and `BR_AMORTIZATION_*` environment variables.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::Deserialize;
use std::path::Path;
use std::str::FromStr;

use crate::error::ConfigError;
use crate::money::Money;

const ENV_PREFIX: &str = "BR_AMORTIZATION_";

/// Highest `max_principal` a configuration may set, in major units.
///
/// Together with the other two ceilings this keeps every schedule total
/// (weekly, 100 years, 10 000% a year) below `i64::MAX` minor units.
pub const PRINCIPAL_CEILING: Decimal = dec!(10_000_000_000_000);
/// Highest `max_term_months` a configuration may set.
pub const TERM_MONTHS_CEILING: u32 = 1200;
/// Highest `max_annual_rate_percent` a configuration may set.
pub const ANNUAL_RATE_PERCENT_CEILING: Decimal = dec!(10_000);

/// Engine configuration structure
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Residue, in minor units, treated as paid off after an extra payment
    pub payoff_tolerance_minor: i64,
    /// Longest accepted loan term
    pub max_term_months: u32,
    /// Highest accepted annual rate, as a percentage
    pub max_annual_rate_percent: Decimal,
    /// Largest accepted principal, in major units
    pub max_principal: Decimal,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            payoff_tolerance_minor: 0,
            max_term_months: 600,
            max_annual_rate_percent: dec!(1000),
            max_principal: dec!(1_000_000_000_000),
        }
    }
}

impl EngineConfig {
    pub fn payoff_tolerance(&self) -> Money {
        Money::from_minor(self.payoff_tolerance_minor)
    }

    /// Largest principal a loan may have, never above [`PRINCIPAL_CEILING`].
    pub fn principal_limit(&self) -> Decimal {
        self.max_principal.min(PRINCIPAL_CEILING)
    }

    /// Longest term a loan may have, never above [`TERM_MONTHS_CEILING`].
    pub fn term_months_limit(&self) -> u32 {
        self.max_term_months.min(TERM_MONTHS_CEILING)
    }

    /// Highest annual rate a loan may have, never above [`ANNUAL_RATE_PERCENT_CEILING`].
    pub fn annual_rate_percent_limit(&self) -> Decimal {
        self.max_annual_rate_percent.min(ANNUAL_RATE_PERCENT_CEILING)
    }

    /// Load configuration from a TOML file
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::FileError(format!("Failed to read config file: {}", e)))?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: EngineConfig = toml::from_str(content)
            .map_err(|e| ConfigError::FileError(format!("Failed to parse TOML: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Apply `BR_AMORTIZATION_*` overrides from the process environment
    pub fn apply_env(&mut self) -> Result<(), ConfigError> {
        self.apply_lookup(|key| std::env::var(key).ok())
    }

    /// Apply overrides from any key lookup, e.g. a map in tests
    pub fn apply_lookup<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(value) = lookup_parsed(&lookup, "PAYOFF_TOLERANCE_MINOR")? {
            self.payoff_tolerance_minor = value;
        }
        if let Some(value) = lookup_parsed(&lookup, "MAX_TERM_MONTHS")? {
            self.max_term_months = value;
        }
        if let Some(value) = lookup_parsed(&lookup, "MAX_ANNUAL_RATE_PERCENT")? {
            self.max_annual_rate_percent = value;
        }
        if let Some(value) = lookup_parsed(&lookup, "MAX_PRINCIPAL")? {
            self.max_principal = value;
        }
        self.validate()
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.payoff_tolerance_minor < 0 {
            return Err(invalid("payoff_tolerance_minor", "must not be negative"));
        }
        if self.max_term_months == 0 {
            return Err(invalid("max_term_months", "must be at least 1"));
        }
        if self.max_term_months > TERM_MONTHS_CEILING {
            return Err(invalid(
                "max_term_months",
                &format!("must not exceed {TERM_MONTHS_CEILING}"),
            ));
        }
        if self.max_annual_rate_percent.is_sign_negative() {
            return Err(invalid("max_annual_rate_percent", "must not be negative"));
        }
        if self.max_annual_rate_percent > ANNUAL_RATE_PERCENT_CEILING {
            return Err(invalid(
                "max_annual_rate_percent",
                &format!("must not exceed {ANNUAL_RATE_PERCENT_CEILING}"),
            ));
        }
        if self.max_principal <= Decimal::ZERO {
            return Err(invalid("max_principal", "must be greater than zero"));
        }
        if self.max_principal > PRINCIPAL_CEILING {
            return Err(invalid(
                "max_principal",
                &format!("must not exceed {PRINCIPAL_CEILING}"),
            ));
        }
        Ok(())
    }
}

/// Build configuration from all sources
///
/// Priority (highest to lowest):
/// 1. Environment variables
/// 2. Config file
/// 3. Default values
pub fn build_config(config_file: Option<&Path>) -> Result<EngineConfig, ConfigError> {
    let mut config = match config_file {
        Some(path) => EngineConfig::from_file(path)?,
        None => EngineConfig::default(),
    };
    config.apply_env()?;
    Ok(config)
}

fn lookup_parsed<T, F>(lookup: &F, name: &str) -> Result<Option<T>, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
    F: Fn(&str) -> Option<String>,
{
    let key = format!("{ENV_PREFIX}{name}");
    match lookup(&key) {
        Some(raw) => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(|e: T::Err| invalid(&key, &e.to_string())),
        None => Ok(None),
    }
}

fn invalid(key: &str, reason: &str) -> ConfigError {
    ConfigError::InvalidValue {
        key: key.to_string(),
        reason: reason.to_string(),
    }
}
