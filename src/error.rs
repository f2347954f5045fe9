use rust_decimal::Decimal;
use serde::ser::SerializeStruct;
use serde::{Serialize, Serializer};
use thiserror::Error;

/// A single rejected input field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    /// Request field name, e.g. `principal` or `extra_payments[1].amount`.
    pub field: String,
    /// Human readable reason the value was rejected.
    pub reason: String,
}

impl std::fmt::Display for FieldError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.reason)
    }
}

/// The loan parameters could not be accepted.
///
/// This is the only error the amortization engine raises. It always carries
/// every violation found, so a caller can fix the whole request at once.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid loan parameters: {}", join_field_errors(.errors))]
pub struct ValidationError {
    pub errors: Vec<FieldError>,
}

impl ValidationError {
    /// Machine readable code the API layer reports for bad loan parameters.
    pub const CODE: &'static str = "INVALID_LOAN_PARAMETERS";

    /// Returns the violation reported for `field`, if any.
    pub fn field(&self, field: &str) -> Option<&FieldError> {
        self.errors.iter().find(|e| e.field == field)
    }
}

impl Serialize for ValidationError {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("ValidationError", 2)?;
        state.serialize_field("code", Self::CODE)?;
        state.serialize_field("errors", &self.errors)?;
        state.end()
    }
}

fn join_field_errors(errors: &[FieldError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

/// Accumulates field errors while a request is being checked.
#[derive(Debug, Default)]
pub(crate) struct FieldErrors(Vec<FieldError>);

impl FieldErrors {
    pub(crate) fn push(&mut self, field: impl Into<String>, reason: impl Into<String>) {
        self.0.push(FieldError {
            field: field.into(),
            reason: reason.into(),
        });
    }

    pub(crate) fn len(&self) -> usize {
        self.0.len()
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub(crate) fn into_error(self) -> ValidationError {
        ValidationError { errors: self.0 }
    }
}

/// A decimal amount that cannot be represented as [`crate::Money`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MoneyError {
    #[error("{0} has more precision than one cent")]
    SubMinorPrecision(Decimal),

    #[error("{0} is out of the representable range")]
    OutOfRange(Decimal),
}

/// Configuration error types
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid value for {key}: {reason}")]
    InvalidValue { key: String, reason: String },

    #[error("Configuration file error: {0}")]
    FileError(String),
}
