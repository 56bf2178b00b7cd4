//! Domain error model.

use thiserror::Error;

/// Result type used across the domain layer.
pub type DomainResult<T> = Result<T, DomainError>;

/// Domain-level error.
///
/// These indicate programmer error in the calling domain logic (bad amounts,
/// mixed currencies, malformed identifiers). They are returned to the immediate
/// caller and abort the in-progress operation.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// A monetary amount was not a whole number of minor units.
    #[error("invalid amount: {0}")]
    InvalidAmount(String),

    /// Arithmetic was attempted across two different currencies.
    #[error("currency mismatch: {left} vs {right}")]
    CurrencyMismatch { left: String, right: String },

    /// Minor-unit arithmetic left the `i64` range.
    #[error("amount overflow")]
    AmountOverflow,

    /// An identifier was invalid (e.g. parse failure).
    #[error("invalid identifier: {0}")]
    InvalidId(String),

    /// A value failed validation (e.g. malformed input).
    #[error("validation failed: {0}")]
    Validation(String),
}

impl DomainError {
    pub fn invalid_amount(msg: impl Into<String>) -> Self {
        Self::InvalidAmount(msg.into())
    }

    pub fn currency_mismatch(left: impl Into<String>, right: impl Into<String>) -> Self {
        Self::CurrencyMismatch {
            left: left.into(),
            right: right.into(),
        }
    }

    pub fn invalid_id(msg: impl Into<String>) -> Self {
        Self::InvalidId(msg.into())
    }

    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }
}
