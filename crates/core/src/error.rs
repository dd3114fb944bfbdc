//! Ledger error model.

use rust_decimal::Decimal;
use thiserror::Error;

use crate::id::IngredientId;

/// Result type used across the ledger core.
pub type LedgerResult<T> = Result<T, LedgerError>;

/// Structured error for every operation exposed by the ledger core.
///
/// Validation failures are rejected before any write is attempted.
/// `InsufficientStock` and `IncompatibleUnitType` are terminal for the
/// specific operation and never leave partial ledger state behind.
/// `ConcurrencyConflict` and `Persistence` are retryable by the caller.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum LedgerError {
    /// A value failed validation (e.g. non-positive quantity).
    #[error("validation failed: {0}")]
    Validation(String),

    /// A referenced ingredient/unit/recipe does not exist.
    #[error("unknown {kind}: {id}")]
    UnknownEntity { kind: &'static str, id: String },

    /// Conversion was attempted between units of different measurement types.
    #[error("incompatible unit types: cannot convert {from} into {to}")]
    IncompatibleUnitType { from: String, to: String },

    /// A consumption would drive the balance negative and backorders are off.
    #[error(
        "insufficient stock for ingredient {ingredient_id}: requested {requested}, available {available}"
    )]
    InsufficientStock {
        ingredient_id: IngredientId,
        requested: Decimal,
        available: Decimal,
    },

    /// The atomic balance update lost the race too many times.
    #[error("concurrency conflict: {0}")]
    ConcurrencyConflict(String),

    /// The backing store is unreachable, timed out, or otherwise failed.
    #[error("persistence failure: {0}")]
    Persistence(String),
}

impl LedgerError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn unknown(kind: &'static str, id: impl ToString) -> Self {
        Self::UnknownEntity {
            kind,
            id: id.to_string(),
        }
    }

    pub fn incompatible_units(from: impl Into<String>, to: impl Into<String>) -> Self {
        Self::IncompatibleUnitType {
            from: from.into(),
            to: to.into(),
        }
    }

    pub fn insufficient_stock(
        ingredient_id: IngredientId,
        requested: Decimal,
        available: Decimal,
    ) -> Self {
        Self::InsufficientStock {
            ingredient_id,
            requested,
            available,
        }
    }

    pub fn conflict(msg: impl Into<String>) -> Self {
        Self::ConcurrencyConflict(msg.into())
    }

    pub fn persistence(msg: impl Into<String>) -> Self {
        Self::Persistence(msg.into())
    }

    /// Whether the caller may safely retry the failed operation.
    ///
    /// Retries of order-item consumption are additionally protected by the
    /// idempotency key, so a retry can never double-deduct.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::ConcurrencyConflict(_) | Self::Persistence(_)
        )
    }
}
