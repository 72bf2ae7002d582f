//! Conversion error types.

use thiserror::Error;

/// Errors returned by currency conversion.
#[derive(Debug, Error)]
pub enum ConversionError {
    /// No rate is quoted for the requested code.
    #[error("Currency not found: {0}")]
    CurrencyNotFound(String),

    /// Amount is zero, negative or not a finite number.
    #[error("Invalid amount: {0}")]
    InvalidAmount(f64),

    /// Rates could not be loaded for an unexpected reason.
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}
