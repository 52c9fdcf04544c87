//! Top-level error type shared across crates.

use thiserror::Error;

/// Errors raised while constructing or parsing fundamental types.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TypesError {
    #[error("invalid address {raw:?}: expected prefix {expected_prefix}")]
    InvalidAddress {
        raw: String,
        expected_prefix: &'static str,
    },

    #[error("invalid decimal {0:?}")]
    InvalidDecimal(String),

    #[error("decimal {0:?} has more than 18 fractional digits")]
    DecimalPrecision(String),

    #[error("invalid integer {0:?}")]
    InvalidInteger(String),
}
