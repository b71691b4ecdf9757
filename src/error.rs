//! Error types for the reshaping library.
//!
//! Command handlers wrap these in `anyhow` with context; library callers can
//! match on the variants directly.

use thiserror::Error;

/// Errors raised while profiling, widening or cleaning a [`crate::table::Table`].
#[derive(Debug, Error)]
pub enum ReshapeError {
    /// A key that must be unique maps to more than one row or value. `count`
    /// is the number of rows or distinct values found for `key`.
    #[error("Key constraint violated for column '{field}': key '{key}' maps to {count} entries, expected one")]
    KeyConstraintViolation {
        field: String,
        key: String,
        count: usize,
    },

    /// A column name that does not exist in the table.
    #[error("Column '{field}' not found")]
    FieldNotFound { field: String },

    /// Caller supplied arguments that cannot be acted upon.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Regex error: {0}")]
    Regex(#[from] regex::Error),
}

impl ReshapeError {
    pub(crate) fn field_not_found(field: &str) -> Self {
        ReshapeError::FieldNotFound {
            field: field.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, ReshapeError>;
