//! Error types for the reconciliation engine.

use thiserror::Error;

/// Main error type for reconciliation operations.
#[derive(Error, Debug)]
pub enum ReconError {
    /// Configuration error (bad settings, unresolvable column)
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// Validation error
    #[error("Validation error: {0}")]
    ValidationError(String),

    /// Missing column in an input table
    #[error("Column '{column}' not found in {table} table")]
    MissingColumn { table: String, column: String },

    /// Invalid data error
    #[error("Invalid data: {0}")]
    InvalidData(String),
}

impl ReconError {
    /// Create a configuration error.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::ConfigError(msg.into())
    }

    /// Create a validation error.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::ValidationError(msg.into())
    }

    /// Create a missing-column error.
    pub fn missing_column(table: impl Into<String>, column: impl Into<String>) -> Self {
        Self::MissingColumn {
            table: table.into(),
            column: column.into(),
        }
    }

    /// Create an invalid data error.
    pub fn invalid_data(msg: impl Into<String>) -> Self {
        Self::InvalidData(msg.into())
    }
}

/// Result type alias for reconciliation operations.
pub type ReconResult<T> = Result<T, ReconError>;
