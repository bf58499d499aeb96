//! Kernel error types.

use thiserror::Error;

/// Errors raised while turning filters and paging into a query specification.
///
/// These indicate a programming mistake in the caller's filters and are
/// raised before any remote call is issued.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum QueryError {
    #[error("unsupported filter operator: {0}")]
    UnsupportedOperator(String),

    #[error("invalid value for filter on {field}: {reason}")]
    InvalidFilterValue { field: String, reason: String },

    #[error("invalid row window: {0}")]
    InvalidRange(String),
}

/// Errors from backend operations.
#[derive(Debug, Error)]
pub enum BackendError {
    /// The remote service reported a failure; carries its message verbatim.
    #[error("{message}")]
    Remote { message: String },

    #[error(transparent)]
    Query(#[from] QueryError),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("expected at most one row from {table}, got several")]
    MultipleRows { table: String },

    #[error("expected a row from {table}, got none")]
    MissingRow { table: String },

    #[error("invalid configuration: {0}")]
    Config(String),
}

impl BackendError {
    /// Build a remote error from any message.
    pub fn remote(message: impl Into<String>) -> Self {
        Self::Remote {
            message: message.into(),
        }
    }
}

/// Result type alias using BackendError.
pub type BackendResult<T> = Result<T, BackendError>;
