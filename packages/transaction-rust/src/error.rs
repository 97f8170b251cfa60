//! Error taxonomy for transaction runs.
//!
//! Validation failures are [`TransactionError`]s raised before any network
//! I/O. Readiness, store, and decode failures keep their own types and reach
//! the caller through [`Error`] unchanged. A malformed store reply is
//! [`Error::ResponseMismatch`].

use std::fmt;

use dynaform_core::CodecError;

/// Input-validation failures. Never retried.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TransactionError {
    #[error("Items required to run transaction")]
    EmptyBatch,
    #[error("Model for table {table} not found")]
    ModelNotFound { table: String },
    #[error("Invalid type option, please pass in \"get\" or \"write\"")]
    InvalidType { value: String },
}

/// Failures while registering a model.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RegistryError {
    #[error("model name must not be empty")]
    EmptyModelName,
    #[error("invalid table name {name}: must match [a-zA-Z0-9_.-]{{3,255}}")]
    InvalidTableName { name: String },
}

/// Per-item outcome reported by the store when it cancels a transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CancellationReason {
    /// Reason code, `"None"` for items that did not cause the cancellation.
    pub code: String,
    /// Optional human-readable detail.
    pub message: Option<String>,
}

impl CancellationReason {
    /// Placeholder reason for items that passed their checks.
    #[must_use]
    pub fn none() -> Self {
        Self {
            code: "None".to_string(),
            message: None,
        }
    }

    /// Reason for an item whose condition evaluated to false.
    #[must_use]
    pub fn conditional_check_failed() -> Self {
        Self {
            code: "ConditionalCheckFailed".to_string(),
            message: Some("The conditional request failed".to_string()),
        }
    }
}

impl fmt::Display for CancellationReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.code)
    }
}

/// Store-native failures. Passed through verbatim; the caller decides
/// which kinds are transient.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    #[error(
        "Transaction cancelled, please refer cancellation reasons for specific reasons [{}]",
        .reasons.iter().map(ToString::to_string).collect::<Vec<_>>().join(", ")
    )]
    TransactionCanceled { reasons: Vec<CancellationReason> },
    #[error("Requested resource not found: Table: {table} not found")]
    ResourceNotFound { table: String },
    #[error("The level of configured provisioned throughput for table {table} was exceeded")]
    ProvisionedThroughputExceeded { table: String },
    #[error("Transaction is ongoing for the item")]
    TransactionConflict,
    #[error("{message}")]
    Validation { message: String },
}

/// Failures while waiting for a table to become usable.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ReadinessError {
    #[error("table {table} did not become active within {timeout_ms}ms")]
    Timeout { table: String, timeout_ms: u128 },
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Every way a transaction run can fail.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    Transaction(#[from] TransactionError),
    #[error(transparent)]
    Readiness(#[from] ReadinessError),
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error(transparent)]
    Decode(#[from] CodecError),
    /// The store answered a read transaction with a different number of
    /// slots than were requested.
    #[error("store returned {actual} responses for {expected} requested items")]
    ResponseMismatch { expected: usize, actual: usize },
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
