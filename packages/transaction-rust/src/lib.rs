//! Dynaform transactions: runs batches of model operations as single atomic
//! store transactions.
//!
//! Models are registered in a [`ModelRegistry`]; their transaction builders
//! produce [`OperationDescriptor`]s which a [`TransactionCoordinator`]
//! classifies, gates on table readiness, submits, and rehydrates.

pub mod config;
pub mod error;
pub mod model;
pub mod operation;
pub mod readiness;
pub mod registry;
pub mod store;
pub mod table;
pub mod transaction;

pub use config::{CoordinatorConfig, TransactionOptions, TransactionSettings, TransactionType};
pub use error::{
    CancellationReason, Error, ReadinessError, RegistryError, Result, StoreError, TransactionError,
};
pub use model::{key, KeyFields, Model, ModelTransaction};
pub use operation::{Condition, Operation, OperationDescriptor, TransactionKind, TransactionRequest};
pub use readiness::{ResourceReadiness, TableStatusReadiness};
pub use registry::ModelRegistry;
pub use store::{ItemResponse, MemoryStore, StoreClient, TransactGetOutput};
pub use table::{Table, TableOptions, TableStatus, WaitForActive};
pub use transaction::{run_with_callback, TransactionCoordinator, TransactionOutcome};
