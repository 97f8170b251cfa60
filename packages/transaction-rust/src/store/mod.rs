//! Backing store client interface.
//!
//! [`StoreClient`] is the narrow surface the transaction layer needs from the
//! managed key-value store: the two atomic transaction calls and a table
//! status probe. Transport, retries, and credentials live behind it.
//!
//! [`MemoryStore`] is an in-process implementation with the same
//! transactional rules as the managed store, for tests and local runs.

pub mod memory;

use async_trait::async_trait;
use dynaform_core::Item;

use crate::error::StoreError;
use crate::operation::TransactionRequest;
use crate::table::TableStatus;

pub use memory::MemoryStore;

/// One slot of a read-transaction response.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ItemResponse {
    /// The stored item, or `None` when no item exists under the key.
    pub item: Option<Item>,
}

/// Raw output of a read transaction.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct TransactGetOutput {
    /// Position-aligned with the request items when present.
    pub responses: Option<Vec<ItemResponse>>,
}

/// Client for the managed key-value store.
///
/// Implementations must be safe for concurrent use by multiple in-flight
/// calls. Used as `Arc<dyn StoreClient>`.
#[async_trait]
pub trait StoreClient: Send + Sync {
    /// Atomically read every item in `request`. All items must be `Get`s.
    async fn transact_get(&self, request: &TransactionRequest)
        -> Result<TransactGetOutput, StoreError>;

    /// Atomically apply every item in `request`. No item may be a `Get`.
    async fn transact_write(&self, request: &TransactionRequest) -> Result<(), StoreError>;

    /// Current lifecycle status of `table`.
    async fn describe_table(&self, table: &str) -> Result<TableStatus, StoreError>;
}
