//! Table readiness checks.
//!
//! [`ResourceReadiness`] decides whether a table must be waited on and
//! performs the wait. [`TableStatusReadiness`] waits by polling the store's
//! table status until it reports `Active`.

use std::sync::Arc;

use async_trait::async_trait;
use tokio::time::Instant;

use crate::error::ReadinessError;
use crate::store::StoreClient;
use crate::table::{Table, TableStatus};

/// Readiness collaborator consulted before a transaction is submitted.
#[async_trait]
pub trait ResourceReadiness: Send + Sync {
    /// Whether `table` must be confirmed ready before use.
    fn is_readiness_required(&self, table: &Table) -> bool;

    /// Resolve once `table` is ready.
    async fn await_ready(&self, table: &Table) -> Result<(), ReadinessError>;
}

/// Polls table status through the store client, honoring each table's
/// `wait_for_active` options.
pub struct TableStatusReadiness {
    store: Arc<dyn StoreClient>,
}

impl TableStatusReadiness {
    #[must_use]
    pub fn new(store: Arc<dyn StoreClient>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl ResourceReadiness for TableStatusReadiness {
    fn is_readiness_required(&self, table: &Table) -> bool {
        table.options().wait_for_active.enabled
    }

    async fn await_ready(&self, table: &Table) -> Result<(), ReadinessError> {
        let wait = &table.options().wait_for_active;
        let started = Instant::now();
        loop {
            let status = self.store.describe_table(table.name()).await?;
            if status == TableStatus::Active {
                tracing::debug!(table = table.name(), "table active");
                return Ok(());
            }
            if started.elapsed() >= wait.timeout {
                return Err(ReadinessError::Timeout {
                    table: table.name().to_string(),
                    timeout_ms: wait.timeout.as_millis(),
                });
            }
            tracing::debug!(table = table.name(), ?status, "waiting for table to become active");
            tokio::time::sleep(wait.frequency).await;
        }
    }
}
