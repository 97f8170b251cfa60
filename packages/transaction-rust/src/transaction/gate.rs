//! Readiness gate: every table a batch touches must be usable before the
//! batch is submitted.

use std::collections::BTreeMap;
use std::sync::Arc;

use futures_util::future::try_join_all;

use crate::error::Result;
use crate::model::Model;
use crate::operation::OperationDescriptor;
use crate::readiness::ResourceReadiness;
use crate::registry::ModelRegistry;

/// Distinct models (by table name) referenced by `batch` whose tables
/// require a readiness wait.
///
/// # Errors
///
/// Returns `TransactionError::ModelNotFound` for a descriptor whose model
/// back-reference does not resolve.
pub fn tables_requiring_wait(
    registry: &ModelRegistry,
    readiness: &dyn ResourceReadiness,
    batch: &[OperationDescriptor],
) -> Result<Vec<Arc<Model>>> {
    let mut distinct = BTreeMap::new();
    for descriptor in batch {
        let model = registry.lookup(descriptor)?;
        distinct
            .entry(model.table().name().to_string())
            .or_insert(model);
    }
    Ok(distinct
        .into_values()
        .filter(|model| readiness.is_readiness_required(model.table()))
        .collect())
}

/// Wait for every table in `batch` that requires it.
///
/// Waits run concurrently. The gate resolves when all of them have, and
/// fails as soon as any one fails. With nothing to wait for it resolves
/// immediately.
///
/// # Errors
///
/// Returns the first readiness failure unchanged, or
/// `TransactionError::ModelNotFound` for an unresolvable descriptor.
pub async fn await_ready(
    registry: &ModelRegistry,
    readiness: &dyn ResourceReadiness,
    batch: &[OperationDescriptor],
) -> Result<()> {
    let models = tables_requiring_wait(registry, readiness, batch)?;
    if models.is_empty() {
        return Ok(());
    }
    tracing::debug!(tables = models.len(), "awaiting table readiness");
    try_join_all(models.iter().map(|model| readiness.await_ready(model.table()))).await?;
    Ok(())
}
