//! Batch classification: decides which atomic store call a batch uses.

use crate::config::TransactionType;
use crate::operation::{OperationDescriptor, TransactionKind};

/// Classify `batch` into a read or write transaction.
///
/// An explicit `kind` always wins. Otherwise the batch is a read transaction
/// only if every descriptor is a `Get`; anything else is a write
/// transaction. A batch mixing reads and writes is not rejected here: it is
/// submitted as a write transaction and the store refuses it.
#[must_use]
pub fn classify(batch: &[OperationDescriptor], kind: Option<TransactionType>) -> TransactionKind {
    if let Some(kind) = kind {
        return kind.into();
    }

    let reads = batch.iter().filter(|d| d.kind().is_read()).count();
    if reads == batch.len() {
        TransactionKind::Read
    } else {
        if reads > 0 {
            tracing::warn!(
                reads,
                writes = batch.len() - reads,
                "batch mixes reads and writes; submitting as write transaction"
            );
        }
        TransactionKind::Write
    }
}
