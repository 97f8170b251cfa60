//! Error-first completion adapter for callers that cannot await.

use std::sync::Arc;

use tokio::task::JoinHandle;

use super::coordinator::{TransactionCoordinator, TransactionOutcome};
use crate::config::TransactionOptions;
use crate::error::Error;
use crate::operation::OperationDescriptor;

/// Run `batch` on the current runtime and report through `callback`.
///
/// The callback is invoked exactly once with the run's result, failure
/// first in the sense that an `Err` carries the error and no outcome. The
/// returned handle completes after the callback has returned.
pub fn run_with_callback<F>(
    coordinator: Arc<TransactionCoordinator>,
    batch: Vec<OperationDescriptor>,
    options: TransactionOptions,
    callback: F,
) -> JoinHandle<()>
where
    F: FnOnce(Result<TransactionOutcome, Error>) + Send + 'static,
{
    tokio::spawn(async move {
        let result = coordinator.run(batch, options).await;
        if let Err(error) = &result {
            tracing::debug!(%error, "transaction failed; notifying callback");
        }
        callback(result);
    })
}
