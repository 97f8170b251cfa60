use std::future::Future;
use std::sync::Arc;
use std::time::Instant;

use dynaform_core::{ClockSource, Document, SchemaCodec, SystemClock};
use futures_util::future::{ready, try_join_all};
use tracing::{info_span, Instrument};

use super::classify::classify;
use super::executor::{execute, RawResponse};
use super::{gate, rehydrate};
use crate::config::{CoordinatorConfig, TransactionOptions};
use crate::error::{Error, RegistryError, Result, TransactionError};
use crate::model::Model;
use crate::operation::{OperationDescriptor, TransactionRequest};
use crate::readiness::{ResourceReadiness, TableStatusReadiness};
use crate::registry::ModelRegistry;
use crate::store::StoreClient;

// ---------------------------------------------------------------------------
// TransactionOutcome
// ---------------------------------------------------------------------------

/// Result of a successful transaction run.
#[derive(Debug, Clone, PartialEq)]
pub enum TransactionOutcome {
    /// The built request, returned instead of executing it.
    Request(TransactionRequest),
    /// The transaction committed and produced nothing to read.
    Empty,
    /// Rehydrated documents of a read transaction, expired ones removed.
    Items(Vec<Document>),
}

impl TransactionOutcome {
    /// The documents of a read transaction, or `None` when the outcome
    /// carries no documents (a dry run or a write).
    #[must_use]
    pub fn into_items(self) -> Option<Vec<Document>> {
        match self {
            Self::Items(items) => Some(items),
            Self::Request(_) | Self::Empty => None,
        }
    }

    /// The built request of a dry run.
    #[must_use]
    pub fn request(&self) -> Option<&TransactionRequest> {
        match self {
            Self::Request(request) => Some(request),
            Self::Empty | Self::Items(_) => None,
        }
    }
}

// ---------------------------------------------------------------------------
// TransactionCoordinator
// ---------------------------------------------------------------------------

/// Runs batches of descriptors as single atomic store transactions.
///
/// Holds no per-call state: every run classifies, gates, executes, and
/// rehydrates its own batch, so one coordinator can serve many concurrent
/// calls. Shared collaborators are held behind `Arc`.
pub struct TransactionCoordinator {
    registry: Arc<ModelRegistry>,
    store: Arc<dyn StoreClient>,
    readiness: Arc<dyn ResourceReadiness>,
    clock: Arc<dyn ClockSource>,
    config: Arc<CoordinatorConfig>,
}

impl TransactionCoordinator {
    /// Creates a coordinator that checks readiness by polling table status
    /// through `store` and reads the system clock for expiry.
    #[must_use]
    pub fn new(
        registry: Arc<ModelRegistry>,
        store: Arc<dyn StoreClient>,
        config: CoordinatorConfig,
    ) -> Self {
        Self {
            readiness: Arc::new(TableStatusReadiness::new(Arc::clone(&store))),
            registry,
            store,
            clock: Arc::new(SystemClock),
            config: Arc::new(config),
        }
    }

    /// Replaces the readiness collaborator.
    #[must_use]
    pub fn with_readiness(mut self, readiness: Arc<dyn ResourceReadiness>) -> Self {
        self.readiness = readiness;
        self
    }

    /// Replaces the clock used for expiry checks.
    #[must_use]
    pub fn with_clock(mut self, clock: Arc<dyn ClockSource>) -> Self {
        self.clock = clock;
        self
    }

    #[must_use]
    pub fn registry(&self) -> &Arc<ModelRegistry> {
        &self.registry
    }

    #[must_use]
    pub fn config(&self) -> &CoordinatorConfig {
        &self.config
    }

    /// Register a model under the configured default table options.
    ///
    /// # Errors
    ///
    /// See [`ModelRegistry::register`].
    pub fn register_model(
        &self,
        name: &str,
        codec: impl SchemaCodec + 'static,
    ) -> Result<Arc<Model>, RegistryError> {
        self.registry
            .register(name, codec, self.config.table_defaults.clone())
    }

    /// Run `batch` as one atomic transaction.
    ///
    /// # Errors
    ///
    /// See [`run_pending`](Self::run_pending).
    pub async fn run(
        &self,
        batch: Vec<OperationDescriptor>,
        options: TransactionOptions,
    ) -> Result<TransactionOutcome> {
        self.run_pending(batch.into_iter().map(|d| ready(Ok::<_, Error>(d))).collect(), options)
            .await
    }

    /// Run a batch whose entries are still being produced.
    ///
    /// Every entry is awaited concurrently; their order is kept. The batch is
    /// then classified and its request built. With `return_request` set the
    /// request is returned without touching readiness or the store.
    /// Otherwise every table needing it is awaited, the request is submitted
    /// in one store call, and read results are rehydrated.
    ///
    /// # Errors
    ///
    /// - `TransactionError::EmptyBatch` before any entry is awaited
    /// - the first error produced by a pending entry
    /// - `TransactionError::ModelNotFound` for an unresolvable descriptor
    /// - readiness and store errors, unchanged
    /// - decode errors; no partial result is returned
    pub async fn run_pending<F, E>(
        &self,
        batch: Vec<F>,
        options: TransactionOptions,
    ) -> Result<TransactionOutcome>
    where
        F: Future<Output = Result<OperationDescriptor, E>> + Send,
        E: Into<Error>,
    {
        if batch.is_empty() {
            return Err(TransactionError::EmptyBatch.into());
        }
        let settings = self.config.defaults.merged(&options);

        let pending = batch
            .into_iter()
            .map(|entry| async move { entry.await.map_err(Into::<Error>::into) });
        let descriptors = try_join_all(pending).await?;

        let kind = classify(&descriptors, settings.kind);
        let request = TransactionRequest::new(kind, &descriptors);
        if settings.return_request {
            tracing::debug!(kind = kind.as_str(), items = request.len(), "returning built request");
            return Ok(TransactionOutcome::Request(request));
        }

        let span = info_span!(
            "transaction",
            kind = kind.as_str(),
            items = request.len(),
            duration_ms = tracing::field::Empty,
            outcome = tracing::field::Empty,
        );

        async move {
            let start = Instant::now();
            let result = self.submit(&descriptors, &request).await;

            #[allow(clippy::cast_possible_truncation)]
            let duration_ms = start.elapsed().as_millis() as u64;
            let outcome = if result.is_ok() { "ok" } else { "error" };
            tracing::Span::current().record("duration_ms", duration_ms);
            tracing::Span::current().record("outcome", outcome);
            tracing::info!(duration_ms, outcome, "transaction complete");

            result
        }
        .instrument(span)
        .await
    }

    async fn submit(
        &self,
        descriptors: &[OperationDescriptor],
        request: &TransactionRequest,
    ) -> Result<TransactionOutcome> {
        gate::await_ready(&self.registry, self.readiness.as_ref(), descriptors).await?;

        match execute(self.store.as_ref(), request).await? {
            RawResponse::Write => Ok(TransactionOutcome::Empty),
            RawResponse::Read(output) if output.responses.is_none() => {
                Ok(TransactionOutcome::Empty)
            }
            RawResponse::Read(output) => {
                let now = self.clock.now();
                let documents = rehydrate::rehydrate(&self.registry, descriptors, output, now).await?;
                Ok(TransactionOutcome::Items(documents))
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
