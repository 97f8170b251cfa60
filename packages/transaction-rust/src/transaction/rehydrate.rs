//! Rehydration: raw store records back into typed documents.

use std::sync::Arc;

use dynaform_core::{unwrap_item_sets, Document, ExpirationPolicy};
use futures_util::future::try_join_all;

use crate::error::{Error, Result};
use crate::model::Model;
use crate::operation::OperationDescriptor;
use crate::registry::ModelRegistry;
use crate::store::TransactGetOutput;

/// Decode every response slot into a document of the model that requested
/// it. The result is position-aligned with `batch` and pairs each slot with
/// the model that decoded it; a slot whose key had no stored item is `None`.
///
/// # Errors
///
/// Fails as a whole if any slot cannot be resolved or decoded, or if the
/// number of slots does not match the batch.
pub async fn decode_responses(
    registry: &ModelRegistry,
    batch: &[OperationDescriptor],
    output: TransactGetOutput,
) -> Result<Vec<(Arc<Model>, Option<Document>)>> {
    let responses = output.responses.unwrap_or_default();
    if responses.len() != batch.len() {
        return Err(Error::ResponseMismatch {
            expected: batch.len(),
            actual: responses.len(),
        });
    }

    let decodes = batch.iter().zip(responses).map(|(descriptor, response)| async move {
        let model = registry.lookup(descriptor)?;
        let Some(raw) = response.item else {
            return Ok((model, None));
        };
        let document = model
            .codec()
            .decode_raw(Document::persisted(model.name()), unwrap_item_sets(raw))
            .await?;
        Ok::<_, Error>((model, Some(document)))
    });
    try_join_all(decodes).await
}

/// Whether `document` has expired under `policy` at `now` (epoch millis).
///
/// Only models that drop expired items are considered; a missing or
/// non-date expiry attribute never expires.
#[must_use]
pub fn is_expired(document: &Document, policy: &ExpirationPolicy, now: u64) -> bool {
    policy
        .filtered_attribute()
        .and_then(|attribute| document.get(attribute))
        .and_then(dynaform_core::Value::as_date)
        .is_some_and(|expires| expires < now)
}

/// Decode a read-transaction output and drop expired documents.
///
/// `now` is read once by the caller and applied to every document, so one
/// pass judges expiry against a single instant. Surviving documents keep
/// their relative order; the result may be shorter than the batch.
///
/// # Errors
///
/// See [`decode_responses`].
pub async fn rehydrate(
    registry: &ModelRegistry,
    batch: &[OperationDescriptor],
    output: TransactGetOutput,
    now: u64,
) -> Result<Vec<Document>> {
    let aligned = decode_responses(registry, batch, output).await?;
    let mut documents = Vec::with_capacity(aligned.len());
    for (model, slot) in aligned {
        let Some(document) = slot else {
            continue;
        };
        if is_expired(&document, model.codec().expiration_policy(), now) {
            tracing::debug!(model = model.name(), "dropping expired document");
            continue;
        }
        documents.push(document);
    }
    Ok(documents)
}
