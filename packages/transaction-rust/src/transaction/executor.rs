//! Submits a built request as one atomic store call.

use crate::error::StoreError;
use crate::operation::{TransactionKind, TransactionRequest};
use crate::store::{StoreClient, TransactGetOutput};

/// Raw store output, before rehydration.
#[derive(Debug, Clone, PartialEq)]
pub enum RawResponse {
    Read(TransactGetOutput),
    Write,
}

/// Submit `request` through the call matching its kind.
///
/// Exactly one store call is made. Store errors are returned as-is.
///
/// # Errors
///
/// Returns whatever `StoreError` the store raised.
pub async fn execute(
    store: &dyn StoreClient,
    request: &TransactionRequest,
) -> Result<RawResponse, StoreError> {
    tracing::debug!(kind = request.kind.as_str(), items = request.len(), "submitting transaction");
    match request.kind {
        TransactionKind::Read => store.transact_get(request).await.map(RawResponse::Read),
        TransactionKind::Write => {
            store.transact_write(request).await?;
            Ok(RawResponse::Write)
        }
    }
}

#[cfg(test)]
mod tests {
    use dynaform_core::{AttributeValue, Item};

    use super::*;
    use crate::operation::{GetItem, Operation, OperationDescriptor, PutItem};
    use crate::store::MemoryStore;

    fn item(id: &str) -> Item {
        let mut item = Item::new();
        item.insert("id".to_string(), AttributeValue::S(id.to_string()));
        item
    }

    fn store() -> MemoryStore {
        let store = MemoryStore::new();
        store.create_table("Users", "id", None);
        store
    }

    #[tokio::test]
    async fn read_goes_through_transact_get() {
        let store = store();
        let request = TransactionRequest::new(
            TransactionKind::Read,
            &[OperationDescriptor::unowned(Operation::Get(GetItem {
                table_name: "Users".into(),
                key: item("u1"),
            }))],
        );

        let response = execute(&store, &request).await.unwrap();
        assert!(matches!(response, RawResponse::Read(_)));
        assert_eq!((store.get_calls(), store.write_calls()), (1, 0));
    }

    #[tokio::test]
    async fn write_goes_through_transact_write() {
        let store = store();
        let request = TransactionRequest::new(
            TransactionKind::Write,
            &[OperationDescriptor::unowned(Operation::Put(PutItem {
                table_name: "Users".into(),
                item: item("u1"),
                condition: None,
            }))],
        );

        assert_eq!(execute(&store, &request).await.unwrap(), RawResponse::Write);
        assert_eq!((store.get_calls(), store.write_calls()), (0, 1));
    }

    #[tokio::test]
    async fn store_errors_are_returned_verbatim() {
        let store = store();
        let original = StoreError::ProvisionedThroughputExceeded {
            table: "Users".into(),
        };
        store.fail_next(original.clone());
        let request = TransactionRequest::new(
            TransactionKind::Write,
            &[OperationDescriptor::unowned(Operation::Put(PutItem {
                table_name: "Users".into(),
                item: item("u1"),
                condition: None,
            }))],
        );

        assert_eq!(execute(&store, &request).await.unwrap_err(), original);
    }
}
