//! In-memory [`StoreClient`] implementation.
//!
//! Enforces the managed store's transaction rules so behavior seen in tests
//! matches production: reads and writes never share a call, one action per
//! item per transaction, conditions are all-or-nothing, and tables answer
//! only once they are `Active`.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use dynaform_core::Item;
use parking_lot::{Mutex, RwLock};

use crate::error::{CancellationReason, StoreError};
use crate::operation::{Condition, Operation, TransactionRequest};
use crate::store::{ItemResponse, StoreClient, TransactGetOutput};
use crate::table::TableStatus;

struct MemoryTable {
    hash_key: String,
    range_key: Option<String>,
    /// Remaining status probes that report `Creating`.
    polls_until_active: u32,
    items: BTreeMap<Item, Item>,
}

impl MemoryTable {
    fn status(&self) -> TableStatus {
        if self.polls_until_active > 0 {
            TableStatus::Creating
        } else {
            TableStatus::Active
        }
    }

    fn key_names(&self) -> impl Iterator<Item = &str> {
        std::iter::once(self.hash_key.as_str()).chain(self.range_key.as_deref())
    }

    /// Extracts the primary key from a full item.
    fn key_of_item(&self, item: &Item) -> Result<Item, StoreError> {
        let mut key = Item::new();
        for name in self.key_names() {
            let value = item.get(name).ok_or_else(|| StoreError::Validation {
                message: "One or more parameter values were invalid: Missing the key in the item"
                    .to_string(),
            })?;
            key.insert(name.to_string(), value.clone());
        }
        Ok(key)
    }

    /// Rejects updates that would set or remove a key attribute.
    fn check_update_targets<'a>(
        &self,
        mut names: impl Iterator<Item = &'a String>,
    ) -> Result<(), StoreError> {
        match names.find(|name| self.key_names().any(|key| key == name.as_str())) {
            Some(name) => Err(StoreError::Validation {
                message: format!(
                    "One or more parameter values were invalid: Cannot update attribute {name}. \
                     This attribute is part of the key"
                ),
            }),
            None => Ok(()),
        }
    }

    /// Checks that `key` names exactly the key attributes of this table.
    fn check_key(&self, key: &Item) -> Result<Item, StoreError> {
        let expected = self.key_names().count();
        if key.len() != expected || self.key_names().any(|name| !key.contains_key(name)) {
            return Err(StoreError::Validation {
                message: "The provided key element does not match the schema".to_string(),
            });
        }
        Ok(key.clone())
    }
}

/// In-process store with managed-store transaction semantics.
///
/// Call counters let tests assert whether (and how often) the store was
/// reached. A failure queued with [`fail_next`](Self::fail_next) is returned
/// by the next transaction call instead of executing it.
pub struct MemoryStore {
    tables: RwLock<HashMap<String, MemoryTable>>,
    pending_failure: Mutex<Option<StoreError>>,
    get_calls: AtomicU64,
    write_calls: AtomicU64,
    describe_calls: AtomicU64,
}

impl MemoryStore {
    /// Creates a store with no tables.
    #[must_use]
    pub fn new() -> Self {
        Self {
            tables: RwLock::new(HashMap::new()),
            pending_failure: Mutex::new(None),
            get_calls: AtomicU64::new(0),
            write_calls: AtomicU64::new(0),
            describe_calls: AtomicU64::new(0),
        }
    }

    /// Creates an `Active` table keyed by `hash_key` (and `range_key`).
    pub fn create_table(&self, name: &str, hash_key: &str, range_key: Option<&str>) {
        self.create_table_activating(name, hash_key, range_key, 0);
    }

    /// Creates a table that reports `Creating` for the next `polls` status
    /// probes, then becomes `Active`.
    pub fn create_table_activating(
        &self,
        name: &str,
        hash_key: &str,
        range_key: Option<&str>,
        polls: u32,
    ) {
        self.tables.write().insert(
            name.to_string(),
            MemoryTable {
                hash_key: hash_key.to_string(),
                range_key: range_key.map(str::to_string),
                polls_until_active: polls,
                items: BTreeMap::new(),
            },
        );
    }

    /// Writes an item directly, outside any transaction.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::ResourceNotFound` for an unknown table and
    /// `StoreError::Validation` if the item lacks a key attribute.
    pub fn put_item(&self, table: &str, item: Item) -> Result<(), StoreError> {
        let mut tables = self.tables.write();
        let table = tables.get_mut(table).ok_or_else(|| not_found(table))?;
        let key = table.key_of_item(&item)?;
        table.items.insert(key, item);
        Ok(())
    }

    /// Reads an item directly, outside any transaction.
    #[must_use]
    pub fn get_item(&self, table: &str, key: &Item) -> Option<Item> {
        self.tables
            .read()
            .get(table)
            .and_then(|t| t.items.get(key).cloned())
    }

    /// Queue `error` to be returned by the next transaction call.
    pub fn fail_next(&self, error: StoreError) {
        *self.pending_failure.lock() = Some(error);
    }

    #[must_use]
    pub fn get_calls(&self) -> u64 {
        self.get_calls.load(Ordering::SeqCst)
    }

    #[must_use]
    pub fn write_calls(&self) -> u64 {
        self.write_calls.load(Ordering::SeqCst)
    }

    #[must_use]
    pub fn describe_calls(&self) -> u64 {
        self.describe_calls.load(Ordering::SeqCst)
    }

    fn take_failure(&self) -> Result<(), StoreError> {
        match self.pending_failure.lock().take() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

fn not_found(table: &str) -> StoreError {
    StoreError::ResourceNotFound {
        table: table.to_string(),
    }
}

fn active_table<'a>(
    tables: &'a HashMap<String, MemoryTable>,
    name: &str,
) -> Result<&'a MemoryTable, StoreError> {
    tables
        .get(name)
        .filter(|t| t.status() == TableStatus::Active)
        .ok_or_else(|| not_found(name))
}

fn write_target(op: &Operation) -> Result<(&str, Option<&Condition>), StoreError> {
    match op {
        Operation::Get(_) => Err(StoreError::Validation {
            message: "TransactWriteItems can not contain Get operations".to_string(),
        }),
        Operation::Put(a) => Ok((&a.table_name, a.condition.as_ref())),
        Operation::Delete(a) => Ok((&a.table_name, a.condition.as_ref())),
        Operation::Update(a) => Ok((&a.table_name, a.condition.as_ref())),
        Operation::ConditionCheck(a) => Ok((&a.table_name, Some(&a.condition))),
    }
}

#[async_trait]
impl StoreClient for MemoryStore {
    async fn transact_get(
        &self,
        request: &TransactionRequest,
    ) -> Result<TransactGetOutput, StoreError> {
        self.get_calls.fetch_add(1, Ordering::SeqCst);
        self.take_failure()?;

        let tables = self.tables.read();
        let mut responses = Vec::with_capacity(request.len());
        for op in &request.items {
            let Operation::Get(get) = op else {
                return Err(StoreError::Validation {
                    message: "TransactGetItems can only contain Get operations".to_string(),
                });
            };
            let table = active_table(&tables, &get.table_name)?;
            let key = table.check_key(&get.key)?;
            responses.push(ItemResponse {
                item: table.items.get(&key).cloned(),
            });
        }
        Ok(TransactGetOutput {
            responses: Some(responses),
        })
    }

    async fn transact_write(&self, request: &TransactionRequest) -> Result<(), StoreError> {
        self.write_calls.fetch_add(1, Ordering::SeqCst);
        self.take_failure()?;

        let mut tables = self.tables.write();

        // Validate shape and resolve every target key before touching data.
        let mut seen = HashSet::new();
        let mut targets = Vec::with_capacity(request.len());
        for op in &request.items {
            let (table_name, condition) = write_target(op)?;
            let table = active_table(&tables, table_name)?;
            let key = match op {
                Operation::Put(put) => table.key_of_item(&put.item)?,
                Operation::Delete(a) => table.check_key(&a.key)?,
                Operation::Update(a) => {
                    table.check_update_targets(a.set.keys().chain(&a.remove))?;
                    table.check_key(&a.key)?
                }
                Operation::ConditionCheck(a) => table.check_key(&a.key)?,
                Operation::Get(_) => unreachable!("rejected by write_target"),
            };
            if !seen.insert((table_name.to_string(), key.clone())) {
                return Err(StoreError::Validation {
                    message: "Transaction request cannot include multiple operations on one item"
                        .to_string(),
                });
            }
            targets.push((table_name.to_string(), key, condition));
        }

        let reasons: Vec<CancellationReason> = targets
            .iter()
            .map(|(table_name, key, condition)| {
                let current = tables.get(table_name).and_then(|t| t.items.get(key));
                match condition {
                    Some(c) if !c.evaluate(current) => CancellationReason::conditional_check_failed(),
                    _ => CancellationReason::none(),
                }
            })
            .collect();
        if reasons.iter().any(|r| r.code != "None") {
            tracing::debug!(?reasons, "write transaction cancelled");
            return Err(StoreError::TransactionCanceled { reasons });
        }

        for (op, (table_name, key, _)) in request.items.iter().zip(targets) {
            let Some(table) = tables.get_mut(&table_name) else {
                continue;
            };
            match op {
                Operation::Put(put) => {
                    table.items.insert(key, put.item.clone());
                }
                Operation::Delete(_) => {
                    table.items.remove(&key);
                }
                Operation::Update(update) => {
                    let item = table.items.entry(key.clone()).or_insert(key);
                    for (name, value) in &update.set {
                        item.insert(name.clone(), value.clone());
                    }
                    for name in &update.remove {
                        item.remove(name);
                    }
                }
                Operation::Get(_) | Operation::ConditionCheck(_) => {}
            }
        }
        Ok(())
    }

    async fn describe_table(&self, table: &str) -> Result<TableStatus, StoreError> {
        self.describe_calls.fetch_add(1, Ordering::SeqCst);
        let mut tables = self.tables.write();
        let table = tables.get_mut(table).ok_or_else(|| not_found(table))?;
        let status = table.status();
        table.polls_until_active = table.polls_until_active.saturating_sub(1);
        Ok(status)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use dynaform_core::AttributeValue;

    use super::*;
    use crate::operation::{
        ConditionCheck, DeleteItem, GetItem, OperationDescriptor, PutItem, TransactionKind,
        UpdateItem,
    };

    fn item(pairs: &[(&str, &str)]) -> Item {
        pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), AttributeValue::S((*v).to_string())))
            .collect()
    }

    fn request(kind: TransactionKind, ops: Vec<Operation>) -> TransactionRequest {
        let descriptors: Vec<_> = ops.into_iter().map(OperationDescriptor::unowned).collect();
        TransactionRequest::new(kind, &descriptors)
    }

    fn get(id: &str) -> Operation {
        Operation::Get(GetItem {
            table_name: "Users".into(),
            key: item(&[("id", id)]),
        })
    }

    fn put(id: &str, name: &str, condition: Option<Condition>) -> Operation {
        Operation::Put(PutItem {
            table_name: "Users".into(),
            item: item(&[("id", id), ("name", name)]),
            condition,
        })
    }

    fn store() -> MemoryStore {
        let store = MemoryStore::new();
        store.create_table("Users", "id", None);
        store
    }

    #[tokio::test]
    async fn get_returns_aligned_slots() {
        let store = store();
        store.put_item("Users", item(&[("id", "u1"), ("name", "Ann")])).unwrap();

        let output = store
            .transact_get(&request(TransactionKind::Read, vec![get("missing"), get("u1")]))
            .await
            .unwrap();
        let responses = output.responses.unwrap();
        assert_eq!(responses.len(), 2);
        assert_eq!(responses[0].item, None);
        assert_eq!(
            responses[1].item.as_ref().unwrap()["name"],
            AttributeValue::S("Ann".into())
        );
        assert_eq!(store.get_calls(), 1);
    }

    #[tokio::test]
    async fn get_rejects_write_items() {
        let store = store();
        let err = store
            .transact_get(&request(TransactionKind::Read, vec![put("u1", "Ann", None)]))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Validation { .. }));
    }

    #[tokio::test]
    async fn write_rejects_get_items() {
        let store = store();
        let err = store
            .transact_write(&request(
                TransactionKind::Write,
                vec![get("u1"), put("u2", "Bo", None)],
            ))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Validation { .. }));
        assert!(store.get_item("Users", &item(&[("id", "u2")])).is_none());
    }

    #[tokio::test]
    async fn write_is_all_or_nothing() {
        let store = store();
        store.put_item("Users", item(&[("id", "u1"), ("name", "Ann")])).unwrap();

        let err = store
            .transact_write(&request(
                TransactionKind::Write,
                vec![
                    put("u2", "Bo", None),
                    put("u1", "Cy", Some(Condition::AttributeNotExists("id".into()))),
                ],
            ))
            .await
            .unwrap_err();

        let StoreError::TransactionCanceled { reasons } = err else {
            panic!("expected cancellation");
        };
        assert_eq!(reasons[0], CancellationReason::none());
        assert_eq!(reasons[1], CancellationReason::conditional_check_failed());
        assert!(store.get_item("Users", &item(&[("id", "u2")])).is_none());
        assert_eq!(
            store.get_item("Users", &item(&[("id", "u1")])).unwrap()["name"],
            AttributeValue::S("Ann".into())
        );
    }

    #[tokio::test]
    async fn write_applies_every_action() {
        let store = store();
        store.put_item("Users", item(&[("id", "old")])).unwrap();
        store.put_item("Users", item(&[("id", "u3"), ("nick", "x")])).unwrap();

        let mut set = BTreeMap::new();
        set.insert("name".to_string(), AttributeValue::S("Cy".into()));
        store
            .transact_write(&request(
                TransactionKind::Write,
                vec![
                    put("u1", "Ann", None),
                    Operation::Delete(DeleteItem {
                        table_name: "Users".into(),
                        key: item(&[("id", "old")]),
                        condition: None,
                    }),
                    Operation::Update(UpdateItem {
                        table_name: "Users".into(),
                        key: item(&[("id", "u3")]),
                        set,
                        remove: vec!["nick".into()],
                        condition: Some(Condition::AttributeExists("id".into())),
                    }),
                    Operation::ConditionCheck(ConditionCheck {
                        table_name: "Users".into(),
                        key: item(&[("id", "u3")]),
                        condition: Condition::AttributeExists("id".into()),
                    }),
                ],
            ))
            .await
            .unwrap_err();

        // u3 is targeted twice above, which the store refuses outright.
        assert!(store.get_item("Users", &item(&[("id", "u1")])).is_none());

        let mut set = BTreeMap::new();
        set.insert("name".to_string(), AttributeValue::S("Cy".into()));
        store
            .transact_write(&request(
                TransactionKind::Write,
                vec![
                    put("u1", "Ann", None),
                    Operation::Delete(DeleteItem {
                        table_name: "Users".into(),
                        key: item(&[("id", "old")]),
                        condition: None,
                    }),
                    Operation::Update(UpdateItem {
                        table_name: "Users".into(),
                        key: item(&[("id", "u3")]),
                        set,
                        remove: vec!["nick".into()],
                        condition: Some(Condition::AttributeExists("id".into())),
                    }),
                ],
            ))
            .await
            .unwrap();

        assert!(store.get_item("Users", &item(&[("id", "u1")])).is_some());
        assert!(store.get_item("Users", &item(&[("id", "old")])).is_none());
        assert_eq!(
            store.get_item("Users", &item(&[("id", "u3")])).unwrap(),
            item(&[("id", "u3"), ("name", "Cy")])
        );
        assert_eq!(store.write_calls(), 2);
    }

    #[tokio::test]
    async fn unknown_or_inactive_tables_are_not_found() {
        let store = MemoryStore::new();
        store.create_table_activating("Users", "id", None, 2);

        let err = store
            .transact_get(&request(TransactionKind::Read, vec![get("u1")]))
            .await
            .unwrap_err();
        assert_eq!(err, StoreError::ResourceNotFound { table: "Users".into() });

        assert_eq!(store.describe_table("Users").await.unwrap(), TableStatus::Creating);
        assert_eq!(store.describe_table("Users").await.unwrap(), TableStatus::Creating);
        assert_eq!(store.describe_table("Users").await.unwrap(), TableStatus::Active);
        assert!(store.describe_table("Orders").await.is_err());
        assert_eq!(store.describe_calls(), 4);
    }

    #[tokio::test]
    async fn queued_failure_is_returned_once() {
        let store = store();
        store.fail_next(StoreError::TransactionConflict);

        let err = store
            .transact_write(&request(TransactionKind::Write, vec![put("u1", "Ann", None)]))
            .await
            .unwrap_err();
        assert_eq!(err, StoreError::TransactionConflict);

        store
            .transact_write(&request(TransactionKind::Write, vec![put("u1", "Ann", None)]))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn key_must_match_schema() {
        let store = store();
        let op = Operation::Get(GetItem {
            table_name: "Users".into(),
            key: item(&[("id", "u1"), ("extra", "x")]),
        });
        let err = store
            .transact_get(&request(TransactionKind::Read, vec![op]))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Validation { .. }));
    }

    #[tokio::test]
    async fn update_cannot_touch_key_attributes() {
        let store = store();
        store.put_item("Users", item(&[("id", "u1"), ("name", "Ann")])).unwrap();

        let mut set = BTreeMap::new();
        set.insert("id".to_string(), AttributeValue::S("u9".into()));
        let renaming = Operation::Update(UpdateItem {
            table_name: "Users".into(),
            key: item(&[("id", "u1")]),
            set,
            remove: Vec::new(),
            condition: None,
        });
        let removing = Operation::Update(UpdateItem {
            table_name: "Users".into(),
            key: item(&[("id", "u1")]),
            set: BTreeMap::new(),
            remove: vec!["id".into()],
            condition: None,
        });

        for op in [renaming, removing] {
            let err = store
                .transact_write(&request(TransactionKind::Write, vec![op]))
                .await
                .unwrap_err();
            assert!(matches!(err, StoreError::Validation { ref message } if message.contains("part of the key")));
        }
        assert_eq!(
            store.get_item("Users", &item(&[("id", "u1")])),
            Some(item(&[("id", "u1"), ("name", "Ann")]))
        );
    }
}
