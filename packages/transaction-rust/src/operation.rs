//! Operation descriptors and the atomic request built from them.
//!
//! An [`Operation`] is a tagged variant naming one store action. Serialized,
//! it takes the store's one-key-per-entry shape:
//!
//! ```json
//! { "Get": { "TableName": "Users", "Key": { "id": { "S": "u1" } } } }
//! ```
//!
//! An [`OperationDescriptor`] pairs an operation with a back-reference to the
//! model that built it. [`TransactionRequest`] strips those back-references
//! before anything is sent to the store.

use std::collections::BTreeMap;

use dynaform_core::{AttributeValue, Item};
use serde::Serialize;

// ---------------------------------------------------------------------------
// Conditions
// ---------------------------------------------------------------------------

/// Condition attached to a write or condition-check action.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum Condition {
    AttributeExists(String),
    AttributeNotExists(String),
    Equals(String, AttributeValue),
    And(Vec<Condition>),
}

impl Condition {
    /// Evaluates the condition against the current stored item, if any.
    #[must_use]
    pub fn evaluate(&self, current: Option<&Item>) -> bool {
        match self {
            Self::AttributeExists(name) => current.is_some_and(|item| item.contains_key(name)),
            Self::AttributeNotExists(name) => !current.is_some_and(|item| item.contains_key(name)),
            Self::Equals(name, expected) => {
                current.and_then(|item| item.get(name)) == Some(expected)
            }
            Self::And(all) => all.iter().all(|c| c.evaluate(current)),
        }
    }
}

// ---------------------------------------------------------------------------
// Actions
// ---------------------------------------------------------------------------

/// Read one item by key.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct GetItem {
    pub table_name: String,
    pub key: Item,
}

/// Write a full item.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct PutItem {
    pub table_name: String,
    pub item: Item,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub condition: Option<Condition>,
}

/// Remove an item by key.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct DeleteItem {
    pub table_name: String,
    pub key: Item,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub condition: Option<Condition>,
}

/// Set and remove individual attributes of an item, creating it if absent.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct UpdateItem {
    pub table_name: String,
    pub key: Item,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub set: BTreeMap<String, AttributeValue>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub remove: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub condition: Option<Condition>,
}

/// Assert a condition on an item without modifying it.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct ConditionCheck {
    pub table_name: String,
    pub key: Item,
    pub condition: Condition,
}

/// Discriminant of an [`Operation`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OperationKind {
    Get,
    Put,
    Delete,
    Update,
    ConditionCheck,
}

impl OperationKind {
    /// Whether this operation only reads.
    #[must_use]
    pub fn is_read(self) -> bool {
        match self {
            Self::Get => true,
            Self::Put | Self::Delete | Self::Update | Self::ConditionCheck => false,
        }
    }
}

/// A single store action.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum Operation {
    Get(GetItem),
    Put(PutItem),
    Delete(DeleteItem),
    Update(UpdateItem),
    ConditionCheck(ConditionCheck),
}

impl Operation {
    #[must_use]
    pub fn kind(&self) -> OperationKind {
        match self {
            Self::Get(_) => OperationKind::Get,
            Self::Put(_) => OperationKind::Put,
            Self::Delete(_) => OperationKind::Delete,
            Self::Update(_) => OperationKind::Update,
            Self::ConditionCheck(_) => OperationKind::ConditionCheck,
        }
    }

    /// Name of the table this action targets.
    #[must_use]
    pub fn table_name(&self) -> &str {
        match self {
            Self::Get(a) => &a.table_name,
            Self::Put(a) => &a.table_name,
            Self::Delete(a) => &a.table_name,
            Self::Update(a) => &a.table_name,
            Self::ConditionCheck(a) => &a.table_name,
        }
    }
}

// ---------------------------------------------------------------------------
// Descriptor
// ---------------------------------------------------------------------------

/// An operation tagged with the model that produced it.
#[derive(Debug, Clone, PartialEq)]
pub struct OperationDescriptor {
    pub operation: Operation,
    /// Back-reference to the owning model. `None` marks a descriptor that
    /// was built by hand and cannot be resolved.
    pub model: Option<String>,
}

impl OperationDescriptor {
    #[must_use]
    pub fn new(operation: Operation, model: impl Into<String>) -> Self {
        Self {
            operation,
            model: Some(model.into()),
        }
    }

    /// Wraps an operation without a model back-reference.
    #[must_use]
    pub fn unowned(operation: Operation) -> Self {
        Self {
            operation,
            model: None,
        }
    }

    #[must_use]
    pub fn kind(&self) -> OperationKind {
        self.operation.kind()
    }

    #[must_use]
    pub fn table_name(&self) -> &str {
        self.operation.table_name()
    }
}

// ---------------------------------------------------------------------------
// Request
// ---------------------------------------------------------------------------

/// Which atomic store call a batch is submitted through.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransactionKind {
    /// Read-only transaction; every item is a `Get`.
    Read,
    /// Write transaction; no item may be a `Get`.
    Write,
}

impl TransactionKind {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Read => "get",
            Self::Write => "write",
        }
    }
}

/// The atomic submission built from a batch, with model metadata stripped.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TransactionRequest {
    #[serde(skip)]
    pub kind: TransactionKind,
    #[serde(rename = "TransactItems")]
    pub items: Vec<Operation>,
}

impl TransactionRequest {
    /// Builds the request for `descriptors`, preserving their order.
    #[must_use]
    pub fn new(kind: TransactionKind, descriptors: &[OperationDescriptor]) -> Self {
        Self {
            kind,
            items: descriptors.iter().map(|d| d.operation.clone()).collect(),
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(id: &str) -> Item {
        let mut key = Item::new();
        key.insert("id".to_string(), AttributeValue::S(id.to_string()));
        key
    }

    fn get(id: &str) -> OperationDescriptor {
        OperationDescriptor::new(
            Operation::Get(GetItem {
                table_name: "Users".into(),
                key: key(id),
            }),
            "User",
        )
    }

    #[test]
    fn request_serializes_without_model_metadata() {
        let request = TransactionRequest::new(TransactionKind::Read, &[get("u1")]);
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "TransactItems": [
                    { "Get": { "TableName": "Users", "Key": { "id": { "S": "u1" } } } }
                ]
            })
        );
        assert!(!json.to_string().contains("User\""));
    }

    #[test]
    fn request_preserves_order() {
        let request =
            TransactionRequest::new(TransactionKind::Read, &[get("a"), get("b"), get("c")]);
        let ids: Vec<_> = request
            .items
            .iter()
            .map(|op| match op {
                Operation::Get(g) => g.key["id"].as_s().unwrap().to_string(),
                _ => unreachable!(),
            })
            .collect();
        assert_eq!(ids, vec!["a", "b", "c"]);
    }

    #[test]
    fn optional_fields_are_omitted() {
        let op = Operation::Update(UpdateItem {
            table_name: "Users".into(),
            key: key("u1"),
            set: BTreeMap::new(),
            remove: vec!["nickname".into()],
            condition: None,
        });
        let json = serde_json::to_value(&op).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "Update": {
                    "TableName": "Users",
                    "Key": { "id": { "S": "u1" } },
                    "Remove": ["nickname"]
                }
            })
        );
    }

    #[test]
    fn conditions_evaluate_against_current_item() {
        let current = key("u1");
        assert!(Condition::AttributeExists("id".into()).evaluate(Some(&current)));
        assert!(!Condition::AttributeExists("id".into()).evaluate(None));
        assert!(Condition::AttributeNotExists("id".into()).evaluate(None));
        assert!(!Condition::AttributeNotExists("id".into()).evaluate(Some(&current)));
        assert!(Condition::Equals("id".into(), AttributeValue::S("u1".into()))
            .evaluate(Some(&current)));
        assert!(!Condition::And(vec![
            Condition::AttributeExists("id".into()),
            Condition::AttributeExists("name".into()),
        ])
        .evaluate(Some(&current)));
    }

    #[test]
    fn only_get_is_a_read() {
        assert!(OperationKind::Get.is_read());
        for kind in [
            OperationKind::Put,
            OperationKind::Delete,
            OperationKind::Update,
            OperationKind::ConditionCheck,
        ] {
            assert!(!kind.is_read());
        }
    }
}
