//! Registered models and their transaction descriptor builders.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use dynaform_core::{CodecError, Document, SchemaCodec, Value};

use crate::operation::{
    Condition, ConditionCheck, DeleteItem, GetItem, Operation, OperationDescriptor, PutItem,
    UpdateItem,
};
use crate::table::Table;

/// Domain-side key: attribute name to value. Extra attributes are ignored
/// when encoding.
pub type KeyFields = BTreeMap<String, Value>;

/// Builds a [`KeyFields`] from name/value pairs.
pub fn key<K, V>(pairs: impl IntoIterator<Item = (K, V)>) -> KeyFields
where
    K: Into<String>,
    V: Into<Value>,
{
    pairs
        .into_iter()
        .map(|(k, v)| (k.into(), v.into()))
        .collect()
}

/// A compiled model: name, backing table, and schema codec.
pub struct Model {
    name: String,
    table: Table,
    codec: Arc<dyn SchemaCodec>,
}

impl Model {
    #[must_use]
    pub fn new(name: impl Into<String>, table: Table, codec: Arc<dyn SchemaCodec>) -> Self {
        Self {
            name: name.into(),
            table,
            codec,
        }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn table(&self) -> &Table {
        &self.table
    }

    #[must_use]
    pub fn codec(&self) -> &dyn SchemaCodec {
        self.codec.as_ref()
    }

    /// Descriptor builders bound to this model.
    #[must_use]
    pub fn transaction(&self) -> ModelTransaction<'_> {
        ModelTransaction { model: self }
    }

    fn descriptor(&self, operation: Operation) -> OperationDescriptor {
        OperationDescriptor::new(operation, self.name.clone())
    }
}

impl fmt::Debug for Model {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Model")
            .field("name", &self.name)
            .field("table", &self.table)
            .finish_non_exhaustive()
    }
}

/// Builds [`OperationDescriptor`]s that carry their model back-reference.
#[derive(Clone, Copy)]
pub struct ModelTransaction<'a> {
    model: &'a Model,
}

impl ModelTransaction<'_> {
    fn table_name(&self) -> String {
        self.model.table.name().to_string()
    }

    /// Read the item stored under `key`.
    ///
    /// # Errors
    ///
    /// Returns `CodecError::MissingAttribute` if a key attribute is absent.
    pub fn get(&self, key: &KeyFields) -> Result<OperationDescriptor, CodecError> {
        Ok(self.model.descriptor(Operation::Get(GetItem {
            table_name: self.table_name(),
            key: self.model.codec.encode_key(key)?,
        })))
    }

    /// Write `document`. Unless `overwrite` is set, the write only succeeds
    /// when no item with the same hash key exists yet.
    ///
    /// # Errors
    ///
    /// Returns `CodecError::Invalid` if the document fails schema validation.
    pub fn create(
        &self,
        document: &Document,
        overwrite: bool,
    ) -> Result<OperationDescriptor, CodecError> {
        let condition = (!overwrite)
            .then(|| Condition::AttributeNotExists(self.model.codec.hash_key().to_string()));
        Ok(self.model.descriptor(Operation::Put(PutItem {
            table_name: self.table_name(),
            item: self.model.codec.encode(document)?,
            condition,
        })))
    }

    /// Remove the item stored under `key`.
    ///
    /// # Errors
    ///
    /// Returns `CodecError::MissingAttribute` if a key attribute is absent.
    pub fn delete(&self, key: &KeyFields) -> Result<OperationDescriptor, CodecError> {
        Ok(self.model.descriptor(Operation::Delete(DeleteItem {
            table_name: self.table_name(),
            key: self.model.codec.encode_key(key)?,
            condition: None,
        })))
    }

    /// Apply `changes` to the item under `key`. A `Value::Null` change
    /// removes the attribute.
    ///
    /// # Errors
    ///
    /// Returns a `CodecError` if the key is incomplete or a value does not
    /// fit its attribute.
    pub fn update(
        &self,
        key: &KeyFields,
        changes: &BTreeMap<String, Value>,
    ) -> Result<OperationDescriptor, CodecError> {
        let codec = &self.model.codec;
        let mut set = BTreeMap::new();
        let mut remove = Vec::new();
        for (name, value) in changes {
            if *value == Value::Null {
                remove.push(name.clone());
            } else {
                set.insert(name.clone(), codec.encode_attribute(name, value)?);
            }
        }
        Ok(self.model.descriptor(Operation::Update(UpdateItem {
            table_name: self.table_name(),
            key: codec.encode_key(key)?,
            set,
            remove,
            condition: None,
        })))
    }

    /// Require `condition` to hold for the item under `key`.
    ///
    /// # Errors
    ///
    /// Returns `CodecError::MissingAttribute` if a key attribute is absent.
    pub fn condition(
        &self,
        key: &KeyFields,
        condition: Condition,
    ) -> Result<OperationDescriptor, CodecError> {
        Ok(self.model.descriptor(Operation::ConditionCheck(ConditionCheck {
            table_name: self.table_name(),
            key: self.model.codec.encode_key(key)?,
            condition,
        })))
    }
}
