use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Domain-side runtime value for document fields.
///
/// This is what application code reads and writes. The schema codec
/// translates between `Value` and the store-native
/// [`AttributeValue`](crate::AttributeValue) encoding.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Value {
    /// Absent or explicit null.
    Null,
    /// Boolean.
    Bool(bool),
    /// Numeric value (64-bit IEEE 754).
    Number(f64),
    /// UTF-8 string.
    String(String),
    /// Binary data.
    Bytes(Vec<u8>),
    /// Point in time as milliseconds since the Unix epoch.
    Date(u64),
    /// Ordered sequence of values. Store-native sets decode to this too.
    List(Vec<Value>),
    /// Nested object.
    /// Uses `BTreeMap` for deterministic serialization order.
    Map(BTreeMap<String, Value>),
}

impl Value {
    /// Returns the string payload, if this is a `String`.
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    /// Returns the millisecond payload, if this is a `Date`.
    #[must_use]
    pub fn as_date(&self) -> Option<u64> {
        match self {
            Self::Date(ms) => Some(*ms),
            _ => None,
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Self::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Self::String(s)
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Self::Number(n)
    }
}

impl From<i64> for Value {
    #[allow(clippy::cast_precision_loss)]
    fn from(n: i64) -> Self {
        Self::Number(n as f64)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

/// A typed domain instance belonging to a registered model.
///
/// Documents built from store responses are marked `persisted`; documents
/// built by application code start out unpersisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    /// Name of the model that owns this document.
    pub model: String,
    /// Field values keyed by attribute name.
    pub fields: BTreeMap<String, Value>,
    /// Whether this document reflects a record already present in the store.
    pub persisted: bool,
}

impl Document {
    /// Creates an empty, unpersisted document for `model`.
    #[must_use]
    pub fn new(model: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            fields: BTreeMap::new(),
            persisted: false,
        }
    }

    /// Creates an empty document marked as already persisted, ready for the
    /// codec to populate from a raw record.
    #[must_use]
    pub fn persisted(model: impl Into<String>) -> Self {
        Self {
            persisted: true,
            ..Self::new(model)
        }
    }

    /// Builder-style field setter.
    #[must_use]
    pub fn with(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.fields.insert(name.into(), value.into());
        self
    }

    /// Looks up a field by name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.fields.get(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn persisted_constructor_marks_flag() {
        let doc = Document::persisted("User");
        assert!(doc.persisted);
        assert!(doc.fields.is_empty());
        assert!(!Document::new("User").persisted);
    }

    #[test]
    fn with_sets_fields() {
        let doc = Document::new("User").with("id", "u1").with("age", 31_i64);
        assert_eq!(doc.get("id").and_then(Value::as_str), Some("u1"));
        assert_eq!(doc.get("age"), Some(&Value::Number(31.0)));
        assert_eq!(doc.get("missing"), None);
    }
}
