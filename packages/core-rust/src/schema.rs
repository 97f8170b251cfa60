//! Model schemas.
//!
//! A [`Schema`] names the key attributes of a model, the type of every
//! attribute it stores, and the model's [`ExpirationPolicy`]. Schemas are
//! defined once when a model is registered and read on every encode and
//! decode pass.

use serde::{Deserialize, Serialize};

use crate::types::{Document, Value};

/// Type of a single schema attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AttributeKind {
    String,
    Number,
    Boolean,
    Binary,
    /// Stored as epoch milliseconds (epoch seconds for the expiration attribute).
    Date,
    List,
    Map,
    StringSet,
    NumberSet,
    BinarySet,
}

impl AttributeKind {
    /// Whether `value` is an acceptable domain value for this kind.
    #[must_use]
    pub fn accepts(self, value: &Value) -> bool {
        match (self, value) {
            (_, Value::Null)
            | (Self::String, Value::String(_))
            | (Self::Number, Value::Number(_))
            | (Self::Boolean, Value::Bool(_))
            | (Self::Binary, Value::Bytes(_))
            | (Self::Date, Value::Date(_))
            | (Self::List, Value::List(_))
            | (Self::Map, Value::Map(_)) => true,
            (Self::StringSet, Value::List(items)) => {
                items.iter().all(|v| matches!(v, Value::String(_)))
            }
            (Self::NumberSet, Value::List(items)) => {
                items.iter().all(|v| matches!(v, Value::Number(_)))
            }
            (Self::BinarySet, Value::List(items)) => {
                items.iter().all(|v| matches!(v, Value::Bytes(_)))
            }
            _ => false,
        }
    }
}

/// Single attribute definition within a schema.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttributeDef {
    /// Name of the attribute.
    pub name: String,
    /// Declared type.
    pub kind: AttributeKind,
    /// Whether the attribute must be present in every record.
    pub required: bool,
}

/// Per-model rule for excluding stale records from read results.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExpirationPolicy {
    /// Date attribute holding the expiry time, if the model expires records.
    pub attribute: Option<String>,
    /// Whether reads return records whose expiry time has already passed.
    /// The store deletes expired records lazily, so they can still come back.
    pub return_expired: bool,
}

impl Default for ExpirationPolicy {
    fn default() -> Self {
        Self {
            attribute: None,
            return_expired: true,
        }
    }
}

impl ExpirationPolicy {
    /// The attribute to filter on, when expired records must be dropped.
    #[must_use]
    pub fn filtered_attribute(&self) -> Option<&str> {
        if self.return_expired {
            None
        } else {
            self.attribute.as_deref()
        }
    }
}

/// Result of validating a document against a schema.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationResult {
    /// The document conforms to the schema.
    Valid,
    /// The document violates one or more schema constraints.
    Invalid {
        /// Human-readable descriptions of each validation failure.
        errors: Vec<String>,
    },
}

/// Schema definition for a model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Schema {
    /// Partition key attribute.
    pub hash_key: String,
    /// Optional sort key attribute.
    pub range_key: Option<String>,
    /// Every stored attribute, keys included.
    pub attributes: Vec<AttributeDef>,
    /// Expiration behavior for reads.
    pub expiration: ExpirationPolicy,
}

impl Schema {
    /// Creates a schema whose only attribute is the required hash key.
    #[must_use]
    pub fn new(hash_key: impl Into<String>, kind: AttributeKind) -> Self {
        let hash_key = hash_key.into();
        Self {
            attributes: vec![AttributeDef {
                name: hash_key.clone(),
                kind,
                required: true,
            }],
            hash_key,
            range_key: None,
            expiration: ExpirationPolicy::default(),
        }
    }

    /// Adds a required sort key attribute.
    #[must_use]
    pub fn with_range_key(mut self, name: impl Into<String>, kind: AttributeKind) -> Self {
        let name = name.into();
        self.range_key = Some(name.clone());
        self.with_attribute(name, kind, true)
    }

    /// Adds (or redefines) an attribute.
    #[must_use]
    pub fn with_attribute(
        mut self,
        name: impl Into<String>,
        kind: AttributeKind,
        required: bool,
    ) -> Self {
        let def = AttributeDef {
            name: name.into(),
            kind,
            required,
        };
        match self.attributes.iter_mut().find(|a| a.name == def.name) {
            Some(existing) => *existing = def,
            None => self.attributes.push(def),
        }
        self
    }

    /// Declares `attribute` as the expiry date attribute.
    ///
    /// The attribute is added as an optional `Date` if not already defined.
    #[must_use]
    pub fn with_expiration(mut self, attribute: impl Into<String>, return_expired: bool) -> Self {
        let attribute = attribute.into();
        if self.attribute(&attribute).is_none() {
            self = self.with_attribute(attribute.clone(), AttributeKind::Date, false);
        }
        self.expiration = ExpirationPolicy {
            attribute: Some(attribute),
            return_expired,
        };
        self
    }

    /// Looks up an attribute definition by name.
    #[must_use]
    pub fn attribute(&self, name: &str) -> Option<&AttributeDef> {
        self.attributes.iter().find(|a| a.name == name)
    }

    /// Names of the key attributes, hash key first.
    pub fn key_names(&self) -> impl Iterator<Item = &str> {
        std::iter::once(self.hash_key.as_str()).chain(self.range_key.as_deref())
    }

    /// Whether `name` is the expiry attribute (stored as epoch seconds).
    #[must_use]
    pub fn is_expiration_attribute(&self, name: &str) -> bool {
        self.expiration.attribute.as_deref() == Some(name)
    }

    /// Checks required attributes and declared types of a document.
    #[must_use]
    pub fn validate(&self, document: &Document) -> ValidationResult {
        let mut errors = Vec::new();
        for def in &self.attributes {
            match document.get(&def.name) {
                None | Some(Value::Null) if def.required => {
                    errors.push(format!("{} is a required attribute", def.name));
                }
                Some(value) if !def.kind.accepts(value) => {
                    errors.push(format!("{} must be of type {:?}", def.name, def.kind));
                }
                _ => {}
            }
        }
        if errors.is_empty() {
            ValidationResult::Valid
        } else {
            ValidationResult::Invalid { errors }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user_schema() -> Schema {
        Schema::new("id", AttributeKind::String)
            .with_attribute("name", AttributeKind::String, true)
            .with_attribute("tags", AttributeKind::StringSet, false)
    }

    #[test]
    fn key_names_include_range_key() {
        let schema = Schema::new("pk", AttributeKind::String)
            .with_range_key("sk", AttributeKind::Number);
        assert_eq!(schema.key_names().collect::<Vec<_>>(), vec!["pk", "sk"]);
        assert!(schema.attribute("sk").is_some_and(|a| a.required));
    }

    #[test]
    fn with_attribute_replaces_existing_definition() {
        let schema = user_schema().with_attribute("name", AttributeKind::Number, false);
        let name = schema.attribute("name").unwrap();
        assert_eq!(name.kind, AttributeKind::Number);
        assert!(!name.required);
        assert_eq!(schema.attributes.len(), 3);
    }

    #[test]
    fn expiration_defaults_to_returning_everything() {
        let schema = user_schema();
        assert_eq!(schema.expiration.filtered_attribute(), None);

        let schema = schema.with_expiration("ttl", false);
        assert_eq!(schema.expiration.filtered_attribute(), Some("ttl"));
        assert_eq!(schema.attribute("ttl").unwrap().kind, AttributeKind::Date);
        assert!(schema.is_expiration_attribute("ttl"));

        let schema = schema.with_expiration("ttl", true);
        assert_eq!(schema.expiration.filtered_attribute(), None);
    }

    #[test]
    fn validate_reports_missing_and_mistyped() {
        let schema = user_schema();
        let doc = Document::new("User").with("id", "u1").with("name", "Ann");
        assert_eq!(schema.validate(&doc), ValidationResult::Valid);

        let doc = Document::new("User")
            .with("id", "u1")
            .with("tags", Value::List(vec![Value::Number(1.0)]));
        let ValidationResult::Invalid { errors } = schema.validate(&doc) else {
            panic!("expected invalid");
        };
        assert_eq!(errors.len(), 2);
        assert!(errors.iter().any(|e| e.contains("name is a required")));
        assert!(errors.iter().any(|e| e.contains("tags must be of type")));
    }
}
