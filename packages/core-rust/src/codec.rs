//! Translation between domain documents and store-native records.
//!
//! [`SchemaCodec`] is the seam between typed documents and the wire
//! encoding. [`Schema`] provides the standard implementation: attributes
//! are converted according to their declared [`AttributeKind`], unknown
//! attributes are dropped, and the expiry attribute travels as epoch
//! seconds.

use std::collections::BTreeMap;

use async_trait::async_trait;

use crate::attribute::{AttributeValue, Item};
use crate::schema::{AttributeKind, ExpirationPolicy, Schema, ValidationResult};
use crate::types::{Document, Value};

/// Errors raised while converting between documents and raw records.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum CodecError {
    #[error("{attribute} is a required attribute")]
    MissingAttribute { attribute: String },
    #[error("expected {attribute} to be of type {expected}, found {found}")]
    TypeMismatch {
        attribute: String,
        expected: String,
        found: &'static str,
    },
    #[error("{attribute} holds an invalid number: {text}")]
    InvalidNumber { attribute: String, text: String },
    #[error("document failed validation: {}", .errors.join(", "))]
    Invalid { errors: Vec<String> },
}

/// Converts between [`Document`]s and raw [`Item`]s for one model.
#[async_trait]
pub trait SchemaCodec: Send + Sync {
    /// Populates `document` from a raw record.
    ///
    /// The record is expected to have its set wrappers already unwrapped
    /// into lists (see [`crate::unwrap_item_sets`]); raw sets are accepted
    /// as well.
    async fn decode_raw(&self, document: Document, raw: Item) -> Result<Document, CodecError>;

    /// Encodes every schema attribute present in `document`.
    ///
    /// # Errors
    ///
    /// Returns `CodecError::Invalid` if the document fails schema validation.
    fn encode(&self, document: &Document) -> Result<Item, CodecError>;

    /// Encodes only the key attributes out of `key`.
    ///
    /// # Errors
    ///
    /// Returns `CodecError::MissingAttribute` if a key attribute is absent.
    fn encode_key(&self, key: &BTreeMap<String, Value>) -> Result<Item, CodecError>;

    /// Encodes a single attribute value (used for update and condition values).
    ///
    /// # Errors
    ///
    /// Returns `CodecError::TypeMismatch` if the value does not fit the attribute.
    fn encode_attribute(&self, name: &str, value: &Value) -> Result<AttributeValue, CodecError>;

    /// Name of the partition key attribute.
    fn hash_key(&self) -> &str;

    /// Read-only expiration metadata.
    fn expiration_policy(&self) -> &ExpirationPolicy;
}

#[async_trait]
impl SchemaCodec for Schema {
    async fn decode_raw(
        &self,
        mut document: Document,
        raw: Item,
    ) -> Result<Document, CodecError> {
        for (name, attr) in raw {
            let Some(def) = self.attribute(&name) else {
                tracing::trace!(attribute = %name, "dropping attribute unknown to schema");
                continue;
            };
            let value = decode_typed(&name, def.kind, attr, self.is_expiration_attribute(&name))?;
            document.fields.insert(name, value);
        }
        for def in self.attributes.iter().filter(|d| d.required) {
            if matches!(document.get(&def.name), None | Some(Value::Null)) {
                return Err(CodecError::MissingAttribute {
                    attribute: def.name.clone(),
                });
            }
        }
        Ok(document)
    }

    fn encode(&self, document: &Document) -> Result<Item, CodecError> {
        if let ValidationResult::Invalid { errors } = self.validate(document) {
            return Err(CodecError::Invalid { errors });
        }
        let mut item = Item::new();
        for def in &self.attributes {
            if let Some(value) = document.get(&def.name) {
                item.insert(def.name.clone(), self.encode_attribute(&def.name, value)?);
            }
        }
        Ok(item)
    }

    fn encode_key(&self, key: &BTreeMap<String, Value>) -> Result<Item, CodecError> {
        let mut item = Item::new();
        for name in self.key_names() {
            let value = key.get(name).ok_or_else(|| CodecError::MissingAttribute {
                attribute: name.to_string(),
            })?;
            item.insert(name.to_string(), self.encode_attribute(name, value)?);
        }
        Ok(item)
    }

    fn encode_attribute(&self, name: &str, value: &Value) -> Result<AttributeValue, CodecError> {
        match self.attribute(name) {
            Some(def) if !def.kind.accepts(value) => Err(CodecError::TypeMismatch {
                attribute: name.to_string(),
                expected: format!("{:?}", def.kind),
                found: value_type_name(value),
            }),
            Some(def) => Ok(encode_typed(def.kind, value, self.is_expiration_attribute(name))),
            None => Ok(encode_untyped(value)),
        }
    }

    fn hash_key(&self) -> &str {
        &self.hash_key
    }

    fn expiration_policy(&self) -> &ExpirationPolicy {
        &self.expiration
    }
}

fn value_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "Null",
        Value::Bool(_) => "Boolean",
        Value::Number(_) => "Number",
        Value::String(_) => "String",
        Value::Bytes(_) => "Binary",
        Value::Date(_) => "Date",
        Value::List(_) => "List",
        Value::Map(_) => "Map",
    }
}

fn parse_number(attribute: &str, text: &str) -> Result<f64, CodecError> {
    text.parse().map_err(|_| CodecError::InvalidNumber {
        attribute: attribute.to_string(),
        text: text.to_string(),
    })
}

fn mismatch(attribute: &str, kind: AttributeKind, found: &AttributeValue) -> CodecError {
    CodecError::TypeMismatch {
        attribute: attribute.to_string(),
        expected: format!("{kind:?}"),
        found: found.type_name(),
    }
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn decode_typed(
    name: &str,
    kind: AttributeKind,
    attr: AttributeValue,
    epoch_seconds: bool,
) -> Result<Value, CodecError> {
    let attr = attr.unwrap_sets();
    match (kind, attr) {
        (_, AttributeValue::Null(_)) => Ok(Value::Null),
        (AttributeKind::String, AttributeValue::S(s)) => Ok(Value::String(s)),
        (AttributeKind::Number, AttributeValue::N(n)) => Ok(Value::Number(parse_number(name, &n)?)),
        (AttributeKind::Boolean, AttributeValue::Bool(b)) => Ok(Value::Bool(b)),
        (AttributeKind::Binary, AttributeValue::B(b)) => Ok(Value::Bytes(b)),
        (AttributeKind::Date, AttributeValue::N(n)) => {
            let n = parse_number(name, &n)?;
            let millis = if epoch_seconds { n * 1000.0 } else { n };
            Ok(Value::Date(millis.max(0.0) as u64))
        }
        (
            AttributeKind::List
            | AttributeKind::StringSet
            | AttributeKind::NumberSet
            | AttributeKind::BinarySet,
            AttributeValue::L(items),
        ) => {
            let values = items
                .into_iter()
                .map(|v| decode_untyped(name, v))
                .collect::<Result<Vec<_>, _>>()?;
            let decoded = Value::List(values);
            if kind.accepts(&decoded) {
                Ok(decoded)
            } else {
                Err(CodecError::TypeMismatch {
                    attribute: name.to_string(),
                    expected: format!("{kind:?}"),
                    found: "L",
                })
            }
        }
        (AttributeKind::Map, attr @ AttributeValue::M(_)) => decode_untyped(name, attr),
        (kind, other) => Err(mismatch(name, kind, &other)),
    }
}

fn decode_untyped(name: &str, attr: AttributeValue) -> Result<Value, CodecError> {
    Ok(match attr.unwrap_sets() {
        AttributeValue::S(s) => Value::String(s),
        AttributeValue::N(n) => Value::Number(parse_number(name, &n)?),
        AttributeValue::B(b) => Value::Bytes(b),
        AttributeValue::Bool(b) => Value::Bool(b),
        AttributeValue::Null(_) => Value::Null,
        AttributeValue::L(items) => Value::List(
            items
                .into_iter()
                .map(|v| decode_untyped(name, v))
                .collect::<Result<_, _>>()?,
        ),
        AttributeValue::M(map) => Value::Map(
            map.into_iter()
                .map(|(k, v)| Ok((k, decode_untyped(name, v)?)))
                .collect::<Result<_, CodecError>>()?,
        ),
        // unwrap_sets leaves no set wrappers behind
        AttributeValue::SS(_) | AttributeValue::NS(_) | AttributeValue::BS(_) => Value::Null,
    })
}

fn encode_typed(kind: AttributeKind, value: &Value, epoch_seconds: bool) -> AttributeValue {
    match (kind, value) {
        // Rounded up: a future expiry must never be stored as a past one.
        (AttributeKind::Date, Value::Date(ms)) if epoch_seconds => {
            AttributeValue::N(ms.div_ceil(1000).to_string())
        }
        (AttributeKind::StringSet, Value::List(items)) => AttributeValue::SS(
            items
                .iter()
                .filter_map(|v| v.as_str().map(str::to_string))
                .collect(),
        ),
        (AttributeKind::NumberSet, Value::List(items)) => AttributeValue::NS(
            items
                .iter()
                .filter_map(|v| match v {
                    Value::Number(n) => Some(n.to_string()),
                    _ => None,
                })
                .collect(),
        ),
        (AttributeKind::BinarySet, Value::List(items)) => AttributeValue::BS(
            items
                .iter()
                .filter_map(|v| match v {
                    Value::Bytes(b) => Some(serde_bytes::ByteBuf::from(b.clone())),
                    _ => None,
                })
                .collect(),
        ),
        _ => encode_untyped(value),
    }
}

fn encode_untyped(value: &Value) -> AttributeValue {
    match value {
        Value::Null => AttributeValue::Null(true),
        Value::Bool(b) => AttributeValue::Bool(*b),
        Value::Number(n) => AttributeValue::N(n.to_string()),
        Value::String(s) => AttributeValue::S(s.clone()),
        Value::Bytes(b) => AttributeValue::B(b.clone()),
        Value::Date(ms) => AttributeValue::N(ms.to_string()),
        Value::List(items) => AttributeValue::L(items.iter().map(encode_untyped).collect()),
        Value::Map(map) => AttributeValue::M(
            map.iter()
                .map(|(k, v)| (k.clone(), encode_untyped(v)))
                .collect(),
        ),
    }
}
