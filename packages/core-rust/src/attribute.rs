//! Store-native attribute values.
//!
//! [`AttributeValue`] mirrors the wire encoding used by the backing key-value
//! store: every value is a single-key object naming its type
//! (`{"S": "text"}`, `{"N": "42"}`, `{"SS": ["a", "b"]}`). Numbers travel as
//! decimal strings so no precision is lost in transit.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// A raw record as stored: attribute name to wire value.
///
/// Uses `BTreeMap` for deterministic serialization order.
pub type Item = BTreeMap<String, AttributeValue>;

/// A single store-native attribute value.
///
/// Totally ordered so encoded keys can index ordered collections.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum AttributeValue {
    /// UTF-8 string.
    S(String),
    /// Number, carried as its decimal text.
    N(String),
    /// Binary blob.
    B(#[serde(with = "serde_bytes")] Vec<u8>),
    /// Boolean.
    #[serde(rename = "BOOL")]
    Bool(bool),
    /// Explicit null. The payload is always `true` on the wire.
    #[serde(rename = "NULL")]
    Null(bool),
    /// Ordered heterogeneous list.
    L(Vec<AttributeValue>),
    /// Nested map.
    M(BTreeMap<String, AttributeValue>),
    /// String set.
    SS(Vec<String>),
    /// Number set.
    NS(Vec<String>),
    /// Binary set.
    BS(Vec<serde_bytes::ByteBuf>),
}

impl AttributeValue {
    /// Builds a number value from any integer or float.
    #[must_use]
    pub fn number(n: impl ToString) -> Self {
        Self::N(n.to_string())
    }

    /// Short name of the wire type, as it appears in the encoded object.
    #[must_use]
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::S(_) => "S",
            Self::N(_) => "N",
            Self::B(_) => "B",
            Self::Bool(_) => "BOOL",
            Self::Null(_) => "NULL",
            Self::L(_) => "L",
            Self::M(_) => "M",
            Self::SS(_) => "SS",
            Self::NS(_) => "NS",
            Self::BS(_) => "BS",
        }
    }

    /// Returns `true` for the three set wrappers (`SS`, `NS`, `BS`).
    #[must_use]
    pub fn is_set(&self) -> bool {
        matches!(self, Self::SS(_) | Self::NS(_) | Self::BS(_))
    }

    /// Unwraps a set wrapper into a plain ordered list of scalar values.
    ///
    /// Non-set values are returned unchanged. Nested lists and maps are
    /// walked so sets at any depth are flattened the same way.
    #[must_use]
    pub fn unwrap_sets(self) -> Self {
        match self {
            Self::SS(values) => Self::L(values.into_iter().map(Self::S).collect()),
            Self::NS(values) => Self::L(values.into_iter().map(Self::N).collect()),
            Self::BS(values) => {
                Self::L(values.into_iter().map(|b| Self::B(b.into_vec())).collect())
            }
            Self::L(values) => Self::L(values.into_iter().map(Self::unwrap_sets).collect()),
            Self::M(map) => Self::M(unwrap_item_sets(map)),
            other => other,
        }
    }

    /// Returns the string payload of an `S` value.
    #[must_use]
    pub fn as_s(&self) -> Option<&str> {
        match self {
            Self::S(s) => Some(s),
            _ => None,
        }
    }

    /// Parses the payload of an `N` value as `f64`.
    #[must_use]
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::N(n) => n.parse().ok(),
            _ => None,
        }
    }
}

/// Applies [`AttributeValue::unwrap_sets`] to every attribute of a record.
#[must_use]
pub fn unwrap_item_sets(item: Item) -> Item {
    item.into_iter()
        .map(|(name, value)| (name, value.unwrap_sets()))
        .collect()
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;

    #[test]
    fn wire_shape_is_single_key_object() {
        let json = serde_json::to_value(AttributeValue::S("u1".into())).unwrap();
        assert_eq!(json, serde_json::json!({ "S": "u1" }));

        let json = serde_json::to_value(AttributeValue::Bool(true)).unwrap();
        assert_eq!(json, serde_json::json!({ "BOOL": true }));

        let json = serde_json::to_value(AttributeValue::Null(true)).unwrap();
        assert_eq!(json, serde_json::json!({ "NULL": true }));
    }

    #[test]
    fn parses_store_json() {
        let raw = serde_json::json!({
            "id": { "S": "u1" },
            "age": { "N": "31" },
            "tags": { "SS": ["a", "b"] }
        });
        let item: Item = serde_json::from_value(raw).unwrap();
        assert_eq!(item["id"], AttributeValue::S("u1".into()));
        assert_eq!(item["age"].as_f64(), Some(31.0));
        assert!(item["tags"].is_set());
    }

    #[test]
    fn unwrap_sets_preserves_order() {
        let set = AttributeValue::NS(vec!["3".into(), "1".into(), "2".into()]);
        assert_eq!(
            set.unwrap_sets(),
            AttributeValue::L(vec![
                AttributeValue::N("3".into()),
                AttributeValue::N("1".into()),
                AttributeValue::N("2".into()),
            ])
        );
    }

    #[test]
    fn unwrap_sets_reaches_nested_maps() {
        let mut inner = BTreeMap::new();
        inner.insert("roles".to_string(), AttributeValue::SS(vec!["admin".into()]));
        let mut item = Item::new();
        item.insert("profile".to_string(), AttributeValue::M(inner));
        item.insert("name".to_string(), AttributeValue::S("Ann".into()));

        let flat = unwrap_item_sets(item);
        let AttributeValue::M(profile) = &flat["profile"] else {
            panic!("expected map");
        };
        assert_eq!(
            profile["roles"],
            AttributeValue::L(vec![AttributeValue::S("admin".into())])
        );
        assert_eq!(flat["name"], AttributeValue::S("Ann".into()));
    }

    #[test]
    fn type_names() {
        assert_eq!(AttributeValue::number(5).type_name(), "N");
        assert_eq!(AttributeValue::BS(vec![]).type_name(), "BS");
        assert_eq!(AttributeValue::M(BTreeMap::new()).type_name(), "M");
    }

    proptest! {
        #[test]
        fn unwrapped_string_sets_keep_every_member_in_order(members in prop::collection::vec(".*", 0..12)) {
            let unwrapped = AttributeValue::SS(members.clone()).unwrap_sets();
            let AttributeValue::L(items) = unwrapped else {
                panic!("set did not unwrap to a list");
            };
            let strings: Vec<_> = items.iter().filter_map(AttributeValue::as_s).map(str::to_string).collect();
            prop_assert_eq!(strings, members);
        }
    }
}
