//! # Structured Document
//!
//! Format-neutral tree used for every configuration document the pipeline
//! rewrites (`app.toml`, `config.toml`, `genesis.json`) and for the override
//! fragments embedded in the network declaration.
//!
//! A [`Value`] is a tagged variant: a [`Scalar`], a list, or a nested
//! [`Document`]. Keys are kept sorted so serialized output is stable.

use std::collections::btree_map;
use std::collections::BTreeMap;
use std::fmt;

use serde::de::{self, MapAccess, SeqAccess, Visitor};
use serde::ser::{SerializeMap, SerializeSeq};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Leaf value of a structured document.
#[derive(Clone, Debug, PartialEq)]
pub enum Scalar {
    /// Explicit null (`~` in YAML, `null` in JSON). TOML has no equivalent.
    Null,
    /// Boolean.
    Bool(bool),
    /// Signed integer.
    Integer(i64),
    /// Unsigned integer above `i64::MAX`. Smaller values are `Integer`.
    Unsigned(u64),
    /// Floating point number.
    Float(f64),
    /// UTF-8 string. TOML datetimes load as strings too.
    String(String),
}

/// A node of a structured document.
#[derive(Clone, Debug, PartialEq)]
pub enum Value {
    /// Leaf value.
    Scalar(Scalar),
    /// Ordered sequence.
    List(Vec<Value>),
    /// Nested mapping.
    Map(Document),
}

impl Value {
    /// Shorthand for `Value::Scalar(Scalar::Null)`.
    pub const NULL: Value = Value::Scalar(Scalar::Null);

    /// Human readable kind, used in diagnostics.
    pub fn kind(&self) -> &'static str {
        match self {
            Value::Scalar(Scalar::Null) => "null",
            Value::Scalar(Scalar::Bool(_)) => "bool",
            Value::Scalar(Scalar::Integer(_) | Scalar::Unsigned(_)) => "integer",
            Value::Scalar(Scalar::Float(_)) => "float",
            Value::Scalar(Scalar::String(_)) => "string",
            Value::List(_) => "list",
            Value::Map(_) => "map",
        }
    }

    /// Borrow the string payload, if this is a string scalar.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Scalar(Scalar::String(s)) => Some(s),
            _ => None,
        }
    }

    /// Borrow the nested document, if this is a map.
    pub fn as_map(&self) -> Option<&Document> {
        match self {
            Value::Map(doc) => Some(doc),
            _ => None,
        }
    }

    /// Borrow the list items, if this is a list.
    pub fn as_list(&self) -> Option<&[Value]> {
        match self {
            Value::List(items) => Some(items),
            _ => None,
        }
    }

    /// Render a non-null scalar as text (`"1s"`, `"42"`, `"true"`).
    ///
    /// Returns `None` for null, lists and maps.
    pub fn as_text(&self) -> Option<String> {
        match self {
            Value::Scalar(Scalar::String(s)) => Some(s.clone()),
            Value::Scalar(Scalar::Integer(i)) => Some(i.to_string()),
            Value::Scalar(Scalar::Unsigned(u)) => Some(u.to_string()),
            Value::Scalar(Scalar::Float(f)) => Some(f.to_string()),
            Value::Scalar(Scalar::Bool(b)) => Some(b.to_string()),
            _ => None,
        }
    }

    /// True for `Value::Scalar(Scalar::Null)`.
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Scalar(Scalar::Null))
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Scalar(Scalar::String(s.to_string()))
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Scalar(Scalar::String(s))
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Scalar(Scalar::Bool(b))
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Scalar(Scalar::Integer(i))
    }
}

impl From<u64> for Value {
    fn from(u: u64) -> Self {
        match i64::try_from(u) {
            Ok(i) => Value::Scalar(Scalar::Integer(i)),
            Err(_) => Value::Scalar(Scalar::Unsigned(u)),
        }
    }
}

impl From<f64> for Value {
    fn from(f: f64) -> Self {
        Value::Scalar(Scalar::Float(f))
    }
}

impl From<Vec<Value>> for Value {
    fn from(items: Vec<Value>) -> Self {
        Value::List(items)
    }
}

impl From<Document> for Value {
    fn from(doc: Document) -> Self {
        Value::Map(doc)
    }
}

/// String-keyed mapping at the root of every structured document.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Document {
    entries: BTreeMap<String, Value>,
}

impl Document {
    /// Create an empty document.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of top-level keys.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True when there are no top-level keys.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Look up a top-level key.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.entries.get(key)
    }

    /// Insert a top-level key, returning the previous value.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        self.entries.insert(key.into(), value.into())
    }

    /// Remove a top-level key.
    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.entries.remove(key)
    }

    /// True if the top-level key is present.
    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    /// Iterate top-level entries in key order.
    pub fn iter(&self) -> btree_map::Iter<'_, String, Value> {
        self.entries.iter()
    }

    /// Resolve a dotted path such as `p2p.laddr`.
    pub fn get_path(&self, path: &str) -> Option<&Value> {
        let mut segments = path.split('.');
        let first = segments.next()?;
        let mut current = self.entries.get(first)?;
        for segment in segments {
            current = current.as_map()?.entries.get(segment)?;
        }
        Some(current)
    }

    /// Resolve a dotted path to a string scalar.
    pub fn get_str(&self, path: &str) -> Option<&str> {
        self.get_path(path).and_then(Value::as_str)
    }

    /// Set a dotted path, creating intermediate maps.
    ///
    /// An intermediate segment that holds a non-map value is replaced by a
    /// map, matching override-wins semantics.
    pub fn set_path(&mut self, path: &str, value: impl Into<Value>) {
        let segments: Vec<&str> = path.split('.').collect();
        set_segments(self, &segments, value.into());
    }
}

fn set_segments(doc: &mut Document, segments: &[&str], value: Value) {
    match segments {
        [] => {}
        [leaf] => {
            doc.entries.insert((*leaf).to_string(), value);
        }
        [head, rest @ ..] => {
            let slot = doc
                .entries
                .entry((*head).to_string())
                .or_insert_with(|| Value::Map(Document::new()));
            if let Value::Map(child) = slot {
                set_segments(child, rest, value);
            } else {
                let mut child = Document::new();
                set_segments(&mut child, rest, value);
                *slot = Value::Map(child);
            }
        }
    }
}

impl IntoIterator for Document {
    type Item = (String, Value);
    type IntoIter = btree_map::IntoIter<String, Value>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

impl<'a> IntoIterator for &'a Document {
    type Item = (&'a String, &'a Value);
    type IntoIter = btree_map::Iter<'a, String, Value>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for Document {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            entries: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

// =============================================================================
// serde
// =============================================================================

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Value::Scalar(Scalar::Null) => serializer.serialize_unit(),
            Value::Scalar(Scalar::Bool(b)) => serializer.serialize_bool(*b),
            Value::Scalar(Scalar::Integer(i)) => serializer.serialize_i64(*i),
            Value::Scalar(Scalar::Unsigned(u)) => serializer.serialize_u64(*u),
            Value::Scalar(Scalar::Float(f)) => serializer.serialize_f64(*f),
            Value::Scalar(Scalar::String(s)) => serializer.serialize_str(s),
            Value::List(items) => {
                let mut seq = serializer.serialize_seq(Some(items.len()))?;
                for item in items {
                    seq.serialize_element(item)?;
                }
                seq.end()
            }
            Value::Map(doc) => doc.serialize(serializer),
        }
    }
}

impl Serialize for Document {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (key, value) in &self.entries {
            map.serialize_entry(key, value)?;
        }
        map.end()
    }
}

struct ValueVisitor;

impl<'de> Visitor<'de> for ValueVisitor {
    type Value = Value;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a scalar, a list or a map")
    }

    fn visit_bool<E: de::Error>(self, v: bool) -> Result<Value, E> {
        Ok(Value::from(v))
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<Value, E> {
        Ok(Value::from(v))
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<Value, E> {
        Ok(Value::from(v))
    }

    fn visit_f64<E: de::Error>(self, v: f64) -> Result<Value, E> {
        Ok(Value::from(v))
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<Value, E> {
        Ok(Value::from(v))
    }

    fn visit_string<E: de::Error>(self, v: String) -> Result<Value, E> {
        Ok(Value::from(v))
    }

    fn visit_unit<E: de::Error>(self) -> Result<Value, E> {
        Ok(Value::NULL)
    }

    fn visit_none<E: de::Error>(self) -> Result<Value, E> {
        Ok(Value::NULL)
    }

    fn visit_some<D: Deserializer<'de>>(self, deserializer: D) -> Result<Value, D::Error> {
        Value::deserialize(deserializer)
    }

    fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> Result<Value, A::Error> {
        let mut items = Vec::with_capacity(seq.size_hint().unwrap_or(0));
        while let Some(item) = seq.next_element()? {
            items.push(item);
        }
        Ok(Value::List(items))
    }

    fn visit_map<A: MapAccess<'de>>(self, map: A) -> Result<Value, A::Error> {
        DocumentVisitor.visit_map(map).map(Value::Map)
    }
}

impl<'de> Deserialize<'de> for Value {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_any(ValueVisitor)
    }
}

/// Map keys may be plain scalars in YAML (`1: foo`); they are stringified.
struct KeyString(String);

impl<'de> Deserialize<'de> for KeyString {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        match Value::deserialize(deserializer)? {
            Value::Scalar(Scalar::Null) => Ok(KeyString("null".to_string())),
            other => other
                .as_text()
                .map(KeyString)
                .ok_or_else(|| de::Error::custom(format!("{} cannot be a map key", other.kind()))),
        }
    }
}

struct DocumentVisitor;

impl<'de> Visitor<'de> for DocumentVisitor {
    type Value = Document;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a map")
    }

    fn visit_unit<E: de::Error>(self) -> Result<Document, E> {
        Ok(Document::new())
    }

    fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<Document, A::Error> {
        let mut entries = BTreeMap::new();
        while let Some((KeyString(key), value)) = map.next_entry::<KeyString, Value>()? {
            entries.insert(key, value);
        }
        Ok(Document { entries })
    }
}

impl<'de> Deserialize<'de> for Document {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_any(DocumentVisitor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Document {
        let mut p2p = Document::new();
        p2p.insert("laddr", "tcp://0.0.0.0:26656");
        let mut doc = Document::new();
        doc.insert("moniker", "node0");
        doc.insert("p2p", p2p);
        doc
    }

    #[test]
    fn test_get_path_nested() {
        let doc = sample();
        assert_eq!(doc.get_str("p2p.laddr"), Some("tcp://0.0.0.0:26656"));
        assert_eq!(doc.get_str("moniker"), Some("node0"));
        assert!(doc.get_path("p2p.missing").is_none());
        assert!(doc.get_path("moniker.deeper").is_none());
    }

    #[test]
    fn test_set_path_creates_intermediates() {
        let mut doc = Document::new();
        doc.set_path("p2p.persistent_peers", "a@1.2.3.4:26656");
        assert_eq!(doc.get_str("p2p.persistent_peers"), Some("a@1.2.3.4:26656"));
    }

    #[test]
    fn test_set_path_replaces_scalar_intermediate() {
        let mut doc = Document::new();
        doc.insert("p2p", "not-a-table");
        doc.set_path("p2p.laddr", "tcp://0.0.0.0:1");
        assert_eq!(doc.get_str("p2p.laddr"), Some("tcp://0.0.0.0:1"));
    }

    #[test]
    fn test_as_text_renders_scalars() {
        assert_eq!(Value::from(5i64).as_text().as_deref(), Some("5"));
        assert_eq!(Value::from(true).as_text().as_deref(), Some("true"));
        assert_eq!(Value::NULL.as_text(), None);
        assert_eq!(Value::List(vec![]).as_text(), None);
    }

    #[test]
    fn test_json_deserialize_keeps_types() {
        let doc: Document =
            serde_json::from_str(r#"{"a": 1, "b": [true, null], "c": {"d": 1.5}}"#).unwrap();
        assert_eq!(doc.get("a"), Some(&Value::from(1i64)));
        assert_eq!(
            doc.get("b"),
            Some(&Value::List(vec![Value::from(true), Value::NULL]))
        );
        assert_eq!(doc.get_path("c.d"), Some(&Value::from(1.5)));
    }

    #[test]
    fn test_yaml_numeric_keys_are_stringified() {
        let doc: Document = serde_yaml::from_str("1: one\ntrue: yes\n").unwrap();
        assert_eq!(doc.get_str("1"), Some("one"));
        assert!(doc.contains_key("true"));
    }

    #[test]
    fn test_huge_unsigned_keeps_every_digit() {
        let text = r#"{"n":18446744073709551615,"m":9223372036854775807}"#;
        let doc: Document = serde_json::from_str(text).unwrap();
        assert_eq!(doc.get("n"), Some(&Value::Scalar(Scalar::Unsigned(u64::MAX))));
        assert_eq!(doc.get("m"), Some(&Value::Scalar(Scalar::Integer(i64::MAX))));
        assert_eq!(
            doc.get("n").and_then(Value::as_text).as_deref(),
            Some("18446744073709551615")
        );
        assert_eq!(
            serde_json::to_string(&doc).unwrap(),
            r#"{"m":9223372036854775807,"n":18446744073709551615}"#
        );
    }

    #[test]
    fn test_serialize_to_json() {
        let json = serde_json::to_string(&sample()).unwrap();
        assert_eq!(json, r#"{"moniker":"node0","p2p":{"laddr":"tcp://0.0.0.0:26656"}}"#);
    }

    #[test]
    fn test_null_document_is_empty() {
        let doc: Document = serde_yaml::from_str("~").unwrap();
        assert!(doc.is_empty());
    }
}
