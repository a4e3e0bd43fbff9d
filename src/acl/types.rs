//! Contract types: keys, value lists and value sets

use crate::acl::codec::encode_text;
use crate::acl::KEY_FIELD;
use crate::document::Datum;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

/// The set of values held by a key
pub type ValueSet = BTreeSet<String>;

/// A key or value identifier: text or an integer.
///
/// Text is percent-encoded before it reaches the store; integers are stored
/// as exact integers when used as a key and as their decimal form when used as a
/// field name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Key {
    Integer(i64),
    Text(String),
}

impl Key {
    /// Value stored in the document's `key` field
    pub fn encode(&self) -> Datum {
        match self {
            Key::Text(s) => Datum::String(encode_text(s)),
            Key::Integer(n) => Datum::from(*n),
        }
    }

    /// Field name used when this identifier is a set member
    pub fn field_name(&self) -> String {
        match self {
            Key::Text(s) => encode_text(s),
            Key::Integer(n) => n.to_string(),
        }
    }

    /// Whether this is the literal reserved key name `key`
    pub fn is_reserved_key(&self) -> bool {
        matches!(self, Key::Text(s) if s == KEY_FIELD)
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Key::Text(s) => write!(f, "{}", s),
            Key::Integer(n) => write!(f, "{}", n),
        }
    }
}

impl From<&str> for Key {
    fn from(s: &str) -> Self {
        Key::Text(s.to_string())
    }
}

impl From<String> for Key {
    fn from(s: String) -> Self {
        Key::Text(s)
    }
}

impl From<&String> for Key {
    fn from(s: &String) -> Self {
        Key::Text(s.clone())
    }
}

impl From<i64> for Key {
    fn from(n: i64) -> Self {
        Key::Integer(n)
    }
}

impl From<i32> for Key {
    fn from(n: i32) -> Self {
        Key::Integer(n as i64)
    }
}

impl From<u32> for Key {
    fn from(n: u32) -> Self {
        Key::Integer(n as i64)
    }
}

/// One or more identifiers passed to a mutation.
///
/// Built from a single string or integer, or from a vector/array of them:
///
/// ```rust
/// use acl_docstore::acl::Values;
///
/// assert_eq!(Values::from("admin").len(), 1);
/// assert_eq!(Values::from(["admin", "editor"]).len(), 2);
/// assert_eq!(Values::from(vec![1, 2, 3]).len(), 3);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Values(Vec<Key>);

impl Values {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Key> {
        self.0.iter()
    }

    /// Encoded field names, one per value
    pub fn field_names(&self) -> Vec<String> {
        self.0.iter().map(Key::field_name).collect()
    }

    /// Encoded key values, one per entry
    pub fn encode(&self) -> Vec<Datum> {
        self.0.iter().map(Key::encode).collect()
    }

    pub fn into_vec(self) -> Vec<Key> {
        self.0
    }
}

impl From<Key> for Values {
    fn from(key: Key) -> Self {
        Values(vec![key])
    }
}

impl From<&str> for Values {
    fn from(s: &str) -> Self {
        Values(vec![Key::from(s)])
    }
}

impl From<String> for Values {
    fn from(s: String) -> Self {
        Values(vec![Key::from(s)])
    }
}

impl From<i64> for Values {
    fn from(n: i64) -> Self {
        Values(vec![Key::from(n)])
    }
}

impl From<i32> for Values {
    fn from(n: i32) -> Self {
        Values(vec![Key::from(n)])
    }
}

impl<T: Into<Key>> From<Vec<T>> for Values {
    fn from(items: Vec<T>) -> Self {
        items.into_iter().collect()
    }
}

impl<T: Into<Key>, const N: usize> From<[T; N]> for Values {
    fn from(items: [T; N]) -> Self {
        items.into_iter().collect()
    }
}

impl<T: Into<Key>> FromIterator<T> for Values {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        Values(iter.into_iter().map(Into::into).collect())
    }
}

impl IntoIterator for Values {
    type Item = Key;
    type IntoIter = std::vec::IntoIter<Key>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl<'a> IntoIterator for &'a Values {
    type Item = &'a Key;
    type IntoIter = std::slice::Iter<'a, Key>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}
