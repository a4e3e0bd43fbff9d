//! Filter DSL for document queries.
//!
//! A deliberately small language: equality, membership and conjunction.
//! It covers every query the ACL backend issues and is what callers of
//! `get_many` hand in, instead of raw store query syntax.
//!
//! # Example
//!
//! ```rust
//! use acl_docstore::store::Filter;
//!
//! let filter = Filter::eq("_bucketname", "users").and(Filter::is_in("key", ["joe", "ann"]));
//! assert_eq!(filter.equalities().len(), 1);
//! ```

use crate::document::{Datum, Document};
use serde::{Deserialize, Serialize};

/// Query filter over document fields
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Filter {
    /// Matches every document
    #[default]
    All,
    /// Field equals value
    Eq(String, Datum),
    /// Field equals any of the values
    In(String, Vec<Datum>),
    /// Every sub-filter matches
    And(Vec<Filter>),
}

impl Filter {
    pub fn eq(field: impl Into<String>, value: impl Into<Datum>) -> Self {
        Filter::Eq(field.into(), value.into())
    }

    pub fn is_in<I, V>(field: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Datum>,
    {
        Filter::In(field.into(), values.into_iter().map(Into::into).collect())
    }

    /// Conjunction of `self` and `other`, flattening nested `And`s and
    /// dropping `All`.
    pub fn and(self, other: Filter) -> Self {
        let mut parts = Vec::new();
        for f in [self, other] {
            match f {
                Filter::All => {}
                Filter::And(inner) => parts.extend(inner),
                f => parts.push(f),
            }
        }

        match parts.len() {
            0 => Filter::All,
            1 => parts.pop().unwrap_or_default(),
            _ => Filter::And(parts),
        }
    }

    /// Whether `doc` satisfies the filter
    pub fn matches(&self, doc: &Document) -> bool {
        match self {
            Filter::All => true,
            Filter::Eq(field, value) => doc.get(field) == Some(value),
            Filter::In(field, values) => doc
                .get(field)
                .map(|v| values.iter().any(|candidate| candidate == v))
                .unwrap_or(false),
            Filter::And(parts) => parts.iter().all(|f| f.matches(doc)),
        }
    }

    /// Equality conditions, used to seed a document created by an upsert
    pub fn equalities(&self) -> Vec<(String, Datum)> {
        match self {
            Filter::Eq(field, value) => vec![(field.clone(), value.clone())],
            Filter::And(parts) => parts.iter().flat_map(Filter::equalities).collect(),
            Filter::All | Filter::In(..) => Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doc(fields: &[(&str, Datum)]) -> Document {
        fields
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    }

    #[test]
    fn test_eq_and_in() {
        let d = doc(&[("key", Datum::from("joe")), ("n", Datum::from(5i64))]);

        assert!(Filter::eq("key", "joe").matches(&d));
        assert!(!Filter::eq("key", "ann").matches(&d));
        assert!(Filter::eq("n", 5i64).matches(&d));
        assert!(Filter::is_in("key", ["ann", "joe"]).matches(&d));
        assert!(!Filter::is_in("key", Vec::<&str>::new()).matches(&d));
        assert!(!Filter::eq("missing", "x").matches(&d));
    }

    #[test]
    fn test_and_flattens() {
        let f = Filter::All
            .and(Filter::eq("a", "1"))
            .and(Filter::eq("b", "2").and(Filter::eq("c", "3")));

        match &f {
            Filter::And(parts) => assert_eq!(parts.len(), 3),
            other => panic!("expected And, got {:?}", other),
        }

        assert_eq!(Filter::All.and(Filter::All), Filter::All);
        assert_eq!(Filter::All.and(Filter::eq("a", "1")), Filter::eq("a", "1"));
    }

    #[test]
    fn test_equalities_skip_membership() {
        let f = Filter::eq("_bucketname", "users").and(Filter::is_in("key", ["a", "b"]));
        assert_eq!(
            f.equalities(),
            vec![("_bucketname".to_string(), Datum::from("users"))]
        );
    }

    #[test]
    fn test_filter_serde() {
        let f = Filter::eq("key", "joe");
        let json = serde_json::to_string(&f).unwrap();
        assert_eq!(json, r#"{"eq":["key","joe"]}"#);

        let back: Filter = serde_json::from_str(&json).unwrap();
        assert_eq!(back, f);
    }
}
