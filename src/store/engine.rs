//! Document store trait

use crate::document::{Datum, Document};
use crate::error::Result;
use crate::store::Filter;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Field selection applied to documents coming out of a read
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Projection {
    /// Return every field
    #[default]
    All,
    /// Return only the listed fields
    Include(Vec<String>),
    /// Return every field except the listed ones
    Exclude(Vec<String>),
}

impl Projection {
    pub fn include<I, S>(fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Projection::Include(fields.into_iter().map(Into::into).collect())
    }

    pub fn exclude<I, S>(fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Projection::Exclude(fields.into_iter().map(Into::into).collect())
    }

    /// Apply the projection to a document
    pub fn apply(&self, mut doc: Document) -> Document {
        match self {
            Projection::All => doc,
            Projection::Include(fields) => {
                doc.retain(|name, _| fields.iter().any(|f| f == name));
                doc
            }
            Projection::Exclude(fields) => {
                for field in fields {
                    doc.remove(field);
                }
                doc
            }
        }
    }
}

/// Field-level modification applied by [`DocumentStore::update_many`]
///
/// `set` assigns values, `unset` removes fields. Both are idempotent per
/// field, so concurrent updates touching different fields never clobber
/// each other.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Update {
    pub set: Vec<(String, Datum)>,
    pub unset: Vec<String>,
}

impl Update {
    /// Set every field in `fields` to `value`
    pub fn set_all<I>(fields: I, value: Datum) -> Self
    where
        I: IntoIterator<Item = String>,
    {
        Self {
            set: fields.into_iter().map(|f| (f, value.clone())).collect(),
            unset: Vec::new(),
        }
    }

    /// Remove every field in `fields`
    pub fn unset_all<I>(fields: I) -> Self
    where
        I: IntoIterator<Item = String>,
    {
        Self {
            set: Vec::new(),
            unset: fields.into_iter().collect(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.set.is_empty() && self.unset.is_empty()
    }

    /// Apply to a document, returning whether anything changed
    pub fn apply(&self, doc: &mut Document) -> bool {
        let mut changed = false;

        for (field, value) in &self.set {
            if doc.get(field) != Some(value) {
                doc.insert(field.clone(), value.clone());
                changed = true;
            }
        }

        for field in &self.unset {
            changed |= doc.remove(field).is_some();
        }

        changed
    }
}

/// Outcome of an update call
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateResult {
    pub matched: u64,
    pub modified: u64,
    pub upserted_id: Option<String>,
}

/// Document store trait
///
/// Collections are created implicitly by the first write that targets them.
/// Reads against a collection that does not exist behave as reads against
/// an empty one. A store that cannot hand out a collection (for example
/// after [`close`](DocumentStore::close)) reports
/// [`Error::CollectionUnavailable`](crate::error::Error::CollectionUnavailable).
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Fetch at most one document matching `filter`
    async fn find_one(
        &self,
        collection: &str,
        filter: &Filter,
        projection: &Projection,
    ) -> Result<Option<Document>>;

    /// Fetch every document matching `filter`, in storage order
    async fn find(
        &self,
        collection: &str,
        filter: &Filter,
        projection: &Projection,
    ) -> Result<Vec<Document>>;

    /// Apply `update` to every document matching `filter`.
    ///
    /// With `upsert` and no match, a new document is created from the
    /// filter's equality conditions with the update applied on top.
    async fn update_many(
        &self,
        collection: &str,
        filter: &Filter,
        update: &Update,
        upsert: bool,
    ) -> Result<UpdateResult>;

    /// Delete every document matching `filter`, returning how many went
    async fn delete_many(&self, collection: &str, filter: &Filter) -> Result<u64>;

    /// Create an ascending index over `fields` unless one already exists
    async fn create_index(&self, collection: &str, fields: &[String]) -> Result<()>;

    /// List all collections
    async fn list_collections(&self) -> Result<Vec<String>>;

    /// Drop a collection and everything in it
    async fn drop_collection(&self, collection: &str) -> Result<()>;

    /// Release the underlying connection
    async fn close(&self) -> Result<()>;
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
    fn test_projection_exclude() {
        let d = doc(&[
            ("_bucketname", Datum::from("users")),
            ("key", Datum::from("joe")),
        ]);

        let projected = Projection::exclude(["_bucketname"]).apply(d);
        assert_eq!(projected.len(), 1);
        assert!(projected.contains_key("key"));
    }

    #[test]
    fn test_projection_include() {
        let d = doc(&[("key", Datum::from("joe")), ("admin", Datum::Boolean(true))]);

        let projected = Projection::include(["admin"]).apply(d.clone());
        assert_eq!(projected.len(), 1);
        assert_eq!(projected.get("admin"), Some(&Datum::Boolean(true)));

        assert_eq!(Projection::All.apply(d.clone()), d);
    }

    #[test]
    fn test_update_apply_reports_changes() {
        let mut d = doc(&[("key", Datum::from("joe"))]);

        let set = Update::set_all(vec!["admin".to_string()], Datum::Boolean(true));
        assert!(set.apply(&mut d));
        // Second application is a no-op
        assert!(!set.apply(&mut d));

        let unset = Update::unset_all(vec!["admin".to_string(), "missing".to_string()]);
        assert!(unset.apply(&mut d));
        assert!(!unset.apply(&mut d));
        assert_eq!(d.len(), 1);
    }
}
