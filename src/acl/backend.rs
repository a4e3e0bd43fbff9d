//! Backend contract and its document-store implementation

use crate::acl::codec::decode_members;
use crate::acl::resolver::CollectionResolver;
use crate::acl::transaction::{Step, Transaction};
use crate::acl::{BackendConfig, Key, ValueSet, Values, RESERVED_FIELDS};
use crate::document::Datum;
use crate::error::{Error, Result};
use crate::store::{DocumentStore, Filter, Projection, Update};
use async_trait::async_trait;
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

/// Storage contract consumed by the ACL engine.
///
/// Reads run immediately. Mutations are synchronous appends to a
/// transaction; nothing reaches the store until [`end`](AclBackend::end).
#[async_trait]
pub trait AclBackend: Send + Sync {
    type Transaction: Send;

    /// Start a new transaction
    fn begin(&self) -> Self::Transaction;

    /// Run every step of `transaction` in order, stopping at the first error
    async fn end(&self, transaction: &mut Self::Transaction) -> Result<()>;

    /// Remove all buckets
    async fn clean(&self) -> Result<()>;

    /// Values of `key` in `bucket`; empty if the key does not exist
    async fn get(&self, bucket: &str, key: Key) -> Result<ValueSet>;

    /// `field` of every document in `bucket` matching `filter`, in result order
    async fn get_many(&self, bucket: &str, filter: Filter, field: &str) -> Result<Vec<Datum>>;

    /// Union of the values of every key in `keys`
    async fn union(&self, bucket: &str, keys: Vec<Key>) -> Result<ValueSet>;

    /// Add `values` to `key`
    fn add(
        &self,
        transaction: &mut Self::Transaction,
        bucket: &str,
        key: Key,
        values: Values,
    ) -> Result<()>;

    /// Remove `values` from `key`
    fn remove(
        &self,
        transaction: &mut Self::Transaction,
        bucket: &str,
        key: Key,
        values: Values,
    ) -> Result<()>;

    /// Delete `keys` from `bucket`
    fn del(&self, transaction: &mut Self::Transaction, bucket: &str, keys: Values) -> Result<()>;

    /// Release the underlying connection
    async fn close(&self) -> Result<()>;
}

/// Which mutation is being validated
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mutation {
    Add,
    Remove,
    Del,
}

/// Semantic argument checks, run before anything is appended.
fn validate(op: Mutation, key: Option<&Key>, values: &Values) -> Result<()> {
    if op == Mutation::Add {
        if let Some(key) = key.filter(|k| k.is_reserved_key()) {
            return Err(Error::InvalidArgument(format!(
                "key name '{}' is not allowed",
                key
            )));
        }
    }

    if values.is_empty() {
        let what = if op == Mutation::Del { "keys" } else { "values" };
        return Err(Error::InvalidArgument(format!("{} must not be empty", what)));
    }

    if op != Mutation::Del {
        if let Some(value) = values
            .iter()
            .find(|v| RESERVED_FIELDS.contains(&v.field_name().as_str()))
        {
            return Err(Error::InvalidArgument(format!(
                "value name '{}' is reserved",
                value
            )));
        }
    }

    Ok(())
}

/// [`AclBackend`] over any [`DocumentStore`]
pub struct DocumentBackend {
    store: Arc<dyn DocumentStore>,
    resolver: CollectionResolver,
    owns_store: bool,
}

impl std::fmt::Debug for DocumentBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DocumentBackend")
            .field("resolver", &self.resolver)
            .field("owns_store", &self.owns_store)
            .finish()
    }
}

impl DocumentBackend {
    /// Backend over a store owned by someone else; [`close`](AclBackend::close)
    /// leaves it open.
    pub fn new(store: Arc<dyn DocumentStore>, config: BackendConfig) -> Self {
        Self {
            store,
            resolver: CollectionResolver::new(&config),
            owns_store: false,
        }
    }

    /// Backend that owns its store and closes it on [`close`](AclBackend::close)
    pub fn owning(store: Arc<dyn DocumentStore>, config: BackendConfig) -> Self {
        Self {
            owns_store: true,
            ..Self::new(store, config)
        }
    }

    pub fn resolver(&self) -> &CollectionResolver {
        &self.resolver
    }
}

#[async_trait]
impl AclBackend for DocumentBackend {
    type Transaction = Transaction;

    fn begin(&self) -> Transaction {
        let tx = Transaction::new();
        debug!(tx = %tx.id(), "Transaction started");
        tx
    }

    async fn end(&self, transaction: &mut Transaction) -> Result<()> {
        transaction.execute(self.store.as_ref()).await
    }

    #[instrument(skip(self))]
    async fn clean(&self) -> Result<()> {
        let collections = self.store.list_collections().await?;

        for name in &collections {
            if let Err(e) = self.store.drop_collection(name).await {
                warn!(collection = %name, error = %e, "Failed to drop collection; continuing");
            }
        }

        info!(count = collections.len(), "Cleaned collections");
        Ok(())
    }

    #[instrument(skip(self))]
    async fn get(&self, bucket: &str, key: Key) -> Result<ValueSet> {
        let collection = self.resolver.resolve(bucket)?;
        let filter = collection.key_filter(key.encode());

        let doc = self
            .store
            .find_one(&collection.name, &filter, &collection.read_projection())
            .await?;

        match doc {
            Some(doc) => decode_members(&doc),
            None => {
                debug!(collection = %collection.name, "No document for key");
                Ok(ValueSet::new())
            }
        }
    }

    #[instrument(skip(self, filter))]
    async fn get_many(&self, bucket: &str, filter: Filter, field: &str) -> Result<Vec<Datum>> {
        let collection = self.resolver.resolve(bucket)?;
        let filter = collection.scoped(filter);

        let docs = self
            .store
            .find(&collection.name, &filter, &Projection::include([field]))
            .await?;

        Ok(docs
            .into_iter()
            .filter_map(|mut doc| doc.remove(field))
            .collect())
    }

    #[instrument(skip(self, keys), fields(key_count = keys.len()))]
    async fn union(&self, bucket: &str, keys: Vec<Key>) -> Result<ValueSet> {
        if keys.is_empty() {
            return Ok(ValueSet::new());
        }

        let collection = self.resolver.resolve(bucket)?;
        let filter = collection.keys_filter(keys.iter().map(Key::encode).collect());

        let docs = self
            .store
            .find(&collection.name, &filter, &collection.read_projection())
            .await?;

        let mut values = ValueSet::new();
        for doc in &docs {
            values.extend(decode_members(doc)?);
        }
        debug!(documents = docs.len(), values = values.len(), "Union resolved");
        Ok(values)
    }

    fn add(&self, transaction: &mut Transaction, bucket: &str, key: Key, values: Values) -> Result<()> {
        validate(Mutation::Add, Some(&key), &values)?;
        let collection = self.resolver.resolve(bucket)?;

        let update = Update::set_all(values.field_names(), Datum::Boolean(true));
        let index_fields = collection.index_fields();

        transaction.append([
            Step::UpdateMany {
                collection: collection.name.clone(),
                filter: collection.key_filter(key.encode()),
                update,
                upsert: true,
            },
            Step::EnsureIndex {
                collection: collection.name,
                fields: index_fields,
            },
        ])
    }

    fn remove(
        &self,
        transaction: &mut Transaction,
        bucket: &str,
        key: Key,
        values: Values,
    ) -> Result<()> {
        validate(Mutation::Remove, Some(&key), &values)?;
        let collection = self.resolver.resolve(bucket)?;

        transaction.append([Step::UpdateMany {
            filter: collection.key_filter(key.encode()),
            collection: collection.name,
            update: Update::unset_all(values.field_names()),
            upsert: true,
        }])
    }

    fn del(&self, transaction: &mut Transaction, bucket: &str, keys: Values) -> Result<()> {
        validate(Mutation::Del, None, &keys)?;
        let collection = self.resolver.resolve(bucket)?;

        transaction.append([Step::DeleteMany {
            filter: collection.keys_filter(keys.encode()),
            collection: collection.name,
        }])
    }

    async fn close(&self) -> Result<()> {
        if self.owns_store {
            info!("Closing document store");
            self.store.close().await?;
        }
        Ok(())
    }
}
