//! Bucket → collection resolution

use crate::acl::codec::sanitize_collection_name;
use crate::acl::{BackendConfig, BUCKET_FIELD, KEY_FIELD, SHARED_COLLECTION};
use crate::document::Datum;
use crate::error::{Error, Result};
use crate::store::{Filter, Projection};

/// Maps logical buckets onto physical collections.
///
/// Built once from a [`BackendConfig`]; every operation goes through
/// [`resolve`](Self::resolve) so the layout flags are applied uniformly.
#[derive(Debug, Clone)]
pub struct CollectionResolver {
    prefix: String,
    single_collection: bool,
    raw_names: bool,
}

impl CollectionResolver {
    pub fn new(config: &BackendConfig) -> Self {
        Self {
            prefix: config.prefix.clone(),
            single_collection: config.use_single_collection,
            raw_names: config.raw_collection_names(),
        }
    }

    pub fn is_single_collection(&self) -> bool {
        self.single_collection
    }

    /// Resolve the collection (and discriminator) for `bucket`
    pub fn resolve(&self, bucket: &str) -> Result<ResolvedCollection> {
        if bucket.is_empty() {
            return Err(Error::InvalidArgument(
                "bucket name must not be empty".to_string(),
            ));
        }

        let (name, discriminator) = if self.single_collection {
            (
                format!("{}{}", self.prefix, SHARED_COLLECTION),
                Some(bucket.to_string()),
            )
        } else {
            let sanitized = sanitize_collection_name(bucket, self.raw_names)?;
            (format!("{}{}", self.prefix, sanitized), None)
        };

        if name.contains('$') || name.contains('\0') {
            return Err(Error::CollectionUnavailable(format!(
                "invalid collection name {:?} for bucket {:?}",
                name, bucket
            )));
        }

        Ok(ResolvedCollection {
            name,
            discriminator,
        })
    }
}

/// A resolved bucket: the physical collection plus, in single-collection
/// mode, the `_bucketname` value scoping every query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedCollection {
    pub name: String,
    pub discriminator: Option<String>,
}

impl ResolvedCollection {
    /// `filter` restricted to this bucket
    pub fn scoped(&self, filter: Filter) -> Filter {
        match &self.discriminator {
            Some(bucket) => Filter::eq(BUCKET_FIELD, bucket.as_str()).and(filter),
            None => filter,
        }
    }

    /// The document for one encoded key
    pub fn key_filter(&self, key: Datum) -> Filter {
        self.scoped(Filter::Eq(KEY_FIELD.to_string(), key))
    }

    /// Documents for any of the encoded keys
    pub fn keys_filter(&self, keys: Vec<Datum>) -> Filter {
        self.scoped(Filter::In(KEY_FIELD.to_string(), keys))
    }

    /// Fields of the supporting lookup index
    pub fn index_fields(&self) -> Vec<String> {
        match self.discriminator {
            Some(_) => vec![BUCKET_FIELD.to_string(), KEY_FIELD.to_string()],
            None => vec![KEY_FIELD.to_string()],
        }
    }

    /// Projection for reads: the discriminator never leaves the store
    pub fn read_projection(&self) -> Projection {
        match self.discriminator {
            Some(_) => Projection::exclude([BUCKET_FIELD]),
            None => Projection::All,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_per_bucket_resolution() {
        let resolver = CollectionResolver::new(&BackendConfig::default());
        let resolved = resolver.resolve("user roles").unwrap();

        assert_eq!(resolved.name, "acl_user_roles");
        assert_eq!(resolved.discriminator, None);
        assert_eq!(resolved.index_fields(), vec!["key"]);
        assert_eq!(resolved.read_projection(), Projection::All);
        assert_eq!(
            resolved.key_filter(Datum::from("joe")),
            Filter::eq("key", "joe")
        );
    }

    #[test]
    fn test_raw_names() {
        let config = BackendConfig::default().with_raw_collection_names(false);
        let resolver = CollectionResolver::new(&config);
        assert_eq!(resolver.resolve("user roles").unwrap().name, "acl_user roles");
    }

    #[test]
    fn test_single_collection_resolution() {
        let config = BackendConfig::default().with_single_collection(true);
        let resolver = CollectionResolver::new(&config);
        let resolved = resolver.resolve("user roles").unwrap();

        assert!(resolver.is_single_collection());
        assert_eq!(resolved.name, "acl_resources");
        assert_eq!(resolved.discriminator.as_deref(), Some("user roles"));
        assert_eq!(resolved.index_fields(), vec!["_bucketname", "key"]);
        assert_eq!(resolved.read_projection(), Projection::exclude(["_bucketname"]));
        assert_eq!(
            resolved.key_filter(Datum::from("joe")),
            Filter::eq("_bucketname", "user roles").and(Filter::eq("key", "joe"))
        );
    }

    #[test]
    fn test_scoped_merges_caller_filter() {
        let config = BackendConfig::default().with_single_collection(true);
        let resolved = CollectionResolver::new(&config).resolve("users").unwrap();

        let filter = resolved.scoped(Filter::eq("admin", true));
        assert_eq!(
            filter,
            Filter::And(vec![Filter::eq("_bucketname", "users"), Filter::eq("admin", true)])
        );
        assert_eq!(resolved.scoped(Filter::All), Filter::eq("_bucketname", "users"));
    }

    #[test]
    fn test_unresolvable_names() {
        let resolver = CollectionResolver::new(&BackendConfig::default());
        let err = resolver.resolve("price$").unwrap_err();
        assert!(matches!(err, Error::CollectionUnavailable(_)));

        let err = resolver.resolve("a%00b").unwrap_err();
        assert!(matches!(err, Error::CollectionUnavailable(_)));
    }

    #[test]
    fn test_empty_bucket_rejected_in_every_layout() {
        for config in [
            BackendConfig::default(),
            BackendConfig::default().with_prefix(""),
            BackendConfig::default().with_single_collection(true),
        ] {
            let resolver = CollectionResolver::new(&config);
            assert!(matches!(resolver.resolve("").unwrap_err(), Error::InvalidArgument(_)));
        }
    }

    #[test]
    fn test_undecodable_bucket_name() {
        let resolver = CollectionResolver::new(&BackendConfig::default());
        assert!(matches!(resolver.resolve("%FF").unwrap_err(), Error::Codec(_)));
    }
}
